//! Per-country pricing calculator
//!
//! Builds the parameter binding for a country, selects the applicable
//! rules, and folds their evaluated contributions into a cost breakdown.
//! A failing rule is skipped and recorded - a single malformed rule must
//! not block pricing for a country.

use crate::cache::ExpressionCache;
use crate::selector::select_applicable_rules;
use crate::bindings;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use vatprice_core::models::{
    country_name, CalculationRequest, CalculationWarning, CostBucket, CountryCostBreakdown,
    ParameterBinding, PricingRule,
};
use vatprice_core::{PricingError, PricingResult};

/// Result of pricing a single country
#[derive(Debug, Clone)]
pub struct CountryCalculation {
    pub breakdown: CountryCostBreakdown,
    pub warnings: Vec<CalculationWarning>,
}

/// Bindings derived from the request alone, shared by every evaluation
pub fn base_request_bindings(request: &CalculationRequest) -> ParameterBinding {
    ParameterBinding::new()
        .with(bindings::TRANSACTION_VOLUME, request.transaction_volume)
        .with(bindings::SERVICE_TYPE, request.service_type.to_string())
        .with(bindings::FILING_FREQUENCY, request.filing_frequency.to_string())
        .with(
            bindings::FILINGS_PER_YEAR,
            i64::from(request.filing_frequency.filings_per_year()),
        )
        .with(
            bindings::ADDITIONAL_SERVICES,
            request.additional_services.join(","),
        )
}

/// Calculate the cost breakdown for one country
///
/// Fails with `CountryNotSupported` when no active rule exists for the
/// country at all. Active rules that are merely out of window or filtered
/// by conditions yield a zero-cost breakdown instead.
pub fn calculate_country_cost(
    country_code: &str,
    request: &CalculationRequest,
    rules: &[PricingRule],
    reference: DateTime<Utc>,
    cache: &mut ExpressionCache,
    money_scale: u32,
) -> PricingResult<CountryCalculation> {
    let active: Vec<&PricingRule> = rules
        .iter()
        .filter(|r| r.matches_country(country_code) && r.is_active)
        .collect();

    if active.is_empty() {
        return Err(PricingError::CountryNotSupported(country_code.to_string()));
    }

    let mut warnings = Vec::new();

    // Request inputs first, then declared rule defaults for names the
    // request did not bind. Defaults must be in place before condition
    // evaluation since conditions may reference them.
    let mut param_bindings = base_request_bindings(request)
        .with(bindings::COUNTRY_CODE, country_code.to_string());

    for rule in &active {
        for param in &rule.parameters {
            match param.parsed_default() {
                Ok(Some(value)) => param_bindings.bind_default(param.name.clone(), value),
                Ok(None) => {}
                Err(e) => {
                    warn!(rule = %rule.name, "unparseable parameter default: {}", e);
                    warnings.push(CalculationWarning::for_rule(country_code, &rule.name, &e));
                }
            }
        }
    }

    let applicable = select_applicable_rules(country_code, &param_bindings, reference, rules);
    debug!(
        country = country_code,
        applicable = applicable.len(),
        "selected applicable rules"
    );

    let name = country_name(country_code).unwrap_or(country_code);
    let mut breakdown = CountryCostBreakdown::new(country_code, name, &request.currency);
    let mut base = Decimal::ZERO;
    let mut additional = Decimal::ZERO;

    for rule in &applicable {
        let amount = match cache
            .get_or_parse(&rule.expression)
            .and_then(|ast| vatprice_expr::evaluate_ast(&ast, &param_bindings))
            .and_then(vatprice_expr::eval::expect_number)
        {
            Ok(amount) => amount,
            Err(e) => {
                warn!(rule = %rule.name, country = country_code, "rule skipped: {}", e);
                warnings.push(CalculationWarning::for_rule(country_code, &rule.name, &e));
                continue;
            }
        };

        let signed = if rule.rule_type.is_deduction() { -amount } else { amount };
        match rule.rule_type.cost_bucket() {
            CostBucket::Base => base = clamp_non_negative(base + signed),
            CostBucket::Additional => additional = clamp_non_negative(additional + signed),
        }

        debug!(
            rule = %rule.name,
            rule_type = %rule.rule_type,
            amount = %amount,
            "rule applied"
        );
        breakdown.applied_rules.push(rule.name.clone());
    }

    breakdown.base_cost = base;
    breakdown.additional_cost = additional;

    Ok(CountryCalculation {
        breakdown: breakdown.rounded(money_scale),
        warnings,
    })
}

fn clamp_non_negative(value: Decimal) -> Decimal {
    if value < Decimal::ZERO {
        Decimal::ZERO
    } else {
        value
    }
}
