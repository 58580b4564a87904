//! Calculation aggregator
//!
//! Combines per-country breakdowns into the full multi-country result,
//! applies globally scoped discount rules, and clamps the final total at
//! zero. Pure function of its inputs.

use crate::cache::ExpressionCache;
use crate::calculator::base_request_bindings;
use crate::selector::select_applicable_rules;
use crate::bindings;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};
use vatprice_core::models::{
    AppliedDiscount, CalculationRequest, CalculationResult, CalculationWarning,
    CountryCostBreakdown, PricingRule, RuleType,
};
use vatprice_core::{PricingError, PricingResult};

/// Aggregate per-country breakdowns and global discounts into one result
///
/// All breakdowns must share the request's reporting currency; a mismatch
/// is fatal for the whole aggregation.
pub fn aggregate(
    request: &CalculationRequest,
    breakdowns: Vec<CountryCostBreakdown>,
    discount_rules: &[PricingRule],
    reference: DateTime<Utc>,
    cache: &mut ExpressionCache,
    money_scale: u32,
) -> PricingResult<CalculationResult> {
    for bd in &breakdowns {
        if bd.currency != request.currency {
            return Err(PricingError::CurrencyMismatch {
                expected: request.currency.clone(),
                found: bd.currency.clone(),
            });
        }
    }

    let gross: Decimal = breakdowns.iter().map(|b| b.total_cost).sum();
    debug!(countries = breakdowns.len(), gross = %gross, "aggregating breakdowns");

    let global_bindings = base_request_bindings(request)
        .with(bindings::COUNTRY_COUNT, breakdowns.len() as i64);

    // Global discounts go through the same selection pipeline, keyed on
    // the global scope marker
    let applicable = select_applicable_rules(
        PricingRule::GLOBAL_SCOPE,
        &global_bindings,
        reference,
        discount_rules,
    );

    let mut warnings = Vec::new();
    let mut discounts = Vec::new();
    let mut total = gross;

    for rule in applicable.iter().filter(|r| r.rule_type == RuleType::Discount) {
        let amount = match cache
            .get_or_parse(&rule.expression)
            .and_then(|ast| vatprice_expr::evaluate_ast(&ast, &global_bindings))
            .and_then(vatprice_expr::eval::expect_number)
        {
            Ok(amount) => amount,
            Err(e) => {
                warn!(rule = %rule.name, "global discount skipped: {}", e);
                warnings.push(CalculationWarning::for_global_rule(&rule.name, &e));
                continue;
            }
        };

        // A discount can never add to the total
        let amount = amount.max(Decimal::ZERO).round_dp(money_scale);
        total -= amount;
        debug!(rule = %rule.name, amount = %amount, "global discount applied");
        discounts.push(AppliedDiscount {
            name: rule.name.clone(),
            amount,
        });
    }

    if total < Decimal::ZERO {
        total = Decimal::ZERO;
    }

    Ok(CalculationResult {
        total_cost: total.round_dp(money_scale),
        currency: request.currency.clone(),
        countries: breakdowns,
        discounts,
        additional_services: request.additional_services.clone(),
        warnings,
    })
}
