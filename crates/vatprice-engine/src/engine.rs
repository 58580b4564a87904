//! Pricing engine facade
//!
//! `PricingEngine` wires the selector, calculator, and aggregator into the
//! `PricingService` contract: validate the request, price each requested
//! country independently, then aggregate with global discounts. Per-country
//! failures are recorded and never abort sibling countries.

use crate::aggregator::aggregate;
use crate::cache::ExpressionCache;
use crate::calculator::calculate_country_cost;
use tracing::{debug, instrument, warn};
use validator::Validate;
use vatprice_core::models::{
    CalculationRequest, CalculationResult, CalculationWarning, PricingRule,
};
use vatprice_core::traits::{PricingService, RuleSource};
use vatprice_core::{PricingConfig, PricingError, PricingResult};

/// Pricing engine implementation
///
/// Stateless apart from configuration; safe to share and to call
/// concurrently.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Calculate against a rule source instead of a pre-assembled slice
    pub fn calculate_from_source(
        &self,
        request: &CalculationRequest,
        source: &dyn RuleSource,
    ) -> PricingResult<CalculationResult> {
        let mut rules = Vec::new();
        for code in &request.country_codes {
            rules.extend(source.rules_for_country(&code.to_ascii_uppercase()));
        }
        rules.extend(source.global_discount_rules());
        self.calculate(request, &rules)
    }

    /// Fill defaults and check request invariants
    fn normalize(&self, request: &CalculationRequest) -> PricingResult<CalculationRequest> {
        let mut request = request.clone();

        if request.currency.is_empty() {
            request.currency = self.config.pricing.default_currency.clone();
        }
        request.currency = request.currency.to_ascii_uppercase();

        request.validate()?;

        if request.currency.len() != 3 {
            return Err(PricingError::Validation(format!(
                "'{}' is not a 3-letter currency code",
                request.currency
            )));
        }

        for code in &mut request.country_codes {
            *code = code.to_ascii_uppercase();
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(PricingError::Validation(format!(
                    "'{}' is not a 2-letter country code",
                    code
                )));
            }
        }

        Ok(request)
    }
}

impl PricingService for PricingEngine {
    #[instrument(skip(self, request, rules), fields(countries = request.country_codes.len(), rules = rules.len()))]
    fn calculate(
        &self,
        request: &CalculationRequest,
        rules: &[PricingRule],
    ) -> PricingResult<CalculationResult> {
        let request = self.normalize(request)?;
        let reference = request.reference_date_or_now();
        let money_scale = self.config.pricing.money_scale;

        // One cache per calculation: parsed ASTs never outlive the request
        let mut cache = ExpressionCache::new(&self.config.evaluation);

        let (global_rules, country_rules): (Vec<PricingRule>, Vec<PricingRule>) =
            rules.iter().cloned().partition(|r| r.is_global());

        let mut breakdowns = Vec::new();
        let mut warnings: Vec<CalculationWarning> = Vec::new();

        for code in &request.country_codes {
            match calculate_country_cost(
                code,
                &request,
                &country_rules,
                reference,
                &mut cache,
                money_scale,
            ) {
                Ok(country) => {
                    debug!(country = %code, total = %country.breakdown.total_cost, "country priced");
                    breakdowns.push(country.breakdown);
                    warnings.extend(country.warnings);
                }
                Err(e) => {
                    // The country is omitted from the aggregate; siblings
                    // continue
                    warn!(country = %code, "country omitted: {}", e);
                    warnings.push(CalculationWarning::for_country(code, &e));
                }
            }
        }

        let mut result = aggregate(
            &request,
            breakdowns,
            &global_rules,
            reference,
            &mut cache,
            money_scale,
        )?;

        // Country-level warnings come first, then aggregation warnings
        warnings.extend(std::mem::take(&mut result.warnings));
        result.warnings = warnings;

        Ok(result)
    }
}
