//! Cost breakdown and calculation result models
//!
//! Outputs of the pricing core. The surrounding API layer serializes these
//! into its existing JSON contract; field names here follow the domain,
//! not the wire format.

use crate::error::PricingError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-country cost decomposition with an applied-rule audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCostBreakdown {
    /// ISO 3166-1 alpha-2 country code
    pub country_code: String,

    /// Human-readable country name
    pub country_name: String,

    /// Reporting currency code
    pub currency: String,

    /// Cost from vat_rate/threshold/complexity rules
    pub base_cost: Decimal,

    /// Cost from special_requirement rules, less per-country discounts
    pub additional_cost: Decimal,

    /// base_cost + additional_cost
    pub total_cost: Decimal,

    /// Names of successfully applied rules, in evaluation (priority) order
    pub applied_rules: Vec<String>,
}

impl CountryCostBreakdown {
    pub fn new(country_code: &str, country_name: &str, currency: &str) -> Self {
        Self {
            country_code: country_code.to_string(),
            country_name: country_name.to_string(),
            currency: currency.to_string(),
            base_cost: Decimal::ZERO,
            additional_cost: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            applied_rules: Vec::new(),
        }
    }

    /// Round costs to the given scale and recompute the total
    ///
    /// The total is derived from the rounded components so the
    /// base + additional = total invariant holds exactly.
    pub fn rounded(mut self, scale: u32) -> Self {
        self.base_cost = self.base_cost.round_dp(scale);
        self.additional_cost = self.additional_cost.round_dp(scale);
        self.total_cost = self.base_cost + self.additional_cost;
        self
    }
}

/// A global discount that fired during aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    /// Discount rule name
    pub name: String,

    /// Amount subtracted from the gross total
    pub amount: Decimal,
}

/// Non-fatal diagnostic recorded during a calculation
///
/// Skipped rules and omitted countries are reported here instead of
/// aborting sibling rules or sibling countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationWarning {
    /// Country the warning relates to, if any
    pub country_code: Option<String>,

    /// Rule the warning relates to, if any
    pub rule_name: Option<String>,

    /// API error code of the underlying failure
    pub code: String,

    /// Human-readable description
    pub message: String,
}

impl CalculationWarning {
    /// Warning for a rule that was skipped during evaluation
    pub fn for_rule(country_code: &str, rule_name: &str, err: &PricingError) -> Self {
        Self {
            country_code: Some(country_code.to_string()),
            rule_name: Some(rule_name.to_string()),
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }

    /// Warning for a country that was omitted from the result
    pub fn for_country(country_code: &str, err: &PricingError) -> Self {
        Self {
            country_code: Some(country_code.to_string()),
            rule_name: None,
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }

    /// Warning for a global discount rule that was skipped
    pub fn for_global_rule(rule_name: &str, err: &PricingError) -> Self {
        Self {
            country_code: None,
            rule_name: Some(rule_name.to_string()),
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Full multi-country calculation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Sum of per-country totals less global discounts, clamped at zero
    pub total_cost: Decimal,

    /// Reporting currency code
    pub currency: String,

    /// Per-country breakdowns, in request order (failed countries omitted)
    pub countries: Vec<CountryCostBreakdown>,

    /// Global discounts applied, in application order
    pub discounts: Vec<AppliedDiscount>,

    /// Additional service identifiers included in the estimate
    pub additional_services: Vec<String>,

    /// Non-fatal diagnostics collected along the way
    pub warnings: Vec<CalculationWarning>,
}
