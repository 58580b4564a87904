//! Common traits for rule sources and pricing services
//!
//! The pricing core never queries storage directly: the surrounding system
//! adapts its persistence to `RuleSource`, and consumes the engine through
//! `PricingService`. All operations are synchronous - the core is pure
//! CPU-bound code with no I/O.

use crate::error::PricingError;
use crate::models::{CalculationRequest, CalculationResult, PricingRule};

/// Supplier of the active rule set
pub trait RuleSource: Send + Sync {
    /// Rules scoped to a single country (global rules excluded)
    fn rules_for_country(&self, country_code: &str) -> Vec<PricingRule>;

    /// Globally scoped discount rules applied during aggregation
    fn global_discount_rules(&self) -> Vec<PricingRule>;
}

/// Pricing service trait
pub trait PricingService: Send + Sync {
    /// Compute a multi-country cost estimate against the supplied rule set
    fn calculate(
        &self,
        request: &CalculationRequest,
        rules: &[PricingRule],
    ) -> Result<CalculationResult, PricingError>;
}

/// In-memory rule source over a fixed rule set
///
/// Used in tests and by callers that already hold the full rule set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleSource {
    rules: Vec<PricingRule>,
}

impl InMemoryRuleSource {
    pub fn new(rules: Vec<PricingRule>) -> Self {
        Self { rules }
    }

    /// All rules, country-scoped and global
    pub fn all(&self) -> &[PricingRule] {
        &self.rules
    }
}

impl RuleSource for InMemoryRuleSource {
    fn rules_for_country(&self, country_code: &str) -> Vec<PricingRule> {
        self.rules
            .iter()
            .filter(|r| r.matches_country(country_code))
            .cloned()
            .collect()
    }

    fn global_discount_rules(&self) -> Vec<PricingRule> {
        self.rules.iter().filter(|r| r.is_global()).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricingRule;

    #[test]
    fn test_in_memory_rule_source_partitions() {
        let rules = vec![
            PricingRule {
                id: 1,
                country_code: "GB".to_string(),
                name: "UK VAT".to_string(),
                expression: "basePrice * 0.20".to_string(),
                ..Default::default()
            },
            PricingRule {
                id: 2,
                country_code: PricingRule::GLOBAL_SCOPE.to_string(),
                name: "Multi-country discount".to_string(),
                expression: "10".to_string(),
                ..Default::default()
            },
        ];
        let source = InMemoryRuleSource::new(rules);

        let gb = source.rules_for_country("GB");
        assert_eq!(gb.len(), 1);
        assert_eq!(gb[0].name, "UK VAT");

        assert!(source.rules_for_country("DE").is_empty());

        let global = source.global_discount_rules();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].id, 2);
    }
}
