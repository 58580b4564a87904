//! Pricing rule model
//!
//! Rules are stored pricing adjustments tied to a country, carrying a
//! free-form cost expression, an effective window, activation conditions,
//! and a priority for conflict resolution. The pricing core consumes them
//! read-only; the administrative workflow that maintains them lives in the
//! surrounding system.

use crate::error::PricingError;
use crate::models::value::{ParamValue, ParameterType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule type enumeration
///
/// The type decides which cost accumulator a rule's evaluated amount
/// adjusts, and with which sign (see `cost_bucket` / `is_deduction`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Country VAT rate contribution - adjusts base cost
    #[default]
    VatRate,
    /// Volume/turnover threshold surcharge - adjusts base cost
    Threshold,
    /// Filing complexity surcharge - adjusts base cost
    Complexity,
    /// Extra service requirement - adjusts additional cost
    SpecialRequirement,
    /// Discount - subtracts from additional cost
    Discount,
}

/// Which accumulator a rule contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostBucket {
    Base,
    Additional,
}

impl RuleType {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vat_rate" | "vatrate" => Some(RuleType::VatRate),
            "threshold" => Some(RuleType::Threshold),
            "complexity" => Some(RuleType::Complexity),
            "special_requirement" | "specialrequirement" => Some(RuleType::SpecialRequirement),
            "discount" => Some(RuleType::Discount),
            _ => None,
        }
    }

    /// The accumulator this rule type adjusts
    pub fn cost_bucket(&self) -> CostBucket {
        match self {
            RuleType::VatRate | RuleType::Threshold | RuleType::Complexity => CostBucket::Base,
            RuleType::SpecialRequirement | RuleType::Discount => CostBucket::Additional,
        }
    }

    /// Whether the evaluated amount is subtracted rather than added
    pub fn is_deduction(&self) -> bool {
        matches!(self, RuleType::Discount)
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::VatRate => write!(f, "vat_rate"),
            RuleType::Threshold => write!(f, "threshold"),
            RuleType::Complexity => write!(f, "complexity"),
            RuleType::SpecialRequirement => write!(f, "special_requirement"),
            RuleType::Discount => write!(f, "discount"),
        }
    }
}

/// Condition operator enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equals,
    GreaterThan,
    LessThan,
    /// String containment; also matches single identifiers inside the
    /// comma-joined `additionalServices` binding
    Contains,
}

impl ConditionOperator {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "equals" | "eq" => Some(ConditionOperator::Equals),
            "greaterthan" | "gt" => Some(ConditionOperator::GreaterThan),
            "lessthan" | "lt" => Some(ConditionOperator::LessThan),
            "contains" => Some(ConditionOperator::Contains),
            _ => None,
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionOperator::Equals => write!(f, "equals"),
            ConditionOperator::GreaterThan => write!(f, "greaterThan"),
            ConditionOperator::LessThan => write!(f, "lessThan"),
            ConditionOperator::Contains => write!(f, "contains"),
        }
    }
}

/// A named parameter declared by a rule
///
/// Declared defaults are bound before condition evaluation, but never
/// override values supplied by the calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleParameter {
    /// Binding name referenced by the rule expression (e.g. "basePrice")
    pub name: String,

    /// Declared data type
    pub data_type: ParameterType,

    /// Optional default literal, parsed according to `data_type`
    pub default_value: Option<String>,
}

impl RuleParameter {
    /// Parse the declared default, if any
    ///
    /// Returns `Err` when a default literal does not parse under the
    /// declared type.
    pub fn parsed_default(&self) -> Result<Option<ParamValue>, PricingError> {
        match &self.default_value {
            None => Ok(None),
            Some(raw) => self
                .data_type
                .parse_value(raw)
                .map(Some)
                .ok_or_else(|| PricingError::Validation(format!(
                    "parameter '{}': '{}' is not a valid {} literal",
                    self.name, raw, self.data_type
                ))),
        }
    }
}

/// An activation condition on a rule
///
/// All conditions of a rule must hold (logical AND) for the rule to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Name of the bound parameter the condition inspects
    pub parameter: String,

    /// Comparison operator
    pub operator: ConditionOperator,

    /// Expected value to compare against
    pub value: ParamValue,
}

/// Pricing rule entity
///
/// Multiple rules can apply to the same country; conflicts are resolved by
/// priority (higher wins), then by ascending id for determinism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRule {
    /// Unique identifier
    pub id: i32,

    /// ISO 3166-1 alpha-2 country code, or `"*"` for globally scoped rules
    pub country_code: String,

    /// Rule type, deciding the cost contribution
    pub rule_type: RuleType,

    /// Rule name, recorded in the applied-rules audit trail
    pub name: String,

    /// Cost expression (e.g. "basePrice * 0.20")
    pub expression: String,

    /// Parameters declared by this rule, in declaration order
    #[serde(default)]
    pub parameters: Vec<RuleParameter>,

    /// Activation conditions (logical AND)
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,

    /// When this rule becomes effective (inclusive)
    pub effective_from: DateTime<Utc>,

    /// When this rule expires (inclusive; None = open-ended)
    pub effective_to: Option<DateTime<Utc>>,

    /// Priority for conflict resolution (higher = evaluated first)
    pub priority: i32,

    /// Whether the rule participates in pricing at all
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl PricingRule {
    /// Country scope marker for rules that apply across all countries
    pub const GLOBAL_SCOPE: &'static str = "*";

    /// Check if the rule is effective at the given reference date
    ///
    /// Both window bounds are inclusive.
    pub fn is_effective_at(&self, reference: DateTime<Utc>) -> bool {
        self.effective_from <= reference
            && self.effective_to.map_or(true, |end| end >= reference)
    }

    /// Whether this rule is globally scoped rather than tied to one country
    pub fn is_global(&self) -> bool {
        self.country_code == Self::GLOBAL_SCOPE
    }

    /// Whether this rule is scoped to the given country code
    ///
    /// Global rules only match the global scope marker itself, so they can
    /// never leak into a concrete country's selection.
    pub fn matches_country(&self, country_code: &str) -> bool {
        self.country_code.eq_ignore_ascii_case(country_code)
    }

    /// Validate rule configuration
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("rule name cannot be empty"));
        }

        if self.expression.trim().is_empty() {
            return Err(self.invalid("expression cannot be empty"));
        }

        let code_ok = self.country_code == Self::GLOBAL_SCOPE
            || (self.country_code.len() == 2
                && self.country_code.chars().all(|c| c.is_ascii_alphabetic()));
        if !code_ok {
            return Err(self.invalid("country code must be a 2-letter code or '*'"));
        }

        if let Some(end) = self.effective_to {
            if end < self.effective_from {
                return Err(self.invalid("effective window ends before it starts"));
            }
        }

        for (i, param) in self.parameters.iter().enumerate() {
            if param.name.trim().is_empty() {
                return Err(self.invalid("parameter name cannot be empty"));
            }
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(self.invalid(&format!("duplicate parameter '{}'", param.name)));
            }
            // Surface bad default literals at validation time
            param.parsed_default().map_err(|e| self.invalid(&e.to_string()))?;
        }

        Ok(())
    }

    fn invalid(&self, message: &str) -> PricingError {
        PricingError::InvalidRule {
            rule: self.name.clone(),
            message: message.to_string(),
        }
    }
}

impl Default for PricingRule {
    fn default() -> Self {
        Self {
            id: 0,
            country_code: String::new(),
            rule_type: RuleType::VatRate,
            name: String::new(),
            expression: String::new(),
            parameters: Vec::new(),
            conditions: Vec::new(),
            effective_from: Utc::now(),
            effective_to: None,
            priority: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rule(name: &str) -> PricingRule {
        PricingRule {
            country_code: "GB".to_string(),
            name: name.to_string(),
            expression: "basePrice * 0.20".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_effective_at_inclusive_bounds() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let r = PricingRule {
            effective_from: from,
            effective_to: Some(to),
            ..rule("windowed")
        };

        let mid = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        assert!(r.is_effective_at(mid));
        assert!(r.is_effective_at(from));
        assert!(r.is_effective_at(to));
        assert!(!r.is_effective_at(after));
    }

    #[test]
    fn test_open_ended_window() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let r = PricingRule {
            effective_from: from,
            effective_to: None,
            ..rule("open")
        };
        let later = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert!(r.is_effective_at(later));
        assert!(!r.is_effective_at(from - chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_global_scope() {
        let r = PricingRule {
            country_code: PricingRule::GLOBAL_SCOPE.to_string(),
            ..rule("global discount")
        };
        assert!(r.is_global());
        assert!(!r.matches_country("GB"));
        assert!(r.matches_country(PricingRule::GLOBAL_SCOPE));

        let r = rule("gb rule");
        assert!(r.matches_country("gb"));
        assert!(!r.matches_country("DE"));
    }

    #[test]
    fn test_rule_type_dispatch() {
        assert_eq!(RuleType::VatRate.cost_bucket(), CostBucket::Base);
        assert_eq!(RuleType::Threshold.cost_bucket(), CostBucket::Base);
        assert_eq!(RuleType::Complexity.cost_bucket(), CostBucket::Base);
        assert_eq!(RuleType::SpecialRequirement.cost_bucket(), CostBucket::Additional);
        assert_eq!(RuleType::Discount.cost_bucket(), CostBucket::Additional);
        assert!(RuleType::Discount.is_deduction());
        assert!(!RuleType::VatRate.is_deduction());
    }

    #[test]
    fn test_validate_rejects_bad_rules() {
        let r = PricingRule {
            expression: "  ".to_string(),
            ..rule("blank expression")
        };
        assert!(r.validate().is_err());

        let r = PricingRule {
            country_code: "GBR".to_string(),
            ..rule("bad country")
        };
        assert!(r.validate().is_err());

        let r = PricingRule {
            parameters: vec![
                RuleParameter {
                    name: "basePrice".to_string(),
                    data_type: ParameterType::Number,
                    default_value: Some("100".to_string()),
                },
                RuleParameter {
                    name: "basePrice".to_string(),
                    data_type: ParameterType::Number,
                    default_value: None,
                },
            ],
            ..rule("duplicate param")
        };
        assert!(r.validate().is_err());

        let r = PricingRule {
            parameters: vec![RuleParameter {
                name: "basePrice".to_string(),
                data_type: ParameterType::Number,
                default_value: Some("not-a-number".to_string()),
            }],
            ..rule("bad default")
        };
        assert!(r.validate().is_err());

        assert!(rule("valid").validate().is_ok());
    }

    #[test]
    fn test_rule_type_parse() {
        assert_eq!(RuleType::from_str("vat_rate"), Some(RuleType::VatRate));
        assert_eq!(RuleType::from_str("VatRate"), Some(RuleType::VatRate));
        assert_eq!(RuleType::from_str("discount"), Some(RuleType::Discount));
        assert_eq!(RuleType::from_str("unknown"), None);
    }
}
