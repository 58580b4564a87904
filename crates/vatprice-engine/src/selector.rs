//! Rule selector
//!
//! Filters the rule set to rules applicable for a country at a reference
//! date, with all conditions satisfied, ordered by priority. Selection is
//! read-only and deterministic for fixed inputs.

use chrono::{DateTime, Utc};
use tracing::debug;
use vatprice_core::models::{
    ConditionOperator, ParamValue, ParameterBinding, PricingRule, RuleCondition,
};

/// Select the rules applicable to a country, ordered for evaluation
///
/// A rule applies when its country matches, it is active, the reference
/// date falls inside its effective window (inclusive bounds), and every
/// condition holds against the bindings. Ordering is priority descending
/// with ties broken by ascending id.
pub fn select_applicable_rules(
    country_code: &str,
    bindings: &ParameterBinding,
    reference: DateTime<Utc>,
    rules: &[PricingRule],
) -> Vec<PricingRule> {
    let mut selected: Vec<PricingRule> = rules
        .iter()
        .filter(|r| r.matches_country(country_code))
        .filter(|r| r.is_active)
        .filter(|r| r.is_effective_at(reference))
        .filter(|r| conditions_hold(r, bindings))
        .cloned()
        .collect();

    selected.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
    selected
}

/// Check all conditions of a rule (logical AND)
///
/// An empty condition list always passes.
pub fn conditions_hold(rule: &PricingRule, bindings: &ParameterBinding) -> bool {
    rule.conditions.iter().all(|c| {
        let holds = condition_holds(c, bindings);
        if !holds {
            debug!(
                rule = %rule.name,
                parameter = %c.parameter,
                operator = %c.operator,
                "condition not satisfied"
            );
        }
        holds
    })
}

/// Evaluate a single condition against the bindings
///
/// Comparisons are typed: numbers and dates order, text supports equality
/// and containment, booleans equality only. A missing binding or an
/// incompatible type pair fails the condition rather than erroring -
/// selection filters, it does not abort.
pub fn condition_holds(condition: &RuleCondition, bindings: &ParameterBinding) -> bool {
    let Some(actual) = bindings.get(&condition.parameter) else {
        return false;
    };

    match condition.operator {
        ConditionOperator::Equals => values_equal(actual, &condition.value),
        ConditionOperator::GreaterThan => {
            values_ordered(actual, &condition.value).map_or(false, |o| o == std::cmp::Ordering::Greater)
        }
        ConditionOperator::LessThan => {
            values_ordered(actual, &condition.value).map_or(false, |o| o == std::cmp::Ordering::Less)
        }
        ConditionOperator::Contains => match (actual, &condition.value) {
            (ParamValue::Text(haystack), ParamValue::Text(needle)) => haystack.contains(needle),
            _ => false,
        },
    }
}

fn values_equal(actual: &ParamValue, expected: &ParamValue) -> bool {
    match (actual, expected) {
        (ParamValue::Number(a), ParamValue::Number(b)) => a == b,
        (ParamValue::Text(a), ParamValue::Text(b)) => a == b,
        (ParamValue::Bool(a), ParamValue::Bool(b)) => a == b,
        (ParamValue::Date(a), ParamValue::Date(b)) => a == b,
        _ => false,
    }
}

fn values_ordered(actual: &ParamValue, expected: &ParamValue) -> Option<std::cmp::Ordering> {
    match (actual, expected) {
        (ParamValue::Number(a), ParamValue::Number(b)) => Some(a.cmp(b)),
        (ParamValue::Date(a), ParamValue::Date(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
