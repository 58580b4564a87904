//! End-to-end pricing scenarios against the engine facade

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use vatprice_core::models::{
    CalculationRequest, ConditionOperator, FilingFrequency, ParamValue, ParameterType,
    PricingRule, RuleCondition, RuleParameter, RuleType, ServiceType,
};
use vatprice_core::traits::{InMemoryRuleSource, PricingService};
use vatprice_engine::PricingEngine;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn request(countries: &[&str]) -> CalculationRequest {
    CalculationRequest {
        reference_date: Some(reference()),
        ..CalculationRequest::new(
            countries.iter().map(|c| c.to_string()).collect(),
            ServiceType::StandardFiling,
            100,
            FilingFrequency::Quarterly,
        )
    }
}

fn rule(id: i32, country: &str, name: &str, rule_type: RuleType, expression: &str) -> PricingRule {
    PricingRule {
        id,
        country_code: country.to_string(),
        rule_type,
        name: name.to_string(),
        expression: expression.to_string(),
        priority: 10,
        effective_from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ..Default::default()
    }
}

fn uk_vat_rule() -> PricingRule {
    PricingRule {
        parameters: vec![RuleParameter {
            name: "basePrice".to_string(),
            data_type: ParameterType::Number,
            default_value: Some("100".to_string()),
        }],
        ..rule(1, "GB", "UK standard VAT filing", RuleType::VatRate, "basePrice * 0.20")
    }
}

#[test]
fn single_country_vat_rate_scenario() {
    init_tracing();
    let engine = PricingEngine::default();

    let result = engine.calculate(&request(&["GB"]), &[uk_vat_rule()]).unwrap();

    assert_eq!(result.total_cost, dec!(20.00));
    assert_eq!(result.currency, "EUR");
    assert_eq!(result.countries.len(), 1);

    let gb = &result.countries[0];
    assert_eq!(gb.country_code, "GB");
    assert_eq!(gb.country_name, "United Kingdom");
    assert_eq!(gb.total_cost, dec!(20.00));
    assert_eq!(gb.applied_rules, vec!["UK standard VAT filing".to_string()]);
    assert!(result.warnings.is_empty());
}

#[test]
fn multi_country_totals_are_summed() {
    init_tracing();
    let engine = PricingEngine::default();
    let rules = vec![
        uk_vat_rule(),
        rule(2, "DE", "DE filing fee", RuleType::VatRate, "45"),
        rule(3, "DE", "DE complexity", RuleType::Complexity, "15"),
    ];

    let result = engine.calculate(&request(&["GB", "DE"]), &rules).unwrap();

    assert_eq!(result.countries.len(), 2);
    assert_eq!(result.countries[0].country_code, "GB");
    assert_eq!(result.countries[1].country_code, "DE");
    assert_eq!(result.countries[1].total_cost, dec!(60));
    assert_eq!(result.total_cost, dec!(80.00));
}

#[test]
fn unsupported_country_is_omitted_with_warning() {
    init_tracing();
    let engine = PricingEngine::default();

    // No rules at all for FR
    let result = engine.calculate(&request(&["GB", "FR"]), &[uk_vat_rule()]).unwrap();

    assert_eq!(result.countries.len(), 1);
    assert_eq!(result.countries[0].country_code, "GB");
    assert_eq!(result.total_cost, dec!(20.00));

    let warning = result
        .warnings
        .iter()
        .find(|w| w.country_code.as_deref() == Some("FR"))
        .expect("warning for omitted country");
    assert_eq!(warning.code, "PRICING-003");
}

#[test]
fn all_countries_failing_still_returns_result() {
    init_tracing();
    let engine = PricingEngine::default();

    let result = engine.calculate(&request(&["FR", "IT"]), &[]).unwrap();
    assert!(result.countries.is_empty());
    assert_eq!(result.total_cost, dec!(0));
    assert_eq!(result.warnings.len(), 2);
}

#[test]
fn malformed_rule_does_not_block_country() {
    init_tracing();
    let engine = PricingEngine::default();
    let rules = vec![
        rule(1, "GB", "broken rule", RuleType::VatRate, "basePrice +* 2"),
        rule(2, "GB", "working rule", RuleType::VatRate, "30"),
    ];

    let result = engine.calculate(&request(&["GB"]), &rules).unwrap();

    assert_eq!(result.total_cost, dec!(30));
    assert_eq!(
        result.countries[0].applied_rules,
        vec!["working rule".to_string()]
    );
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].rule_name.as_deref(), Some("broken rule"));
}

#[test]
fn audit_trail_lists_higher_priority_first() {
    init_tracing();
    let engine = PricingEngine::default();
    let rules = vec![
        PricingRule {
            priority: 10,
            ..rule(1, "GB", "low priority surcharge", RuleType::Threshold, "5")
        },
        PricingRule {
            priority: 90,
            ..rule(2, "GB", "high priority base", RuleType::VatRate, "50")
        },
    ];

    let result = engine.calculate(&request(&["GB"]), &rules).unwrap();
    assert_eq!(
        result.countries[0].applied_rules,
        vec![
            "high priority base".to_string(),
            "low priority surcharge".to_string()
        ]
    );
}

#[test]
fn effective_window_respected_via_reference_date() {
    init_tracing();
    let engine = PricingEngine::default();
    let rules = vec![PricingRule {
        effective_from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        effective_to: Some(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()),
        ..uk_vat_rule()
    }];

    // Inside the window
    let result = engine.calculate(&request(&["GB"]), &rules).unwrap();
    assert_eq!(result.total_cost, dec!(20.00));

    // After the window: rule exists and is active, so the country is
    // supported but prices to zero
    let mut late = request(&["GB"]);
    late.reference_date = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    let result = engine.calculate(&late, &rules).unwrap();
    assert_eq!(result.total_cost, dec!(0));
    assert!(result.countries[0].applied_rules.is_empty());
}

#[test]
fn global_discount_applies_and_clamps() {
    init_tracing();
    let engine = PricingEngine::default();
    let discount = PricingRule {
        priority: 5,
        ..rule(
            10,
            PricingRule::GLOBAL_SCOPE,
            "volume discount",
            RuleType::Discount,
            "transactionVolume * 0.05",
        )
    };

    let rules = vec![uk_vat_rule(), discount.clone()];
    let result = engine.calculate(&request(&["GB"]), &rules).unwrap();
    // 20.00 gross - 5.00 discount
    assert_eq!(result.total_cost, dec!(15.00));
    assert_eq!(result.discounts.len(), 1);
    assert_eq!(result.discounts[0].amount, dec!(5.00));

    // A discount exceeding the gross total clamps the result at zero
    let oversized = PricingRule {
        expression: "transactionVolume * 10".to_string(),
        ..discount
    };
    let result = engine
        .calculate(&request(&["GB"]), &[uk_vat_rule(), oversized])
        .unwrap();
    assert_eq!(result.total_cost, dec!(0));
}

#[test]
fn conditioned_discount_only_fires_above_volume() {
    init_tracing();
    let engine = PricingEngine::default();
    let discount = PricingRule {
        conditions: vec![RuleCondition {
            parameter: "transactionVolume".to_string(),
            operator: ConditionOperator::GreaterThan,
            value: ParamValue::Number(dec!(500)),
        }],
        ..rule(
            10,
            PricingRule::GLOBAL_SCOPE,
            "bulk discount",
            RuleType::Discount,
            "10",
        )
    };
    let rules = vec![uk_vat_rule(), discount];

    // Volume 100 - condition fails, no discount
    let result = engine.calculate(&request(&["GB"]), &rules).unwrap();
    assert_eq!(result.total_cost, dec!(20.00));
    assert!(result.discounts.is_empty());

    // Volume 1000 - discount fires
    let mut bulk = request(&["GB"]);
    bulk.transaction_volume = 1000;
    let result = engine.calculate(&bulk, &rules).unwrap();
    assert_eq!(result.total_cost, dec!(10.00));
    assert_eq!(result.discounts[0].name, "bulk discount");
}

#[test]
fn additional_service_gates_special_requirement() {
    init_tracing();
    let engine = PricingEngine::default();
    let gated = PricingRule {
        conditions: vec![RuleCondition {
            parameter: "additionalServices".to_string(),
            operator: ConditionOperator::Contains,
            value: ParamValue::Text("fiscal_representation".to_string()),
        }],
        ..rule(
            2,
            "GB",
            "fiscal representation",
            RuleType::SpecialRequirement,
            "40",
        )
    };
    let rules = vec![uk_vat_rule(), gated];

    let mut req = request(&["GB"]);
    req.additional_services = vec!["fiscal_representation".to_string()];
    let result = engine.calculate(&req, &rules).unwrap();

    let gb = &result.countries[0];
    assert_eq!(gb.base_cost, dec!(20.00));
    assert_eq!(gb.additional_cost, dec!(40));
    assert_eq!(gb.total_cost, dec!(60.00));
    assert_eq!(
        result.additional_services,
        vec!["fiscal_representation".to_string()]
    );
}

#[test]
fn lowercase_request_codes_are_normalized() {
    init_tracing();
    let engine = PricingEngine::default();
    let result = engine.calculate(&request(&["gb"]), &[uk_vat_rule()]).unwrap();
    assert_eq!(result.countries[0].country_code, "GB");
    assert_eq!(result.total_cost, dec!(20.00));
}

#[test]
fn calculate_from_source_matches_direct_slice() {
    init_tracing();
    let engine = PricingEngine::default();
    let rules = vec![
        uk_vat_rule(),
        rule(2, "DE", "DE filing fee", RuleType::VatRate, "45"),
        rule(
            10,
            PricingRule::GLOBAL_SCOPE,
            "flat discount",
            RuleType::Discount,
            "5",
        ),
    ];
    let source = InMemoryRuleSource::new(rules.clone());

    let req = request(&["GB", "DE"]);
    let from_source = engine.calculate_from_source(&req, &source).unwrap();
    let direct = engine.calculate(&req, &rules).unwrap();

    assert_eq!(from_source, direct);
    assert_eq!(from_source.total_cost, dec!(60.00));
}

#[test]
fn repeated_calculation_is_deterministic() {
    init_tracing();
    let engine = PricingEngine::default();
    let rules = vec![
        uk_vat_rule(),
        rule(2, "GB", "complexity", RuleType::Complexity, "7 / 3"),
    ];

    let first = engine.calculate(&request(&["GB"]), &rules).unwrap();
    for _ in 0..5 {
        assert_eq!(engine.calculate(&request(&["GB"]), &rules).unwrap(), first);
    }
}
