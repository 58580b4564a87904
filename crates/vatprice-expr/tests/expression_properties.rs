//! Property tests for the expression evaluator

use proptest::prelude::*;
use rust_decimal::Decimal;
use vatprice_core::models::ParameterBinding;
use vatprice_expr::{evaluate, parse};

/// Decimals in a range that keeps generated arithmetic far from overflow
fn small_decimal() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64, 0u32..4u32).prop_map(|(n, scale)| Decimal::new(n, scale))
}

proptest! {
    #[test]
    fn literal_roundtrip(d in small_decimal()) {
        // A non-negative literal evaluates to itself
        prop_assume!(d >= Decimal::ZERO);
        let bindings = ParameterBinding::new();
        let result = evaluate(&d.to_string(), &bindings).unwrap();
        prop_assert_eq!(result, d);
    }

    #[test]
    fn evaluation_is_deterministic(a in small_decimal(), b in small_decimal()) {
        let bindings = ParameterBinding::new()
            .with("a", a)
            .with("b", b);
        let first = evaluate("a * 3 + b - a / 2", &bindings).unwrap();
        let second = evaluate("a * 3 + b - a / 2", &bindings).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn addition_matches_decimal_addition(a in small_decimal(), b in small_decimal()) {
        let bindings = ParameterBinding::new()
            .with("a", a)
            .with("b", b);
        let result = evaluate("a + b", &bindings).unwrap();
        prop_assert_eq!(result, a + b);
    }

    #[test]
    fn parse_never_panics(input in "[a-z0-9+\\-*/() .<>=!]{0,64}") {
        // Arbitrary input either parses or fails with a typed error
        let _ = parse(&input);
    }
}
