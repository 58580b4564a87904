//! Request-scoped expression cache
//!
//! Rules repeat expressions across countries within one request, so parsed
//! ASTs are memoized for the duration of a single calculation and discarded
//! with it. The cache is never shared across requests: a stale AST for an
//! updated rule set would silently misprice.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;
use vatprice_core::config::EvaluationSettings;
use vatprice_core::{PricingError, PricingResult};
use vatprice_expr::{parse, Expr};

/// Per-calculation cache of parsed rule expressions
pub struct ExpressionCache {
    enabled: bool,
    max_expression_length: usize,
    entries: HashMap<String, Arc<Expr>>,
}

impl ExpressionCache {
    pub fn new(settings: &EvaluationSettings) -> Self {
        Self {
            enabled: settings.cache_parsed_expressions,
            max_expression_length: settings.max_expression_length,
            entries: HashMap::new(),
        }
    }

    /// Parse an expression, reusing a previously parsed AST when possible
    pub fn get_or_parse(&mut self, expression: &str) -> PricingResult<Arc<Expr>> {
        if expression.len() > self.max_expression_length {
            return Err(PricingError::SyntaxError {
                position: self.max_expression_length,
                message: format!(
                    "expression exceeds maximum length of {} bytes",
                    self.max_expression_length
                ),
            });
        }

        if self.enabled {
            if let Some(ast) = self.entries.get(expression) {
                trace!("expression cache HIT: {}", expression);
                return Ok(Arc::clone(ast));
            }
        }

        let ast = Arc::new(parse(expression)?);

        if self.enabled {
            trace!("expression cache MISS: {}", expression);
            self.entries.insert(expression.to_string(), Arc::clone(&ast));
        }

        Ok(ast)
    }

    /// Number of cached expressions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EvaluationSettings {
        EvaluationSettings::default()
    }

    #[test]
    fn test_cache_reuses_parsed_ast() {
        let mut cache = ExpressionCache::new(&settings());
        let first = cache.get_or_parse("basePrice * 0.20").unwrap();
        let second = cache.get_or_parse("basePrice * 0.20").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_disabled_parses_every_time() {
        let mut cache = ExpressionCache::new(&EvaluationSettings {
            cache_parsed_expressions: false,
            ..settings()
        });
        let first = cache.get_or_parse("1 + 2").unwrap();
        let second = cache.get_or_parse("1 + 2").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_over_long_expression_rejected() {
        let mut cache = ExpressionCache::new(&EvaluationSettings {
            max_expression_length: 10,
            ..settings()
        });
        let err = cache.get_or_parse("1 + 2 + 3 + 4 + 5").unwrap_err();
        assert!(matches!(err, PricingError::SyntaxError { .. }));
    }

    #[test]
    fn test_parse_errors_propagate() {
        let mut cache = ExpressionCache::new(&settings());
        assert!(cache.get_or_parse("basePrice *").is_err());
    }
}
