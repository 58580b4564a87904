//! Application configuration
//!
//! This module provides centralized configuration management using the
//! `config` crate. Configuration can be loaded from environment variables
//! and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main pricing configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PricingConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub evaluation: EvaluationSettings,
}

/// Pricing output settings
#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    /// Reporting currency used when a request does not name one
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Decimal places for reported costs
    #[serde(default = "default_money_scale")]
    pub money_scale: u32,
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_money_scale() -> u32 {
    2
}

/// Expression evaluation settings
#[derive(Debug, Deserialize, Clone)]
pub struct EvaluationSettings {
    /// Maximum accepted rule expression length in bytes
    #[serde(default = "default_max_expression_length")]
    pub max_expression_length: usize,

    /// Whether parsed expressions are memoized within a single calculation
    #[serde(default = "default_cache_parsed")]
    pub cache_parsed_expressions: bool,
}

fn default_max_expression_length() -> usize {
    512
}

fn default_cache_parsed() -> bool {
    true
}

impl PricingConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        // Pick up a local .env if present
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("pricing.default_currency", "EUR")?
            .set_default("pricing.money_scale", 2)?
            .set_default("evaluation.max_expression_length", 512)?
            .set_default("evaluation.cache_parsed_expressions", true)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with VATPRICE_ prefix
            .add_source(
                Environment::with_prefix("VATPRICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("VATPRICE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            money_scale: default_money_scale(),
        }
    }
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            max_expression_length: default_max_expression_length(),
            cache_parsed_expressions: default_cache_parsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PricingConfig::default();
        assert_eq!(config.pricing.default_currency, "EUR");
        assert_eq!(config.pricing.money_scale, 2);
        assert_eq!(config.evaluation.max_expression_length, 512);
        assert!(config.evaluation.cache_parsed_expressions);
    }
}
