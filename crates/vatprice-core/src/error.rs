//! Unified error handling for the pricing core
//!
//! All failures in the pricing core are expressed as `PricingError`. The
//! consuming API layer maps `error_code()` onto its own HTTP error contract;
//! no transport types leak into this crate.

use thiserror::Error;

/// Main pricing error type
///
/// Expression-level errors (`is_expression_error`) are non-fatal for a
/// calculation: the offending rule is skipped and recorded. Country-level
/// and request-level errors are surfaced according to the propagation policy
/// documented on each variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    // ==================== Expression Errors ====================
    /// Malformed expression. Fatal for the expression, non-fatal for the
    /// calculation.
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Numeric overflow in expression")]
    Overflow,

    // ==================== Rule Errors ====================
    #[error("Invalid rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    // ==================== Calculation Errors ====================
    /// No active rules exist for the country. Fatal for that country's
    /// breakdown, non-fatal for a multi-country request.
    #[error("Country not supported: {0}")]
    CountryNotSupported(String),

    /// Breakdown currencies disagree. Fatal for aggregation.
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: String, found: String },

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    // ==================== Configuration Errors ====================
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PricingError {
    /// Returns the API error code for this error
    ///
    /// These codes are the contract with the surrounding API layer, which
    /// translates them into its HTTP error taxonomy.
    pub fn error_code(&self) -> &'static str {
        match self {
            PricingError::Config(_) => "PRICING-001",
            PricingError::Validation(_) => "PRICING-002",
            PricingError::CountryNotSupported(_) => "PRICING-003",
            PricingError::CurrencyMismatch { .. } => "PRICING-004",
            PricingError::UnknownParameter(_)
            | PricingError::DivisionByZero
            | PricingError::TypeMismatch { .. }
            | PricingError::Overflow
            | PricingError::InvalidRule { .. } => "PRICING-005",
            PricingError::SyntaxError { .. } => "PRICING-006",
        }
    }

    /// Whether this error originated in expression parsing or evaluation
    ///
    /// Expression errors never abort a calculation: the affected rule is
    /// skipped and a warning is recorded instead.
    pub fn is_expression_error(&self) -> bool {
        matches!(
            self,
            PricingError::SyntaxError { .. }
                | PricingError::UnknownParameter(_)
                | PricingError::DivisionByZero
                | PricingError::TypeMismatch { .. }
                | PricingError::Overflow
        )
    }
}

// ==================== From implementations ====================

impl From<config::ConfigError> for PricingError {
    fn from(err: config::ConfigError) -> Self {
        PricingError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for PricingError {
    fn from(err: validator::ValidationErrors) -> Self {
        PricingError::Validation(err.to_string())
    }
}
