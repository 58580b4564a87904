//! VatPrice Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the VatPrice pricing system. It includes:
//!
//! - Domain models (PricingRule, CalculationRequest, CountryCostBreakdown, etc.)
//! - Typed parameter values and bindings for rule evaluation
//! - Common traits for rule sources and pricing services
//! - Unified error handling with API error-code mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::PricingConfig;
pub use error::PricingError;

/// Result type alias using PricingError
pub type PricingResult<T> = Result<T, PricingError>;
