//! Calculation request model
//!
//! The request is constructed by the surrounding API layer from an HTTP
//! body; the pricing core validates it before any evaluation happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Filing service tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Standard VAT return preparation and filing
    #[default]
    StandardFiling,
    /// Expedited handling with shorter turnaround
    PriorityFiling,
    /// Filing plus registration, correspondence, and advisory
    FullService,
}

impl ServiceType {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard_filing" | "standardfiling" => Some(ServiceType::StandardFiling),
            "priority_filing" | "priorityfiling" => Some(ServiceType::PriorityFiling),
            "full_service" | "fullservice" => Some(ServiceType::FullService),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceType::StandardFiling => write!(f, "standard_filing"),
            ServiceType::PriorityFiling => write!(f, "priority_filing"),
            ServiceType::FullService => write!(f, "full_service"),
        }
    }
}

/// VAT filing frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilingFrequency {
    Monthly,
    #[default]
    Quarterly,
    Annually,
}

impl FilingFrequency {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monthly" => Some(FilingFrequency::Monthly),
            "quarterly" => Some(FilingFrequency::Quarterly),
            "annually" | "annual" | "yearly" => Some(FilingFrequency::Annually),
            _ => None,
        }
    }

    /// Number of filings per year for this frequency
    pub fn filings_per_year(&self) -> i32 {
        match self {
            FilingFrequency::Monthly => 12,
            FilingFrequency::Quarterly => 4,
            FilingFrequency::Annually => 1,
        }
    }
}

impl fmt::Display for FilingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilingFrequency::Monthly => write!(f, "monthly"),
            FilingFrequency::Quarterly => write!(f, "quarterly"),
            FilingFrequency::Annually => write!(f, "annually"),
        }
    }
}

/// A multi-country pricing estimation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CalculationRequest {
    /// Target country codes (ISO 3166-1 alpha-2)
    #[validate(length(min = 1, message = "At least one country code is required"))]
    pub country_codes: Vec<String>,

    /// Requested service tier
    pub service_type: ServiceType,

    /// Monthly transaction volume
    #[validate(range(min = 1, message = "Transaction volume must be positive"))]
    pub transaction_volume: i64,

    /// Filing frequency
    pub filing_frequency: FilingFrequency,

    /// Optional additional service identifiers (e.g. "fiscal_representation")
    #[serde(default)]
    pub additional_services: Vec<String>,

    /// Reference date for rule applicability (None = now)
    #[serde(default)]
    pub reference_date: Option<DateTime<Utc>>,

    /// Reporting currency for all breakdowns; empty = configured default
    #[serde(default)]
    pub currency: String,
}

impl CalculationRequest {
    pub fn new(
        country_codes: Vec<String>,
        service_type: ServiceType,
        transaction_volume: i64,
        filing_frequency: FilingFrequency,
    ) -> Self {
        Self {
            country_codes,
            service_type,
            transaction_volume,
            filing_frequency,
            additional_services: Vec::new(),
            reference_date: None,
            currency: String::new(),
        }
    }

    /// The reference date for rule applicability, defaulting to now
    pub fn reference_date_or_now(&self) -> DateTime<Utc> {
        self.reference_date.unwrap_or_else(Utc::now)
    }
}
