//! Typed parameter values and bindings
//!
//! Rule expressions and conditions are evaluated against a `ParameterBinding`,
//! a name-to-value map of typed values. The same binding feeds both the
//! expression evaluator and condition checks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed parameter value
///
/// Variant order matters for untagged deserialization: numbers are tried
/// before dates and dates before plain text, so RFC 3339 strings become
/// `Date` rather than `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(Decimal),
    Bool(bool),
    Date(DateTime<Utc>),
    Text(String),
}

impl ParamValue {
    /// Human-readable type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::Bool(_) => "bool",
            ParamValue::Date(_) => "date",
            ParamValue::Text(_) => "text",
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            ParamValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<Decimal> for ParamValue {
    fn from(n: Decimal) -> Self {
        ParamValue::Number(n)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Number(Decimal::from(n))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(d: DateTime<Utc>) -> Self {
        ParamValue::Date(d)
    }
}

/// Declared data type of a rule parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    #[default]
    Number,
    Text,
    Bool,
    Date,
}

impl ParameterType {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "number" => Some(ParameterType::Number),
            "text" | "string" => Some(ParameterType::Text),
            "bool" | "boolean" => Some(ParameterType::Bool),
            "date" => Some(ParameterType::Date),
            _ => None,
        }
    }

    /// Parse a stored literal into a typed value according to this tag
    pub fn parse_value(&self, raw: &str) -> Option<ParamValue> {
        match self {
            ParameterType::Number => raw.trim().parse::<Decimal>().ok().map(ParamValue::Number),
            ParameterType::Text => Some(ParamValue::Text(raw.to_string())),
            ParameterType::Bool => match raw.trim().to_lowercase().as_str() {
                "true" | "1" => Some(ParamValue::Bool(true)),
                "false" | "0" => Some(ParamValue::Bool(false)),
                _ => None,
            },
            ParameterType::Date => raw
                .trim()
                .parse::<DateTime<Utc>>()
                .ok()
                .map(ParamValue::Date),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::Number => write!(f, "number"),
            ParameterType::Text => write!(f, "text"),
            ParameterType::Bool => write!(f, "bool"),
            ParameterType::Date => write!(f, "date"),
        }
    }
}

/// A name-to-value map used for condition and expression evaluation
///
/// Backed by a BTreeMap so iteration order is deterministic. Bindings are
/// never mutated during selection or evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterBinding {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binding, replacing any existing value for the name
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Insert a binding only if the name is not already bound
    ///
    /// Used for rule parameter defaults, which never override request inputs.
    pub fn bind_default(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.entry(name.into()).or_insert_with(|| value.into());
    }

    /// Builder-style bind
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.bind(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }
}
