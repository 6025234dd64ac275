//! Lenient serde helpers for documents read back from the store
//!
//! The document store accepts untyped writes, so any historical shape may
//! come back: numbers written as strings, booleans as `"true"`, timestamps as
//! epoch millis, RFC 3339 strings or `{seconds, nanoseconds}` objects. These
//! deserializers never fail on a wrong shape; they yield `None` and let the
//! model apply its documented default.
//!
//! Use with `#[serde(default, deserialize_with = "...")]` so a missing field
//! also maps to `None`.
//!
//! Write payloads are the opposite case: [`FormNumber`] keeps the raw input
//! so a non-numeric value is rejected at validation instead of dropped.

use super::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Numeric form input: a number or a numeric string, checked on validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormNumber(Value);

impl FormNumber {
    pub fn to_f64(&self, field: &str) -> Result<f64, ValidationError> {
        number_from_value(&self.0).ok_or_else(|| self.not_a_number(field))
    }

    pub fn to_i64(&self, field: &str) -> Result<i64, ValidationError> {
        integer_from_value(&self.0).ok_or_else(|| self.not_a_number(field))
    }

    fn not_a_number(&self, field: &str) -> ValidationError {
        ValidationError::new(format!("{field} must be a number, got {}", self.0))
    }
}

impl From<f64> for FormNumber {
    fn from(n: f64) -> Self {
        Self(n.into())
    }
}

impl From<i64> for FormNumber {
    fn from(n: i64) -> Self {
        Self(n.into())
    }
}

/// Number or numeric string → `f64` (finite only)
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|v| v.as_ref().and_then(number_from_value))
}

/// Integer, integral float or numeric string → `i64`
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|v| v.as_ref().and_then(integer_from_value))
}

/// Bool or `"true"`/`"false"` → `bool`
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|v| match v {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// String only; any other shape is treated as absent
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|v| match v {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Array of strings → set; non-string entries are dropped
pub fn lenient_string_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|v| match v {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => BTreeSet::new(),
    })
}

/// Timestamp in any stored format → epoch milliseconds
pub fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|v| v.as_ref().and_then(millis_from_value))
}

pub fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn integer_from_value(value: &Value) -> Option<i64> {
    if let Value::Number(n) = value
        && let Some(i) = n.as_i64()
    {
        return Some(i);
    }
    if let Value::String(s) = value
        && let Ok(i) = s.trim().parse::<i64>()
    {
        return Some(i);
    }
    let f = number_from_value(value)?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
}

pub fn millis_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp_millis()),
        Value::Object(map) => {
            // Firestore Timestamp exported as JSON
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            seconds.checked_mul(1000)?.checked_add(nanos / 1_000_000)
        }
        _ => None,
    }
}
