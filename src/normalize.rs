//! Record normalization.
//!
//! Normalization is total: it accepts any JSON value and never fails.
//! Missing required keys become explicit `null`s, and values of the wrong
//! type are projected to `null` when a [`NormalizedCountryRecord`] is built.

use crate::config::RAW_COUNTRY_FIELDS;
use crate::models::{NormalizedCountryRecord, RawCountryRecord};
use serde_json::{Map, Value};

/// Pad `value` so every name in `required` is a key of the top-level object,
/// recursing into nested objects and arrays.
///
/// Non-object inputs are returned as-is (after recursion), since there is no
/// key set to complete.
pub fn normalize_value(value: Value, required: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = normalize_map(map);
            for field in required {
                out.entry(field.to_string()).or_insert(Value::Null);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_nested).collect()),
        other => other,
    }
}

fn normalize_nested(value: Value) -> Value {
    normalize_value(value, &[])
}

fn normalize_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(k, v)| (k, normalize_nested(v)))
        .collect()
}

impl NormalizedCountryRecord {
    /// Project a raw directory record onto the fixed field set.
    pub fn from_raw(raw: &RawCountryRecord) -> Self {
        let padded = normalize_value(Value::Object(raw.0.clone()), RAW_COUNTRY_FIELDS);

        Self {
            name: non_empty_str(&padded["name"]),
            capital: non_empty_str(&padded["capital"]),
            region: non_empty_str(&padded["region"]),
            population: population(&padded["population"]),
            currency_code: first_currency_code(&padded["currencies"]),
            flag_url: non_empty_str(&padded["flag"]),
        }
    }
}

/// The `code` of the first currency descriptor, if it has one.
fn first_currency_code(currencies: &Value) -> Option<String> {
    currencies
        .as_array()
        .and_then(|list| list.first())
        .and_then(|c| c.get("code"))
        .and_then(non_empty_str)
        .map(|code| code.to_uppercase())
}

/// Whole, non-negative counts only; `1.2e6` is accepted, `12.5` is not.
fn population(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        })
        .filter(|p| *p >= 0)
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
