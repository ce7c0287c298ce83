//! Helpers for reading typed parameters out of a `serde_json::Value` object.
//!
//! Each helper takes a JSON value, a key name and a default. Missing keys and
//! wrong types fall back to the default; the ranged variants additionally
//! clamp into the accepted interval. These never fail.

use serde_json::Value;

/// Extracts an `f32` from `params[name]`, returning `default` if missing or wrong type.
///
/// JSON integers are accepted and converted.
pub fn param_f32(params: &Value, name: &str, default: f32) -> f32 {
    params
        .get(name)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(default)
}

/// Like [`param_f32`], clamped to `[min, max]`.
pub fn param_f32_in(params: &Value, name: &str, default: f32, min: f32, max: f32) -> f32 {
    param_f32(params, name, default).clamp(min, max)
}

/// Extracts a `usize` clamped to `[min, max]`.
///
/// Only non-negative JSON integers are accepted; anything else yields `default`.
pub fn param_usize_in(params: &Value, name: &str, default: usize, min: usize, max: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
        .unwrap_or(default)
        .clamp(min, max)
}

/// Extracts a string, returning `default` if missing or wrong type.
pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_owned())
}
