//! Conversion of an entry point's return value into the envelope `result`.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::core::json_text::to_json_text;

/// Produce the envelope form of a returned value.
///
/// - arrays and objects become their wire-format JSON text (a string, not a
///   nested value);
/// - numbers, booleans and null pass through unchanged;
/// - anything else (text) becomes its string form.
pub fn normalize_result(value: Value) -> Result<Value> {
    match value {
        Value::Array(_) | Value::Object(_) => {
            let text = to_json_text(&value).context("serialize composite result")?;
            Ok(Value::String(text))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value),
        Value::String(text) => Ok(Value::String(text)),
    }
}
