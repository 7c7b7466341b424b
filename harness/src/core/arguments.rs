//! Invocation arguments and the shape normalization applied to decoded input.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::{Map, Value};

/// Key under which the nested parameter mapping is always available.
pub const PARAMS_KEY: &str = "params";

/// Arguments handed to an entry point.
///
/// Built once per invocation and never mutated afterwards. When input was
/// supplied, `params` is guaranteed to be a mapping (possibly empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    /// Arguments used when no input was supplied.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The nested parameter mapping, if present.
    pub fn params(&self) -> Option<&Map<String, Value>> {
        self.0.get(PARAMS_KEY).and_then(Value::as_object)
    }

    /// Look up `key` inside `params`.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params().and_then(|params| params.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Parse a JSON payload and normalize it into [`Arguments`].
pub fn parse_arguments(raw: &str) -> Result<Arguments> {
    let decoded: Value = serde_json::from_str(raw).context("parse input json")?;
    normalize_arguments(decoded)
}

/// Give a decoded payload the "arguments with nested params" shape.
///
/// - no `params` key: `params` becomes a copy of the whole mapping (empty
///   mapping when the payload itself is empty);
/// - `params: null`: replaced by an empty mapping;
/// - `params` holding a non-mapping value: treated like a missing key, so the
///   original value stays reachable at `params.params`.
pub fn normalize_arguments(decoded: Value) -> Result<Arguments> {
    let mut map = match decoded {
        Value::Object(map) => map,
        other => bail!("input must be a JSON object, got {}", json_kind(&other)),
    };

    match map.get(PARAMS_KEY) {
        Some(Value::Object(_)) => {}
        Some(Value::Null) => {
            map.insert(PARAMS_KEY.to_string(), Value::Object(Map::new()));
        }
        None | Some(_) => {
            let copy = Value::Object(map.clone());
            map.insert(PARAMS_KEY.to_string(), copy);
        }
    }

    Ok(Arguments(map))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_params_copies_whole_payload() {
        let args = normalize_arguments(json!({"a": 3, "b": 4})).expect("normalize");
        assert_eq!(args.get("a"), Some(&json!(3)));
        assert_eq!(args.param("b"), Some(&json!(4)));
        assert_eq!(
            args.params().map(|params| params.len()),
            Some(2),
            "params must not contain itself"
        );
    }

    #[test]
    fn empty_payload_gets_empty_params() {
        let args = normalize_arguments(json!({})).expect("normalize");
        assert_eq!(args.to_value(), json!({"params": {}}));
    }

    #[test]
    fn null_params_becomes_empty_mapping() {
        let args = normalize_arguments(json!({"params": null, "x": 1})).expect("normalize");
        assert_eq!(args.to_value(), json!({"params": {}, "x": 1}));
    }

    #[test]
    fn explicit_params_mapping_is_kept() {
        let args =
            normalize_arguments(json!({"params": {"input": "hi"}, "x": 1})).expect("normalize");
        assert_eq!(args.to_value(), json!({"params": {"input": "hi"}, "x": 1}));
    }

    #[test]
    fn scalar_params_is_wrapped_into_mapping() {
        let args = normalize_arguments(json!({"params": "raw"})).expect("normalize");
        assert_eq!(args.param("params"), Some(&json!("raw")));
    }

    #[test]
    fn every_object_payload_yields_mapping_params() {
        let payloads = [
            json!({}),
            json!({"params": null}),
            json!({"params": 5}),
            json!({"params": [1, 2]}),
            json!({"params": {}}),
            json!({"nested": {"params": null}}),
        ];
        for payload in payloads {
            let args = normalize_arguments(payload.clone()).expect("normalize");
            assert!(args.params().is_some(), "params not a mapping for {payload}");
        }
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = normalize_arguments(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = parse_arguments("{not json").unwrap_err();
        assert!(err.to_string().contains("parse input json"));
    }
}
