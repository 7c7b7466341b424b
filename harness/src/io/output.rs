//! Host-side decoding of a harness run's captured output.
//!
//! The caller that launched the harness sees raw stdout/stderr bytes. The
//! envelope is the last stdout line shaped like `{"logs": [..], "result": .., "error": ..}`;
//! anything printed before it (pass-through text) is ignored.

use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::envelope::ResultEnvelope;

const ENVELOPE_SCHEMA: &str = include_str!("../../../schemas/envelope/v1.schema.json");

static ENVELOPE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\{"logs":\s*\[.*\],\s*"result":.*,\s*"error":.*\}$"#).unwrap()
});

/// Outcome of one harness run as seen by its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub result: Option<Value>,
    pub logs: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
}

/// Extract the envelope from captured output.
///
/// Without an envelope line the run is reported as failed, carrying raw
/// stdout as its only log entry and stderr in the error.
pub fn parse_execution_output(stdout: &[u8], stderr: &[u8]) -> Result<ExecutionResult> {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    let Some(line) = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| ENVELOPE_LINE.is_match(line))
    else {
        warn!("no envelope found in harness output");
        return Ok(ExecutionResult {
            result: None,
            logs: if stdout.is_empty() {
                Vec::new()
            } else {
                vec![stdout.into_owned()]
            },
            success: false,
            error: Some(format!(
                "failed to extract structured output: {}",
                stderr.trim()
            )),
        });
    };

    let value: Value = serde_json::from_str(line).context("parse envelope json")?;
    validate_envelope(&value)?;
    let envelope: ResultEnvelope =
        serde_json::from_value(value).context("deserialize envelope")?;
    debug!(logs = envelope.logs.len(), "decoded envelope");

    let result = match envelope.result {
        Value::Null => None,
        other => Some(other),
    };
    Ok(ExecutionResult {
        success: envelope.error.is_none(),
        result,
        logs: envelope.logs,
        error: envelope.error,
    })
}

/// Check `value` against the bundled envelope schema.
pub fn validate_envelope(value: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(ENVELOPE_SCHEMA).context("parse envelope schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(value) {
        let messages = compiled
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "envelope schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_success_envelope_after_pass_through_text() {
        let stdout = b"debug text\n{\"logs\": [\"a\", \"b\"], \"result\": \"{\\\"sum\\\": 7}\", \"error\": null}\n";
        let parsed = parse_execution_output(stdout, b"").expect("parse");
        assert!(parsed.success);
        assert_eq!(parsed.logs, vec!["a", "b"]);
        assert_eq!(parsed.result, Some(json!("{\"sum\": 7}")));
        assert_eq!(parsed.error, None);
    }

    #[test]
    fn null_result_reads_as_none() {
        let stdout = br#"{"logs":[],"result":null,"error":"bad\ntrace"}"#;
        let parsed = parse_execution_output(stdout, b"").expect("parse");
        assert!(!parsed.success);
        assert_eq!(parsed.result, None);
        assert_eq!(parsed.error.as_deref(), Some("bad\ntrace"));
    }

    #[test]
    fn record_glued_to_the_envelope_hides_it() {
        let stdout = br#"[INFO] last{"logs": [], "result": 1, "error": null}"#;
        let parsed = parse_execution_output(stdout, b"").expect("parse");
        assert!(!parsed.success);
    }

    #[test]
    fn scalar_result_is_kept_native() {
        let parsed = parse_execution_output(br#"{"logs":[],"result":12345,"error":null}"#, b"")
            .expect("parse");
        assert_eq!(parsed.result, Some(json!(12345)));
    }

    #[test]
    fn missing_envelope_reports_stderr() {
        let parsed = parse_execution_output(b"garbage\n", b"thread panicked\n").expect("parse");
        assert!(!parsed.success);
        assert_eq!(parsed.logs, vec!["garbage\n"]);
        assert_eq!(
            parsed.error.as_deref(),
            Some("failed to extract structured output: thread panicked")
        );
    }

    #[test]
    fn schema_rejects_nested_result_object() {
        let err = parse_execution_output(br#"{"logs":[],"result":{"a":1},"error":null}"#, b"")
            .unwrap_err();
        assert!(err.to_string().contains("schema validation failed"));
    }
}
