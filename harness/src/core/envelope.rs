//! The single JSON object a harness run emits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::failure::Failure;

/// Terminal output of one invocation.
///
/// `error` set implies `result` is null. Both null is a valid success with
/// an empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub logs: Vec<String>,
    pub result: Value,
    pub error: Option<String>,
}

impl ResultEnvelope {
    pub fn success(result: Value) -> Self {
        Self {
            logs: Vec::new(),
            result,
            error: None,
        }
    }

    pub fn failure(failure: Failure) -> Self {
        Self {
            logs: Vec::new(),
            result: Value::Null,
            error: Some(failure.into_message()),
        }
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = logs;
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
