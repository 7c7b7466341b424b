//! Failure values threaded from loading through normalization.
//!
//! Every lower-layer failure becomes a [`Failure`]; [`Failure::into_message`]
//! is the single place where one is turned into the envelope's `error` text.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use serde::Serialize;

/// Harness phase in which a failure was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// The script's top-level statements.
    Load,
    /// The resolved entry point.
    Execution,
    /// Conversion of the returned value into its envelope form.
    Normalization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Load => "load",
            Stage::Execution => "execution",
            Stage::Normalization => "normalization",
        };
        f.write_str(label)
    }
}

/// A captured failure: textual description plus the stack trace.
#[derive(Debug)]
pub struct Failure {
    pub stage: Stage,
    pub description: String,
    pub trace: String,
}

impl Failure {
    /// Capture an error returned by user code or by the harness itself.
    ///
    /// Uses the backtrace recorded inside the error when one exists, otherwise
    /// captures one at this point.
    pub fn from_error(stage: Stage, error: anyhow::Error) -> Self {
        let trace = match error.backtrace().status() {
            BacktraceStatus::Captured => error.backtrace().to_string(),
            _ => Backtrace::force_capture().to_string(),
        };
        Self {
            stage,
            description: format!("{error:#}"),
            trace,
        }
    }

    /// Capture a panic raised by user code, with the trace taken at the panic site.
    pub fn from_panic(stage: Stage, message: String, trace: Option<Backtrace>) -> Self {
        let trace = trace.unwrap_or_else(Backtrace::force_capture);
        Self {
            stage,
            description: message,
            trace: trace.to_string(),
        }
    }

    /// Render the envelope `error` text: description, newline, trace.
    pub fn into_message(self) -> String {
        format!("{}\n{}", self.description, self.trace)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.description)
    }
}
