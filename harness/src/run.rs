//! Orchestration for one harness run: intercept, decode, load, dispatch, emit.

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::core::envelope::ResultEnvelope;
use crate::core::failure::{Failure, Stage};
use crate::core::normalize::normalize_result;
use crate::dispatch::{dispatch, guarded};
use crate::io::config::HarnessConfig;
use crate::io::emit::emit_envelope;
use crate::io::input::{DecodedInput, decode_input, read_input};
use crate::io::interceptor::{self, Console, Sink};
use crate::script::{Module, Script};

/// Run `script` once with input read from the configured environment variable.
pub fn run_from_env<S: Script + ?Sized>(
    script: &S,
    config: &HarnessConfig,
    sink: Sink,
) -> Result<ResultEnvelope> {
    let raw = read_input(&config.input_var);
    run_script(script, config, raw.as_deref(), sink)
}

/// Run `script` once and write exactly one envelope line to `sink`.
///
/// Failures from loading, the entry point, or normalization end up in the
/// envelope's `error` field. Only a failure to write the envelope itself is
/// returned as an error.
pub fn run_script<S: Script + ?Sized>(
    script: &S,
    config: &HarnessConfig,
    raw_input: Option<&str>,
    sink: Sink,
) -> Result<ResultEnvelope> {
    let threshold = config.capture.threshold_filter()?;
    debug!(script = script.name(), %threshold, "starting run");

    let interception = interceptor::install(sink, config.capture.show_logs, threshold);
    let console = interception.console().clone();
    let input = decode_input(raw_input, &console);
    let outcome = invoke(script, console, &input);
    let restored = interception.restore()?;

    let envelope = match outcome {
        Ok(result) => ResultEnvelope::success(result),
        Err(failure) => {
            debug!(stage = %failure.stage, "run failed");
            ResultEnvelope::failure(failure)
        }
    }
    .with_logs(restored.logs);

    let mut sink = restored.sink;
    emit_envelope(&mut sink, &envelope)?;
    debug!(lines = envelope.logs.len(), "envelope written");
    Ok(envelope)
}

fn invoke<S: Script + ?Sized>(
    script: &S,
    console: Console,
    input: &DecodedInput,
) -> Result<Value, Failure> {
    let mut module = Module::new(console);
    guarded(Stage::Load, || {
        script
            .load(&mut module)
            .map_err(|err| Failure::from_error(Stage::Load, err))
    })?;
    let returned = dispatch(&module, input)?;
    normalize_result(returned).map_err(|err| Failure::from_error(Stage::Normalization, err))
}
