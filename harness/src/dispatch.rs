//! Entry point resolution and invocation inside a failure boundary.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use anyhow::anyhow;
use serde_json::Value;
use tracing::debug;

use crate::core::failure::{Failure, Stage};
use crate::io::input::DecodedInput;
use crate::script::{Callable, EntryName, Module};

/// Resolve `handler`, falling back to `main`.
pub fn resolve(module: &Module) -> Option<(EntryName, &Callable)> {
    [EntryName::Handler, EntryName::Main]
        .into_iter()
        .find_map(|name| module.entry(name).map(|callable| (name, callable)))
}

/// Invoke the resolved entry point and return its raw JSON value.
///
/// `handler` receives the arguments only when input was supplied; `main`
/// always does. No entry point yields a null result without an error.
pub fn dispatch(module: &Module, input: &DecodedInput) -> Result<Value, Failure> {
    let Some((name, callable)) = resolve(module) else {
        debug!("no entry point defined");
        return Ok(Value::Null);
    };
    let pass_args = match name {
        EntryName::Handler => input.supplied,
        EntryName::Main => true,
    };
    debug!(entry = %name, arity = callable.arity(), pass_args, "invoking entry point");

    let returned = guarded(Stage::Execution, || match (callable, pass_args) {
        (Callable::Unary(call), true) => call(&input.args),
        (Callable::Nullary(call), false) => call(),
        (Callable::Nullary(_), true) => Err(arity_failure(format!(
            "{name}() takes no arguments but was called with input"
        ))),
        (Callable::Unary(_), false) => Err(arity_failure(format!(
            "{name}(args) requires an argument but no input was supplied"
        ))),
    })?;

    if name == EntryName::Handler && returned.is_null() {
        module.console().print("warning: handler returned no value");
    }
    Ok(returned)
}

fn arity_failure(message: String) -> Failure {
    Failure::from_error(Stage::Execution, anyhow!(message))
}

/// Run `f`, turning a panic into a [`Failure`] for `stage`.
///
/// While `f` runs, panics on this thread are recorded with a backtrace taken
/// at the panic site instead of being printed.
pub fn guarded<T>(stage: Stage, f: impl FnOnce() -> Result<T, Failure>) -> Result<T, Failure> {
    let trap = PanicTrap::install();
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    let report = trap.release();
    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let failure = match report {
                Some(report) => Failure::from_panic(stage, report.message, Some(report.trace)),
                None => Failure::from_panic(stage, payload_message(payload.as_ref()), None),
            };
            Err(failure)
        }
    }
}

struct PanicReport {
    message: String,
    trace: Backtrace,
}

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Temporarily replaces the process panic hook.
///
/// Panics from other threads are forwarded to the previous hook.
struct PanicTrap {
    slot: Arc<Mutex<Option<PanicReport>>>,
    previous: Option<Arc<PanicHook>>,
}

impl PanicTrap {
    fn install() -> Self {
        let slot = Arc::new(Mutex::new(None));
        let previous: Arc<PanicHook> = Arc::new(panic::take_hook());
        let owner: ThreadId = thread::current().id();

        let hook_slot = Arc::clone(&slot);
        let hook_previous = Arc::clone(&previous);
        panic::set_hook(Box::new(move |info| {
            if thread::current().id() != owner {
                (**hook_previous)(info);
                return;
            }
            let report = PanicReport {
                message: payload_message(info.payload()),
                trace: Backtrace::force_capture(),
            };
            *hook_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(report);
        }));

        Self {
            slot,
            previous: Some(previous),
        }
    }

    fn release(mut self) -> Option<PanicReport> {
        self.restore_hook();
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn restore_hook(&mut self) {
        if let Some(previous) = self.previous.take() {
            panic::set_hook(Box::new(move |info| (**previous)(info)));
        }
    }
}

impl Drop for PanicTrap {
    fn drop(&mut self) {
        if !thread::panicking() {
            self.restore_hook();
        }
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
