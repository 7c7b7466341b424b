//! Output interception for one invocation.
//!
//! [`install`] swaps the real output destination for an in-memory log buffer
//! and routes `tracing` records into the same buffer. The returned
//! [`Interception`] hands the real destination back exactly once through
//! [`Interception::restore`]; dropping it on any other path restores too.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow};
use tracing_subscriber::filter::LevelFilter;

use crate::io::bridge::{self, BridgeGuard};

/// The real output destination the envelope is written to.
pub type Sink = Box<dyn Write + Send>;

/// Handle scripts print through while output is intercepted.
///
/// Cheap to clone; every clone appends to the same buffer.
#[derive(Clone)]
pub struct Console {
    inner: Arc<Mutex<ConsoleState>>,
}

struct ConsoleState {
    logs: Vec<String>,
    show_logs: bool,
    /// `None` once the real destination has been restored.
    real: Option<Sink>,
}

impl Console {
    pub(crate) fn new(real: Sink, show_logs: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ConsoleState {
                logs: Vec::new(),
                show_logs,
                real: Some(real),
            })),
        }
    }

    /// Record `text` stripped of surrounding whitespace, skipping blank writes.
    ///
    /// With pass-through enabled the original text is also forwarded to the
    /// real destination. Writes after restoration are discarded.
    pub fn write(&self, text: &str) {
        let mut state = self.lock();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        let ConsoleState {
            logs,
            show_logs,
            real,
        } = &mut *state;
        let Some(real) = real.as_mut() else {
            return;
        };
        logs.push(trimmed.to_string());
        if *show_logs {
            // Pass-through is best effort; the buffer is the record of truth.
            let _ = real.write_all(text.as_bytes());
        }
    }

    /// Write `message` followed by a newline, as a single write.
    pub fn print(&self, message: impl fmt::Display) {
        self.write(&format!("{message}\n"));
    }

    pub fn flush(&self) {
        let mut state = self.lock();
        if !state.show_logs {
            return;
        }
        if let Some(real) = state.real.as_mut() {
            let _ = real.flush();
        }
    }

    /// Snapshot of the lines captured so far.
    pub fn lines(&self) -> Vec<String> {
        self.lock().logs.clone()
    }

    pub(crate) fn same_buffer(&self, other: &Console) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn close(&self) -> Option<(Vec<String>, Sink)> {
        let mut state = self.lock();
        let real = state.real.take()?;
        Some((std::mem::take(&mut state.logs), real))
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Console")
            .field("lines", &state.logs.len())
            .field("show_logs", &state.show_logs)
            .field("restored", &state.real.is_none())
            .finish()
    }
}

/// Output and logging captured for the lifetime of one invocation.
pub struct Interception {
    console: Console,
    logging: Option<BridgeGuard>,
}

/// What the interception hands back when it ends.
pub struct Restored {
    pub logs: Vec<String>,
    pub sink: Sink,
}

/// Start intercepting: console writes and `tracing` records at or above
/// `threshold` land in one ordered buffer.
///
/// Logging routing is replaced for the current thread, which displaces any
/// globally installed subscriber until the interception ends. Records from
/// other threads reach the buffer through the global relay layer installed
/// by [`crate::logging::init`].
pub fn install(real: Sink, show_logs: bool, threshold: LevelFilter) -> Interception {
    let console = Console::new(real, show_logs);
    let logging = bridge::install(console.clone(), threshold);
    Interception {
        console,
        logging: Some(logging),
    }
}

impl Interception {
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// End the interception and return the captured lines with the real destination.
    pub fn restore(mut self) -> Result<Restored> {
        self.logging.take();
        let (logs, sink) = self
            .console
            .close()
            .ok_or_else(|| anyhow!("output destination already restored"))?;
        Ok(Restored { logs, sink })
    }
}

impl Drop for Interception {
    fn drop(&mut self) {
        self.logging.take();
        self.console.close();
    }
}
