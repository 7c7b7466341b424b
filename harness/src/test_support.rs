//! Test-only helpers for driving the harness in memory.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};

use crate::core::envelope::ResultEnvelope;
use crate::io::config::HarnessConfig;
use crate::io::interceptor::Console;
use crate::run::run_script;
use crate::script::Script;

/// In-memory stand-in for the real standard output.
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    /// Everything written so far, as UTF-8 (lossy).
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A console that records lines without any interception installed.
pub fn detached_console() -> Console {
    Console::new(Box::new(io::sink()), false)
}

/// Run `script` with default config, returning the envelope and raw real output.
pub fn run_captured<S: Script + ?Sized>(
    script: &S,
    input: Option<&str>,
) -> Result<(ResultEnvelope, String)> {
    run_captured_with(script, &HarnessConfig::default(), input)
}

pub fn run_captured_with<S: Script + ?Sized>(
    script: &S,
    config: &HarnessConfig,
    input: Option<&str>,
) -> Result<(ResultEnvelope, String)> {
    let sink = SharedSink::default();
    let envelope = run_script(script, config, input, Box::new(sink.clone()))?;
    Ok((envelope, sink.contents()))
}

/// Write a config file into a fresh temp dir. Keep the dir alive while the path is used.
pub fn temp_config(contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("harness.toml");
    std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}
