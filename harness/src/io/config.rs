//! Harness configuration, optionally read from a TOML file.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

/// Default environment variable carrying the input payload.
pub const DEFAULT_INPUT_VAR: &str = "INPUT_JSON";

/// Harness configuration (TOML).
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Environment variable holding the JSON-encoded input.
    pub input_var: String,

    pub capture: CaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Also forward captured text to the real output as it is written.
    pub show_logs: bool,

    /// Minimum severity routed into the log buffer (`trace`..`error`, or `off`).
    pub threshold: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            show_logs: false,
            threshold: "info".to_string(),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            input_var: DEFAULT_INPUT_VAR.to_string(),
            capture: CaptureConfig::default(),
        }
    }
}

impl CaptureConfig {
    pub fn threshold_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(self.threshold.trim())
            .map_err(|_| anyhow!("unknown capture.threshold {:?}", self.threshold))
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_var.trim().is_empty() {
            return Err(anyhow!("input_var must be a non-empty name"));
        }
        self.capture.threshold_filter()?;
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HarnessConfig::default()`.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    if !path.exists() {
        let cfg = HarnessConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HarnessConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
