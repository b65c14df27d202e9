//! Harness configuration (TOML).

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Deadline and output policy for harnessed invocations.
///
/// Missing fields default to the values used for benchmark runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Fixed per-invocation deadline, used when `adaptive_timeout` is off and
    /// no explicit timeout is supplied.
    pub timeout_secs: u64,

    /// Pick the deadline from the grid's largest dimension.
    pub adaptive_timeout: bool,

    /// Time between the graceful stop request and a forced kill.
    pub grace_period_secs: u64,

    /// Truncate captured worker stderr beyond this many bytes.
    pub stderr_limit_bytes: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            adaptive_timeout: true,
            grace_period_secs: 5,
            stderr_limit_bytes: 100_000,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        if self.stderr_limit_bytes == 0 {
            return Err(anyhow!("stderr_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
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
