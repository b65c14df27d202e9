//! Benchmark configuration (`bench.toml`) and command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use crossing::io::config::HarnessConfig;
use serde::{Deserialize, Serialize};

/// Driver settings. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BenchConfig {
    pub harness: HarnessConfig,
    /// `crossing` binary used as the worker; defaults to the one next to `bench`.
    pub worker_binary: Option<PathBuf>,
    /// Where result batches are written and read back for reports.
    pub output_dir: PathBuf,
    /// Host label stamped on every record.
    pub instance_id: Option<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            harness: HarnessConfig::default(),
            worker_binary: None,
            output_dir: PathBuf::from("results"),
            instance_id: None,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        self.harness.validate().context("harness")?;
        if self.output_dir.as_os_str().is_empty() {
            bail!("output_dir must be non-empty");
        }
        if let Some(instance_id) = &self.instance_id
            && instance_id.trim().is_empty()
        {
            bail!("instance_id must be non-empty when set");
        }
        Ok(())
    }
}

/// Overrides taken from the command line.
///
/// An explicit `--timeout` is not part of this: it travels with the run
/// request and takes precedence over the configured deadline policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub grace_period_secs: Option<u64>,
    pub worker_binary: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub instance_id: Option<String>,
}

/// Load `bench.toml`; a missing file yields the defaults.
pub fn load_bench_config(path: &Path) -> Result<BenchConfig> {
    if !path.exists() {
        return Ok(BenchConfig::default());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: BenchConfig =
        toml::from_str(&contents).with_context(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate config {}", path.display()))?;
    Ok(cfg)
}

/// Apply command-line overrides on top of the file configuration.
pub fn apply_overrides(mut base: BenchConfig, overrides: &RunOverrides) -> Result<BenchConfig> {
    if let Some(grace_period_secs) = overrides.grace_period_secs {
        base.harness.grace_period_secs = grace_period_secs;
    }
    if let Some(worker_binary) = &overrides.worker_binary {
        base.worker_binary = Some(worker_binary.clone());
    }
    if let Some(output_dir) = &overrides.output_dir {
        base.output_dir = output_dir.clone();
    }
    if let Some(instance_id) = &overrides.instance_id {
        base.instance_id = Some(instance_id.clone());
    }
    base.validate()?;
    Ok(base)
}
