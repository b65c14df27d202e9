use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossing::core::algorithms::Algorithm;
use crossing::core::record::{RunRecord, RunStatus};
use tracing::debug;

use crate::results::{MERGED_PREFIX, load_batch};

/// Aggregates for one algorithm across every loaded batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AlgorithmSummary {
    pub runs: usize,
    pub success: usize,
    pub timed_out: usize,
    pub errored: usize,
    /// Mean over successful runs only.
    pub mean_duration_secs: Option<f64>,
    pub max_peak_memory_kb: Option<f64>,
    pub min_cost: Option<f64>,
    pub max_cost: Option<f64>,
}

impl AlgorithmSummary {
    fn add(&mut self, record: &RunRecord) {
        self.runs += 1;
        match record.status {
            RunStatus::Success => self.success += 1,
            RunStatus::TimedOut => self.timed_out += 1,
            RunStatus::Errored => self.errored += 1,
        }
        if !record.succeeded() {
            return;
        }

        let n = self.success as f64;
        self.mean_duration_secs = Some(match self.mean_duration_secs {
            None => record.execution_time_seconds,
            Some(avg) => (avg * (n - 1.0) + record.execution_time_seconds) / n,
        });
        if let Some(kb) = record.peak_memory_kb {
            self.max_peak_memory_kb = Some(self.max_peak_memory_kb.map_or(kb, |m| m.max(kb)));
        }
        let cost = record.path_cost;
        self.min_cost = Some(self.min_cost.map_or(cost, |m| m.min(cost)));
        self.max_cost = Some(self.max_cost.map_or(cost, |m| m.max(cost)));
    }
}

/// Run batch files (`benchmark_*.json`) in `results_dir`, sorted.
///
/// Merged batches repeat records already present in their inputs and are left out.
pub fn batch_files(results_dir: &Path) -> Result<Vec<PathBuf>> {
    if !results_dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(results_dir)
        .with_context(|| format!("read {}", results_dir.display()))?
    {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if path.is_file()
            && name.starts_with("benchmark_")
            && !name.starts_with(MERGED_PREFIX)
            && name.ends_with(".json")
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Summaries per algorithm, plus warnings for unreadable batches.
pub fn aggregate(
    results_dir: &Path,
) -> Result<(BTreeMap<Algorithm, AlgorithmSummary>, Vec<String>)> {
    let mut summaries: BTreeMap<Algorithm, AlgorithmSummary> = BTreeMap::new();
    let mut warnings = Vec::new();

    for path in batch_files(results_dir)? {
        let file = match load_batch(&path) {
            Ok(file) => file,
            Err(err) => {
                warnings.push(format!("skip {}: {err:#}", path.display()));
                continue;
            }
        };
        if file.metadata.merged {
            debug!(path = %path.display(), "skipping merged batch");
            continue;
        }
        for record in &file.results {
            summaries.entry(record.algorithm).or_default().add(record);
        }
    }

    Ok((summaries, warnings))
}
