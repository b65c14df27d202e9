//! Batch orchestration: one algorithm across grids and start rows.
//!
//! Invocations run strictly one after another through the harness; a timeout
//! or crash is recorded and the batch moves on.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use crossing::core::algorithms::Algorithm;
use crossing::core::record::{ResultBatch, RunRecord, RunStatus};
use crossing::io::harness::{Harness, Invocation};
use tracing::{debug, info, instrument};

use crate::grids::GridSource;

/// What to run.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub algorithm: Algorithm,
    pub sources: Vec<GridSource>,
    pub start_rows: Vec<usize>,
    /// Explicit per-invocation deadline; `None` defers to the harness policy.
    pub timeout: Option<Duration>,
}

impl BatchPlan {
    /// Descriptor hashes of file-backed grids, keyed by label.
    pub fn source_digests(&self) -> BTreeMap<String, String> {
        self.sources
            .iter()
            .filter_map(|source| {
                source
                    .sha256
                    .as_ref()
                    .map(|sha| (source.label.clone(), sha.clone()))
            })
            .collect()
    }
}

/// Run every (grid, start row) pair in order, writing one progress line each.
#[instrument(skip_all, fields(algorithm = %plan.algorithm, grids = plan.sources.len()))]
pub fn run_batch<W: Write>(harness: &Harness, plan: &BatchPlan, progress: &mut W) -> Result<ResultBatch> {
    info!(start_rows = ?plan.start_rows, "batch started");
    let mut batch = ResultBatch::new();
    for source in &plan.sources {
        for &start_row in &plan.start_rows {
            write!(progress, "  {} (start={start_row}): ", source.label).context("write progress")?;
            progress.flush().context("flush progress")?;

            let record = harness.run(&Invocation {
                algorithm: plan.algorithm,
                grid: &source.grid,
                matrix_type: &source.label,
                start_row,
                timeout: plan.timeout,
            });
            writeln!(progress, "{}", progress_line(&record)).context("write progress")?;
            debug!(label = %source.label, start_row, status = record.status.as_str(), "invocation recorded");
            batch.push(record);
        }
    }
    info!(records = batch.len(), "batch finished");
    Ok(batch)
}

pub fn progress_line(record: &RunRecord) -> String {
    match record.status {
        RunStatus::Success => format!("ok {:.4}s", record.execution_time_seconds),
        RunStatus::TimedOut => format!("TIMEOUT {:.1}s", record.execution_time_seconds),
        RunStatus::Errored => format!(
            "ERROR {}",
            record.error_message.as_deref().unwrap_or("unknown error")
        ),
    }
}
