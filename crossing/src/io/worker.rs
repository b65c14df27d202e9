//! Worker side of the isolation boundary.
//!
//! The harness spawns `crossing worker`, writes one [`WorkerJob`] as JSON to
//! its stdin and reads exactly one [`WorkerReply`] line from its stdout.
//! Everything that can go wrong inside the worker (bad job, bad grid, bad
//! start row, panic) is folded into the reply's `error` string; only a worker
//! that dies without replying is seen as a crash by the harness.

use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::core::algorithms::Algorithm;
use crate::core::grid::{Grid, GridDescriptor};
use crate::core::path::Path;
use crate::io::memory::measure_peak;

/// Job handed to an isolated worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerJob {
    pub algorithm: Algorithm,
    pub start_row: usize,
    pub grid: GridDescriptor,
}

/// One-shot answer from a worker. Exactly one of `path` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReply {
    #[serde(default)]
    pub path: Option<Path>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub peak_memory_kb: Option<f64>,
}

impl WorkerReply {
    fn solved(path: Path, peak_memory_kb: f64) -> Self {
        Self {
            path: Some(path),
            error: None,
            peak_memory_kb: Some(peak_memory_kb),
        }
    }

    fn failed(error: String) -> Self {
        Self {
            path: None,
            error: Some(error),
            peak_memory_kb: None,
        }
    }
}

/// Read a job from `input`, run it, and write the reply line to `output`.
///
/// Returns `Err` only when the reply itself cannot be written.
#[instrument(skip_all)]
pub fn serve<R: Read, W: Write>(mut input: R, mut output: W) -> Result<()> {
    let mut raw = String::new();
    let reply = match input.read_to_string(&mut raw).context("read job") {
        Ok(_) => run_job_str(&raw),
        Err(err) => WorkerReply::failed(format!("{err:#}")),
    };
    let mut line = serde_json::to_string(&reply).context("serialize reply")?;
    line.push('\n');
    output.write_all(line.as_bytes()).context("write reply")?;
    output.flush().context("flush reply")?;
    Ok(())
}

fn run_job_str(raw: &str) -> WorkerReply {
    let job: WorkerJob = match serde_json::from_str(raw).context("parse job") {
        Ok(job) => job,
        Err(err) => return WorkerReply::failed(format!("{err:#}")),
    };
    run_job(&job)
}

/// Solve `job` in this process, measuring peak heap around the algorithm call only.
pub fn run_job(job: &WorkerJob) -> WorkerReply {
    let grid = match Grid::from_descriptor(&job.grid) {
        Ok(grid) => grid,
        Err(err) => return WorkerReply::failed(format!("{err:#}")),
    };
    debug!(
        algorithm = %job.algorithm,
        rows = grid.rows(),
        cols = grid.cols(),
        start_row = job.start_row,
        "running job"
    );

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        measure_peak(|| job.algorithm.solve(&grid, job.start_row))
    }));
    match outcome {
        Ok((Ok(path), peak_kb)) => WorkerReply::solved(path, peak_kb),
        Ok((Err(err), _)) => WorkerReply::failed(format!("{err:#}")),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "algorithm panicked");
            WorkerReply::failed(format!("panicked: {message}"))
        }
    }
}

/// Parse the reply from captured worker stdout: the last non-empty line.
pub fn parse_reply(stdout: &[u8]) -> Result<WorkerReply> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| anyhow!("worker produced no output"))?;
    serde_json::from_str(line).context("parse worker reply")
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
