//! Per-invocation result records and the ordered batch that collects them.
//!
//! Every outcome (success, timeout, crash, algorithm error) has the same
//! shape, so consumers never special-case failures structurally: failures
//! carry an empty path, zero cost and a populated `error_message`.

use serde::{Deserialize, Serialize};

use crate::core::algorithms::Algorithm;
use crate::core::path::Path;

/// Final status of one harnessed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    TimedOut,
    /// Algorithm error, caught panic, or a worker that exited without a reply.
    Errored,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::TimedOut => "timed_out",
            RunStatus::Errored => "errored",
        }
    }
}

/// Immutable result of one invocation, created by the harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub algorithm: Algorithm,
    /// Grid type/seed label, e.g. `square_10x10_seed42`.
    pub matrix_type: String,
    pub matrix_rows: usize,
    pub matrix_cols: usize,
    pub start_position: usize,
    pub execution_time_seconds: f64,
    pub status: RunStatus,
    pub path: Path,
    pub path_cost: f64,
    /// RFC 3339 timestamp taken when the record was created.
    pub timestamp: String,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Peak live heap during the algorithm call, in KiB (two decimals).
    #[serde(default)]
    pub peak_memory_kb: Option<f64>,
}

impl RunRecord {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Batch-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub generated_at: String,
    pub total_results: usize,
}

/// Records in the order the invocations were issued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultBatch {
    records: Vec<RunRecord>,
}

impl ResultBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<RunRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RunRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn metadata(&self, generated_at: String) -> BatchMetadata {
        BatchMetadata {
            generated_at,
            total_results: self.records.len(),
        }
    }
}
