//! Batch persistence: JSON documents with paths, flat CSV without them.
//!
//! JSON batches are the source of truth; they can be loaded back, merged
//! and aggregated. CSV is an export for spreadsheets and plotting tools.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use crossing::core::algorithms::Algorithm;
use crossing::core::record::{BatchMetadata, ResultBatch, RunRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// CSV columns, in order: the record fields minus `path`.
pub const CSV_COLUMNS: [&str; 12] = [
    "algorithm",
    "matrix_type",
    "matrix_rows",
    "matrix_cols",
    "start_position",
    "execution_time_seconds",
    "path_cost",
    "timestamp",
    "instance_id",
    "status",
    "error_message",
    "peak_memory_kb",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

/// Metadata block of a persisted batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFileMeta {
    #[serde(flatten)]
    pub batch: BatchMetadata,
    /// `None` for merged batches spanning several algorithms.
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    #[serde(default)]
    pub instance_id: Option<String>,
    /// Grid label to descriptor SHA-256, for grids loaded from files.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
    /// Set on the output of `merge_batches`; reports skip such files.
    #[serde(default)]
    pub merged: bool,
}

/// A persisted batch: metadata plus records in issue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFile {
    pub metadata: BatchFileMeta,
    pub results: Vec<RunRecord>,
}

impl BatchFile {
    pub fn new(
        batch: ResultBatch,
        algorithm: Option<Algorithm>,
        instance_id: Option<String>,
        sources: BTreeMap<String, String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let metadata = BatchFileMeta {
            batch: batch.metadata(generated_at.to_rfc3339()),
            algorithm,
            instance_id,
            sources,
            merged: false,
        };
        Self {
            metadata,
            results: batch.into_records(),
        }
    }

    fn file_prefix(&self) -> String {
        match self.metadata.algorithm {
            Some(algorithm) if !self.metadata.merged => format!("benchmark_{algorithm}"),
            _ => MERGED_PREFIX.to_string(),
        }
    }
}

/// File name prefix of merged batches.
pub const MERGED_PREFIX: &str = "benchmark_merged";

/// Attempts at a free file name before giving up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// `<prefix>_<YYYYmmdd_HHMMSS>.<ext>`, with `_<n>` before the extension for
/// `attempt > 0`.
pub fn batch_file_name(
    prefix: &str,
    stamp: DateTime<Utc>,
    attempt: usize,
    format: Format,
) -> String {
    let stamp = stamp.format("%Y%m%d_%H%M%S");
    let ext = format.extension();
    if attempt == 0 {
        format!("{prefix}_{stamp}.{ext}")
    } else {
        format!("{prefix}_{stamp}_{attempt}.{ext}")
    }
}

/// Create a new batch file, never replacing an existing one.
fn create_unique(
    output_dir: &Path,
    prefix: &str,
    stamp: DateTime<Utc>,
    format: Format,
) -> Result<(PathBuf, fs::File)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = output_dir.join(batch_file_name(prefix, stamp, attempt, format));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e).with_context(|| format!("create batch {}", path.display())),
        }
    }
    bail!(
        "no free batch file name for {prefix} at {} in {}",
        stamp.format("%Y%m%d_%H%M%S"),
        output_dir.display()
    )
}

/// Write `file` into a new file in `output_dir` and return its path.
#[instrument(skip_all, fields(output_dir = %output_dir.display(), format = ?format))]
pub fn save_batch(
    output_dir: &Path,
    file: &BatchFile,
    format: Format,
    stamp: DateTime<Utc>,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;
    let mut buf = Vec::new();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut buf, file).context("serialize batch")?;
            buf.push(b'\n');
        }
        Format::Csv => write_csv(&mut buf, &file.results)?,
    }
    let (path, mut out) = create_unique(output_dir, &file.file_prefix(), stamp, format)?;
    out.write_all(&buf)
        .with_context(|| format!("write batch {}", path.display()))?;
    debug!(path = %path.display(), records = file.results.len(), "batch saved");
    Ok(path)
}

/// Write records as CSV (RFC 4180 quoting), header first.
pub fn write_csv<W: Write>(mut out: W, records: &[RunRecord]) -> Result<()> {
    writeln!(out, "{}", CSV_COLUMNS.join(",")).context("write csv header")?;
    for record in records {
        let fields = [
            record.algorithm.to_string(),
            record.matrix_type.clone(),
            record.matrix_rows.to_string(),
            record.matrix_cols.to_string(),
            record.start_position.to_string(),
            record.execution_time_seconds.to_string(),
            record.path_cost.to_string(),
            record.timestamp.clone(),
            record.instance_id.clone().unwrap_or_default(),
            record.status.as_str().to_string(),
            record.error_message.clone().unwrap_or_default(),
            record
                .peak_memory_kb
                .map(|kb| kb.to_string())
                .unwrap_or_default(),
        ];
        let line: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
        writeln!(out, "{}", line.join(",")).context("write csv row")?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Read a JSON batch back.
pub fn load_batch(path: &Path) -> Result<BatchFile> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read batch {}", path.display()))?;
    let file: BatchFile = serde_json::from_str(&contents)
        .with_context(|| format!("parse batch {}", path.display()))?;
    if file.metadata.batch.total_results != file.results.len() {
        bail!(
            "batch {} declares {} results but holds {}",
            path.display(),
            file.metadata.batch.total_results,
            file.results.len()
        );
    }
    Ok(file)
}

/// Concatenate JSON batches, ordered by algorithm name, grid label and row count.
pub fn merge_batches(paths: &[PathBuf], generated_at: DateTime<Utc>) -> Result<BatchFile> {
    if paths.is_empty() {
        bail!("nothing to merge");
    }
    let mut records = Vec::new();
    let mut sources = BTreeMap::new();
    let mut algorithms = Vec::new();
    let mut instances = Vec::new();
    for path in paths {
        let file = load_batch(path)?;
        algorithms.push(file.metadata.algorithm);
        instances.push(file.metadata.instance_id);
        sources.extend(file.metadata.sources);
        records.extend(file.results);
    }
    records.sort_by(|a, b| {
        (a.algorithm.as_str(), &a.matrix_type, a.matrix_rows).cmp(&(
            b.algorithm.as_str(),
            &b.matrix_type,
            b.matrix_rows,
        ))
    });

    let algorithm = shared(&algorithms).flatten();
    let instance_id = shared(&instances).flatten();
    let mut merged = BatchFile::new(
        ResultBatch::from_records(records),
        algorithm,
        instance_id,
        sources,
        generated_at,
    );
    merged.metadata.merged = true;
    Ok(merged)
}

/// The common value if every entry agrees.
fn shared<T: Clone + PartialEq>(values: &[T]) -> Option<T> {
    let first = values.first()?;
    values
        .iter()
        .all(|value| value == first)
        .then(|| first.clone())
}
