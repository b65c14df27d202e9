//! CLI command implementations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::Utc;
use crossing::core::algorithms::Algorithm;
use crossing::io::harness::{Harness, WorkerCommand};
use tracing::debug;

use crate::config::{BenchConfig, RunOverrides, apply_overrides, load_bench_config};
use crate::grids::{GridSource, discover_grids, random_grids};
use crate::report::aggregate;
use crate::results::{BatchFile, Format, merge_batches, save_batch};
use crate::run::{BatchPlan, run_batch};
use crate::worker::worker_binary_path;

/// Where grids come from.
#[derive(Debug, Clone, Default)]
pub struct GridSelection {
    /// Directory of `*.json` descriptors.
    pub grids_dir: Option<PathBuf>,
    /// Also generate random squares (always on when no directory is given).
    pub random: bool,
    pub sizes: Vec<usize>,
    pub seeds: Vec<u64>,
}

impl GridSelection {
    pub fn load(&self) -> Result<Vec<GridSource>> {
        let mut sources = Vec::new();
        if let Some(dir) = &self.grids_dir {
            sources.extend(discover_grids(dir)?);
        }
        if self.random || self.grids_dir.is_none() {
            sources.extend(random_grids(&self.sizes, &self.seeds)?);
        }
        if sources.is_empty() {
            bail!("no grids selected");
        }
        Ok(sources)
    }
}

/// Options for `bench run`.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub algorithm: Algorithm,
    pub grids: GridSelection,
    pub start_rows: Vec<usize>,
    pub format: Format,
    /// Fixed deadline for every invocation; replaces the configured policy.
    pub timeout: Option<Duration>,
    pub config_path: PathBuf,
    pub overrides: RunOverrides,
}

/// Print every selected grid with its dimensions.
pub fn list_grids(selection: &GridSelection) -> Result<()> {
    for source in selection.load()? {
        println!(
            "{} {}x{}",
            source.label,
            source.grid.rows(),
            source.grid.cols()
        );
    }
    Ok(())
}

/// Run one algorithm over the selected grids and save the batch.
pub fn run_benchmark(request: &RunRequest) -> Result<()> {
    let config = apply_overrides(load_bench_config(&request.config_path)?, &request.overrides)?;
    let worker = worker_binary_path(config.worker_binary.as_deref())?;
    let sources = request.grids.load()?;
    debug!(grids = sources.len(), worker = %worker.display(), "benchmark configured");

    println!("algorithm: {}", request.algorithm);
    println!("worker: {}", worker.display());
    println!("output: {}", config.output_dir.display());
    println!("timeout: {}", describe_timeout(&config, request.timeout));

    let plan = BatchPlan {
        algorithm: request.algorithm,
        sources,
        start_rows: request.start_rows.clone(),
        timeout: request.timeout,
    };
    let harness = Harness::new(WorkerCommand::crossing(worker), config.harness.clone())
        .with_instance_id(config.instance_id.clone());

    let mut stdout = std::io::stdout().lock();
    let batch = run_batch(&harness, &plan, &mut stdout)?;
    drop(stdout);

    let now = Utc::now();
    let file = BatchFile::new(
        batch,
        Some(request.algorithm),
        config.instance_id.clone(),
        plan.source_digests(),
        now,
    );
    let path = save_batch(&config.output_dir, &file, request.format, now)?;
    println!("saved: {}", path.display());
    println!("total results: {}", file.results.len());
    Ok(())
}

/// Output directory from `bench.toml`, or the command-line override.
fn resolve_output_dir(config_path: &Path, output_dir: Option<PathBuf>) -> Result<PathBuf> {
    let config = apply_overrides(
        load_bench_config(config_path)?,
        &RunOverrides {
            output_dir,
            ..RunOverrides::default()
        },
    )?;
    Ok(config.output_dir)
}

/// Summarize every run batch in the output directory.
pub fn report(config_path: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    let output_dir = resolve_output_dir(config_path, output_dir)?;
    let (summaries, warnings) = aggregate(&output_dir)?;
    for (algorithm, summary) in &summaries {
        println!(
            "report: {} runs={} success={} timed_out={} errored={}",
            algorithm, summary.runs, summary.success, summary.timed_out, summary.errored
        );
        if let Some(avg) = summary.mean_duration_secs {
            println!("report: {} mean_duration_secs={:.4}", algorithm, avg);
        }
        if let Some(peak) = summary.max_peak_memory_kb {
            println!("report: {} max_peak_memory_kb={:.2}", algorithm, peak);
        }
        if let (Some(min), Some(max)) = (summary.min_cost, summary.max_cost) {
            println!("report: {} cost_range=[{}, {}]", algorithm, min, max);
        }
    }
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

/// Merge JSON batches into one `benchmark_merged_*` file.
pub fn merge(files: &[PathBuf], config_path: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    let output_dir = resolve_output_dir(config_path, output_dir)?;
    let now = Utc::now();
    let merged = merge_batches(files, now)?;
    let path = save_batch(&output_dir, &merged, Format::Json, now)?;
    println!("merged: {} ({} results)", path.display(), merged.results.len());
    Ok(())
}

fn describe_timeout(config: &BenchConfig, explicit: Option<Duration>) -> String {
    if let Some(timeout) = explicit {
        format!("{}s", timeout.as_secs_f64())
    } else if config.harness.adaptive_timeout {
        "adaptive".to_string()
    } else {
        format!("{}s", config.harness.timeout_secs)
    }
}
