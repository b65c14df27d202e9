//! `crossing`: solve a toroidal grid crossing under an isolating harness.
//!
//! `solve` re-invokes this same binary as `crossing worker` for each
//! algorithm call, so a hung or crashing strategy never takes the caller down.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crossing::core::algorithms::Algorithm;
use crossing::io::config::load_config;
use crossing::io::grid_store::load_grid;
use crossing::io::harness::{Harness, Invocation, WorkerCommand, parse_timeout_secs};
use crossing::io::memory::CountingAlloc;
use crossing::io::worker::serve;
use crossing::{exit_codes, logging};

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc;

#[derive(Parser)]
#[command(
    name = "crossing",
    version,
    about = "Minimum-cost crossing of a toroidal cost grid"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read one job from stdin, solve it, write one reply line to stdout.
    #[command(hide = true)]
    Worker,
    /// Run one algorithm on a grid file in an isolated worker and print the record.
    Solve {
        #[arg(short, long, value_enum)]
        algorithm: Algorithm,
        /// Grid descriptor (JSON with `rows`, `cols`, `data`).
        #[arg(short, long)]
        grid: PathBuf,
        #[arg(short, long, default_value_t = 0)]
        start_row: usize,
        /// Deadline in seconds; overrides the configured policy.
        #[arg(short, long)]
        timeout: Option<f64>,
        /// Harness config (TOML). Defaults apply when the file is missing.
        #[arg(short, long, default_value = "crossing.toml")]
        config: PathBuf,
        /// Grid label for the record; defaults to the file stem.
        #[arg(long)]
        label: Option<String>,
    },
    /// Check that a grid descriptor is well formed.
    Check {
        #[arg(short, long)]
        grid: PathBuf,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Worker => serve(io::stdin().lock(), io::stdout().lock()),
        Command::Solve {
            algorithm,
            grid,
            start_row,
            timeout,
            config,
            label,
        } => cmd_solve(algorithm, &grid, start_row, timeout, &config, label),
        Command::Check { grid } => cmd_check(&grid),
    }
}

fn cmd_solve(
    algorithm: Algorithm,
    grid_path: &Path,
    start_row: usize,
    timeout: Option<f64>,
    config_path: &Path,
    label: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let grid = load_grid(grid_path)?;
    let timeout = timeout.map(parse_timeout_secs).transpose()?;
    let label = label.unwrap_or_else(|| {
        grid_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "grid".to_string())
    });

    let harness = Harness::new(WorkerCommand::current_exe()?, config);
    let record = harness.run(&Invocation {
        algorithm,
        grid: &grid,
        matrix_type: &label,
        start_row,
        timeout,
    });
    let json = serde_json::to_string_pretty(&record).context("serialize record")?;
    println!("{json}");
    Ok(())
}

fn cmd_check(grid_path: &Path) -> Result<()> {
    let grid = load_grid(grid_path)?;
    println!("ok: {} x {}", grid.rows(), grid.cols());
    Ok(())
}
