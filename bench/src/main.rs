//! `bench`: drive the crossing harness over many grids and persist the results.

mod cli;
mod config;
mod grids;
mod report;
mod results;
mod run;
mod worker;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use crossing::core::algorithms::Algorithm;
use crossing::io::harness::parse_timeout_secs;
use crossing::{exit_codes, logging};

use crate::cli::{GridSelection, RunRequest};
use crate::config::RunOverrides;
use crate::grids::{DEFAULT_SEEDS, DEFAULT_SIZES};
use crate::results::Format;

#[derive(Parser)]
#[command(name = "bench", version, about = "Benchmark driver for crossing strategies")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the grids a run would use.
    List {
        #[command(flatten)]
        grids: GridArgs,
    },
    /// Benchmark one algorithm and save the batch.
    Run {
        #[arg(short, long, value_enum)]
        algorithm: Algorithm,
        #[command(flatten)]
        grids: GridArgs,
        #[arg(long, num_args = 1.., default_values_t = [0usize])]
        start_rows: Vec<usize>,
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Fixed deadline in seconds, fractions allowed (disables the adaptive policy).
        #[arg(short, long)]
        timeout: Option<f64>,
        #[arg(long)]
        grace_period: Option<u64>,
        #[arg(long)]
        worker_binary: Option<PathBuf>,
        #[arg(long)]
        instance_id: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, default_value = "bench.toml")]
        config: PathBuf,
    },
    /// Summarize saved JSON batches per algorithm.
    Report {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, default_value = "bench.toml")]
        config: PathBuf,
    },
    /// Merge JSON batches into one.
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Defaults to `output_dir` from the config.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, default_value = "bench.toml")]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct GridArgs {
    /// Directory of JSON grid descriptors.
    #[arg(short, long)]
    grids: Option<PathBuf>,
    /// Add random squares even when a grid directory is given.
    #[arg(long)]
    random: bool,
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_SIZES)]
    sizes: Vec<usize>,
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_SEEDS)]
    seeds: Vec<u64>,
}

impl From<GridArgs> for GridSelection {
    fn from(args: GridArgs) -> Self {
        Self {
            grids_dir: args.grids,
            random: args.random,
            sizes: args.sizes,
            seeds: args.seeds,
        }
    }
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
        Command::List { grids } => cli::list_grids(&grids.into()),
        Command::Run {
            algorithm,
            grids,
            start_rows,
            format,
            timeout,
            grace_period,
            worker_binary,
            instance_id,
            output,
            config,
        } => cli::run_benchmark(&RunRequest {
            algorithm,
            grids: grids.into(),
            start_rows,
            format,
            timeout: timeout.map(parse_timeout_secs).transpose()?,
            config_path: config,
            overrides: RunOverrides {
                grace_period_secs: grace_period,
                worker_binary,
                output_dir: output,
                instance_id,
            },
        }),
        Command::Report { output, config } => cli::report(&config, output),
        Command::Merge {
            files,
            output,
            config,
        } => cli::merge(&files, &config, output),
    }
}
