//! Execution harness: one algorithm invocation in an isolated worker process.
//!
//! Lifecycle of a call to [`Harness::run`]:
//!
//! ```text
//! Idle -> Started -> Completed | TimedOut | Crashed -> Recorded
//! ```
//!
//! - **Started**: a worker process is spawned and handed the job on stdin.
//! - **Completed**: the worker replied with a path (plus a peak-memory
//!   reading) or with an error string.
//! - **TimedOut**: the deadline passed; the worker was asked to stop and,
//!   after the grace period, killed. Any late output is discarded.
//! - **Crashed**: the worker exited without a usable reply (killed by the
//!   host, out of memory, stack overflow, spawn failure).
//! - **Recorded**: every terminal state becomes a [`RunRecord`] with the same
//!   shape; failures carry an empty path and zero cost.
//!
//! The caller blocks for the whole lifecycle, and exactly one worker is alive
//! per call.

use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::core::algorithms::Algorithm;
use crate::core::grid::Grid;
use crate::core::path::{Path, validate_path};
use crate::core::record::{RunRecord, RunStatus};
use crate::io::config::HarnessConfig;
use crate::io::process::{ProcessLimits, ProcessOutcome, run_with_deadline};
use crate::io::worker::{WorkerJob, WorkerReply, parse_reply};

/// Deadline for a grid whose largest dimension is `max_dimension`.
pub fn adaptive_timeout(max_dimension: usize) -> Duration {
    let secs = match max_dimension {
        0..=12 => 60,
        13..=20 => 120,
        21..=50 => 180,
        _ => 240,
    };
    Duration::from_secs(secs)
}

/// Explicit deadline given on a command line, in (possibly fractional) seconds.
pub fn parse_timeout_secs(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        bail!("timeout must be a positive number of seconds, got {secs}");
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Program and arguments that start a worker reading a job on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `<crossing binary> worker`.
    pub fn crossing(binary: impl Into<PathBuf>) -> Self {
        Self::new(binary, vec!["worker".to_string()])
    }

    /// The running executable in worker mode; only meaningful from the `crossing` binary.
    pub fn current_exe() -> Result<Self> {
        let exe = std::env::current_exe().context("locate current executable")?;
        Ok(Self::crossing(exe))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// One invocation request.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub algorithm: Algorithm,
    pub grid: &'a Grid,
    /// Grid type/seed label carried into the record.
    pub matrix_type: &'a str,
    pub start_row: usize,
    /// Explicit deadline; `None` defers to the harness configuration.
    pub timeout: Option<Duration>,
}

/// Terminal state of the worker before recording.
#[derive(Debug)]
enum WorkerOutcome {
    Completed(WorkerReply),
    TimedOut(Duration),
    Crashed(String),
}

/// Runs invocations one at a time, each in a fresh worker process.
#[derive(Debug, Clone)]
pub struct Harness {
    worker: WorkerCommand,
    config: HarnessConfig,
    instance_id: Option<String>,
}

impl Harness {
    pub fn new(worker: WorkerCommand, config: HarnessConfig) -> Self {
        Self {
            worker,
            config,
            instance_id: None,
        }
    }

    /// Label stamped on every record (host or machine identifier).
    pub fn with_instance_id(mut self, instance_id: Option<String>) -> Self {
        self.instance_id = instance_id;
        self
    }

    /// Explicit timeout if given, else adaptive or fixed per configuration.
    pub fn deadline_for(&self, grid: &Grid, explicit: Option<Duration>) -> Duration {
        match explicit {
            Some(timeout) => timeout,
            None if self.config.adaptive_timeout => adaptive_timeout(grid.max_dimension()),
            None => Duration::from_secs(self.config.timeout_secs),
        }
    }

    /// Run one invocation to completion and record it.
    ///
    /// Never fails: spawn problems, algorithm errors, timeouts and crashes all
    /// come back as records, so a bad invocation cannot stop the next one.
    #[instrument(skip_all, fields(algorithm = %invocation.algorithm, matrix_type = invocation.matrix_type, start_row = invocation.start_row))]
    pub fn run(&self, invocation: &Invocation<'_>) -> RunRecord {
        let timeout = self.deadline_for(invocation.grid, invocation.timeout);
        debug!(timeout_secs = timeout.as_secs_f64(), "started");

        let started = Instant::now();
        let outcome = match self.spawn_and_wait(invocation, timeout) {
            Ok(outcome) => outcome,
            Err(err) => WorkerOutcome::Crashed(format!("failed to run worker: {err:#}")),
        };
        let elapsed = started.elapsed();

        let record = self.record(invocation, outcome, elapsed);
        info!(
            status = record.status.as_str(),
            secs = record.execution_time_seconds,
            cost = record.path_cost,
            "recorded"
        );
        record
    }

    fn spawn_and_wait(
        &self,
        invocation: &Invocation<'_>,
        timeout: Duration,
    ) -> Result<WorkerOutcome> {
        let job = WorkerJob {
            algorithm: invocation.algorithm,
            start_row: invocation.start_row,
            grid: invocation.grid.to_descriptor(),
        };
        let payload = serde_json::to_vec(&job).context("serialize job")?;
        let limits = ProcessLimits {
            timeout,
            grace_period: self.config.grace_period(),
            stderr_limit_bytes: self.config.stderr_limit_bytes,
        };

        let outcome = run_with_deadline(self.worker.command(), &payload, limits)
            .with_context(|| format!("start worker {}", self.worker.program.display()))?;
        Ok(match outcome {
            ProcessOutcome::TimedOut { forced } => {
                warn!(forced, "worker timed out");
                WorkerOutcome::TimedOut(timeout)
            }
            ProcessOutcome::Exited {
                status,
                stdout,
                stderr,
                ..
            } => match parse_reply(&stdout) {
                Ok(reply) => {
                    debug!("completed");
                    WorkerOutcome::Completed(reply)
                }
                Err(err) => {
                    let stderr = String::from_utf8_lossy(&stderr);
                    warn!(err = %err, exit = %describe_exit(status), stderr = %stderr.trim(), "worker crashed");
                    WorkerOutcome::Crashed(format!(
                        "crashed without result ({})",
                        describe_exit(status)
                    ))
                }
            },
        })
    }

    fn record(
        &self,
        invocation: &Invocation<'_>,
        outcome: WorkerOutcome,
        elapsed: Duration,
    ) -> RunRecord {
        let grid = invocation.grid;
        let mut record = RunRecord {
            algorithm: invocation.algorithm,
            matrix_type: invocation.matrix_type.to_string(),
            matrix_rows: grid.rows(),
            matrix_cols: grid.cols(),
            start_position: invocation.start_row,
            execution_time_seconds: elapsed.as_secs_f64(),
            status: RunStatus::Errored,
            path: Path::new(),
            path_cost: 0.0,
            timestamp: Utc::now().to_rfc3339(),
            instance_id: self.instance_id.clone(),
            error_message: None,
            peak_memory_kb: None,
        };

        match outcome {
            WorkerOutcome::TimedOut(timeout) => {
                record.status = RunStatus::TimedOut;
                record.error_message = Some(format!("timeout after {}s", timeout.as_secs_f64()));
            }
            WorkerOutcome::Crashed(message) => {
                record.error_message = Some(message);
            }
            WorkerOutcome::Completed(reply) => match (reply.path, reply.error) {
                (_, Some(error)) => record.error_message = Some(error),
                (None, None) => {
                    record.error_message =
                        Some("worker reply carried neither path nor error".to_string());
                }
                (Some(path), None) => {
                    let violations = validate_path(grid, &path);
                    if violations.is_empty() {
                        record.status = RunStatus::Success;
                        record.path_cost = grid.path_cost(&path);
                        record.path = path;
                        record.peak_memory_kb = reply.peak_memory_kb;
                    } else {
                        record.error_message = Some(format!(
                            "worker returned an illegal path: {}",
                            violations.join("; ")
                        ));
                    }
                }
            },
        }
        record
    }
}

fn describe_exit(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("signal {signal}");
        }
    }
    "unknown exit status".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path::Step;

    fn grid() -> Grid {
        Grid::from_rows(&[vec![1.0, 2.0, 3.0], vec![-1.0, 0.0, 4.0]]).expect("grid")
    }

    fn harness(config: HarnessConfig) -> Harness {
        Harness::new(WorkerCommand::crossing("/bin/crossing"), config)
            .with_instance_id(Some("node-1".to_string()))
    }

    fn invocation(grid: &Grid) -> Invocation<'_> {
        Invocation {
            algorithm: Algorithm::Tabulation,
            grid,
            matrix_type: "fixture",
            start_row: 1,
            timeout: None,
        }
    }

    #[test]
    fn explicit_timeout_must_be_positive() {
        assert_eq!(
            parse_timeout_secs(1.5).expect("ok"),
            Duration::from_millis(1500)
        );
        assert!(parse_timeout_secs(0.0).is_err());
        assert!(parse_timeout_secs(-2.0).is_err());
        assert!(parse_timeout_secs(f64::NAN).is_err());
    }

    #[test]
    fn adaptive_timeout_grows_with_size() {
        assert_eq!(adaptive_timeout(0), Duration::from_secs(60));
        assert_eq!(adaptive_timeout(12), Duration::from_secs(60));
        assert_eq!(adaptive_timeout(13), Duration::from_secs(120));
        assert_eq!(adaptive_timeout(20), Duration::from_secs(120));
        assert_eq!(adaptive_timeout(50), Duration::from_secs(180));
        assert_eq!(adaptive_timeout(51), Duration::from_secs(240));
    }

    #[test]
    fn deadline_prefers_explicit_then_policy() {
        let g = grid();
        let adaptive = harness(HarnessConfig::default());
        assert_eq!(adaptive.deadline_for(&g, None), Duration::from_secs(60));
        assert_eq!(
            adaptive.deadline_for(&g, Some(Duration::from_secs(3))),
            Duration::from_secs(3)
        );
        let fixed = harness(HarnessConfig {
            adaptive_timeout: false,
            timeout_secs: 9,
            ..HarnessConfig::default()
        });
        assert_eq!(fixed.deadline_for(&g, None), Duration::from_secs(9));
    }

    #[test]
    fn completed_reply_is_costed_on_the_grid() {
        let g = grid();
        let reply = WorkerReply {
            path: Some(vec![Step::new(0, 1), Step::new(1, 1), Step::new(2, 0)]),
            error: None,
            peak_memory_kb: Some(2.5),
        };
        let record = harness(HarnessConfig::default()).record(
            &invocation(&g),
            WorkerOutcome::Completed(reply),
            Duration::from_millis(5),
        );
        assert_eq!(record.status, RunStatus::Success);
        assert_eq!(record.path_cost, 2.0);
        assert_eq!(record.peak_memory_kb, Some(2.5));
        assert_eq!(record.instance_id.as_deref(), Some("node-1"));
        assert_eq!((record.matrix_rows, record.matrix_cols), (2, 3));
    }

    #[test]
    fn failures_share_the_empty_shape() {
        let g = grid();
        let h = harness(HarnessConfig::default());
        let outcomes = vec![
            WorkerOutcome::TimedOut(Duration::from_secs(2)),
            WorkerOutcome::Crashed("crashed without result (signal 9)".to_string()),
            WorkerOutcome::Completed(WorkerReply {
                path: None,
                error: Some("start row 9 out of range".to_string()),
                peak_memory_kb: None,
            }),
        ];
        let records: Vec<RunRecord> = outcomes
            .into_iter()
            .map(|outcome| h.record(&invocation(&g), outcome, Duration::from_secs(2)))
            .collect();
        for record in &records {
            assert!(record.path.is_empty());
            assert_eq!(record.path_cost, 0.0);
            assert_eq!(record.peak_memory_kb, None);
            assert!(record.error_message.is_some());
        }
        assert_eq!(records[0].status, RunStatus::TimedOut);
        assert_eq!(records[0].error_message.as_deref(), Some("timeout after 2s"));
        assert_eq!(records[1].status, RunStatus::Errored);
        assert_eq!(records[2].status, RunStatus::Errored);
    }

    #[test]
    fn illegal_reply_path_is_rejected() {
        let g = grid();
        let reply = WorkerReply {
            path: Some(vec![Step::new(0, 1), Step::new(2, 0)]),
            error: None,
            peak_memory_kb: Some(1.0),
        };
        let record = harness(HarnessConfig::default()).record(
            &invocation(&g),
            WorkerOutcome::Completed(reply),
            Duration::ZERO,
        );
        assert_eq!(record.status, RunStatus::Errored);
        assert!(record.path.is_empty());
        assert!(
            record
                .error_message
                .expect("message")
                .contains("illegal path")
        );
    }

    #[test]
    fn missing_worker_binary_is_recorded_not_raised() {
        let g = grid();
        let h = Harness::new(
            WorkerCommand::crossing("/definitely/not/crossing"),
            HarnessConfig::default(),
        );
        let record = h.run(&invocation(&g));
        assert_eq!(record.status, RunStatus::Errored);
        assert!(
            record
                .error_message
                .expect("message")
                .contains("failed to run worker")
        );
    }
}
