//! Harness tests against the real `crossing worker` process.
//!
//! Each test drives `Harness::run` with the built binary as the worker and
//! checks the recorded outcome for success, algorithm errors, timeouts and
//! crashes.

use std::time::{Duration, Instant};

use crossing::core::algorithms::Algorithm;
use crossing::core::grid::Grid;
use crossing::core::record::{RunRecord, RunStatus};
use crossing::io::config::HarnessConfig;
use crossing::io::harness::{Harness, Invocation, WorkerCommand};
use crossing::test_support::{grid, uniform};

fn harness() -> Harness {
    let config = HarnessConfig {
        grace_period_secs: 1,
        ..HarnessConfig::default()
    };
    Harness::new(WorkerCommand::crossing(env!("CARGO_BIN_EXE_crossing")), config)
        .with_instance_id(Some("test-host".to_string()))
}

fn run(
    harness: &Harness,
    algorithm: Algorithm,
    grid: &Grid,
    start_row: usize,
    timeout: Option<Duration>,
) -> RunRecord {
    harness.run(&Invocation {
        algorithm,
        grid,
        matrix_type: "fixture",
        start_row,
        timeout,
    })
}

fn sample_grid() -> Grid {
    grid(&[
        &[3.0, 4.0, 1.0, 2.0, 8.0, 6.0],
        &[6.0, 1.0, 8.0, 2.0, 7.0, 4.0],
        &[5.0, 9.0, 3.0, 9.0, 9.0, 5.0],
        &[8.0, 4.0, 1.0, 3.0, 2.0, 6.0],
        &[3.0, 7.0, 2.0, 8.0, 6.0, 4.0],
    ])
}

#[test]
fn every_algorithm_succeeds_with_the_optimal_cost() {
    let h = harness();
    let g = sample_grid();
    for algorithm in Algorithm::ALL {
        let record = run(&h, algorithm, &g, 0, None);
        assert_eq!(record.status, RunStatus::Success, "{algorithm}: {record:?}");
        assert_eq!(record.path_cost, 16.0, "{algorithm}");
        assert_eq!(record.path.len(), 6);
        assert_eq!(record.error_message, None);
        assert!(record.peak_memory_kb.is_some());
        assert_eq!(record.instance_id.as_deref(), Some("test-host"));
        assert_eq!((record.matrix_rows, record.matrix_cols), (5, 6));
    }
}

#[test]
fn start_row_out_of_range_is_recorded_as_errored() {
    let record = run(&harness(), Algorithm::Tabulation, &sample_grid(), 9, None);
    assert_eq!(record.status, RunStatus::Errored);
    assert!(record.path.is_empty());
    assert_eq!(record.path_cost, 0.0);
    let message = record.error_message.expect("message");
    assert!(message.contains("start row 9 out of range"), "{message}");
}

#[test]
fn empty_grid_succeeds_with_empty_path() {
    let record = run(&harness(), Algorithm::Memoization, &Grid::empty(), 0, None);
    assert_eq!(record.status, RunStatus::Success);
    assert!(record.path.is_empty());
    assert_eq!(record.path_cost, 0.0);
}

#[test]
fn overrunning_worker_is_stopped_within_deadline_plus_grace() {
    // 3^39 candidate paths: far beyond any deadline.
    let g = uniform(6, 40, 1.0);
    let h = harness();
    let started = Instant::now();
    let record = run(&h, Algorithm::BruteForce, &g, 0, Some(Duration::from_secs(1)));
    let elapsed = started.elapsed();

    assert_eq!(record.status, RunStatus::TimedOut);
    assert!(record.path.is_empty());
    assert_eq!(record.path_cost, 0.0);
    assert_eq!(record.peak_memory_kb, None);
    assert_eq!(record.error_message.as_deref(), Some("timeout after 1s"));
    // Deadline + grace, plus slack for process start-up.
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
}

#[test]
fn later_invocations_run_after_a_timeout_in_issue_order() {
    let h = harness();
    let slow = uniform(6, 40, 1.0);
    let quick = sample_grid();
    let records = vec![
        run(&h, Algorithm::Tabulation, &quick, 1, None),
        run(&h, Algorithm::DivideAndConquer, &slow, 0, Some(Duration::from_millis(500))),
        run(&h, Algorithm::Backtracking, &quick, 2, None),
    ];
    let statuses: Vec<RunStatus> = records.iter().map(|record| record.status).collect();
    assert_eq!(
        statuses,
        vec![RunStatus::Success, RunStatus::TimedOut, RunStatus::Success]
    );
    let starts: Vec<usize> = records.iter().map(|record| record.start_position).collect();
    assert_eq!(starts, vec![1, 0, 2]);
}

#[cfg(unix)]
#[test]
fn worker_that_never_reads_its_job_still_times_out_on_deadline() {
    let config = HarnessConfig {
        grace_period_secs: 1,
        ..HarnessConfig::default()
    };
    let h = Harness::new(
        WorkerCommand::new("/bin/sh", vec!["-c".to_string(), "sleep 8".to_string()]),
        config,
    );
    // The serialized job is several times the size of a pipe buffer.
    let g = uniform(200, 200, 1.0);
    let started = Instant::now();
    let record = run(&h, Algorithm::Tabulation, &g, 0, Some(Duration::from_secs(1)));
    let elapsed = started.elapsed();

    assert_eq!(record.status, RunStatus::TimedOut);
    assert_eq!(record.error_message.as_deref(), Some("timeout after 1s"));
    assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}");
}

#[cfg(unix)]
#[test]
fn worker_exiting_without_reply_is_a_crash() {
    let h = Harness::new(
        WorkerCommand::new("/bin/sh", vec!["-c".to_string(), "exit 3".to_string()]),
        HarnessConfig::default(),
    );
    let record = run(&h, Algorithm::Memoization, &sample_grid(), 0, None);
    assert_eq!(record.status, RunStatus::Errored);
    assert!(record.path.is_empty());
    assert_eq!(
        record.error_message.as_deref(),
        Some("crashed without result (exit code 3)")
    );
}

#[cfg(unix)]
#[test]
fn worker_killed_by_signal_is_a_crash() {
    let h = Harness::new(
        WorkerCommand::new("/bin/sh", vec!["-c".to_string(), "kill -9 $$".to_string()]),
        HarnessConfig::default(),
    );
    let record = run(&h, Algorithm::Memoization, &sample_grid(), 0, None);
    assert_eq!(record.status, RunStatus::Errored);
    assert_eq!(
        record.error_message.as_deref(),
        Some("crashed without result (signal 9)")
    );
}

#[test]
fn tabulation_reports_heap_growth_on_a_large_grid() {
    let g = uniform(200, 200, 1.0);
    let record = run(&harness(), Algorithm::Tabulation, &g, 0, None);
    assert_eq!(record.status, RunStatus::Success);
    assert_eq!(record.path_cost, 200.0);
    // 200 x 200 f64 cost table alone is 312.5 KiB.
    let peak = record.peak_memory_kb.expect("peak");
    assert!(peak >= 300.0, "peak {peak} KiB");
}
