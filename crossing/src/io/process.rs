//! Child process execution with a deadline and cooperative-then-forced termination.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Limits applied to one child run.
#[derive(Debug, Clone, Copy)]
pub struct ProcessLimits {
    /// Deadline for the child to exit on its own.
    pub timeout: Duration,
    /// Time allowed between the graceful stop request and a forced kill.
    pub grace_period: Duration,
    /// Maximum stderr bytes kept in memory.
    pub stderr_limit_bytes: usize,
}

/// How the child run ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The child exited before the deadline.
    Exited {
        status: ExitStatus,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        stderr_truncated: usize,
    },
    /// The deadline passed; the child was stopped and its output discarded.
    TimedOut {
        /// `true` if the child ignored the graceful stop and had to be killed.
        forced: bool,
    },
}

/// Spawn `cmd`, feed it `stdin`, and wait up to `limits.timeout` for it to exit.
///
/// Input is fed and output drained on their own threads, so neither a child
/// that never reads nor a chatty one can hold up the deadline. On timeout the
/// child is asked to stop (SIGTERM on Unix), given `limits.grace_period`, then
/// killed; the I/O threads are abandoned so late output is never consumed.
#[instrument(skip_all, fields(timeout_secs = limits.timeout.as_secs_f64(), grace_secs = limits.grace_period.as_secs_f64()))]
pub fn run_with_deadline(
    mut cmd: Command,
    stdin: &[u8],
    limits: ProcessLimits,
) -> Result<ProcessOutcome> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let child_stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin was not piped"))?;
    let stderr_limit = limits.stderr_limit_bytes;
    let input = stdin.to_vec();
    let stdin_handle = thread::spawn(move || write_stdin(child_stdin, &input));
    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, usize::MAX));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, stderr_limit));

    let Some(status) = child.wait_timeout(limits.timeout).context("wait for command")? else {
        warn!(
            timeout_secs = limits.timeout.as_secs_f64(),
            "command timed out, stopping"
        );
        let forced = stop(&mut child, limits.grace_period)?;
        drop(stdin_handle);
        drop(stdout_handle);
        drop(stderr_handle);
        return Ok(ProcessOutcome::TimedOut { forced });
    };

    match stdin_handle.join() {
        Ok(result) => result?,
        Err(_) => return Err(anyhow!("stdin writer thread panicked")),
    }
    let (stdout, _) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;
    if stderr_truncated > 0 {
        warn!(stderr_truncated, "stderr truncated");
    }

    debug!(exit_code = ?status.code(), "command finished");
    Ok(ProcessOutcome::Exited {
        status,
        stdout,
        stderr,
        stderr_truncated,
    })
}

/// Write the job and close stdin. A child that exits without reading its
/// input shows up as a broken pipe, which is left for the exit status to explain.
fn write_stdin(mut child_stdin: ChildStdin, input: &[u8]) -> Result<()> {
    match child_stdin.write_all(input) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            warn!("child closed stdin before reading the job");
            Ok(())
        }
        Err(e) => Err(e).context("write stdin"),
    }
}

/// Ask the child to stop, then kill it if it outlives `grace`.
///
/// Returns `true` when the forced kill was needed.
fn stop(child: &mut Child, grace: Duration) -> Result<bool> {
    request_stop(child);
    if child
        .wait_timeout(grace)
        .context("wait for graceful stop")?
        .is_some()
    {
        debug!("child exited after stop request");
        return Ok(false);
    }
    warn!(grace_secs = grace.as_secs_f64(), "child ignored stop request, killing");
    child.kill().context("kill command")?;
    child.wait().context("wait command after kill")?;
    Ok(true)
}

#[cfg(unix)]
fn request_stop(child: &Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(child.id()) else {
        return;
    };
    if let Err(err) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
        warn!(%err, "SIGTERM failed");
    }
}

#[cfg(not(unix))]
fn request_stop(_child: &Child) {
    // No graceful signal available; the grace wait is followed by a kill.
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
