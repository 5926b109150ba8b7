//! Process execution with deadlines and captured output.
//!
//! The [`Executor`] trait is the seam between the [`Client`](crate::client::Client)
//! and the operating system. [`SystemExecutor`] spawns real processes;
//! tests substitute the mock in [`test_helpers`].
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::error::ExecError;

/// A fully described, non-interactive process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Short label used in logs and errors (e.g. `status`, `git log`).
    pub label: String,
    /// Program to run.
    pub program: PathBuf,
    /// Arguments, baseline flags included.
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
    /// Deadline after which the child is killed.
    pub timeout: Duration,
}

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// `true` when the process exited with status 0.
    pub success: bool,
    /// Exit code; `None` when the process was ended by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Standard output followed by standard error, as one buffer.
    #[must_use]
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        if self.stdout.is_empty() {
            return self.stderr.clone();
        }
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        out.push_str(&self.stdout);
        if !self.stdout.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// Runs invocations and reports their outcome without judging the exit code.
///
/// Implementations must return `Ok` for any process that ran to completion,
/// whatever its exit status; only spawn failures and timeouts are errors.
pub trait Executor: Send + Sync + fmt::Debug {
    /// Run `invocation` to completion or until its deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] if the process cannot be started,
    /// [`ExecError::Timeout`] if it outlives its deadline, and
    /// [`ExecError::Wait`] if its status or output cannot be collected.
    fn execute(&self, invocation: &Invocation) -> Result<ExecResult, ExecError>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// Executor backed by real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<ExecResult, ExecError> {
        run_with_timeout(invocation)
    }

    fn which(&self, program: &str) -> bool {
        which(program)
    }
}

/// Resolve `program` on `PATH`, returning its full path.
#[must_use]
pub fn resolve(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

/// Check if a program is available on `PATH`.
#[must_use]
pub fn which(program: &str) -> bool {
    if Path::new(program).is_absolute() {
        return Path::new(program).is_file();
    }
    resolve(program).is_some()
}

/// Spawn the invocation, drain both pipes, and enforce its deadline.
fn run_with_timeout(inv: &Invocation) -> Result<ExecResult, ExecError> {
    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in &inv.env {
        cmd.env(k, v);
    }

    debug!(subcommand = %inv.label, args = ?inv.args, "spawning chezmoi");
    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        subcommand: inv.label.clone(),
        source,
    })?;

    let wait_err = |source| ExecError::Wait {
        subcommand: inv.label.clone(),
        source,
    };

    // Drain both pipes while waiting; a full pipe stalls the child.
    let deadline = Instant::now() + inv.timeout;
    let stdout = child.stdout.take().map(spawn_drain);
    let stderr = child.stderr.take().map(spawn_drain);

    let timed_out = || {
        warn!(
            subcommand = %inv.label,
            timeout_ms = inv.timeout.as_millis(),
            "chezmoi timed out"
        );
        ExecError::Timeout {
            subcommand: inv.label.clone(),
            timeout: inv.timeout,
        }
    };

    let Some(status) = child.wait_timeout(inv.timeout).map_err(wait_err)? else {
        child.kill().map_err(wait_err)?;
        child.wait().map_err(wait_err)?;
        return Err(timed_out());
    };

    // A grandchild may still hold the pipes open after the child exits.
    let stdout = collect(stdout, deadline)
        .ok_or_else(timed_out)?
        .map_err(wait_err)?;
    let stderr = collect(stderr, deadline)
        .ok_or_else(timed_out)?
        .map_err(wait_err)?;

    debug!(subcommand = %inv.label, exit_code = ?status.code(), "chezmoi finished");
    Ok(ExecResult {
        stdout,
        stderr,
        success: status.success(),
        code: status.code(),
    })
}

type Drained = mpsc::Receiver<std::io::Result<String>>;

/// Read `reader` to the end on its own thread, delivering the text once.
fn spawn_drain<R: Read + Send + 'static>(reader: R) -> Drained {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(drain(reader));
    });
    rx
}

fn drain<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Wait for a drained pipe until `deadline`. `None` means the deadline
/// passed first; the reader thread is abandoned.
fn collect(rx: Option<Drained>, deadline: Instant) -> Option<std::io::Result<String>> {
    let Some(rx) = rx else {
        return Some(Ok(String::new()));
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(result) => Some(result),
        Err(mpsc::RecvTimeoutError::Timeout) => None,
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Some(Err(std::io::Error::other("output reader thread panicked")))
        }
    }
}
