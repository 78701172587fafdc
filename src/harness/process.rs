//! Child process execution with full output capture and a bounded wait.
//!
//! Each invocation is isolated: its own child process, null stdin, piped
//! stdout/stderr drained on dedicated reader threads so the child can never
//! deadlock against a full pipe while the parent polls for exit.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Exit-poll interval while a child is running.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default bound on how long a killed child may take to be reaped.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_millis(2000);

/// The program under test could not be run at all.
///
/// A child that starts and exits nonzero is not an error; its exit code is
/// data on [`ExecutionResult`].
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("cannot execute '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting on child process: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
}

/// How to invoke the program under test.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Path to the executable under test.
    pub program: PathBuf,
    /// Arguments placed before the source path, e.g. `["run"]`.
    pub base_args: Vec<String>,
    /// Working directory for the child; `None` inherits the harness cwd.
    pub cwd: Option<PathBuf>,
    /// Run-wide wall-clock limit per case.
    pub timeout: Duration,
    /// Bound on the reap wait after a kill.
    pub kill_grace: Duration,
}

/// Captured output and status of one invocation. Produced exactly once per
/// test case and never shared across cases.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Full captured stdout, lossily decoded.
    pub stdout: String,
    /// Full captured stderr, lossily decoded. Retained for diagnostics on
    /// crashing children.
    pub stderr: String,
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    /// The child exceeded its time limit and was killed.
    pub timed_out: bool,
    /// The run was interrupted and the child was killed.
    pub cancelled: bool,
}

/// Spawns and supervises one child process per [`run`](ProcessRunner::run)
/// call. Holds no mutable state, so a single runner can serve concurrent
/// cases.
pub struct ProcessRunner {
    config: RunnerConfig,
    cancel: Arc<AtomicBool>,
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig, cancel: Arc<AtomicBool>) -> Self {
        Self { config, cancel }
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Run the program under test against one source file, capturing output
    /// until exit, timeout, or cancellation.
    pub fn run(
        &self,
        source_path: &Path,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, LaunchError> {
        let timeout = timeout.unwrap_or(self.config.timeout);

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.base_args)
            .arg(source_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.config.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!(
            program = %self.config.program.display(),
            source = %source_path.display(),
            "spawning program under test"
        );

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;

        let stdout_reader = child
            .stdout
            .take()
            .map(|mut out| thread::spawn(move || read_all(&mut out)));
        let stderr_reader = child
            .stderr
            .take()
            .map(|mut err| thread::spawn(move || read_all(&mut err)));

        let mut timed_out = false;
        let mut cancelled = false;
        let exit_status = loop {
            if let Some(status) = child.try_wait().map_err(|source| LaunchError::Wait { source })? {
                break Some(status);
            }
            if self.cancel.load(Ordering::SeqCst) {
                cancelled = true;
                break kill_and_reap(&mut child, self.config.kill_grace)?;
            }
            if start.elapsed() >= timeout {
                timed_out = true;
                break kill_and_reap(&mut child, self.config.kill_grace)?;
            }
            thread::sleep(POLL_INTERVAL);
        };

        let duration = start.elapsed();
        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);

        Ok(ExecutionResult {
            stdout,
            stderr,
            exit_code: exit_status.and_then(|status| status.code()),
            duration,
            timed_out,
            cancelled,
        })
    }
}

/// Kill the child and wait for it to be reaped, bounded by `grace`.
///
/// `std::process` offers no portable graceful signal; the kill is forcible
/// and the grace period only bounds the reap wait.
fn kill_and_reap(child: &mut Child, grace: Duration) -> Result<Option<ExitStatus>, LaunchError> {
    let _ = child.kill();
    let deadline = Instant::now() + grace;
    loop {
        if let Some(status) = child.try_wait().map_err(|source| LaunchError::Wait { source })? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            tracing::warn!("killed child was not reaped within the grace period");
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn read_all<R: Read>(reader: &mut R) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    buf
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle.and_then(|h| h.join().ok()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
