//! CLI for the golden conformance harness.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! `execute()` returns `CliResult<ExitCode>` instead of calling
//! `process::exit`. Only the top-level `run()` function handles errors and
//! exits.
//!
//! Exit codes: 0 when every case passes, 1 when any case fails, 2 on
//! infrastructure errors (fixtures unloadable, executable missing,
//! interrupted run).

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;

use crate::harness::compare::Normalization;
use crate::harness::process::{DEFAULT_KILL_GRACE, RunnerConfig};
use crate::harness::report::{ConsoleReporter, JsonReporter, Reporter};
use crate::harness::suite::{Harness, SuiteConfig};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    /// Every case passed.
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// At least one case failed.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run itself could not be carried out.
    pub const INFRASTRUCTURE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// An infrastructure error (exit code 2).
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::INFRASTRUCTURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Golden-file conformance harness for an external program under test
#[derive(Parser, Debug)]
#[command(name = "golden")]
#[command(version = VERSION)]
#[command(
    about = "Run golden-file conformance tests against an external program",
    long_about = None
)]
pub struct Cli {
    /// Program under test
    #[arg(long = "exec", value_name = "PATH")]
    pub exec: PathBuf,

    /// Fixture directory holding paired golden and source files
    #[arg(long = "dir", value_name = "PATH", default_value = "tests")]
    pub dir: PathBuf,

    /// Argument placed before the source path (repeatable)
    #[arg(
        long = "arg",
        value_name = "ARG",
        default_value = "run",
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,

    /// Working directory for the program under test
    #[arg(long = "cwd", value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// Extension of source files fed to the program under test
    #[arg(long = "source-ext", value_name = "EXT", default_value = "ava")]
    pub source_ext: String,

    /// Extension of golden files holding expected stdout
    #[arg(long = "golden-ext", value_name = "EXT", default_value = "txt")]
    pub golden_ext: String,

    /// Per-case timeout in milliseconds
    #[arg(long = "timeout-ms", value_name = "INT", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Stop at the first failure; remaining cases are skipped
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Only run cases whose name contains this substring
    #[arg(long = "filter", value_name = "PATTERN")]
    pub filter: Option<String>,

    /// Number of cases to run concurrently
    #[arg(long = "jobs", value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Fold CRLF line endings into LF before comparing
    #[arg(long = "normalize-crlf")]
    pub normalize_crlf: bool,

    /// Ignore a single trailing newline on either side
    #[arg(long = "ignore-trailing-newline")]
    pub ignore_trailing_newline: bool,

    /// Emit a machine-readable JSON summary instead of the console report
    #[arg(long = "json")]
    pub json: bool,

    /// Show per-case durations and extra detail
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn suite_config(&self) -> SuiteConfig {
        SuiteConfig {
            fixture_dir: self.dir.clone(),
            golden_ext: self.golden_ext.clone(),
            source_ext: self.source_ext.clone(),
            filter: self.filter.clone(),
            runner: RunnerConfig {
                program: self.exec.clone(),
                base_args: self.args.clone(),
                cwd: self.cwd.clone(),
                timeout: Duration::from_millis(self.timeout_ms),
                kill_grace: DEFAULT_KILL_GRACE,
            },
            normalization: Normalization {
                line_endings: self.normalize_crlf,
                trailing_newline: self.ignore_trailing_newline,
            },
            fail_fast: self.fail_fast,
            jobs: self.jobs.max(1),
        }
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. `execute` returns
/// `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the run and map its result to an exit code.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    // A program given as a path must exist up front. Bare names ("python3")
    // resolve through PATH at spawn time instead; their failures surface per
    // case as launch errors.
    if cli.exec.components().count() > 1 && !cli.exec.exists() {
        return Err(CliError::infrastructure(format!(
            "error: executable '{}' not found",
            cli.exec.display()
        )));
    }

    let json = cli.json;
    let verbose = cli.verbose;
    let mut harness = Harness::new(cli.suite_config());

    // Ctrl-C sets the shared flag; the orchestrator kills in-flight children
    // and skips the rest, then the report still renders.
    let cancel = harness.cancel_flag();
    if let Err(err) = ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst)) {
        tracing::warn!("cannot install interrupt handler: {err}");
    }

    let mut reporter: Box<dyn Reporter> = if json {
        Box::new(JsonReporter::stdout())
    } else {
        Box::new(ConsoleReporter::stdout(verbose))
    };

    let summary = harness
        .run(reporter.as_mut())
        .map_err(|err| CliError::infrastructure(format!("error: {err}")))?;

    if harness.interrupted() {
        return Err(CliError::infrastructure("interrupted"));
    }
    Ok(ExitCode(summary.exit_code()))
}

// ============================================================================
// Tests
// ============================================================================
