//! Golden-file conformance harness.
//!
//! A run flows through the components in order: [`fixture`] discovers test
//! cases from a directory of paired files, [`process`] executes the program
//! under test against each source file, [`compare`] checks the captured
//! stdout against the golden file, and [`report`] renders outcomes as they
//! arrive. [`suite`] composes them and owns the run state.

pub mod compare;
pub mod fixture;
pub mod process;
pub mod report;
pub mod suite;

pub use compare::{Comparison, DiffSummary, Normalization, compare};
pub use fixture::{FixtureError, TestCase, load_fixtures};
pub use process::{DEFAULT_KILL_GRACE, ExecutionResult, LaunchError, ProcessRunner, RunnerConfig};
pub use report::{ConsoleReporter, JsonReporter, Reporter};
pub use suite::{
    CaseStatus, FailureReason, Harness, Phase, RunSummary, SuiteConfig, TestOutcome,
};
