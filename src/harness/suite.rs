//! Harness orchestration: load fixtures, run each case, compare, report.
//!
//! The run moves through `Idle -> Loading -> Running -> Reporting -> Done`,
//! with `Failed` as a terminal state when fixture loading itself fails (an
//! infrastructure error, not a test failure). Per-case failures never abort
//! the run; they surface only in the report.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crate::harness::compare::{self, DiffSummary, Normalization};
use crate::harness::fixture::{self, FixtureError, TestCase};
use crate::harness::process::{ExecutionResult, ProcessRunner, RunnerConfig};
use crate::harness::report::Reporter;

/// Why a case failed.
#[derive(Debug, Clone)]
pub enum FailureReason {
    /// Output did not match the golden file.
    Mismatch(DiffSummary),
    /// The child exceeded its time limit.
    TimedOut { limit: Duration },
    /// The program under test could not be executed at all.
    Launch(String),
    /// The run was interrupted while this case was executing.
    Interrupted,
}

#[derive(Debug, Clone)]
pub enum CaseStatus {
    Passed {
        execution: ExecutionResult,
    },
    Failed {
        /// Absent when the child could not be spawned.
        execution: Option<ExecutionResult>,
        reason: FailureReason,
    },
    /// Not executed: fail-fast stopped the run earlier, or it was interrupted.
    Skipped,
}

/// One case's final status. Exactly one per loaded [`TestCase`].
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub name: String,
    pub source_path: PathBuf,
    pub status: CaseStatus,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        matches!(self.status, CaseStatus::Passed { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self.status, CaseStatus::Failed { .. })
    }

    pub fn skipped(&self) -> bool {
        matches!(self.status, CaseStatus::Skipped)
    }

    fn skipped_case(case: &TestCase) -> Self {
        Self {
            name: case.name.clone(),
            source_path: case.source_path.clone(),
            status: CaseStatus::Skipped,
        }
    }
}

/// Aggregated results, in fixture-load order. `passed + failed + skipped`
/// always equals `total`. Never mutated after reporting completes.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<TestOutcome>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: Duration,
}

impl RunSummary {
    fn push(&mut self, outcome: TestOutcome) {
        self.total += 1;
        match outcome.status {
            CaseStatus::Passed { .. } => self.passed += 1,
            CaseStatus::Failed { .. } => self.failed += 1,
            CaseStatus::Skipped => self.skipped += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Process exit code for this run: 0 when nothing failed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 { 0 } else { 1 }
    }
}

/// Run configuration, owned by the orchestrator for the whole run.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub fixture_dir: PathBuf,
    pub golden_ext: String,
    pub source_ext: String,
    /// Substring filter on case names.
    pub filter: Option<String>,
    pub runner: RunnerConfig,
    pub normalization: Normalization,
    /// Stop at the first failure; remaining cases are recorded as skipped.
    pub fail_fast: bool,
    /// Bounded worker pool size. Fail-fast forces sequential execution so no
    /// case after the first failure is ever dispatched.
    pub jobs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Running,
    Reporting,
    Done,
    /// Fixture loading failed; nothing was run.
    Failed,
}

/// Composes the loader, runner, comparator, and reporter into one run.
pub struct Harness {
    config: SuiteConfig,
    cancel: Arc<AtomicBool>,
    phase: Phase,
}

impl Harness {
    pub fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            phase: Phase::Idle,
        }
    }

    /// Shared flag that aborts the run when set; in-flight children are
    /// killed. Hand this to a signal handler.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn interrupted(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Execute the whole suite, streaming outcomes to `reporter` in
    /// fixture-load order regardless of execution order.
    pub fn run(&mut self, reporter: &mut dyn Reporter) -> Result<RunSummary, FixtureError> {
        self.phase = Phase::Loading;
        let cases = match fixture::load_fixtures(
            &self.config.fixture_dir,
            &self.config.golden_ext,
            &self.config.source_ext,
            self.config.filter.as_deref(),
        ) {
            Ok(cases) => cases,
            Err(err) => {
                self.phase = Phase::Failed;
                return Err(err);
            }
        };

        self.phase = Phase::Running;
        reporter.on_collection_complete(cases.len());

        let start = Instant::now();
        let runner = ProcessRunner::new(self.config.runner.clone(), self.cancel.clone());

        let mut summary = RunSummary::default();
        if self.config.jobs > 1 && !self.config.fail_fast {
            self.run_parallel(&cases, &runner, reporter, &mut summary);
        } else {
            self.run_sequential(&cases, &runner, reporter, &mut summary);
        }

        self.phase = Phase::Reporting;
        summary.duration = start.elapsed();
        reporter.on_run_complete(&summary);
        self.phase = Phase::Done;
        Ok(summary)
    }

    fn run_sequential(
        &self,
        cases: &[TestCase],
        runner: &ProcessRunner,
        reporter: &mut dyn Reporter,
        summary: &mut RunSummary,
    ) {
        let mut halted = false;
        for case in cases {
            if halted || self.cancel.load(Ordering::SeqCst) {
                record(summary, reporter, TestOutcome::skipped_case(case));
                continue;
            }

            reporter.on_case_start(&case.name);
            let outcome = self.execute_case(case, runner);
            if self.config.fail_fast && outcome.failed() {
                halted = true;
            }
            record(summary, reporter, outcome);
        }
    }

    /// Bounded pool: workers claim cases by atomic index; the caller thread
    /// streams finished outcomes to the reporter in fixture order.
    fn run_parallel(
        &self,
        cases: &[TestCase],
        runner: &ProcessRunner,
        reporter: &mut dyn Reporter,
        summary: &mut RunSummary,
    ) {
        let next_case = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<TestOutcome>>> = Mutex::new(vec![None; cases.len()]);
        let ready = Condvar::new();

        thread::scope(|scope| {
            let workers = self.config.jobs.min(cases.len().max(1));
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let idx = next_case.fetch_add(1, Ordering::SeqCst);
                        if idx >= cases.len() {
                            break;
                        }
                        let case = &cases[idx];
                        let outcome = if self.cancel.load(Ordering::SeqCst) {
                            TestOutcome::skipped_case(case)
                        } else {
                            self.execute_case(case, runner)
                        };
                        lock(&slots)[idx] = Some(outcome);
                        ready.notify_all();
                    }
                });
            }

            for idx in 0..cases.len() {
                let outcome = {
                    let mut guard = lock(&slots);
                    loop {
                        if let Some(outcome) = guard[idx].take() {
                            break outcome;
                        }
                        guard = ready.wait(guard).unwrap_or_else(|e| e.into_inner());
                    }
                };
                record(summary, reporter, outcome);
            }
        });
    }

    fn execute_case(&self, case: &TestCase, runner: &ProcessRunner) -> TestOutcome {
        let status = match runner.run(&case.source_path, case.timeout) {
            Err(err) => CaseStatus::Failed {
                execution: None,
                reason: FailureReason::Launch(err.to_string()),
            },
            Ok(execution) if execution.cancelled => CaseStatus::Failed {
                execution: Some(execution),
                reason: FailureReason::Interrupted,
            },
            Ok(execution) if execution.timed_out => {
                let limit = case.timeout.unwrap_or(self.config.runner.timeout);
                CaseStatus::Failed {
                    execution: Some(execution),
                    reason: FailureReason::TimedOut { limit },
                }
            }
            Ok(execution) => {
                let comparison = compare::compare(
                    &case.expected_output,
                    &execution.stdout,
                    self.config.normalization,
                );
                match comparison.diff {
                    None => CaseStatus::Passed { execution },
                    Some(diff) => CaseStatus::Failed {
                        execution: Some(execution),
                        reason: FailureReason::Mismatch(diff),
                    },
                }
            }
        };

        TestOutcome {
            name: case.name.clone(),
            source_path: case.source_path.clone(),
            status,
        }
    }
}

fn record(summary: &mut RunSummary, reporter: &mut dyn Reporter, outcome: TestOutcome) {
    reporter.on_case_complete(&outcome);
    summary.push(outcome);
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
