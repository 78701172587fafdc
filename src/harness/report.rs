//! Run reporting.
//!
//! Reporting goes through the [`Reporter`] trait so output formats stay
//! separate from execution. `ConsoleReporter` streams one line per case as
//! outcomes arrive, so progress is visible before the run finishes;
//! `JsonReporter` emits a single machine-readable document at the end.

use std::io::{self, Write};

use serde::Serialize;

use crate::harness::suite::{CaseStatus, FailureReason, RunSummary, TestOutcome};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Observes a run as it progresses. Outcomes arrive in fixture-load order.
pub trait Reporter {
    /// Called once fixtures are collected, before any case runs.
    fn on_collection_complete(&mut self, _case_count: usize) {}

    /// Called before a case executes. Sequential runs only; a worker pool
    /// starts cases concurrently and does not announce them.
    fn on_case_start(&mut self, _name: &str) {}

    /// Called as each outcome is finalized.
    fn on_case_complete(&mut self, outcome: &TestOutcome);

    /// Called after the last outcome with the finalized summary.
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Human-readable streaming report with ANSI colors.
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbose: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(io::stdout(), verbose)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_collection_complete(&mut self, case_count: usize) {
        let _ = writeln!(self.out, "collected {case_count} case(s)");
        let _ = writeln!(self.out);
    }

    fn on_case_complete(&mut self, outcome: &TestOutcome) {
        let name = &outcome.name;
        match &outcome.status {
            CaseStatus::Passed { execution } => {
                if self.verbose {
                    let _ = writeln!(
                        self.out,
                        "{name}: {GREEN}PASS{RESET} ({}ms)",
                        execution.duration.as_millis()
                    );
                } else {
                    let _ = writeln!(self.out, "{name}: {GREEN}PASS{RESET}");
                }
            }
            CaseStatus::Skipped => {
                let _ = writeln!(self.out, "{name}: {YELLOW}SKIP{RESET}");
            }
            CaseStatus::Failed { execution, reason } => {
                let _ = writeln!(self.out, "{name}: {RED}FAIL{RESET}");
                match reason {
                    FailureReason::Mismatch(diff) => {
                        for line in diff.to_string().lines() {
                            let _ = writeln!(self.out, "    {line}");
                        }
                    }
                    FailureReason::TimedOut { limit } => {
                        let _ = writeln!(
                            self.out,
                            "    timed out after {}ms; child was killed",
                            limit.as_millis()
                        );
                    }
                    FailureReason::Launch(msg) => {
                        let _ = writeln!(self.out, "    could not execute program under test: {msg}");
                    }
                    FailureReason::Interrupted => {
                        let _ = writeln!(self.out, "    interrupted before completion");
                    }
                }
                if let Some(execution) = execution {
                    if let Some(code) = execution.exit_code {
                        if code != 0 {
                            let _ = writeln!(self.out, "    exit code: {code}");
                        }
                    }
                    if !execution.stderr.is_empty() {
                        let _ = writeln!(self.out, "    stderr:");
                        for line in execution.stderr.lines() {
                            let _ = writeln!(self.out, "      {line}");
                        }
                    }
                }
            }
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        let color = if summary.failed > 0 { RED } else { GREEN };
        let _ = writeln!(self.out);
        let _ = writeln!(
            self.out,
            "{BOLD}{color}====== {} passed, {} failed, {} skipped ({} total) in {:.2}s ======{RESET}",
            summary.passed,
            summary.failed,
            summary.skipped,
            summary.total,
            summary.duration.as_secs_f64()
        );
    }
}

/// Machine-readable report: one JSON document on run completion.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

#[derive(Serialize)]
struct JsonCase<'a> {
    name: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u128>,
    timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    duration_ms: u128,
    cases: Vec<JsonCase<'a>>,
}

impl<'a> From<&'a TestOutcome> for JsonCase<'a> {
    fn from(outcome: &'a TestOutcome) -> Self {
        let (status, execution, detail) = match &outcome.status {
            CaseStatus::Passed { execution } => ("passed", Some(execution), None),
            CaseStatus::Skipped => ("skipped", None, None),
            CaseStatus::Failed { execution, reason } => {
                let detail = match reason {
                    FailureReason::Mismatch(diff) => diff.to_string(),
                    FailureReason::TimedOut { limit } => {
                        format!("timed out after {}ms", limit.as_millis())
                    }
                    FailureReason::Launch(msg) => format!("could not execute: {msg}"),
                    FailureReason::Interrupted => "interrupted".to_string(),
                };
                ("failed", execution.as_ref(), Some(detail))
            }
        };

        JsonCase {
            name: &outcome.name,
            status,
            exit_code: execution.and_then(|e| e.exit_code),
            duration_ms: execution.map(|e| e.duration.as_millis()),
            timed_out: execution.is_some_and(|e| e.timed_out),
            detail,
        }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn on_case_complete(&mut self, _outcome: &TestOutcome) {}

    fn on_run_complete(&mut self, summary: &RunSummary) {
        let doc = JsonSummary {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
            duration_ms: summary.duration.as_millis(),
            cases: summary.outcomes.iter().map(JsonCase::from).collect(),
        };
        if serde_json::to_writer_pretty(&mut self.out, &doc).is_ok() {
            let _ = writeln!(self.out);
        }
    }
}
