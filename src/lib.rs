#![forbid(unsafe_code)]
//! Golden-file conformance harness
//!
//! `golden` validates an external program (typically a language interpreter)
//! against a directory of golden-file fixtures: for each `<name>.txt` holding
//! expected stdout there is a `<name>.ava` source file fed to the program
//! under test. Each case runs in its own child process under a timeout, its
//! stdout is compared byte-for-byte (with optional normalization) against the
//! golden file, and outcomes stream into a report as they complete.
//!
//! The program under test is a black box invoked as
//! `<executable> <args...> <source-path>`; a nonzero exit from it is data on
//! the execution result, never a harness error.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod harness;

pub use harness::suite::{Harness, RunSummary, SuiteConfig};
