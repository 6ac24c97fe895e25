//! patchlint core library.
//!
//! This crate runs a configurable set of linters over a repository and
//! merges their findings into one sorted report. When a diff is supplied,
//! only changed files are linted and findings on unchanged lines are
//! suppressed, so legacy code does not block a change.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `diff`: Changed-line index and unified diff parsing.
//! - `error`: Configuration and execution error types.
//! - `filter`: Ordered include/exclude filename rules.
//! - `git`: Candidate files and changed lines from git.
//! - `lint`: The orchestrator driving all linters of a run.
//! - `linters`: The adapter traits, registry and built-in linters.
//! - `models`: Findings and the aggregated report.
//! - `output`: Human/JSON printers.
//! - `process`: External command execution with timeouts.
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod git;
pub mod lint;
pub mod linters;
pub mod models;
pub mod output;
pub mod process;
