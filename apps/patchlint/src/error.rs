//! Error taxonomy for configuration and linter execution.
//!
//! `ConfigError` is fatal and raised before any process is spawned.
//! `ExecutionFailure` is scoped to one linter and recorded in the report.
//! Malformed tool output is not an error at all: parsers skip the line.

use std::path::PathBuf;
use thiserror::Error;

/// Problems detected while loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration found in {}; pass --config or add .patchlint.yml", root.display())]
    NotFound { root: PathBuf },

    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML/TOML.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// An entry refers to a linter that is not registered.
    #[error("unknown linter '{name}' (registered: {known})")]
    UnknownLinter { name: String, known: String },

    /// A filefilter rule has no sign or an invalid glob.
    #[error("linter '{linter}': bad filefilter rule '{rule}': {reason}")]
    BadFilterRule {
        linter: String,
        rule: String,
        reason: String,
    },

    /// An option was rejected when overlaid onto the linter's defaults.
    #[error("linter '{linter}': invalid option: {reason}")]
    InvalidOption { linter: String, reason: String },

    /// The configuration has the wrong overall shape.
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// The worker pool could not be created.
    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),
}

impl ConfigError {
    pub fn invalid_option(linter: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidOption {
            linter: linter.into(),
            reason: reason.to_string(),
        }
    }
}

/// A linter run that did not complete correctly.
///
/// Distinct from a run that completed and found issues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionFailure {
    #[error("could not start `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("`{command}` failed (exit {}): {stderr}", display_code(.code))]
    Rejected {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` timed out after {seconds}s")]
    TimedOut { command: String, seconds: u64 },

    #[error("i/o error: {0}")]
    Io(String),

    #[error("could not compute diff: {0}")]
    Diff(String),
}

/// Anything that stops a run before a report can be produced.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The diff supplier failed; no candidates could be computed.
    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "terminated".to_string(), |c| c.to_string())
}
