//! Aggregated outcome of one run across all linters.

use crate::error::ExecutionFailure;
use crate::linters::Mode;
use crate::models::Message;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Progress of one linter through a run.
///
/// `Pending → SelectingFiles → Invoking → Parsing → Filtering → Aggregated`,
/// or `Failed` when the tool did not run correctly. A failed linter never
/// stops the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    SelectingFiles,
    Invoking,
    Parsing,
    Filtering,
    Aggregated,
    Failed,
}

/// Per-linter record kept alongside the merged messages.
#[derive(Debug, Clone, Serialize)]
pub struct LinterRun {
    pub name: String,
    pub mode: Mode,
    pub stage: Stage,
    /// Files handed to the linter after filtering.
    pub files: usize,
    /// Messages returned before diff suppression.
    pub raw_count: usize,
    /// Messages that survived diff suppression.
    pub kept: usize,
    #[serde(serialize_with = "display_failure", skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExecutionFailure>,
}

impl LinterRun {
    pub fn new(name: impl Into<String>, mode: Mode) -> Self {
        Self {
            name: name.into(),
            mode,
            stage: Stage::Pending,
            files: 0,
            raw_count: 0,
            kept: 0,
            failure: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Whether the linter was skipped for lack of files.
    pub fn skipped(&self) -> bool {
        self.files == 0 && !self.failed()
    }
}

fn display_failure<S: Serializer>(
    failure: &Option<ExecutionFailure>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match failure {
        Some(err) => serializer.serialize_str(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Overall outcome, keeping "tool broke" apart from "tool found issues".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Clean,
    FindingsPresent,
    ExecutionFailed,
}

/// Merged, sorted and deduplicated findings plus the pass/fail verdict.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub messages: Vec<Message>,
    pub per_linter_raw_count: BTreeMap<String, usize>,
    pub linters: Vec<LinterRun>,
    pub ok: bool,
}

impl Report {
    /// Merge per-linter results. Completion order does not matter: the
    /// messages are sorted and exact duplicates dropped.
    pub fn aggregate(results: Vec<(LinterRun, Vec<Message>)>) -> Self {
        let mut messages = Vec::new();
        let mut per_linter_raw_count: BTreeMap<String, usize> = BTreeMap::new();
        let mut linters = Vec::with_capacity(results.len());
        for (run, found) in results {
            *per_linter_raw_count.entry(run.name.clone()).or_default() += run.raw_count;
            messages.extend(found);
            linters.push(run);
        }
        messages.sort();
        messages.dedup();
        let ok = messages.is_empty() && !linters.iter().any(LinterRun::failed);
        Self {
            messages,
            per_linter_raw_count,
            linters,
            ok,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.linters.iter().any(LinterRun::failed) {
            Verdict::ExecutionFailed
        } else if !self.messages.is_empty() {
            Verdict::FindingsPresent
        } else {
            Verdict::Clean
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &LinterRun> + '_ {
        self.linters.iter().filter(|run| run.failed())
    }
}
