//! Orchestrator: runs every configured linter and merges their findings.
//!
//! Configuration is validated completely in [`Orchestrator::new`], before any
//! process is spawned. [`Orchestrator::run`] then drives each linter through
//! file selection, invocation, filename normalization and diff suppression
//! on a bounded rayon pool. Linters are isolated from each other: a failure
//! in one is recorded in its `LinterRun` and never aborts the others.

use crate::config::LinterEntry;
use crate::diff::DiffLineIndex;
use crate::error::ConfigError;
use crate::filter::FileFilter;
use crate::linters::{Job, Linter, LinterRegistry, Mode, RunContext, Selection};
use crate::models::{LinterRun, Message, Report, Stage};
use rayon::prelude::*;
use serde_json::Value as Json;
use tracing::{debug, warn};

/// A linter with its compiled filter and merged options.
struct Planned<'r> {
    linter: &'r dyn Linter,
    filter: FileFilter,
    job: Box<dyn Job + 'r>,
}

pub struct Orchestrator<'r> {
    plan: Vec<Planned<'r>>,
    pool: rayon::ThreadPool,
}

impl<'r> Orchestrator<'r> {
    /// Validate `entries` against `registry` and size the worker pool.
    ///
    /// # Errors
    ///
    /// Returns the first configuration problem found: an unknown linter
    /// name, a bad `filefilter` rule, or an option the linter rejects.
    pub fn new(
        registry: &'r LinterRegistry,
        entries: &[LinterEntry],
        jobs: usize,
    ) -> Result<Self, ConfigError> {
        let plan = entries
            .iter()
            .map(|entry| plan_entry(registry, entry))
            .collect::<Result<Vec<_>, _>>()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .thread_name(|i| format!("patchlint-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;
        Ok(Self { plan, pool })
    }

    /// Names of the planned linters, in configuration order.
    pub fn linters(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plan.iter().map(|p| p.linter.name())
    }

    /// Run all planned linters over `candidates`.
    ///
    /// With `diff` present, diff-aware linters only see files with changed
    /// lines and every message on an unchanged line is suppressed. Without
    /// it, nothing is suppressed.
    pub fn run(
        &self,
        ctx: &RunContext<'_>,
        candidates: &[String],
        diff: Option<&DiffLineIndex>,
    ) -> Report {
        let results: Vec<(LinterRun, Vec<Message>)> = self.pool.install(|| {
            self.plan
                .par_iter()
                .map(|planned| run_planned(planned, ctx, candidates, diff))
                .collect()
        });
        Report::aggregate(results)
    }
}

fn plan_entry<'r>(
    registry: &'r LinterRegistry,
    entry: &LinterEntry,
) -> Result<Planned<'r>, ConfigError> {
    let linter = registry
        .get(&entry.name)
        .ok_or_else(|| ConfigError::UnknownLinter {
            name: entry.name.clone(),
            known: registry.names().collect::<Vec<_>>().join(", "),
        })?;

    let mut options = entry.options.clone();
    let filter = match options.remove("filefilter") {
        None => FileFilter::parse(linter.default_filefilter()),
        Some(value) => FileFilter::parse(&filter_rules(&entry.name, value)?),
    }
    .map_err(|(rule, reason)| ConfigError::BadFilterRule {
        linter: entry.name.clone(),
        rule,
        reason,
    })?;

    let job = linter
        .configure(options)
        .map_err(|reason| ConfigError::invalid_option(&entry.name, reason))?;
    Ok(Planned {
        linter,
        filter,
        job,
    })
}

fn filter_rules(linter: &str, value: Json) -> Result<Vec<String>, ConfigError> {
    let not_a_list = || ConfigError::invalid_option(linter, "filefilter must be a list of strings");
    match value {
        Json::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Json::String(rule) => Ok(rule),
                _ => Err(not_a_list()),
            })
            .collect(),
        _ => Err(not_a_list()),
    }
}

fn run_planned(
    planned: &Planned<'_>,
    ctx: &RunContext<'_>,
    candidates: &[String],
    diff: Option<&DiffLineIndex>,
) -> (LinterRun, Vec<Message>) {
    let name = planned.linter.name();
    let mode = planned.linter.mode();
    let mut run = LinterRun::new(name, mode);

    advance(&mut run, Stage::SelectingFiles);
    let mut files = planned.filter.select(candidates);
    if let (Mode::DiffAware, Some(index)) = (mode, diff) {
        files.retain(|f| index.lines(f).is_some_and(|lines| !lines.is_empty()));
    }
    run.files = files.len();
    if files.is_empty() {
        debug!(linter = name, "no files selected, skipping");
        advance(&mut run, Stage::Aggregated);
        return (run, Vec::new());
    }

    let selection = match mode {
        Mode::Static => Selection::Files(files),
        Mode::DiffAware => Selection::Changed { files, lines: diff },
    };

    advance(&mut run, Stage::Invoking);
    let raw = match planned.job.run(ctx, &selection) {
        Ok(messages) => messages,
        Err(err) => {
            warn!(linter = name, %err, "linter failed");
            run.failure = Some(err);
            advance(&mut run, Stage::Failed);
            return (run, Vec::new());
        }
    };
    run.raw_count = raw.len();

    advance(&mut run, Stage::Parsing);
    let normalized = raw.into_iter().map(|m| m.relative_to(ctx.root));

    advance(&mut run, Stage::Filtering);
    let kept: Vec<Message> = match diff {
        Some(index) => normalized
            .filter(|m| index.keeps(&m.filename, m.line))
            .collect(),
        None => normalized.collect(),
    };
    run.kept = kept.len();

    advance(&mut run, Stage::Aggregated);
    debug!(
        linter = name,
        files = run.files,
        raw = run.raw_count,
        kept = run.kept,
        "linter done"
    );
    (run, kept)
}

fn advance(run: &mut LinterRun, stage: Stage) {
    debug!(linter = run.name.as_str(), from = ?run.stage, to = ?stage, "stage");
    run.stage = stage;
}

/// Validate `entries` and run them once.
///
/// # Errors
///
/// Returns a `ConfigError` if validation fails; nothing is run in that case.
pub fn run_lint(
    registry: &LinterRegistry,
    entries: &[LinterEntry],
    jobs: usize,
    ctx: &RunContext<'_>,
    candidates: &[String],
    diff: Option<&DiffLineIndex>,
) -> Result<Report, ConfigError> {
    let orchestrator = Orchestrator::new(registry, entries, jobs)?;
    Ok(orchestrator.run(ctx, candidates, diff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linters::default_registry;
    use crate::linters::testing::FakeRunner;
    use serde_json::json;
    use std::path::Path;

    fn entry(name: &str, options: Json) -> LinterEntry {
        LinterEntry {
            name: name.to_string(),
            options: options.as_object().cloned().unwrap_or_default(),
        }
    }

    fn files(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_linter_is_rejected_before_running() {
        let registry = default_registry();
        let err = Orchestrator::new(&registry, &[entry("pylint", json!({}))], 1)
            .err()
            .unwrap();
        match err {
            ConfigError::UnknownLinter { name, known } => {
                assert_eq!(name, "pylint");
                assert!(known.contains("flake8"));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn bad_filter_rule_and_options_are_config_errors() {
        let registry = default_registry();
        let err = Orchestrator::new(
            &registry,
            &[entry("flake8", json!({"filefilter": ["*.py"]}))],
            1,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::BadFilterRule { ref rule, .. } if rule == "*.py"));

        let err = Orchestrator::new(&registry, &[entry("flake8", json!({"filefilter": "+ *.py"}))], 1)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidOption { .. }));

        let err = Orchestrator::new(&registry, &[entry("cpplint", json!({"linelength": 0}))], 1)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidOption { .. }));
    }

    #[test]
    fn user_filefilter_replaces_default() {
        let registry = default_registry();
        let runner = FakeRunner::new(|_| FakeRunner::stdout(0, ""));
        let ctx = RunContext {
            root: Path::new("."),
            runner: &runner,
        };
        let orch = Orchestrator::new(
            &registry,
            &[entry("flake8", json!({"filefilter": ["+ *.py", "- tests/*"]}))],
            1,
        )
        .unwrap();
        let report = orch.run(&ctx, &files(&["a.py", "tests/t.py", "b.pyx"]), None);
        assert_eq!(report.linters[0].files, 1);
        assert_eq!(runner.tool_calls(), vec![vec!["flake8".to_string(), "a.py".to_string()]]);
    }

    #[test]
    fn empty_selection_spawns_nothing() {
        let registry = default_registry();
        let runner = FakeRunner::new(|_| FakeRunner::stdout(0, ""));
        let ctx = RunContext {
            root: Path::new("."),
            runner: &runner,
        };
        let report = run_lint(
            &registry,
            &[entry("flake8", json!({})), entry("yamllint", json!({}))],
            2,
            &ctx,
            &files(&["README.md"]),
            None,
        )
        .unwrap();
        assert!(runner.calls.lock().unwrap().is_empty());
        assert!(report.ok);
        assert!(report.linters.iter().all(|r| r.skipped() && r.stage == Stage::Aggregated));
    }

    #[test]
    fn diff_suppresses_unchanged_lines_but_keeps_unlocated() {
        let registry = default_registry();
        let runner = FakeRunner::new(|_| {
            FakeRunner::stdout(1, "a.py:3:1: E1 changed\na.py:9:1: E2 legacy\n")
        });
        let ctx = RunContext {
            root: Path::new("."),
            runner: &runner,
        };
        let index: DiffLineIndex = [("a.py", vec![3])].into_iter().collect();
        let orch = Orchestrator::new(&registry, &[entry("flake8", json!({}))], 1).unwrap();
        let report = orch.run(&ctx, &files(&["a.py"]), Some(&index));
        assert_eq!(report.messages, vec![Message::new("a.py", Some(3), Some(1), "E1 changed")]);
        assert_eq!(report.per_linter_raw_count["flake8"], 2);
        assert_eq!(report.linters[0].kept, 1);
        assert!(!report.ok);
    }

    #[test]
    fn diff_aware_linter_skips_files_without_changed_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("moved.txt"), "x \n").unwrap();
        let registry = default_registry();
        let runner = FakeRunner::new(|_| FakeRunner::stdout(0, ""));
        let ctx = RunContext {
            root: dir.path(),
            runner: &runner,
        };
        let mut index = DiffLineIndex::new();
        index.touch("moved.txt");
        let orch = Orchestrator::new(&registry, &[entry("whitespace", json!({}))], 1).unwrap();
        let report = orch.run(&ctx, &files(&["moved.txt"]), Some(&index));
        assert_eq!(report.linters[0].files, 0);
        assert!(report.ok);
    }

    #[test]
    fn failing_linter_does_not_stop_others() {
        let registry = default_registry();
        let runner = FakeRunner::new(|cmd| match cmd[0].as_str() {
            "flake8" => FakeRunner::stdout(2, ""),
            _ => FakeRunner::stdout(1, "c.yml:1:1: [error] bad"),
        });
        let ctx = RunContext {
            root: Path::new("."),
            runner: &runner,
        };
        let orch = Orchestrator::new(
            &registry,
            &[entry("flake8", json!({})), entry("yamllint", json!({}))],
            2,
        )
        .unwrap();
        let report = orch.run(&ctx, &files(&["a.py", "c.yml"]), None);
        let flake8 = &report.linters[0];
        assert_eq!(flake8.stage, Stage::Failed);
        assert!(flake8.failure.is_some());
        assert_eq!(report.linters[1].stage, Stage::Aggregated);
        assert_eq!(report.messages.len(), 1);
        assert!(!report.ok);
    }
}
