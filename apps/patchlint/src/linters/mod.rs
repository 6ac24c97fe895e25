//! Linter plugins and the registry the orchestrator draws from.
//!
//! An adapter is written against the typed [`Adapter`] trait: it declares a
//! serde-backed `Config` struct whose `Default` holds the default options,
//! an invocation [`Mode`], default filename rules, and a `run` function that
//! turns a [`Selection`] into [`Message`]s. Every adapter is automatically a
//! [`Linter`], the object-safe view stored in a [`LinterRegistry`].
//!
//! User options are overlaid field by field: a key present in the user
//! mapping replaces the default wholesale (lists included), absent keys keep
//! their default, and unknown keys are rejected.

mod cpplint;
mod flake8;
mod header;
pub(crate) mod parse;
mod whitespace;
mod yamllint;

pub use cpplint::{Cpplint, CpplintConfig};
pub use flake8::{Flake8, Flake8Config};
pub use header::{Header, HeaderConfig};
pub use whitespace::{Whitespace, WhitespaceConfig};
pub use yamllint::{Yamllint, YamllintConfig};

use crate::diff::DiffLineIndex;
use crate::error::ExecutionFailure;
use crate::models::Message;
use crate::process::{always, CommandRunner};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::path::Path;
use tracing::{debug, info};

/// Upper bound on filenames passed to one external command.
pub const MAX_FILES_PER_COMMAND: usize = 200;

/// How a linter is handed its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Whole files, never line data.
    Static,
    /// Changed files plus the changed-line index.
    DiffAware,
}

/// Files chosen for one linter run.
#[derive(Debug, Clone)]
pub enum Selection<'a> {
    Files(Vec<String>),
    /// `lines` is `None` on full-tree runs where no diff exists.
    Changed {
        files: Vec<String>,
        lines: Option<&'a DiffLineIndex>,
    },
}

impl Selection<'_> {
    pub fn files(&self) -> &[String] {
        match self {
            Self::Files(files) | Self::Changed { files, .. } => files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }

    /// Changed lines for `filename`, when line data was provided.
    pub fn changed_lines(&self, filename: &str) -> Option<impl Iterator<Item = u32> + '_> {
        match self {
            Self::Files(_) => None,
            Self::Changed { lines, .. } => lines
                .and_then(|index| index.lines(filename))
                .map(|set| set.iter().copied()),
        }
    }
}

/// Environment shared by all linters of one run.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    /// Repository root; relative filenames resolve against it.
    pub root: &'a Path,
    pub runner: &'a dyn CommandRunner,
}

/// Typed definition of a linter.
pub trait Adapter: Send + Sync + 'static {
    type Config: Serialize + DeserializeOwned + Default + Send + Sync + 'static;

    const NAME: &'static str;
    const MODE: Mode = Mode::Static;
    const LANGUAGE: Option<&'static str> = None;
    /// Default `filefilter` rules.
    const FILEFILTER: &'static [&'static str];

    /// Reject option values serde alone cannot catch.
    fn validate(&self, _config: &Self::Config) -> Result<(), String> {
        Ok(())
    }

    /// Lint the selected files.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionFailure` when the underlying tool did not run
    /// correctly. Findings are never errors.
    fn run(
        &self,
        ctx: &RunContext<'_>,
        config: &Self::Config,
        selection: &Selection<'_>,
    ) -> Result<Vec<Message>, ExecutionFailure>;
}

/// A linter bound to its merged configuration, ready to run.
pub trait Job: Send + Sync {
    fn run(
        &self,
        ctx: &RunContext<'_>,
        selection: &Selection<'_>,
    ) -> Result<Vec<Message>, ExecutionFailure>;
}

/// Object-safe view of an [`Adapter`].
pub trait Linter: Send + Sync {
    fn name(&self) -> &'static str;
    fn mode(&self) -> Mode;
    fn language(&self) -> Option<&'static str>;
    fn default_filefilter(&self) -> &'static [&'static str];

    /// Default options, including `filefilter`, as a JSON object.
    fn default_config(&self) -> Json;

    /// Overlay `options` (without `filefilter`) onto the defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the rejected option.
    fn configure(&self, options: Map<String, Json>) -> Result<Box<dyn Job + '_>, String>;
}

struct Configured<'a, A: Adapter> {
    adapter: &'a A,
    config: A::Config,
}

impl<A: Adapter> Job for Configured<'_, A> {
    fn run(
        &self,
        ctx: &RunContext<'_>,
        selection: &Selection<'_>,
    ) -> Result<Vec<Message>, ExecutionFailure> {
        self.adapter.run(ctx, &self.config, selection)
    }
}

impl<A: Adapter> Linter for A {
    fn name(&self) -> &'static str {
        A::NAME
    }

    fn mode(&self) -> Mode {
        A::MODE
    }

    fn language(&self) -> Option<&'static str> {
        A::LANGUAGE
    }

    fn default_filefilter(&self) -> &'static [&'static str] {
        A::FILEFILTER
    }

    fn default_config(&self) -> Json {
        let mut map = match serde_json::to_value(A::Config::default()) {
            Ok(Json::Object(map)) => map,
            _ => Map::new(),
        };
        map.insert(
            "filefilter".to_string(),
            Json::from(A::FILEFILTER.to_vec()),
        );
        Json::Object(map)
    }

    fn configure(&self, options: Map<String, Json>) -> Result<Box<dyn Job + '_>, String> {
        let config: A::Config =
            serde_json::from_value(Json::Object(options)).map_err(|e| e.to_string())?;
        self.validate(&config)?;
        Ok(Box::new(Configured {
            adapter: self,
            config,
        }))
    }
}

/// Linters available to a run, in registration order.
#[derive(Default)]
pub struct LinterRegistry {
    linters: Vec<Box<dyn Linter>>,
}

impl LinterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a linter; a later registration with the same name replaces
    /// the earlier one in place.
    pub fn register<L>(&mut self, linter: L)
    where
        L: Linter + 'static,
    {
        let boxed: Box<dyn Linter> = Box::new(linter);
        match self.linters.iter_mut().find(|l| l.name() == boxed.name()) {
            Some(slot) => *slot = boxed,
            None => self.linters.push(boxed),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Linter> {
        self.linters
            .iter()
            .find(|l| l.name() == name)
            .map(|l| l.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Linter> + '_ {
        self.linters.iter().map(|l| l.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.linters.iter().map(|l| l.name())
    }
}

impl std::fmt::Debug for LinterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinterRegistry")
            .field("linters", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry holding every built-in linter.
#[must_use]
pub fn default_registry() -> LinterRegistry {
    let mut registry = LinterRegistry::new();
    registry.register(Flake8);
    registry.register(Yamllint);
    registry.register(Cpplint);
    registry.register(Header);
    registry.register(Whitespace);
    registry
}

/// Log the version of an external tool. Failures are ignored.
pub(crate) fn log_version(ctx: &RunContext<'_>, linter: &str, program: &str) {
    let command = [program.to_string(), "--version".to_string()];
    match ctx.runner.run(&command, always) {
        Ok(out) => {
            let version = out.stdout.lines().next().unwrap_or_default().trim();
            info!(linter, version, "using");
        }
        Err(err) => debug!(linter, %err, "version probe failed"),
    }
}

/// Run `base + batch` for each batch of files and collect the output of
/// the chosen stream.
pub(crate) fn run_batched(
    ctx: &RunContext<'_>,
    base: &[String],
    files: &[String],
    succeeded: crate::process::SuccessPredicate,
    parse: impl Fn(&crate::process::ProcessOutput) -> Vec<Message>,
) -> Result<Vec<Message>, ExecutionFailure> {
    let mut messages = Vec::new();
    for batch in files.chunks(MAX_FILES_PER_COMMAND) {
        let mut command = base.to_vec();
        command.extend(batch.iter().cloned());
        let output = ctx.runner.run(&command, succeeded)?;
        messages.extend(parse(&output));
    }
    Ok(messages)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn default_registry_has_builtins_in_order() {
        let registry = default_registry();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["flake8", "yamllint", "cpplint", "header", "whitespace"]);
        assert_eq!(registry.get("whitespace").unwrap().mode(), Mode::DiffAware);
        assert_eq!(registry.get("flake8").unwrap().language(), Some("python"));
        assert!(registry.get("pylint").is_none());
    }

    #[test]
    fn registering_same_name_replaces_in_place() {
        let mut registry = default_registry();
        registry.register(Flake8);
        assert_eq!(registry.names().count(), 5);
        assert_eq!(registry.names().next(), Some("flake8"));
    }

    #[test]
    fn default_config_includes_filefilter() {
        let registry = default_registry();
        let cfg = registry.get("cpplint").unwrap().default_config();
        assert_eq!(cfg["script"], "./cpplint.py");
        assert_eq!(cfg["linelength"], 100);
        assert_eq!(cfg["filefilter"][0], "+ *.h");
    }

    #[test]
    fn configure_rejects_unknown_and_mistyped_options() {
        let registry = default_registry();
        let flake8 = registry.get("flake8").unwrap();
        assert!(flake8.configure(options(json!({"config": "setup.cfg"}))).is_ok());
        let err = flake8
            .configure(options(json!({"confg": "setup.cfg"})))
            .err()
            .unwrap();
        assert!(err.contains("confg"));
        assert!(flake8.configure(options(json!({"config": 3}))).is_err());
    }

    #[test]
    fn selection_only_exposes_lines_when_changed() {
        let index: DiffLineIndex = [("a.py", vec![4, 2])].into_iter().collect();
        let changed = Selection::Changed {
            files: vec!["a.py".into()],
            lines: Some(&index),
        };
        let lines: Vec<u32> = changed.changed_lines("a.py").unwrap().collect();
        assert_eq!(lines, vec![2, 4]);
        assert!(changed.changed_lines("b.py").is_none());

        let plain = Selection::Files(vec!["a.py".into()]);
        assert!(plain.changed_lines("a.py").is_none());
        assert_eq!(plain.files(), ["a.py".to_string()]);
    }
}
