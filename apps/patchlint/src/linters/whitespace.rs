//! Trailing whitespace and tab check.
//!
//! Runs in diff-aware mode: when changed-line data is available only the
//! changed lines are inspected, so untouched legacy lines never show up.

use super::{Adapter, Mode, RunContext, Selection};
use crate::error::ExecutionFailure;
use crate::models::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WhitespaceConfig {
    /// Also flag tab characters.
    pub tabs: bool,
}

impl Default for WhitespaceConfig {
    fn default() -> Self {
        Self { tabs: true }
    }
}

#[derive(Debug, Default)]
pub struct Whitespace;

impl Adapter for Whitespace {
    type Config = WhitespaceConfig;

    const NAME: &'static str = "whitespace";
    const MODE: Mode = Mode::DiffAware;
    const FILEFILTER: &'static [&'static str] = &["+ *"];

    fn run(
        &self,
        ctx: &RunContext<'_>,
        config: &Self::Config,
        selection: &Selection<'_>,
    ) -> Result<Vec<Message>, ExecutionFailure> {
        let mut messages = Vec::new();
        for file in selection.files() {
            let path = ctx.root.join(file);
            let bytes = fs::read(&path).map_err(|err| {
                ExecutionFailure::Io(format!("cannot read {}: {err}", path.display()))
            })?;
            let Ok(source) = String::from_utf8(bytes) else {
                debug!(file = file.as_str(), "skipping non-text file");
                continue;
            };
            let wanted: Option<BTreeSet<u32>> =
                selection.changed_lines(file).map(|lines| lines.collect());
            for (idx, line) in source.lines().enumerate() {
                let lineno = u32::try_from(idx + 1).unwrap_or(u32::MAX);
                if wanted.as_ref().is_some_and(|set| !set.contains(&lineno)) {
                    continue;
                }
                check_line(file, lineno, line, config, &mut messages);
            }
        }
        Ok(messages)
    }
}

fn check_line(file: &str, lineno: u32, line: &str, config: &WhitespaceConfig, out: &mut Vec<Message>) {
    let trimmed = line.trim_end();
    if trimmed.len() != line.len() {
        let column = u32::try_from(trimmed.chars().count() + 1).unwrap_or(u32::MAX);
        out.push(Message::new(file, Some(lineno), Some(column), "Trailing whitespace"));
    }
    if config.tabs {
        if let Some(pos) = line.chars().position(|c| c == '\t') {
            let column = u32::try_from(pos + 1).unwrap_or(u32::MAX);
            out.push(Message::new(file, Some(lineno), Some(column), "Tab character"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffLineIndex;
    use crate::linters::testing::FakeRunner;
    use tempfile::tempdir;

    const SOURCE: &str = "clean\ntrailing  \n\tindented\nfine\n";

    #[test]
    fn checks_every_line_without_diff() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), SOURCE).unwrap();
        let runner = FakeRunner::new(|_| FakeRunner::stdout(0, ""));
        let ctx = RunContext { root: dir.path(), runner: &runner };
        let selection = Selection::Changed { files: vec!["a.txt".into()], lines: None };
        let msgs = Whitespace.run(&ctx, &WhitespaceConfig::default(), &selection).unwrap();
        assert_eq!(
            msgs,
            vec![
                Message::new("a.txt", Some(2), Some(9), "Trailing whitespace"),
                Message::new("a.txt", Some(3), Some(1), "Tab character"),
            ]
        );
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn restricts_to_changed_lines() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), SOURCE).unwrap();
        let runner = FakeRunner::new(|_| FakeRunner::stdout(0, ""));
        let ctx = RunContext { root: dir.path(), runner: &runner };
        let index: DiffLineIndex = [("a.txt", vec![3, 4])].into_iter().collect();
        let selection = Selection::Changed { files: vec!["a.txt".into()], lines: Some(&index) };
        let msgs = Whitespace.run(&ctx, &WhitespaceConfig::default(), &selection).unwrap();
        assert_eq!(msgs, vec![Message::new("a.txt", Some(3), Some(1), "Tab character")]);

        let msgs = Whitespace
            .run(&ctx, &WhitespaceConfig { tabs: false }, &selection)
            .unwrap();
        assert!(msgs.is_empty());
    }
}
