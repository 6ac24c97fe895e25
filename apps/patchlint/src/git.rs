//! Candidate files and changed lines taken from git.
//!
//! The runner is expected to execute in the repository root; paths in the
//! results are relative to it.

use crate::diff::{parse_unified_diff, DiffLineIndex};
use crate::error::ExecutionFailure;
use crate::process::{exit_code_zero, CommandRunner};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Changed lines between `refspec` and the working tree.
///
/// Files no longer present on disk are dropped: there is nothing left to
/// lint in them.
pub fn changed_lines(
    runner: &dyn CommandRunner,
    root: &Path,
    refspec: &str,
) -> Result<DiffLineIndex, ExecutionFailure> {
    let mut command: Vec<String> = ["git", "diff", "-U0", "--no-color", "--no-ext-diff"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    command.extend(refspec.split_whitespace().map(str::to_string));
    let output = runner
        .run(&command, exit_code_zero)
        .map_err(|e| ExecutionFailure::Diff(e.to_string()))?;
    let mut index = parse_unified_diff(&output.stdout);
    retain_existing(&mut index, root);
    debug!(refspec, files = index.len(), "computed changed lines");
    Ok(index)
}

/// Index built from a pre-computed unified diff; `-` reads stdin.
pub fn read_diff_file(root: &Path, source: &str) -> Result<DiffLineIndex, ExecutionFailure> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| ExecutionFailure::Diff(format!("cannot read diff from stdin: {e}")))?;
        buf
    } else {
        fs::read_to_string(source)
            .map_err(|e| ExecutionFailure::Diff(format!("cannot read {source}: {e}")))?
    };
    let mut index = parse_unified_diff(&text);
    retain_existing(&mut index, root);
    Ok(index)
}

/// Every file tracked by git that still exists in the working tree.
pub fn tracked_files(
    runner: &dyn CommandRunner,
    root: &Path,
) -> Result<Vec<String>, ExecutionFailure> {
    let command = ["git".to_string(), "ls-files".to_string()];
    let output = runner
        .run(&command, exit_code_zero)
        .map_err(|e| ExecutionFailure::Diff(e.to_string()))?;
    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && root.join(line).is_file())
        .map(str::to_string)
        .collect())
}

fn retain_existing(index: &mut DiffLineIndex, root: &Path) {
    let gone: Vec<String> = index
        .files()
        .filter(|f| !root.join(f).is_file())
        .map(str::to_string)
        .collect();
    for file in gone {
        debug!(file = file.as_str(), "dropping file missing from working tree");
        index.remove(&file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linters::testing::FakeRunner;
    use tempfile::tempdir;

    const DIFF: &str = "\
diff --git a/kept.py b/kept.py
--- a/kept.py
+++ b/kept.py
@@ -1,0 +2,2 @@
+x = 1
+y = 2
diff --git a/gone.py b/gone.py
--- a/gone.py
+++ b/gone.py
@@ -4 +4 @@
-a
+b
";

    #[test]
    fn changed_lines_runs_git_diff_and_drops_missing_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("kept.py"), "").unwrap();
        let runner = FakeRunner::new(|_| FakeRunner::stdout(0, DIFF));
        let index = changed_lines(&runner, dir.path(), "origin/main").unwrap();
        assert_eq!(index.files().collect::<Vec<_>>(), vec!["kept.py"]);
        assert!(index.contains("kept.py", 3));
        assert_eq!(
            runner.calls.lock().unwrap()[0],
            vec!["git", "diff", "-U0", "--no-color", "--no-ext-diff", "origin/main"]
        );
    }

    #[test]
    fn git_failure_becomes_diff_failure() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new(|_| FakeRunner::stdout(128, ""));
        let err = changed_lines(&runner, dir.path(), "nope").unwrap_err();
        assert!(matches!(err, ExecutionFailure::Diff(_)));
    }

    #[test]
    fn tracked_files_skips_deleted_entries() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.py"), "").unwrap();
        let runner = FakeRunner::new(|_| FakeRunner::stdout(0, "src/a.py\nremoved.py\n"));
        let files = tracked_files(&runner, dir.path()).unwrap();
        assert_eq!(files, vec!["src/a.py"]);
    }

    #[test]
    fn reads_diff_from_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("kept.py"), "").unwrap();
        fs::write(dir.path().join("gone.py"), "").unwrap();
        let patch = dir.path().join("change.diff");
        fs::write(&patch, DIFF).unwrap();
        let index = read_diff_file(dir.path(), patch.to_str().unwrap()).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains("gone.py", 4));

        let err = read_diff_file(dir.path(), "/nonexistent/change.diff").unwrap_err();
        assert!(matches!(err, ExecutionFailure::Diff(_)));
    }
}
