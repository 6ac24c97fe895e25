//! Changed-line model used to tell new findings from pre-existing ones.
//!
//! A `DiffLineIndex` maps a repository-relative filename to the set of
//! 1-based line numbers touched by the current change. A file that is
//! absent is not part of the change. A file present with an empty set
//! changed without attributable lines (rename, mode change).

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffLineIndex {
    files: BTreeMap<String, BTreeSet<u32>>,
}

impl DiffLineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a file as touched without adding lines.
    pub fn touch(&mut self, filename: impl Into<String>) {
        self.files.entry(filename.into()).or_default();
    }

    pub fn insert(&mut self, filename: impl Into<String>, line: u32) {
        self.files.entry(filename.into()).or_default().insert(line);
    }

    pub fn extend_lines(&mut self, filename: impl Into<String>, lines: impl IntoIterator<Item = u32>) {
        self.files.entry(filename.into()).or_default().extend(lines);
    }

    pub fn remove(&mut self, filename: &str) {
        self.files.remove(filename);
    }

    /// True when the file is part of the change, even with no lines.
    pub fn is_touched(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    /// True when `line` of `filename` was changed.
    pub fn contains(&self, filename: &str, line: u32) -> bool {
        self.files
            .get(filename)
            .is_some_and(|lines| lines.contains(&line))
    }

    pub fn lines(&self, filename: &str) -> Option<&BTreeSet<u32>> {
        self.files.get(filename)
    }

    /// Touched filenames in sorted order.
    pub fn files(&self) -> impl Iterator<Item = &str> + '_ {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether a finding at `line` of `filename` belongs to the change.
    ///
    /// Findings without a line cannot be attributed to a hunk and are
    /// always kept.
    pub fn keeps(&self, filename: &str, line: Option<u32>) -> bool {
        match line {
            None => true,
            Some(line) => self.contains(filename, line),
        }
    }
}

impl<S: Into<String>, I: IntoIterator<Item = u32>> FromIterator<(S, I)> for DiffLineIndex {
    fn from_iter<T: IntoIterator<Item = (S, I)>>(iter: T) -> Self {
        let mut index = Self::new();
        for (file, lines) in iter {
            index.extend_lines(file, lines);
        }
        index
    }
}

fn hunk_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@@ -\d+(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid hunk header regex")
    })
}

/// Build an index from `git diff` output.
///
/// Meant for zero-context diffs (`-U0`), where every line a hunk covers on
/// the new side was added or modified. Deleted files are not indexed;
/// files with header lines but no hunks are indexed with an empty set.
pub fn parse_unified_diff(text: &str) -> DiffLineIndex {
    let mut index = DiffLineIndex::new();
    let mut current: Option<String> = None;
    let mut pending_header: Option<String> = None;
    // Lines still owed to the current hunk, old side then new side.
    let mut body = (0u32, 0u32);

    for raw in text.lines() {
        if body != (0, 0) {
            match raw.as_bytes().first() {
                Some(b'+') => {
                    body.1 = body.1.saturating_sub(1);
                    continue;
                }
                Some(b'-') => {
                    body.0 = body.0.saturating_sub(1);
                    continue;
                }
                Some(b' ') => {
                    body = (body.0.saturating_sub(1), body.1.saturating_sub(1));
                    continue;
                }
                Some(b'\\') => continue,
                _ => body = (0, 0),
            }
        }
        if let Some(rest) = raw.strip_prefix("diff --git ") {
            // Renames and mode changes never reach a +++ line.
            if let Some(prev) = pending_header.take() {
                index.touch(prev);
            }
            current = None;
            pending_header = new_side_path(rest);
            continue;
        }
        if let Some(rest) = raw.strip_prefix("rename to ") {
            pending_header = Some(rest.trim().to_string());
            continue;
        }
        if raw.starts_with("deleted file mode") {
            pending_header = None;
            continue;
        }
        if let Some(rest) = raw.strip_prefix("+++ ") {
            let target = rest.split('\t').next().unwrap_or(rest).trim();
            pending_header = None;
            current = if target == "/dev/null" {
                None
            } else {
                let name = strip_side_prefix(target);
                index.touch(name.clone());
                Some(name)
            };
            continue;
        }
        if raw.starts_with("@@") {
            let Some(file) = current.as_ref() else {
                continue;
            };
            let Some(caps) = hunk_header().captures(raw) else {
                debug!(line = raw, "skipping malformed hunk header");
                continue;
            };
            let Ok(start) = caps[2].parse::<u32>() else {
                continue;
            };
            let count_at = |group: usize| {
                caps.get(group)
                    .map_or(Some(1), |m| m.as_str().parse::<u32>().ok())
            };
            let (Some(old_count), Some(new_count)) = (count_at(1), count_at(3)) else {
                continue;
            };
            index.extend_lines(file.clone(), start..start.saturating_add(new_count));
            body = (old_count, new_count);
        }
    }
    if let Some(prev) = pending_header {
        index.touch(prev);
    }
    index
}

/// New-side path of a `diff --git a/<old> b/<new>` header. Paths may
/// contain spaces, so the split happens at the last ` b/`.
fn new_side_path(header: &str) -> Option<String> {
    match header.rfind(" b/") {
        Some(at) => Some(header[at + 3..].to_string()),
        None => header.split_whitespace().nth(1).map(strip_side_prefix),
    }
}

fn strip_side_prefix(path: &str) -> String {
    path.strip_prefix("b/")
        .or_else(|| path.strip_prefix("a/"))
        .unwrap_or(path)
        .to_string()
}
