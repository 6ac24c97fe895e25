//! Canonical lint finding shared by every linter.

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A single finding reported by a linter.
///
/// Field order matters: the derived `Ord` sorts by filename, then line
/// (absent first), then column (absent first), then text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Message {
    pub filename: String,
    /// 1-based; `None` when the tool gives no location.
    pub line: Option<u32>,
    /// 1-based; `None` when the tool gives no column.
    pub column: Option<u32>,
    pub text: String,
}

impl Message {
    pub fn new(
        filename: impl Into<String>,
        line: Option<u32>,
        column: Option<u32>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
            text: text.into(),
        }
    }

    /// Rewrite an absolute filename relative to `root` so it lines up with
    /// the diff index keys. Relative names are left untouched.
    pub fn relative_to(mut self, root: &Path) -> Self {
        let path = Path::new(&self.filename);
        if path.is_absolute() {
            if let Some(rel) = pathdiff::diff_paths(path, root) {
                self.filename = rel.to_string_lossy().replace('\\', "/");
            }
        }
        if let Some(stripped) = self.filename.strip_prefix("./") {
            self.filename = stripped.to_string();
        }
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filename)?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(col) = self.column {
                write!(f, ":{col}")?;
            }
        }
        write!(f, " {}", self.text)
    }
}
