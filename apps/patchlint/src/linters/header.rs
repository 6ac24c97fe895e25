//! Source file header check.
//!
//! The expected header is read from a template file and must appear as a
//! comment at the top of every selected file, preceded by the configured
//! `extra` lines. A leading shebang line is checked separately and does
//! not count against the header.

use super::{Adapter, RunContext, Selection};
use crate::error::ExecutionFailure;
use crate::models::Message;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    /// Template file, relative to the repository root.
    pub header: String,
    /// Prefix put in front of each template line.
    pub comment: String,
    /// Expected shebang, only checked when a file starts with `#!`.
    pub shebang: Option<String>,
    /// Lines expected above the template, below any shebang.
    pub extra: Vec<String>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            header: "HEADER".to_string(),
            comment: "# ".to_string(),
            shebang: Some("#!/usr/bin/env python".to_string()),
            extra: vec!["# -*- coding: utf-8 -*-".to_string()],
        }
    }
}

#[derive(Debug, Default)]
pub struct Header;

impl Adapter for Header {
    type Config = HeaderConfig;

    const NAME: &'static str = "header";
    const FILEFILTER: &'static [&'static str] = &["+ *.py", "+ *.pyx", "+ *.pxd"];

    fn run(
        &self,
        ctx: &RunContext<'_>,
        config: &Self::Config,
        selection: &Selection<'_>,
    ) -> Result<Vec<Message>, ExecutionFailure> {
        let files = selection.files();
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let template_path = ctx.root.join(&config.header);
        let template = fs::read_to_string(&template_path).map_err(|err| {
            ExecutionFailure::Io(format!(
                "cannot read header template {}: {err}",
                template_path.display()
            ))
        })?;
        let expected = expected_lines(config, &template);

        let mut messages = Vec::new();
        for file in files {
            let path = ctx.root.join(file);
            let bytes = fs::read(&path).map_err(|err| {
                ExecutionFailure::Io(format!("cannot read {}: {err}", path.display()))
            })?;
            match String::from_utf8(bytes) {
                Ok(source) => check_source(file, &source, config, &expected, &mut messages),
                Err(err) => warn!(
                    linter = Self::NAME,
                    file = file.as_str(),
                    error = %err.utf8_error(),
                    "skipping file that is not valid UTF-8"
                ),
            }
        }
        Ok(messages)
    }
}

fn expected_lines(config: &HeaderConfig, template: &str) -> Vec<String> {
    config
        .extra
        .iter()
        .cloned()
        .chain(
            template
                .lines()
                .map(|line| format!("{}{}", config.comment, line).trim().to_string()),
        )
        .collect()
}

fn check_source(
    filename: &str,
    source: &str,
    config: &HeaderConfig,
    expected: &[String],
    messages: &mut Vec<Message>,
) {
    let mut matched = 0;
    for (idx, line) in source.lines().enumerate() {
        if matched >= expected.len() {
            break;
        }
        let lineno = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        match (&config.shebang, idx == 0 && line.starts_with("#!")) {
            (Some(shebang), true) => {
                if line != shebang.as_str() {
                    messages.push(Message::new(
                        filename,
                        Some(lineno),
                        None,
                        format!("Shebang line should be {shebang}."),
                    ));
                }
            }
            _ => {
                let want = &expected[matched];
                if line != want.as_str() {
                    messages.push(Message::new(
                        filename,
                        Some(lineno),
                        None,
                        format!("Line should be: {want}"),
                    ));
                }
                matched += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linters::testing::FakeRunner;
    use std::path::Path;
    use tempfile::tempdir;

    fn lint(root: &Path, files: &[&str], config: &HeaderConfig) -> Result<Vec<Message>, ExecutionFailure> {
        let runner = FakeRunner::new(|_| FakeRunner::stdout(0, ""));
        let ctx = RunContext { root, runner: &runner };
        let selection = Selection::Files(files.iter().map(|f| f.to_string()).collect());
        Header.run(&ctx, config, &selection)
    }

    #[test]
    fn accepts_correct_header_with_shebang() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("HEADER"), "Project X\nGPLv3\n").unwrap();
        fs::write(
            dir.path().join("ok.py"),
            "#!/usr/bin/env python\n# -*- coding: utf-8 -*-\n# Project X\n# GPLv3\nimport os\n",
        )
        .unwrap();
        let msgs = lint(dir.path(), &["ok.py"], &HeaderConfig::default()).unwrap();
        assert!(msgs.is_empty(), "{msgs:?}");
    }

    #[test]
    fn reports_each_wrong_line() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("HEADER"), "Project X\n\nGPLv3\n").unwrap();
        fs::write(
            dir.path().join("bad.py"),
            "#!/usr/bin/python\n# -*- coding: utf-8 -*-\n# Project Y\n#\n# GPLv3\n",
        )
        .unwrap();
        let msgs = lint(dir.path(), &["bad.py"], &HeaderConfig::default()).unwrap();
        assert_eq!(
            msgs,
            vec![
                Message::new("bad.py", Some(1), None, "Shebang line should be #!/usr/bin/env python."),
                Message::new("bad.py", Some(3), None, "Line should be: # Project X"),
            ]
        );
    }

    #[test]
    fn shebang_check_can_be_disabled() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("HEADER"), "X\n").unwrap();
        fs::write(dir.path().join("s.py"), "#!/bin/sh\n# X\n").unwrap();
        let config = HeaderConfig {
            shebang: None,
            extra: Vec::new(),
            ..HeaderConfig::default()
        };
        let msgs = lint(dir.path(), &["s.py"], &config).unwrap();
        assert_eq!(msgs, vec![Message::new("s.py", Some(1), None, "Line should be: # X")]);
    }

    #[test]
    fn invalid_utf8_file_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("HEADER"), "X\n").unwrap();
        fs::write(dir.path().join("bin.py"), [0xff_u8, 0xfe, 0x00]).unwrap();
        fs::write(dir.path().join("ok.py"), "# X\n").unwrap();
        fs::write(dir.path().join("bad.py"), "# Y\n").unwrap();
        let config = HeaderConfig {
            shebang: None,
            extra: Vec::new(),
            ..HeaderConfig::default()
        };
        let msgs = lint(dir.path(), &["bin.py", "ok.py", "bad.py"], &config).unwrap();
        assert_eq!(msgs, vec![Message::new("bad.py", Some(1), None, "Line should be: # X")]);
    }

    #[test]
    fn missing_template_is_an_execution_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "").unwrap();
        let err = lint(dir.path(), &["a.py"], &HeaderConfig::default()).unwrap_err();
        assert!(matches!(err, ExecutionFailure::Io(_)));
    }
}
