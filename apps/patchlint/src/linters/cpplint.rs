//! Google's cpplint.py, see <https://github.com/google/styleguide>.
//!
//! cpplint exits non-zero whenever it finds something, so success is judged
//! by the absence of a `FATAL` marker in stdout. Findings go to stderr as
//! `file:line:  description  [category] [confidence]`.

use super::{log_version, parse, run_batched, Adapter, RunContext, Selection};
use crate::error::ExecutionFailure;
use crate::models::Message;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpplintConfig {
    /// Path of the cpplint script.
    pub script: String,
    pub linelength: u32,
    /// Category filters, joined into `--filter=`.
    pub filter: Vec<String>,
}

impl Default for CpplintConfig {
    fn default() -> Self {
        Self {
            script: "./cpplint.py".to_string(),
            linelength: 100,
            filter: vec!["-runtime/int".to_string()],
        }
    }
}

#[derive(Debug, Default)]
pub struct Cpplint;

fn no_fatal(_code: Option<i32>, stdout: &str, _stderr: &str) -> bool {
    !stdout.contains("FATAL")
}

impl Adapter for Cpplint {
    type Config = CpplintConfig;

    const NAME: &'static str = "cpplint";
    const LANGUAGE: Option<&'static str> = Some("cpp");
    const FILEFILTER: &'static [&'static str] = &["+ *.h", "+ *.h.in", "+ *.cpp", "+ *.c"];

    fn validate(&self, config: &Self::Config) -> Result<(), String> {
        if config.script.trim().is_empty() {
            return Err("script must not be empty".to_string());
        }
        if config.linelength == 0 {
            return Err("linelength must be positive".to_string());
        }
        Ok(())
    }

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
        log_version(ctx, Self::NAME, &config.script);

        let mut base = vec![
            config.script.clone(),
            format!("--linelength={}", config.linelength),
        ];
        if !config.filter.is_empty() {
            base.push(format!("--filter={}", config.filter.join(",")));
        }
        run_batched(ctx, &base, files, no_fatal, |out| parse_output(&out.stderr))
    }
}

/// Parse cpplint's stderr. Line 0 marks file-level findings and is
/// reported without a line.
fn parse_output(output: &str) -> Vec<Message> {
    output.lines().filter_map(parse_record).collect()
}

fn parse_record(line: &str) -> Option<Message> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let location = words.first()?;
    if location.matches(':').count() != 2 || words.len() < 4 {
        if !line.trim().is_empty() {
            debug!(linter = "cpplint", line, "skipping unrecognized output line");
        }
        return None;
    }
    let mut loc = location.split(':');
    let filename = loc.next().filter(|f| !f.is_empty())?;
    let raw_line = loc.next()?;
    let row = match raw_line.trim().parse::<u32>() {
        Ok(0) => None,
        Ok(_) => Some(parse::position(raw_line)?),
        Err(_) => {
            debug!(linter = "cpplint", line, "skipping record with bad line number");
            return None;
        }
    };
    let priority = words[words.len() - 1];
    let tag = words[words.len() - 2];
    let description = words[1..words.len() - 2].join(" ");
    Some(Message::new(
        filename,
        row,
        None,
        format!("{priority} {tag} {description}"),
    ))
}
