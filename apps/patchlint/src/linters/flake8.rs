//! flake8, see <http://flake8.pycqa.org>.

use super::{log_version, parse, run_batched, Adapter, RunContext, Selection};
use crate::error::ExecutionFailure;
use crate::models::Message;
use crate::process::exit_code_below_two;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Flake8Config {
    /// Optional path to a flake8 configuration file.
    pub config: Option<String>,
}

#[derive(Debug, Default)]
pub struct Flake8;

impl Adapter for Flake8 {
    type Config = Flake8Config;

    const NAME: &'static str = "flake8";
    const LANGUAGE: Option<&'static str> = Some("python");
    const FILEFILTER: &'static [&'static str] = &["+ *.py", "+ *.pyx", "+ *.pxd", "+ scripts/*"];

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
        log_version(ctx, Self::NAME, "flake8");

        let mut base = vec!["flake8".to_string()];
        if let Some(path) = &config.config {
            base.push(format!("--config={path}"));
        }
        run_batched(ctx, &base, files, exit_code_below_two, |out| {
            parse::colon_records(Self::NAME, &out.stdout)
        })
    }
}
