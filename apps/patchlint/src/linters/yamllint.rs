//! yamllint in parsable mode, see <https://yamllint.readthedocs.io>.

use super::{log_version, parse, run_batched, Adapter, RunContext, Selection};
use crate::error::ExecutionFailure;
use crate::models::Message;
use crate::process::exit_code_below_two;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct YamllintConfig {
    /// Passed as `-c <path>` when set.
    pub config: Option<String>,
}

#[derive(Debug, Default)]
pub struct Yamllint;

impl Adapter for Yamllint {
    type Config = YamllintConfig;

    const NAME: &'static str = "yamllint";
    const LANGUAGE: Option<&'static str> = Some("yaml");
    const FILEFILTER: &'static [&'static str] = &["+ *.yml", "+ *.yaml"];

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
        log_version(ctx, Self::NAME, "yamllint");

        let mut base = vec!["yamllint".to_string(), "-f".into(), "parsable".into()];
        if let Some(path) = &config.config {
            base.push("-c".into());
            base.push(path.clone());
        }
        run_batched(ctx, &base, files, exit_code_below_two, |out| {
            parse::colon_records(Self::NAME, &out.stdout)
        })
    }
}
