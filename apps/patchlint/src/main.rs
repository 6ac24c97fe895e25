//! patchlint CLI binary entry point.
//! Resolves configuration, picks candidate files, runs the linters and
//! prints the report.

use clap::Parser;
use patchlint::cli::{Cli, Commands};
use patchlint::config::{self, Overrides};
use patchlint::diff::DiffLineIndex;
use patchlint::error::Error;
use patchlint::lint::Orchestrator;
use patchlint::linters::{default_registry, RunContext};
use patchlint::process::ProcessRunner;
use patchlint::{git, output};
use std::process::ExitCode;

/// Exit status for configuration and setup errors.
const EXIT_SETUP: u8 = 2;

struct RunArgs {
    repo_root: Option<String>,
    config: Option<String>,
    refspec: Option<String>,
    diff_file: Option<String>,
    jobs: Option<usize>,
    timeout: Option<u64>,
    output: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::Linters { output } => {
            let registry = default_registry();
            match output::print_linters(&registry, output.as_deref().unwrap_or("human")) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => fail(&Error::from(err)),
            }
        }
        Commands::Run {
            repo_root,
            config,
            refspec,
            diff_file,
            jobs,
            timeout,
            output,
            verbose,
        } => {
            init_logging(verbose);
            let args = RunArgs {
                repo_root,
                config,
                refspec,
                diff_file,
                jobs,
                timeout,
                output,
            };
            match run(&args) {
                Ok(true) => ExitCode::SUCCESS,
                Ok(false) => ExitCode::FAILURE,
                Err(err) => fail(&err),
            }
        }
    }
}

fn fail(err: &Error) -> ExitCode {
    eprintln!("{} {}", output::error_prefix(), err);
    ExitCode::from(EXIT_SETUP)
}

/// Run once; `Ok(report.ok)` on completion.
fn run(args: &RunArgs) -> Result<bool, Error> {
    let eff = config::resolve_effective(&Overrides {
        repo_root: args.repo_root.as_deref(),
        config: args.config.as_deref(),
        jobs: args.jobs,
        timeout: args.timeout,
        output: args.output.as_deref(),
    })?;

    // Validate every linter entry before spawning anything, git included.
    let registry = default_registry();
    let orchestrator = Orchestrator::new(&registry, &eff.linters, eff.jobs)?;
    if eff.linters.is_empty() && eff.output != "json" {
        eprintln!(
            "{} No linters configured in {}",
            output::note_prefix(),
            eff.config_path.display()
        );
    }

    let runner = ProcessRunner::new()
        .current_dir(&eff.repo_root)
        .timeout(eff.timeout);
    let diff: Option<DiffLineIndex> = match (&args.refspec, &args.diff_file) {
        (Some(refspec), _) => Some(git::changed_lines(&runner, &eff.repo_root, refspec)?),
        (None, Some(source)) => Some(git::read_diff_file(&eff.repo_root, source)?),
        (None, None) => None,
    };
    let candidates: Vec<String> = match &diff {
        Some(index) => index.files().map(str::to_string).collect(),
        None => git::tracked_files(&runner, &eff.repo_root)?,
    };

    let ctx = RunContext {
        root: &eff.repo_root,
        runner: &runner,
    };
    let report = orchestrator.run(&ctx, &candidates, diff.as_ref());
    output::print_report(&report, &eff.output)?;
    Ok(report.ok)
}

/// Initialize tracing on stderr. `--verbose` wins over `RUST_LOG`.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
