//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "patchlint",
    version,
    about = "Run many linters, report only what a change touched",
    long_about = "patchlint runs a configurable set of external and built-in linters over a repository and merges their findings.\n\nWith --refspec or --diff-file only changed files are linted and findings on unchanged lines are suppressed.\n\nConfiguration precedence: CLI > .patchlint.yml > defaults.",
    after_help = "Examples:\n  patchlint run --refspec origin/main\n  git diff -U0 HEAD~1 | patchlint run --diff-file -\n  patchlint run --output json\n  patchlint linters",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current patchlint version.")]
    Version,
    /// Run the configured linters
    #[command(
        about = "Run linters",
        long_about = "Run every linter listed in the configuration. Exit status is 0 when no messages remain and no linter failed, 1 otherwise, 2 on configuration errors.",
        after_help = "Examples:\n  patchlint run --refspec master\n  patchlint run --jobs 4 --timeout 60"
    )]
    Run {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Config file, relative to the repository root")]
        config: Option<String>,
        #[arg(long, conflicts_with = "diff_file", help = "Only lint changes since this git refspec")]
        refspec: Option<String>,
        #[arg(long, help = "Read a unified diff from this file ('-' for stdin)")]
        diff_file: Option<String>,
        #[arg(long, help = "Maximum linters running at once (default: CPU count)")]
        jobs: Option<usize>,
        #[arg(long, help = "Per-process timeout in seconds, 0 disables (default: 300)")]
        timeout: Option<u64>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(short, long, action = clap::ArgAction::SetTrue, help = "Log debug details to stderr")]
        verbose: bool,
    },
    /// List registered linters
    #[command(
        about = "List linters",
        long_about = "List every registered linter with its mode, language and default options."
    )]
    Linters {
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
