//! Configuration discovery and effective settings resolution.
//!
//! patchlint reads `.patchlint.yml|yaml|toml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `jobs`: available parallelism
//! - `timeout`: 300 seconds per process, `0` disables it
//! - `output`: `human`
//!
//! Overrides precedence: CLI > config file > defaults.
//!
//! The `linters` list is kept in file order. Each entry is a single-key
//! mapping from linter name to options, or a bare name:
//!
//! ```yaml
//! linters:
//!   - flake8:
//!       filefilter: ['- tests/*', '+ *.py']
//!       config: setup.cfg
//!   - header:
//!   - whitespace
//! ```
//!
//! Options are only checked for shape here; the orchestrator validates them
//! against each linter's typed configuration.

use crate::error::ConfigError;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File names probed in each directory, in order.
pub const CONFIG_FILES: [&str; 3] = [".patchlint.yml", ".patchlint.yaml", ".patchlint.toml"];

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Root configuration loaded from `.patchlint.{yml,yaml,toml}`.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PatchlintConfig {
    pub jobs: Option<usize>,
    pub timeout: Option<u64>,
    pub output: Option<String>,
    #[serde(default)]
    pub linters: Vec<LinterEntry>,
}

/// One `linters` entry: a registered name plus its raw options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct LinterEntry {
    pub name: String,
    pub options: Map<String, Json>,
}

impl LinterEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Bare(String),
    Keyed(Map<String, Json>),
}

impl TryFrom<RawEntry> for LinterEntry {
    type Error = String;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let map = match raw {
            RawEntry::Bare(name) => return Ok(Self::new(name)),
            RawEntry::Keyed(map) => map,
        };
        if map.len() != 1 {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            return Err(format!(
                "linter entry must have exactly one key, found [{}]",
                keys.join(", ")
            ));
        }
        let Some((name, value)) = map.into_iter().next() else {
            return Err("empty linter entry".to_string());
        };
        let options = match value {
            Json::Null => Map::new(),
            Json::Object(options) => options,
            other => {
                return Err(format!(
                    "options of linter '{name}' must be a mapping, found {other}"
                ))
            }
        };
        Ok(Self { name, options })
    }
}

/// Fully-resolved configuration used by commands after applying precedence.
#[derive(Debug, Clone)]
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_path: PathBuf,
    pub jobs: usize,
    /// `None` disables the per-process timeout.
    pub timeout: Option<Duration>,
    pub output: String,
    pub linters: Vec<LinterEntry>,
}

/// Values given on the command line; `None` falls through to the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides<'a> {
    pub repo_root: Option<&'a str>,
    pub config: Option<&'a str>,
    pub jobs: Option<usize>,
    pub timeout: Option<u64>,
    pub output: Option<&'a str>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `.patchlint.*` file or a `.git` entry is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|name| cur.join(name).is_file()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Find the first config file present directly in `root`.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Parse one config file; `.toml` files as TOML, anything else as YAML.
pub fn load_config_file(path: &Path) -> Result<PatchlintConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&text).map_err(|e| e.to_string())
    } else if text.trim().is_empty() {
        Ok(PatchlintConfig::default())
    } else {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Load the config discovered in `root`, if any.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, PatchlintConfig)>, ConfigError> {
    find_config(root)
        .map(|path| load_config_file(&path).map(|cfg| (path, cfg)))
        .transpose()
}

/// Resolve `Effective` by merging CLI flags, the config file, and defaults.
///
/// # Errors
///
/// Fails when no config file exists, when it cannot be read or parsed, or
/// when a resolved value is out of range.
pub fn resolve_effective(cli: &Overrides<'_>) -> Result<Effective, ConfigError> {
    let start = PathBuf::from(cli.repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);

    let (config_path, cfg) = match cli.config {
        Some(explicit) => {
            let path = repo_root.join(explicit);
            let cfg = load_config_file(&path)?;
            (path, cfg)
        }
        None => load_config(&repo_root)?.ok_or_else(|| ConfigError::NotFound {
            root: repo_root.clone(),
        })?,
    };

    let jobs = cli.jobs.or(cfg.jobs).unwrap_or_else(default_jobs);
    if jobs == 0 {
        return Err(ConfigError::Malformed("jobs must be at least 1".to_string()));
    }

    let timeout = match cli.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS) {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let output = cli
        .output
        .map(str::to_string)
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if !matches!(output.as_str(), "human" | "json") {
        return Err(ConfigError::Malformed(format!(
            "output must be 'human' or 'json', got '{output}'"
        )));
    }

    Ok(Effective {
        repo_root,
        config_path,
        jobs,
        timeout,
        output,
        linters: cfg.linters,
    })
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
