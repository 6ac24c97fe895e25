//! External process execution with per-tool success rules.
//!
//! Tools disagree on what an exit code means: some use 1 for "issues found"
//! and 2+ for "crashed", others exit 0 and print a fatal marker. Each linter
//! therefore supplies a `SuccessPredicate`; when it returns false the call
//! becomes an `ExecutionFailure` instead of output to parse.

use crate::error::ExecutionFailure;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Decides whether a finished process ran correctly.
///
/// Receives the exit code (`None` when killed by a signal), stdout and stderr.
pub type SuccessPredicate = fn(Option<i32>, &str, &str) -> bool;

/// Success iff the exit code is 0 or 1.
pub fn exit_code_below_two(code: Option<i32>, _stdout: &str, _stderr: &str) -> bool {
    matches!(code, Some(0 | 1))
}

/// Success iff the exit code is 0.
pub fn exit_code_zero(code: Option<i32>, _stdout: &str, _stderr: &str) -> bool {
    code == Some(0)
}

/// Accept any completed run.
pub fn always(_code: Option<i32>, _stdout: &str, _stderr: &str) -> bool {
    true
}

/// Captured result of a completed process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

/// Seam between linters and the operating system.
///
/// Linters never spawn processes directly; tests substitute a recording
/// fake.
pub trait CommandRunner: Send + Sync {
    /// Run `command` (program followed by arguments) and wait for it.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionFailure` if the process cannot be started, times
    /// out, or `succeeded` rejects its result.
    fn run(
        &self,
        command: &[String],
        succeeded: SuccessPredicate,
    ) -> Result<ProcessOutput, ExecutionFailure>;
}

/// Runs real processes, optionally in a fixed directory and with a timeout.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
    env: Vec<(OsString, OsString)>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add or override one environment variable; the rest is inherited.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        command: &[String],
        succeeded: SuccessPredicate,
    ) -> Result<ProcessOutput, ExecutionFailure> {
        let command_line = command.join(" ");
        let (program, args) = command.split_first().ok_or_else(|| ExecutionFailure::Spawn {
            command: String::new(),
            reason: "empty command".to_string(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        debug!(command = %command_line, "spawning");
        let mut child = cmd.spawn().map_err(|err| ExecutionFailure::Spawn {
            command: command_line.clone(),
            reason: err.to_string(),
        })?;

        // Pipes are drained while waiting: the child blocks once one fills.
        let stdout_handle = child.stdout.take().map(spawn_reader);
        let stderr_handle = child.stderr.take().map(spawn_reader);

        let status = match self.timeout {
            Some(limit) => match child.wait_timeout(limit) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExecutionFailure::TimedOut {
                        command: command_line,
                        seconds: limit.as_secs(),
                    });
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExecutionFailure::Io(format!(
                        "failed waiting on `{command_line}`: {err}"
                    )));
                }
            },
            None => child.wait().map_err(|err| {
                ExecutionFailure::Io(format!("failed waiting on `{command_line}`: {err}"))
            })?,
        };

        let stdout = join_reader(stdout_handle, "stdout")?;
        let stderr = join_reader(stderr_handle, "stderr")?;
        let code = status.code();
        debug!(command = %command_line, ?code, "finished");

        if !succeeded(code, &stdout, &stderr) {
            return Err(ExecutionFailure::Rejected {
                command: command_line,
                code,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(ProcessOutput {
            stdout,
            stderr,
            code,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> thread::JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn join_reader(
    handle: Option<thread::JoinHandle<io::Result<Vec<u8>>>>,
    stream: &str,
) -> Result<String, ExecutionFailure> {
    match handle {
        Some(handle) => {
            let bytes = handle
                .join()
                .map_err(|_| ExecutionFailure::Io(format!("failed to join {stream} reader")))?
                .map_err(|err| ExecutionFailure::Io(format!("failed to read {stream}: {err}")))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => Ok(String::new()),
    }
}
