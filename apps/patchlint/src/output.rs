//! Output rendering for `run` and `linters`.
//!
//! Supports `human` (default) and `json` outputs. Rendering is pure and
//! returns strings; the `print_*` helpers write them to stdout. Logging
//! goes to stderr and never mixes with this output.

use crate::linters::LinterRegistry;
use crate::models::{LinterRun, Message, Report};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::fmt::Write as _;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn paint(text: &str, color: bool, style: fn(&str) -> String) -> String {
    if color {
        style(text)
    } else {
        text.to_string()
    }
}

/// Print a run report in the requested format.
pub fn print_report(report: &Report, output: &str) -> Result<(), serde_json::Error> {
    let text = match output {
        "json" => serde_json::to_string_pretty(&compose_report_json(report)?)?,
        _ => render_human(report, use_colors(output)),
    };
    println!("{text}");
    Ok(())
}

/// Print the registered linters with their defaults.
pub fn print_linters(registry: &LinterRegistry, output: &str) -> Result<(), serde_json::Error> {
    let text = match output {
        "json" => serde_json::to_string_pretty(&compose_linters_json(registry))?,
        _ => render_linters(registry, use_colors(output)),
    };
    println!("{text}");
    Ok(())
}

/// Prefix for fatal errors printed by the binary.
pub fn error_prefix() -> String {
    paint("✖ error:", std::env::var_os("NO_COLOR").is_none(), |s| {
        s.red().bold().to_string()
    })
}

pub fn note_prefix() -> String {
    paint("◆ note:", std::env::var_os("NO_COLOR").is_none(), |s| {
        s.blue().bold().to_string()
    })
}

/// One line per message, then a status line per linter and a summary.
pub fn render_human(report: &Report, color: bool) -> String {
    let mut out = String::new();
    for msg in &report.messages {
        let _ = writeln!(out, "{}", render_message(msg, color));
    }
    if !report.messages.is_empty() && !report.linters.is_empty() {
        out.push('\n');
    }
    let width = report.linters.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for run in &report.linters {
        let _ = writeln!(out, "{}", render_status(run, width, color));
    }
    let failed = report.failures().count();
    let summary = format!(
        "— Summary — messages={} linters={} failed={}",
        report.messages.len(),
        report.linters.len(),
        failed
    );
    let verdict = if report.ok {
        paint("✔ ok", color, |s| s.green().bold().to_string())
    } else if failed > 0 {
        paint("✖ linter failure", color, |s| s.red().bold().to_string())
    } else {
        paint("▲ findings", color, |s| s.yellow().bold().to_string())
    };
    let _ = write!(
        out,
        "{} {}",
        paint(&summary, color, |s| s.bold().to_string()),
        verdict
    );
    out
}

fn render_message(msg: &Message, color: bool) -> String {
    let mut location = msg.filename.clone();
    if let Some(line) = msg.line {
        let _ = write!(location, ":{line}");
        if let Some(col) = msg.column {
            let _ = write!(location, ":{col}");
        }
    }
    format!(
        "{} {} {}",
        paint("✖", color, |s| s.red().to_string()),
        paint(&location, color, |s| s.bold().to_string()),
        msg.text
    )
}

fn render_status(run: &LinterRun, width: usize, color: bool) -> String {
    let name = format!("{:width$}", run.name);
    if let Some(failure) = &run.failure {
        return format!(
            "{} {} {}",
            name,
            paint("failed  ", color, |s| s.red().bold().to_string()),
            failure
        );
    }
    if run.skipped() {
        return format!(
            "{} {}",
            name,
            paint("skipped  no files", color, |s| s.bright_black().to_string())
        );
    }
    let label = if run.kept > 0 {
        paint("findings", color, |s| s.yellow().bold().to_string())
    } else {
        paint("clean   ", color, |s| s.green().to_string())
    };
    format!(
        "{} {} files={} raw={} kept={}",
        name,
        label,
        run.files,
        run.raw_count,
        run.kept
    )
}

fn render_linters(registry: &LinterRegistry, color: bool) -> String {
    let width = registry.names().map(str::len).max().unwrap_or(0);
    let mut out = String::new();
    for linter in registry.iter() {
        let name = format!("{:width$}", linter.name());
        let mode = match linter.mode() {
            crate::linters::Mode::Static => "static    ",
            crate::linters::Mode::DiffAware => "diff-aware",
        };
        let _ = writeln!(
            out,
            "{} {} {:8} {}",
            paint(&name, color, |s| s.bold().to_string()),
            mode,
            linter.language().unwrap_or("-"),
            linter.default_config()
        );
    }
    out.truncate(out.trim_end().len());
    out
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &Report) -> Result<JsonVal, serde_json::Error> {
    let mut value = serde_json::to_value(report)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("verdict".to_string(), serde_json::to_value(report.verdict())?);
    }
    Ok(value)
}

/// Compose the `linters` listing (pure) for testing/snapshot purposes.
pub fn compose_linters_json(registry: &LinterRegistry) -> JsonVal {
    let items: Vec<_> = registry
        .iter()
        .map(|l| {
            json!({
                "name": l.name(),
                "mode": l.mode(),
                "language": l.language(),
                "defaults": l.default_config(),
            })
        })
        .collect();
    JsonVal::Array(items)
}
