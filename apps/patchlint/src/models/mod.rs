//! Shared data models: the canonical finding and the aggregated report.

pub mod message;
pub mod report;

pub use message::Message;
pub use report::{LinterRun, Report, Stage, Verdict};
