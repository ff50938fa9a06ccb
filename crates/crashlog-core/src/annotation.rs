//! Buildbot step annotations understood by the CI log viewer.
//!
//! Each annotation is a single stdout line of the form `@@@NAME@args@@@`.

use std::{fmt, io::Write};

use crate::scanner::ScanResult;

/// Name of the step log that collects undiagnosed crash lines.
pub const DEFAULT_STEP_LOG: &str = "undiagnosed_crashes";

/// One annotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAnnotation<'a> {
    /// Append a line to the named step log.
    LogLine { log: &'a str, text: &'a str },
    /// Close the named step log.
    LogEnd { log: &'a str },
    /// Mark the current step as having warnings.
    Warnings,
}

impl fmt::Display for StepAnnotation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogLine { log, text } => write!(f, "@@@STEP_LOG_LINE@{log}@{text}@@@"),
            Self::LogEnd { log } => write!(f, "@@@STEP_LOG_END@{log}@@@"),
            Self::Warnings => f.write_str("@@@STEP_WARNINGS@@@"),
        }
    }
}

/// Annotation sequence for a scan: one log line per crash, then the closing
/// marker and the warning marker. Empty when nothing was found.
pub fn annotations_for<'a>(result: &'a ScanResult, log: &'a str) -> Vec<StepAnnotation<'a>> {
    if !result.any_found {
        return Vec::new();
    }
    let mut out: Vec<_> = result
        .records
        .iter()
        .map(|record| StepAnnotation::LogLine {
            log,
            text: record.text.trim(),
        })
        .collect();
    out.push(StepAnnotation::LogEnd { log });
    out.push(StepAnnotation::Warnings);
    out
}

/// Write the annotations for `result` and flush so the log viewer sees them immediately.
pub fn emit_annotations<W: Write>(
    result: &ScanResult,
    log: &str,
    out: &mut W,
) -> std::io::Result<()> {
    let annotations = annotations_for(result, log);
    if annotations.is_empty() {
        return Ok(());
    }
    for annotation in &annotations {
        writeln!(out, "{annotation}")?;
    }
    out.flush()
}
