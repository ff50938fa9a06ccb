use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::annotation::annotations_for;
use crate::scanner::{CrashRecord, ScanResult};

/// Format styles supported by the default reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Buildbot step annotations, the format consumed by CI.
    #[default]
    Annotations,
    Human,
    Json,
}

/// Produce a report string from a `ScanResult` using the desired format.
///
/// `step_log` only affects the annotation format.
pub fn render_report(
    result: &ScanResult,
    format: OutputFormat,
    step_log: &str,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Annotations => Ok(render_annotations(result, step_log)),
        OutputFormat::Human => render_human(result),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport::from(result))?),
    }
}

fn render_annotations(result: &ScanResult, step_log: &str) -> String {
    annotations_for(result, step_log)
        .iter()
        .map(|annotation| format!("{annotation}\n"))
        .collect()
}

fn render_human(result: &ScanResult) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "Lines scanned: {}", result.lines_scanned)?;
    if !result.any_found {
        writeln!(out, "No undiagnosed crashes detected.")?;
        return Ok(out);
    }
    writeln!(out, "Undiagnosed crashes: {}", result.crash_count())?;
    for record in &result.records {
        writeln!(out, "  - line {:>6}: {}", record.line_number, record.text)?;
    }
    Ok(out)
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    any_found: bool,
    lines_scanned: usize,
    crashes: &'a [CrashRecord],
}

impl<'a> From<&'a ScanResult> for JsonReport<'a> {
    fn from(result: &'a ScanResult) -> Self {
        Self {
            any_found: result.any_found,
            lines_scanned: result.lines_scanned,
            crashes: &result.records,
        }
    }
}
