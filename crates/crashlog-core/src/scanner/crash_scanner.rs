use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, instrument, trace};

use super::{CrashPattern, CrashRecord, LogLine, LogSource, ScanResult, Scanner};

/// Single-pass scanner that collects undiagnosed crash reports from a log source.
pub struct CrashLogScanner<S: LogSource> {
    source: Arc<S>,
    pattern: CrashPattern,
}

impl<S: LogSource> CrashLogScanner<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            pattern: CrashPattern::new(),
        }
    }

    /// Classify one line; the match is anchored at the true start of the line.
    pub fn classify(&self, line: &LogLine) -> Option<CrashRecord> {
        if !self.pattern.is_match(&line.text) {
            return None;
        }
        Some(CrashRecord {
            line_number: line.number,
            text: line.text.trim_end().to_string(),
        })
    }

    /// Run the linear classification pass over already-read lines.
    pub fn scan_lines<I>(&self, lines: I) -> ScanResult
    where
        I: IntoIterator<Item = LogLine>,
    {
        let mut records = Vec::new();
        let mut lines_scanned = 0;
        for line in lines {
            lines_scanned += 1;
            if let Some(record) = self.classify(&line) {
                trace!(line = record.line_number, "crash line matched");
                records.push(record);
            }
        }
        ScanResult::new(records, lines_scanned)
    }
}

#[async_trait::async_trait]
impl<S> Scanner for CrashLogScanner<S>
where
    S: LogSource + 'static,
{
    #[instrument(name = "scan_log", skip(self), fields(source = %self.source.describe()))]
    async fn scan(&self) -> Result<ScanResult> {
        let lines = self
            .source
            .read_lines()
            .await
            .with_context(|| format!("failed to read log from {}", self.source.describe()))?;
        let result = self.scan_lines(lines);
        debug!(
            lines = result.lines_scanned,
            crashes = result.crash_count(),
            "scan completed"
        );
        Ok(result)
    }
}
