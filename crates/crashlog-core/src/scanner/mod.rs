use anyhow::Result as AnyResult;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub mod crash_scanner;
/// Log sources backed by files on disk or in-memory text.
pub mod file_source;

/// Source of the fixed crash-report prefix: digits, colon, space, `Crash (`.
const CRASH_PATTERN_SOURCE: &str = r"^[0-9]+: Crash \(";

static CRASH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(CRASH_PATTERN_SOURCE).expect("crash pattern is a valid regex"));

/// A single line of the debug log, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// 1-based position within the log.
    pub number: usize,
    pub text: String,
}

impl LogLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// A log line classified as an undiagnosed crash report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashRecord {
    pub line_number: usize,
    /// Line content with trailing whitespace stripped.
    pub text: String,
}

/// Outcome of one scan over a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub records: Vec<CrashRecord>,
    pub any_found: bool,
    pub lines_scanned: usize,
}

impl ScanResult {
    /// Build a result, deriving `any_found` from the records.
    pub fn new(records: Vec<CrashRecord>, lines_scanned: usize) -> Self {
        Self {
            any_found: !records.is_empty(),
            records,
            lines_scanned,
        }
    }

    pub fn crash_count(&self) -> usize {
        self.records.len()
    }
}

/// The anchored, case-sensitive crash-report prefix matcher.
#[derive(Debug, Clone)]
pub struct CrashPattern {
    regex: &'static Regex,
}

impl CrashPattern {
    pub fn new() -> Self {
        Self {
            regex: &CRASH_REGEX,
        }
    }

    /// True when the line starts with ASCII digits followed by `: Crash (`.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

impl Default for CrashPattern {
    fn default() -> Self {
        Self::new()
    }
}

/// Abstraction over where log lines come from so files, stdin and in-memory text can be swapped.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Read every line of the log in order.
    async fn read_lines(&self) -> AnyResult<Vec<LogLine>>;

    /// Short human-readable description used in log messages and error context.
    fn describe(&self) -> String;
}

/// Primary scanning interface that turns a log into a structured result.
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self) -> AnyResult<ScanResult>;
}
