pub mod annotation;
pub mod report;
pub mod scanner;

pub use annotation::{emit_annotations, StepAnnotation, DEFAULT_STEP_LOG};
pub use report::{render_report, OutputFormat};
pub use scanner::{
    crash_scanner::CrashLogScanner,
    file_source::{FileLogSource, LogSourceError, TextLogSource},
    CrashPattern, CrashRecord, LogLine, LogSource, ScanResult, Scanner,
};
