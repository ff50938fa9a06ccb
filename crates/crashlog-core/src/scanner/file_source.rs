use std::{io, path::PathBuf};

use anyhow::Result;
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::debug;

use super::{LogLine, LogSource};

/// I/O failures raised while reading a log file.
#[derive(Debug, Error)]
pub enum LogSourceError {
    #[error("failed to open log file {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read line {line} of log file {}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// Reads log lines from a file on disk, e.g. the `.debug.log` written by the test driver.
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl LogSource for FileLogSource {
    async fn read_lines(&self) -> Result<Vec<LogLine>> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| LogSourceError::Open {
                path: self.path.clone(),
                source,
            })?;
        let mut reader = BufReader::new(file);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|source| LogSourceError::Read {
                    path: self.path.clone(),
                    line: lines.len() + 1,
                    source,
                })?;
            if read == 0 {
                break;
            }
            lines.push(LogLine::new(lines.len() + 1, decode_line(&buf)));
        }
        debug!(path = %self.path.display(), lines = lines.len(), "log file read");
        Ok(lines)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Log lines held in memory, used for stdin input and tests.
pub struct TextLogSource {
    text: String,
}

impl TextLogSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait::async_trait]
impl LogSource for TextLogSource {
    async fn read_lines(&self) -> Result<Vec<LogLine>> {
        Ok(self
            .text
            .split_inclusive('\n')
            .enumerate()
            .map(|(idx, raw)| LogLine::new(idx + 1, strip_terminator(raw)))
            .collect())
    }

    fn describe(&self) -> String {
        "<memory>".into()
    }
}

// Non-UTF-8 bytes are replaced rather than failing the whole scan.
fn decode_line(raw: &[u8]) -> String {
    strip_terminator(&String::from_utf8_lossy(raw)).to_string()
}

fn strip_terminator(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn texts(lines: &[LogLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[tokio::test]
    async fn reads_lines_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(".debug.log");
        fs::write(&path, "first\r\n12: Crash (x)\nlast without newline").unwrap();

        let source = FileLogSource::new(&path);
        let lines = LogSource::read_lines(&source).await.unwrap();

        assert_eq!(
            texts(&lines),
            vec!["first", "12: Crash (x)", "last without newline"]
        );
        assert_eq!(lines[2].number, 3);
    }

    #[tokio::test]
    async fn empty_file_has_no_lines() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("empty.log");
        fs::write(&path, "").unwrap();
        let source = FileLogSource::new(&path);
        let lines = LogSource::read_lines(&source).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_is_decoded_lossily() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("binary.log");
        fs::write(&path, b"\xff\xfe junk\n3: Crash (bad bytes)\n").unwrap();
        let source = FileLogSource::new(&path);
        let lines = LogSource::read_lines(&source).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].text.ends_with(" junk"));
        assert_eq!(lines[1].text, "3: Crash (bad bytes)");
    }

    #[tokio::test]
    async fn missing_file_surfaces_open_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing.log");
        let source = FileLogSource::new(&path);
        let err = LogSource::read_lines(&source).await.unwrap_err();
        let typed = err
            .downcast_ref::<LogSourceError>()
            .expect("error should be a LogSourceError");
        assert!(matches!(typed, LogSourceError::Open { source, .. }
            if source.kind() == io::ErrorKind::NotFound));
        assert!(err.to_string().contains("missing.log"));
    }

    #[test]
    fn text_source_splits_like_file_source() {
        let source = TextLogSource::new("a\r\nb\n\nc");
        let lines = futures::executor::block_on(LogSource::read_lines(&source)).unwrap();
        assert_eq!(texts(&lines), vec!["a", "b", "", "c"]);
        assert_eq!(source.describe(), "<memory>");
    }
}
