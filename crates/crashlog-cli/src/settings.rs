use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crashlog_core::{OutputFormat, DEFAULT_STEP_LOG};
use serde::Deserialize;

/// Resolved configuration for one invocation.
///
/// Layers, lowest to highest precedence: built-in defaults, the optional
/// config file, `CRASHLOG_*` environment variables. CLI flags are applied
/// on top by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Debug log to scan; `-` reads standard input.
    pub log_path: PathBuf,
    /// Step log name used in the annotation markers.
    pub step_log: String,
    pub format: OutputFormat,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(Self::DEFAULT_LOG_PATH),
            step_log: DEFAULT_STEP_LOG.to_string(),
            format: OutputFormat::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub const DEFAULT_LOG_PATH: &'static str = ".debug.log";
    const ENV_PREFIX: &'static str = "CRASHLOG";

    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix(Self::ENV_PREFIX));
        let merged = builder.build().with_context(|| match config_file {
            Some(path) => format!("failed to load configuration from {}", path.display()),
            None => "failed to load configuration from environment".to_string(),
        })?;
        merged
            .try_deserialize()
            .context("invalid crashlog configuration")
    }

    pub fn reads_stdin(&self) -> bool {
        self.log_path.as_os_str() == "-"
    }
}
