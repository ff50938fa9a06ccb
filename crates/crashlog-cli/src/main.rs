mod settings;

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crashlog_core::{
    emit_annotations, render_report, CrashLogScanner, FileLogSource, LogSource, OutputFormat,
    ScanResult, Scanner, TextLogSource,
};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "crashlog",
    author,
    version,
    about = "Report undiagnosed crashes from a CI debug log"
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a debug log and report crash lines
    Scan(ScanArgs),
}

#[derive(Args, Debug, Default)]
struct ScanArgs {
    /// Debug log to scan (`-` for stdin) [default: .debug.log]
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Output format [default: annotations]
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Step log name used in annotation markers [default: undiagnosed_crashes]
    #[arg(long = "step-log", value_name = "NAME")]
    step_log: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Annotations,
    Human,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Annotations => OutputFormat::Annotations,
            FormatArg::Human => OutputFormat::Human,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    init_tracing(&settings.log_level);

    match cli.command.unwrap_or(Commands::Scan(ScanArgs::default())) {
        Commands::Scan(args) => {
            apply_overrides(&mut settings, args);
            scan(&settings).await?
        }
    }
    Ok(())
}

fn apply_overrides(settings: &mut Settings, args: ScanArgs) {
    if let Some(log) = args.log {
        settings.log_path = log;
    }
    if let Some(format) = args.format {
        settings.format = format.into();
    }
    if let Some(step_log) = args.step_log {
        settings.step_log = step_log;
    }
}

async fn scan(settings: &Settings) -> Result<()> {
    let result = if settings.reads_stdin() {
        let mut raw = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut raw)
            .await
            .context("failed to read log from stdin")?;
        run_scanner(TextLogSource::new(String::from_utf8_lossy(&raw))).await?
    } else {
        run_scanner(FileLogSource::new(&settings.log_path)).await?
    };
    info!(
        crashes = result.crash_count(),
        lines = result.lines_scanned,
        "crash log scan finished"
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_report(&result, settings, &mut handle)
}

fn write_report<W: Write>(result: &ScanResult, settings: &Settings, out: &mut W) -> Result<()> {
    match settings.format {
        OutputFormat::Annotations => emit_annotations(result, &settings.step_log, out)
            .context("failed to write annotations to stdout")?,
        format => {
            let report = render_report(result, format, &settings.step_log)?;
            out.write_all(report.as_bytes())
                .and_then(|_| out.flush())
                .context("failed to write report to stdout")?;
        }
    }
    Ok(())
}

async fn run_scanner<S: LogSource + 'static>(source: S) -> Result<ScanResult> {
    let scanner = CrashLogScanner::new(Arc::new(source));
    scanner.scan().await
}

fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout is reserved for the annotation protocol.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crashlog_core::CrashRecord;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    fn one_crash() -> ScanResult {
        ScanResult::new(
            vec![CrashRecord {
                line_number: 1,
                text: "3: Crash (oom)".into(),
            }],
            1,
        )
    }

    #[test]
    fn closed_stdout_is_an_error_for_every_format() {
        for format in [OutputFormat::Annotations, OutputFormat::Human, OutputFormat::Json] {
            let settings = Settings {
                format,
                ..Settings::default()
            };
            let err = write_report(&one_crash(), &settings, &mut ClosedPipe)
                .expect_err("write to a closed pipe should fail");
            assert!(err.to_string().contains("stdout"), "{format:?}: {err:#}");
        }
    }

    #[test]
    fn json_report_is_written_to_the_given_writer() {
        let settings = Settings {
            format: OutputFormat::Json,
            ..Settings::default()
        };
        let mut out = Vec::new();
        write_report(&one_crash(), &settings, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["crashes"][0]["text"], "3: Crash (oom)");
    }
}
