//! provides logging helpers

use std::path::Path;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::InitError;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

/// Line format of emitted log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Unknown formats fall back to text.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Destination of emitted log events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogOutput {
    /// `stdout` and `stderr` name the standard streams, anything else is a file path.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "stdout" => LogOutput::Stdout,
            "stderr" => LogOutput::Stderr,
            path => LogOutput::File(PathBuf::from(path)),
        }
    }
}

/// Options for the global subscriber
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

/// Parse a level name, unknown levels fall back to `INFO`.
pub fn parse_level(level: &str) -> filter::LevelFilter {
    level
        .trim()
        .parse::<filter::LevelFilter>()
        .unwrap_or(filter::LevelFilter::INFO)
}

/// initiate the global tracing subscriber
///
/// `RUST_LOG` directives take precedence over the configured level. The returned guard
/// must be kept alive for as long as file output should be flushed.
pub fn init(options: &LogOptions) -> Result<Option<WorkerGuard>, InitError> {
    let env_filter = filter::EnvFilter::builder()
        .with_default_directive(parse_level(&options.level).into())
        .from_env_lossy();

    let (writer, guard) = match &options.output {
        LogOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), None),
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), None),
        LogOutput::File(path) => {
            let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender(path)?);
            (BoxMakeWriter::new(file_writer), Some(file_guard))
        }
    };
    let ansi = !matches!(options.output, LogOutput::File(_));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match options.format {
        LogFormat::Text => layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(ansi)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .with_filter(env_filter)
            .boxed(),
    };

    registry().with(fmt_layer).init();
    Ok(guard)
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, InitError> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "elchi-discovery.log".to_string());

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
}
