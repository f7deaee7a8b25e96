//! Dual-sink logging: console plus an append-only log file.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "zotero_tagger.log";

#[derive(Debug, Error, Diagnostic)]
#[error("cannot open log file {path}")]
#[diagnostic(
    code(tagger::logging::open),
    help("Check that the log directory exists and is writable, or pass --log-file.")
)]
pub struct LoggingError {
    path: String,
    #[source]
    source: InitError,
}

/// Install the global subscriber. Keep the returned guard alive for the
/// whole run so buffered file output is flushed on exit.
pub fn init(log_file: &Path) -> Result<WorkerGuard, LoggingError> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = log_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.into());

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|source| LoggingError {
            path: log_file.display().to_string(),
            source,
        })?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    Ok(guard)
}
