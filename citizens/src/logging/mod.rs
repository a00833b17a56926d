//! Structured logging infrastructure.
//!
//! Builds a global `tracing` subscriber from [`LoggingConfig`]. The configured
//! level is the default filter; `RUST_LOG` overrides it when set.

#[cfg(test)]
mod tests;

use crate::config::{LogFormat, LogLevel, LoggingConfig};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Error type for logging operations
#[derive(Debug)]
pub enum LogError {
    /// IO error occurred
    IoError(std::io::Error),

    /// Error parsing log level
    InvalidLogLevel(String),

    /// Error in subscriber setup
    SubscriberError(Box<dyn std::error::Error + Send + Sync>),
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        LogError::IoError(err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for LogError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        LogError::SubscriberError(err)
    }
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::IoError(e) => write!(f, "IO error: {}", e),
            LogError::SubscriberError(e) => write!(f, "Subscriber error: {}", e),
            LogError::InvalidLogLevel(s) => write!(f, "Invalid log level: {}", s),
        }
    }
}

impl std::error::Error for LogError {}

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Initialize the logging system with the given configuration.
///
/// When a log file is configured the returned guard flushes it on drop; keep
/// it alive for as long as the process logs.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    match &config.file {
        Some(path) => {
            let (writer, guard) = create_non_blocking_file(path)?;
            if config.stdout {
                try_init_with(config.format, filter, std::io::stdout.and(writer))?;
            } else {
                try_init_with(config.format, filter, writer)?;
            }
            Ok(Some(guard))
        }
        None => {
            try_init_with(config.format, filter, std::io::stdout)?;
            Ok(None)
        }
    }
}

fn try_init_with<W>(format: LogFormat, filter: EnvFilter, writer: W) -> Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_level(true)
        .with_target(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().try_init()?,
        LogFormat::Compact => builder.compact().try_init()?,
        LogFormat::Pretty => builder.pretty().try_init()?,
        LogFormat::Default => builder.try_init()?,
    }

    Ok(())
}

/// Create a non-blocking file writer.
fn create_non_blocking_file(path: impl AsRef<Path>) -> Result<(NonBlocking, WorkerGuard)> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = path.file_name().ok_or_else(|| {
        LogError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("log file path has no file name: {}", path.display()),
        ))
    })?;

    let file_appender = tracing_appender::rolling::never(
        path.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".")),
        file_name,
    );

    Ok(tracing_appender::non_blocking(file_appender))
}

/// Parse a log level string into a LogLevel enum.
pub fn parse_log_level(level: &str) -> Result<LogLevel> {
    level
        .parse()
        .map_err(|_| LogError::InvalidLogLevel(level.to_string()))
}
