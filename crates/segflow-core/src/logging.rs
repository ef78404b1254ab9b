//! Tracing subscriber setup driven by the logging config

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Returns the appender guard when logging to a file; the caller must keep it
/// alive for the lifetime of the process or buffered lines are lost.
pub fn init(config: &LoggingConfig) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, crate::Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    match &config.file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| crate::Error::Config(format!("Invalid log file path: {}", path.display())))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            if config.format == "json" {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(writer)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(writer)
                    .with_ansi(false)
                    .init();
            }
            Ok(Some(guard))
        }
        None => {
            if config.format == "json" {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .init();
            } else {
                tracing_subscriber::fmt().with_env_filter(filter).init();
            }
            Ok(None)
        }
    }
}
