use std::path::Path;

use anyhow::{Context, Result};
use opsdesk_core::config::LogSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "opsdesk.log";

/// Installs the global subscriber: stderr always, plus a daily-rolling file
/// under `logs_dir` when `settings.file_logging` is on.
///
/// The returned guard flushes the file writer on drop and must live until exit.
pub fn init(settings: &LogSettings, logs_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // `settings.level` already carries any OPSDESK_LOG override.
    let filter = EnvFilter::try_new(&settings.level).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log filter '{}': {}", settings.level, e);
        EnvFilter::new("info")
    });

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    match logs_dir.filter(|_| settings.file_logging) {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init()
                .context("Failed to install the tracing subscriber")?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .context("Failed to install the tracing subscriber")?;
            Ok(None)
        }
    }
}
