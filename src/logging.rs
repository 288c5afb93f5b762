use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FALLBACK_LEVEL: &str = "info";
const LOG_FILE_PREFIX: &str = "recommender.log";
/// sqlx logs every statement at info; the progress store runs one per request.
const QUIET_SQLX: &str = "sqlx=warn";

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

pub fn log_dir() -> PathBuf {
    std::env::var("LOG_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Filter directives for `log_level`, with sqlx statement logging muted
/// unless the caller configured sqlx explicitly.
pub fn filter_directives(log_level: &str) -> String {
    let level = log_level.trim();
    let level = if level.is_empty() { FALLBACK_LEVEL } else { level };
    if level.contains("sqlx") {
        level.to_string()
    } else {
        format!("{level},{QUIET_SQLX}")
    }
}

/// Installs the global subscriber. Keep the returned guard alive for as long
/// as file output should keep flushing.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(filter_directives(log_level))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(FALLBACK_LEVEL)));

    let (file_layer, guard) = match file_appender() {
        Some((writer, guard)) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(FileLogGuard { _guard: guard }))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    guard
}

fn file_appender() -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if !file_logging_enabled() {
        return None;
    }

    let dir = log_dir();
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("failed to create log directory {}: {err}", dir.display());
        return None;
    }

    let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}
