use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const ENV_LOG_FILTER: &str = "CONTACTDESK_LOG";
pub const ENV_LOG_DIR: &str = "CONTACTDESK_LOG_DIR";
pub const DEFAULT_FILTER: &str = "contactdesk=info,sqlx=warn";
const LOG_FILE_PREFIX: &str = "contactdesk.log";

fn env_filter() -> EnvFilter {
    EnvFilter::new(std::env::var(ENV_LOG_FILTER).unwrap_or_else(|_| DEFAULT_FILTER.into()))
}

/// Install the JSON subscriber used by both binaries.
///
/// Events go to stderr so command output on stdout stays parseable. When
/// `CONTACTDESK_LOG_DIR` is set, a daily rolling file receives the same
/// events; keep the returned guard alive until exit so it flushes.
pub fn init() -> Option<WorkerGuard> {
    let _ = tracing_log::LogTracer::init();

    let mut guard = None;
    let file_layer = std::env::var_os(ENV_LOG_DIR).map(PathBuf::from).and_then(|dir| {
        if let Err(err) = std::fs::create_dir_all(&dir) {
            eprintln!("Warning: failed to create log directory {}: {err}", dir.display());
            return None;
        }
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        let (writer, worker) = tracing_appender::non_blocking(appender);
        guard = Some(worker);
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(env_filter()),
        )
    });

    let console_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}
