//! Tracing setup for the dashboard binary.
//!
//! `NIGHTWATCH_DEBUG_LOG=1` forces debug output; otherwise `RUST_LOG` applies,
//! defaulting to `info`. The interactive session owns stdout, so it logs to a
//! daily file under the data directory. One-shot commands log to stderr.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEBUG_ENV: &str = "NIGHTWATCH_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "nightwatch-dash.log";

fn debug_forced(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

fn env_filter() -> EnvFilter {
    if debug_forced(std::env::var(DEBUG_ENV).ok().as_deref()) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Logs to stderr.
pub fn init_stderr() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

/// Logs to a daily-rolling file in `logs_dir`. The guard must be held until
/// exit so buffered lines are flushed. Falls back to stderr when the
/// directory cannot be created.
pub fn init_file(logs_dir: &Path) -> Option<WorkerGuard> {
    if let Err(err) = std::fs::create_dir_all(logs_dir) {
        init_stderr();
        tracing::warn!(error = %err, path = %logs_dir.display(), "Log directory unavailable; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init();
    Some(guard)
}
