//! Console + file logging.
//!
//! Both sinks share one line format: local timestamp, level, message. The
//! level filter defaults to `info` and can be overridden with `RUST_LOG`.

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(TIMESTAMP_FORMAT))
    }
}

/// Install the global subscriber. Log lines are appended to `log_file`; keep
/// the returned guard alive for as long as the process should keep writing.
pub fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
    let directory = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", log_file.display()))?;

    std::fs::create_dir_all(directory)
        .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", directory, e))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_timer(LocalTimer).with_target(false))
        .with(
            fmt::layer()
                .with_timer(LocalTimer)
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}
