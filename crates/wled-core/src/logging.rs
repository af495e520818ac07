//! File logging for the plugin process

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "WLED_DIAL_LOG";

/// Filter used when `WLED_DIAL_LOG` is unset or unparsable
pub const DEFAULT_FILTER: &str = "wled_dial=info,wled_app=info,wled_device=info,warn";

const LOG_FILE_PREFIX: &str = "wled-dial.log";

/// Install the global subscriber.
///
/// Stdout carries the host protocol, so logs only go to a daily-rolling file
/// under the platform data dir, e.g. `~/.local/share/wled-dial/logs/`.
///
/// ```bash
/// WLED_DIAL_LOG=debug wled-dial
/// WLED_DIAL_LOG=wled_app=trace wled-dial
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(env_filter(std::env::var(LOG_ENV).ok().as_deref()))
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!(log_dir = %log_dir.display(), "wled-dial starting");

    Ok(())
}

fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wled-dial")
        .join("logs")
}

/// Build the filter from a user directive, falling back to [`DEFAULT_FILTER`]
fn env_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
