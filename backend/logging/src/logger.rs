//! Structured Logger
//!
//! Wraps `tracing` to provide human or JSON console output, optional file
//! rotation (NDJSON), and environment-based level control.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name prefix for rolling logs: `tenantlens.log.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "tenantlens.log";

/// Initialize the global structured logger.
///
/// `RUST_LOG` overrides `level` when set. Console output goes to stderr so
/// command output on stdout stays machine-readable. When `log_dir` is given a
/// daily-rolling NDJSON file layer is added.
pub fn init_logger<P: AsRef<Path>>(log_dir: Option<P>, level: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let file_layer = match log_dir {
        Some(dir) => {
            let dir = dir.as_ref();
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file_appender)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .try_init();

    Ok(())
}
