//! Logging setup for docshare.
//!
//! `logging.level` takes either a bare level (`info`) or full `EnvFilter`
//! directives (`info,docshare=debug,tower_http=warn`). A non-empty `RUST_LOG`
//! replaces it entirely.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{DocshareError, Result};

/// Parse filter directives from configuration.
fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| {
        DocshareError::Config(format!("invalid logging.level {directives:?}: {e}"))
    })
}

fn build_filter(directives: &str) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(env) if !env.trim().is_empty() => parse_filter(&env),
        _ => parse_filter(directives),
    }
}

/// Open the log file for appending, creating it and its directory if needed.
fn open_log_file(path: &str) -> Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Initialize logging to stdout and to the configured log file.
///
/// Fails on an unparseable filter or an unwritable log file; the caller
/// falls back to [`init_console_only`].
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(&config.level)?;
    let log_file = Arc::new(open_log_file(&config.file)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .init();

    Ok(())
}

/// Initialize console-only logging.
///
/// Directives that do not parse are skipped rather than rejected.
pub fn init_console_only(level: &str) {
    let filter = build_filter(level).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .init();
}
