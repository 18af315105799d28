//! Global tracing subscriber for the `biogate` binary.
//!
//! Console output goes to stderr so command results on stdout stay
//! machine-readable. File output uses a non-blocking daily rolling appender.

use anyhow::Context;
use biogate_kernel::domain::config::LoggingConfig;
use std::fs;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "biogate";
const LOG_FILE_SUFFIX: &str = "log";
const MAX_LOG_FILES: usize = 10;

/// Keeps the background file writer alive. Drop it only on shutdown.
#[must_use = "Dropping this handle stops the background log writer"]
#[derive(Debug)]
pub struct LogGuard {
    guard: Option<WorkerGuard>,
}

impl LogGuard {
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

/// Resolves the effective level: `verbose` forces `DEBUG`.
///
/// # Errors
/// Returns an error if the configured level is not a valid level name.
pub fn level(config: &LoggingConfig, verbose: bool) -> anyhow::Result<LevelFilter> {
    if verbose {
        return Ok(LevelFilter::DEBUG);
    }
    config
        .level
        .parse::<LevelFilter>()
        .with_context(|| format!("Invalid log level '{}'", config.level))
}

/// Installs the global subscriber described by `config`.
///
/// `RUST_LOG` directives take precedence over the configured level. With both
/// console and file output disabled, nothing is installed and logs are dropped.
///
/// # Errors
/// Returns an error for an invalid level, an unusable log directory, or if a
/// global subscriber is already set.
pub fn init(config: &LoggingConfig, verbose: bool) -> anyhow::Result<LogGuard> {
    let filter = EnvFilter::builder().with_default_directive(level(config, verbose)?.into()).from_env_lossy();

    let mut layers = Vec::new();

    if config.console {
        layers.push(layer().compact().with_ansi(true).with_writer(std::io::stderr).boxed());
    }

    let guard = if let Some(path) = &config.directory {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create log directory: {}", path.display()))?;

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(MAX_LOG_FILES)
            .build(path)
            .context("Failed to set up rolling log file")?;

        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = layer().with_writer(writer).with_ansi(false);
        layers.push(if config.json { file_layer.json().boxed() } else { file_layer.boxed() });
        Some(guard)
    } else {
        None
    };

    if layers.is_empty() {
        return Ok(LogGuard { guard: None });
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .context("Failed to install the global log subscriber")?;

    Ok(LogGuard { guard })
}
