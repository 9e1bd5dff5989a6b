use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;

/// Installs the console layer plus a plain-text layer that appends warnings
/// and errors to `error_log`, the file the weekly report is built from.
pub fn init_tracing(config: &LoggingConfig, error_log: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level {:?}", config.level))?;

    let error_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(error_log)
        .with_context(|| format!("failed to open error log {}", error_log.display()))?;

    let error_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(error_file))
        .with_filter(LevelFilter::WARN);

    let registry = tracing_subscriber::registry().with(error_layer);

    let result = if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_filter(filter))
            .try_init()
    } else {
        registry.with(fmt::layer().with_filter(filter)).try_init()
    };

    result.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
