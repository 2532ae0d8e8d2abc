use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::config::LoggingConfig;
use crate::utils::error::{MonitorError, Result};

/// Install the global subscriber: one plain-text layer appending to the log
/// file and one on stdout. The returned guard flushes the file writer when
/// dropped, so the caller must hold it for the life of the process.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let filter = build_filter(&config.level)?;

    let (dir, file_name) = split_log_path(&config.log_file)?;
    std::fs::create_dir_all(dir)?;

    let file_appender = rolling::never(dir, file_name);
    let (file_writer, guard) = non_blocking(file_appender);

    let file_layer = fmt::Layer::new()
        .with_writer(file_writer)
        .with_target(false)
        .with_ansi(false);
    let console_layer = fmt::Layer::new()
        .with_writer(std::io::stdout)
        .with_target(false);

    Registry::default()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| config_error(format!("Failed to install logger: {}", e)))?;

    tracing::debug!("Logging to {}", config.log_file.display());
    Ok(guard)
}

/// Stdout-only logger for failures that happen before `init` can run.
/// Returns false when a global subscriber is already installed.
pub fn init_console() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// `RUST_LOG` wins over the configured level when set.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let filter = EnvFilter::try_new(level)
        .map_err(|e| config_error(format!("Invalid LOG_LEVEL '{}': {}", level, e)))?;

    // Keep dependency chatter out of the log unless tracing everything.
    if level.to_lowercase().contains("trace") {
        return Ok(filter);
    }
    Ok(filter
        .add_directive(quiet("hyper=warn")?)
        .add_directive(quiet("reqwest=info")?)
        .add_directive(quiet("headless_chrome=warn")?)
        .add_directive(quiet("tungstenite=warn")?))
}

fn quiet(directive: &str) -> Result<tracing_subscriber::filter::Directive> {
    directive
        .parse()
        .map_err(|e| config_error(format!("Invalid log directive '{}': {}", directive, e)))
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| config_error(format!("LOG_FILE '{}' has no file name", path.display())))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((dir, file_name))
}

fn config_error(message: String) -> MonitorError {
    MonitorError::Config(config::ConfigError::Message(message))
}
