use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Blocked by security challenge after {}s", .waited.as_secs())]
    Blocked { waited: Duration },

    #[error("Email not configured: {missing} is not set")]
    NotConfigured { missing: String },

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MonitorError::Fetch(format!("request timed out: {}", err))
        } else {
            MonitorError::Fetch(err.to_string())
        }
    }
}

impl From<lettre::transport::smtp::Error> for MonitorError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MonitorError::Delivery(err.to_string())
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MonitorError>;
