pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use classifier::Classifier;
pub use config::MonitorConfig;
pub use models::{StockCheckResult, StockStatus};
pub use monitor::StockMonitor;
pub use utils::error::MonitorError;

pub type Result<T> = std::result::Result<T, MonitorError>;
