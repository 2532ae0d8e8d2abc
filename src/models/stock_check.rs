use serde::{Deserialize, Serialize};
use std::fmt;

/// Every outcome the classifier can reach. The availability flag and the
/// human-readable label both derive from the variant, so they can't disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    InStock,
    /// No heuristic was conclusive and the fail-open default applied.
    AssumedInStock,
    SoldOut,
    NotFound,
    Blocked,
    CheckFailed(String),
}

impl StockStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, StockStatus::InStock | StockStatus::AssumedInStock)
    }

    /// Short code used in structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            StockStatus::InStock => "IN_STOCK",
            StockStatus::AssumedInStock => "IN_STOCK_ASSUMED",
            StockStatus::SoldOut => "SOLD_OUT",
            StockStatus::NotFound => "NOT_FOUND",
            StockStatus::Blocked => "BLOCKED",
            StockStatus::CheckFailed(_) => "ERROR",
        }
    }

    pub fn label(&self) -> String {
        match self {
            StockStatus::InStock => "IN STOCK".to_string(),
            StockStatus::AssumedInStock => "Status unclear - assumed IN STOCK".to_string(),
            StockStatus::SoldOut => "SOLD OUT".to_string(),
            StockStatus::NotFound => "Product not found on page".to_string(),
            StockStatus::Blocked => "BLOCKED BY SECURITY".to_string(),
            StockStatus::CheckFailed(reason) => format!("Error checking stock: {}", reason),
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockCheckResult {
    available: bool,
    status_label: String,
    code: &'static str,
}

impl StockCheckResult {
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn status_label(&self) -> &str {
        &self.status_label
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<StockStatus> for StockCheckResult {
    fn from(status: StockStatus) -> Self {
        StockCheckResult {
            available: status.is_available(),
            status_label: status.label(),
            code: status.code(),
        }
    }
}

impl fmt::Display for StockCheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Available: {})", self.status_label, self.available)
    }
}
