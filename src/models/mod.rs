pub mod notification;
pub mod product;
pub mod stock_check;

// Re-exports for convenience
pub use notification::*;
pub use product::*;
pub use stock_check::*;
