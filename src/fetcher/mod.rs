pub mod browser;
pub mod http;

use async_trait::async_trait;
use std::path::Path;

use crate::config::{FetchMode, ScraperConfig};
use crate::utils::error::Result;

pub use browser::{BrowserFetcher, BrowserSession, wait_for_challenge};
pub use http::HttpFetcher;

/// Retrieves the raw HTML of a page.
///
/// Checks run strictly one after another on a single thread, so
/// implementations are not required to be `Send`.
#[async_trait(?Send)]
pub trait PageFetcher {
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str) -> Result<String>;
}

pub fn build_fetcher(config: &ScraperConfig) -> Result<Box<dyn PageFetcher>> {
    match config.fetch_mode {
        FetchMode::Http => Ok(Box::new(HttpFetcher::new(config)?)),
        FetchMode::Browser => Ok(Box::new(BrowserFetcher::new(config.clone()))),
    }
}

/// Keep a copy of the last fetched page for selector debugging.
pub fn save_debug_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, html)?;
    Ok(())
}
