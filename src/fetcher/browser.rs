use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::cell::Cell;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;

use super::PageFetcher;
use crate::classifier::looks_like_challenge;
use crate::config::ScraperConfig;
use crate::utils::error::{MonitorError, Result};

/// One headless Chrome process and its tab, alive for a single check.
/// Dropping the session closes the tab and kills the browser process.
pub struct BrowserSession {
    // Field order matters: the tab must go before the browser that owns it.
    tab: Arc<Tab>,
    _browser: Browser,
}

impl BrowserSession {
    pub fn launch(config: &ScraperConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .idle_browser_timeout(config.request_timeout + config.challenge_timeout)
            .args(vec![
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--no-first-run"),
                OsStr::new("--disable-background-timer-throttling"),
                OsStr::new("--disable-backgrounding-occluded-windows"),
                OsStr::new("--disable-renderer-backgrounding"),
            ])
            .build()
            .map_err(|e| MonitorError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(chrome_path.clone());
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| MonitorError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| MonitorError::Browser(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(config.request_timeout);
        tab.set_user_agent(&config.user_agent, Some("en-US,en;q=0.9"), None)
            .map_err(|e| MonitorError::Browser(format!("Failed to set user agent: {}", e)))?;

        tracing::info!("Browser session started");
        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| MonitorError::Fetch(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    pub fn content(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| MonitorError::Browser(format!("Failed to get page content: {}", e)))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            tracing::warn!("Error closing browser tab: {}", e);
        }
        tracing::info!("Browser session closed");
    }
}

/// Fetches pages through a real browser so client-side challenges get a
/// chance to resolve.
pub struct BrowserFetcher {
    config: ScraperConfig,
}

impl BrowserFetcher {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    async fn navigate_with_retry(&self, session: &BrowserSession, url: &str) -> Result<()> {
        let retries = self.config.navigation_attempts.saturating_sub(1) as usize;
        let strategy = FixedInterval::new(self.config.navigation_retry_delay).take(retries);
        let attempt = Cell::new(0u32);
        let attempts = self.config.navigation_attempts;

        Retry::spawn(strategy, || {
            attempt.set(attempt.get() + 1);
            let current = attempt.get();
            async move {
                tracing::info!("Navigating to {} (attempt {}/{})", url, current, attempts);
                session.navigate(url).inspect_err(|e| {
                    tracing::warn!("Navigation attempt {} failed: {}", current, e);
                })
            }
        })
        .await
    }

    /// The page to visit before `target`, if any. Never the target itself.
    fn warmup_for(&self, target: &str) -> Option<&str> {
        self.config
            .warmup_url
            .as_deref()
            .filter(|warmup| warmup.trim_end_matches('/') != target.trim_end_matches('/'))
    }

    /// Load the landing page so its cookies are set before the target visit.
    async fn warm_up(&self, session: &BrowserSession, url: &str) -> Result<()> {
        tracing::info!("Warming up session at {}", url);
        session.navigate(url)?;
        tokio::time::sleep(self.config.warmup_settle).await;
        wait_for_challenge(
            || session.content(),
            self.config.challenge_poll_interval,
            self.config.challenge_timeout,
        )
        .await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &str {
        "browser"
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let session = BrowserSession::launch(&self.config)?;

        if let Some(warmup) = self.warmup_for(url) {
            if let Err(e) = self.warm_up(&session, warmup).await {
                tracing::warn!(
                    "Warm-up visit to {} failed, going to the target anyway: {}",
                    warmup,
                    e
                );
            }
        }

        self.navigate_with_retry(&session, url).await?;

        wait_for_challenge(
            || session.content(),
            self.config.challenge_poll_interval,
            self.config.challenge_timeout,
        )
        .await
    }
}

/// Re-read the page every `poll_interval` while it still looks like a
/// security challenge, giving up once `timeout` has elapsed.
pub async fn wait_for_challenge<F>(
    mut read_page: F,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<String>
where
    F: FnMut() -> Result<String>,
{
    let html = read_page()?;
    if !looks_like_challenge(&html) {
        return Ok(html);
    }

    tracing::warn!("Detected security challenge page, waiting for it to resolve");

    let mut waited = Duration::ZERO;
    while waited < timeout {
        tokio::time::sleep(poll_interval).await;
        waited += poll_interval;

        let html = read_page()?;
        if !looks_like_challenge(&html) {
            tracing::info!("Security challenge resolved after {:?}", waited);
            return Ok(html);
        }

        tracing::info!("Still on security page... waited {:?}/{:?}", waited, timeout);
    }

    tracing::warn!("Security challenge did not resolve after {:?}", timeout);
    Err(MonitorError::Blocked { waited })
}
