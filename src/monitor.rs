use std::path::PathBuf;

use crate::classifier::Classifier;
use crate::config::MonitorConfig;
use crate::fetcher::{self, PageFetcher};
use crate::models::{StockCheckResult, StockStatus};
use crate::notifier::EmailNotifier;
use crate::utils::error::{MonitorError, Result};

/// Wires fetch, classification and notification into one check. Every run
/// is independent; nothing carries over between checks.
pub struct StockMonitor {
    fetcher: Box<dyn PageFetcher>,
    classifier: Classifier,
    notifier: EmailNotifier,
    debug_page_path: Option<PathBuf>,
}

impl StockMonitor {
    pub fn new(
        fetcher: Box<dyn PageFetcher>,
        classifier: Classifier,
        notifier: EmailNotifier,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            notifier,
            debug_page_path: None,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let scraper = config.scraper();
        let fetcher = fetcher::build_fetcher(&scraper)?;
        let classifier = Classifier::new(config.product());
        let notifier = EmailNotifier::new(config.mail(), config.product());

        tracing::info!(
            fetcher = fetcher.name(),
            product_id = %classifier.target().id,
            "Stock monitor initialized"
        );

        Ok(Self::new(fetcher, classifier, notifier).with_debug_page(scraper.debug_page_path))
    }

    pub fn with_debug_page(mut self, path: Option<PathBuf>) -> Self {
        self.debug_page_path = path;
        self
    }

    pub fn notifier(&self) -> &EmailNotifier {
        &self.notifier
    }

    /// Fetch and classify the target page. Fetch failures are folded into the
    /// result instead of being returned.
    pub async fn check_stock(&self) -> StockCheckResult {
        let status = self.check_status().await;
        let result = StockCheckResult::from(status);

        tracing::info!(
            code = result.code(),
            available = result.available(),
            "Stock status: {}",
            result.status_label()
        );
        result
    }

    async fn check_status(&self) -> StockStatus {
        let url = &self.classifier.target().page_url;
        tracing::info!(fetcher = self.fetcher.name(), "Checking stock at {}", url);

        match self.fetcher.fetch(url).await {
            Ok(html) => {
                self.save_debug_page(&html);
                self.classifier.classify(&html)
            }
            Err(MonitorError::Blocked { waited }) => {
                tracing::warn!("Page still behind a security challenge after {:?}", waited);
                StockStatus::Blocked
            }
            Err(e) => {
                tracing::error!("Error checking stock status: {}", e);
                StockStatus::CheckFailed(e.to_string())
            }
        }
    }

    fn save_debug_page(&self, html: &str) {
        if let Some(path) = &self.debug_page_path {
            match fetcher::save_debug_page(path, html) {
                Ok(()) => tracing::debug!("Saved page snapshot to {}", path.display()),
                Err(e) => {
                    tracing::warn!("Could not save page snapshot to {}: {}", path.display(), e)
                }
            }
        }
    }

    pub async fn run_daily_check(&self) -> bool {
        tracing::info!("{}", "=".repeat(50));
        tracing::info!("Starting daily stock check for {}", self.classifier.target().name);

        let result = self.check_stock().await;
        let sent = self.notifier.send_notification(&result);

        if sent {
            tracing::info!("Daily check completed successfully");
        } else {
            tracing::error!("Daily check completed but email failed to send");
        }
        tracing::info!("{}", "=".repeat(50));

        sent
    }

    /// One-off verification: test email, a real check, then the stock email.
    pub async fn run_test_check(&self) -> bool {
        tracing::info!("Running test stock check...");

        if let Err(e) = self.notifier.check_configured() {
            tracing::error!("{}. Please set FROM_EMAIL and EMAIL_PASSWORD.", e);
            return false;
        }

        tracing::info!("Testing email configuration...");
        if !self.notifier.send_test_email() {
            tracing::error!("Email test failed");
            return false;
        }
        tracing::info!("Email test successful");

        let result = self.check_stock().await;
        tracing::info!("Stock Status: {}", result);

        if self.notifier.send_notification(&result) {
            tracing::info!("Stock notification sent successfully");
            true
        } else {
            tracing::error!("Failed to send stock notification");
            false
        }
    }
}
