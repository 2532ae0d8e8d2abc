use chrono::{Local, NaiveDateTime};

use super::{MailTransport, SmtpMailer};
use crate::config::MailSettings;
use crate::models::{NotificationMessage, ProductTarget, StockCheckResult};
use crate::utils::error::{MonitorError, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct EmailNotifier {
    settings: MailSettings,
    product: ProductTarget,
    transport: Box<dyn MailTransport>,
}

impl EmailNotifier {
    pub fn new(settings: MailSettings, product: ProductTarget) -> Self {
        let transport = Box::new(SmtpMailer::new(settings.clone()));
        Self::with_transport(settings, product, transport)
    }

    pub fn with_transport(
        settings: MailSettings,
        product: ProductTarget,
        transport: Box<dyn MailTransport>,
    ) -> Self {
        Self {
            settings,
            product,
            transport,
        }
    }

    /// Names the first missing credential, if any.
    pub fn check_configured(&self) -> Result<()> {
        let present =
            |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

        if !present(&self.settings.from_email) {
            return Err(MonitorError::NotConfigured { missing: "FROM_EMAIL".to_string() });
        }
        if !present(&self.settings.password) {
            return Err(MonitorError::NotConfigured { missing: "EMAIL_PASSWORD".to_string() });
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.check_configured().is_ok()
    }

    pub fn recipient(&self) -> &str {
        self.settings
            .to_email
            .as_deref()
            .or(self.settings.from_email.as_deref())
            .unwrap_or_default()
    }

    pub fn compose(
        &self,
        result: &StockCheckResult,
        checked_at: NaiveDateTime,
    ) -> NotificationMessage {
        let timestamp = checked_at.format(TIMESTAMP_FORMAT).to_string();
        let body = if result.available() {
            self.in_stock_body(result.status_label(), &timestamp)
        } else {
            self.out_of_stock_body(result.status_label(), &timestamp)
        };

        NotificationMessage {
            recipient: self.recipient().to_string(),
            subject: format!("{} Stock Alert - {}", self.product.name, result.status_label()),
            body,
        }
    }

    fn in_stock_body(&self, status: &str, timestamp: &str) -> String {
        let mut text = String::new();

        text.push_str("🎉 GOOD NEWS! 🎉\n\n");
        text.push_str(&format!("The {} is currently IN STOCK!\n\n", self.product.name));
        text.push_str(&format!("✅ Status: {}\n", status));
        text.push_str(&format!("🕒 Checked at: {}\n", timestamp));
        text.push_str(&format!("🔗 Direct link: {}\n\n", self.product.product_url));
        text.push_str("Hurry up and grab it before it sells out again!\n\n");
        text.push_str("---\nAutomated Stock Watcher");

        text
    }

    fn out_of_stock_body(&self, status: &str, timestamp: &str) -> String {
        let mut text = String::new();

        text.push_str("📦 Stock Update 📦\n\n");
        text.push_str(&format!("The {} status:\n\n", self.product.name));
        text.push_str(&format!("❌ Status: {}\n", status));
        text.push_str(&format!("🕒 Checked at: {}\n", timestamp));
        text.push_str(&format!("🔗 Product page: {}\n\n", self.product.product_url));
        text.push_str("We'll keep monitoring and let you know when it's back in stock!\n\n");
        text.push_str("---\nAutomated Stock Watcher");

        text
    }

    pub fn compose_test(&self, sent_at: NaiveDateTime) -> NotificationMessage {
        let body = format!(
            "🧪 Test Email 🧪\n\n\
             This is a test email from your Stock Watcher for {}.\n\n\
             If you're receiving this, your email configuration is working correctly!\n\n\
             Timestamp: {}\n\n\
             ---\nStock Watcher Setup Test",
            self.product.name,
            sent_at.format(TIMESTAMP_FORMAT)
        );

        NotificationMessage {
            recipient: self.recipient().to_string(),
            subject: "Stock Watcher - Test Email".to_string(),
            body,
        }
    }

    /// Compose and deliver one notification for `result`. Returns whether the
    /// email went out; failures are logged, never raised.
    pub fn send_notification(&self, result: &StockCheckResult) -> bool {
        if let Err(e) = self.check_configured() {
            tracing::error!("Email credentials not configured: {}", e);
            return false;
        }

        let message = self.compose(result, Local::now().naive_local());
        match self.transport.send(&message) {
            Ok(()) => {
                tracing::info!(
                    recipient = %message.recipient,
                    "Email notification sent successfully"
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to send email: {}", e);
                false
            }
        }
    }

    pub fn send_test_email(&self) -> bool {
        if let Err(e) = self.check_configured() {
            tracing::error!("Cannot send test email: {}", e);
            return false;
        }

        let message = self.compose_test(Local::now().naive_local());
        match self.transport.send(&message) {
            Ok(()) => {
                tracing::info!(recipient = %message.recipient, "Test email sent successfully");
                true
            }
            Err(e) => {
                tracing::error!("Failed to send test email: {}", e);
                false
            }
        }
    }
}
