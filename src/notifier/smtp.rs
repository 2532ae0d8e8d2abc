use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::MailTransport;
use crate::config::MailSettings;
use crate::models::NotificationMessage;
use crate::utils::error::{MonitorError, Result};

/// STARTTLS submission to the provider's relay. A fresh connection is opened
/// and authenticated for every message.
pub struct SmtpMailer {
    settings: MailSettings,
}

impl SmtpMailer {
    pub fn new(settings: MailSettings) -> Self {
        Self { settings }
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let from = self
            .settings
            .from_email
            .as_deref()
            .ok_or_else(|| MonitorError::NotConfigured { missing: "FROM_EMAIL".to_string() })?;
        let password = self
            .settings
            .password
            .as_deref()
            .ok_or_else(|| MonitorError::NotConfigured { missing: "EMAIL_PASSWORD".to_string() })?;
        Ok((from, password))
    }

    fn build_message(&self, from: &str, message: &NotificationMessage) -> Result<Message> {
        let sender: Mailbox = from
            .parse()
            .map_err(|e| {
                MonitorError::Delivery(format!("Invalid sender address '{}': {}", from, e))
            })?;
        let recipient: Mailbox = message
            .recipient
            .parse()
            .map_err(|e| {
                MonitorError::Delivery(format!(
                    "Invalid recipient address '{}': {}",
                    message.recipient, e
                ))
            })?;

        Message::builder()
            .from(sender)
            .to(recipient)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| MonitorError::Delivery(format!("Failed to build email: {}", e)))
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: &NotificationMessage) -> Result<()> {
        let (from, password) = self.credentials()?;
        let email = self.build_message(from, message)?;

        let mailer = SmtpTransport::starttls_relay(&self.settings.smtp_server)?
            .port(self.settings.smtp_port)
            .credentials(Credentials::new(from.to_string(), password.to_string()))
            .build();

        tracing::debug!(
            server = %self.settings.smtp_server,
            port = self.settings.smtp_port,
            "Submitting email over SMTP"
        );
        mailer.send(&email)?;
        Ok(())
    }
}
