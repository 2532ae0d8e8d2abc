pub mod email;
pub mod smtp;

use crate::models::NotificationMessage;
use crate::utils::error::Result;

pub use email::EmailNotifier;
pub use smtp::SmtpMailer;

/// Delivers a composed message. Implementations report failure through the
/// returned error and never retry.
#[cfg_attr(test, mockall::automock)]
pub trait MailTransport {
    fn send(&self, message: &NotificationMessage) -> Result<()>;
}
