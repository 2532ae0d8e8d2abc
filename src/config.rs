use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::models::ProductTarget;
use crate::scheduler::DailySchedule;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Everything the monitor needs, loaded once at start. Keys map one-to-one
/// onto unprefixed environment variables (`FROM_EMAIL` -> `from_email`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub product_id: String,
    pub product_name: String,
    pub target_url: String,
    pub product_url: String,

    pub from_email: Option<String>,
    pub email_password: Option<String>,
    pub email_provider: String,
    pub to_email: Option<String>,

    pub check_time: String,
    pub poll_interval_secs: u64,

    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub fetch_mode: FetchMode,
    pub chrome_path: Option<String>,
    pub navigation_attempts: u32,
    pub navigation_retry_delay_secs: u64,
    pub challenge_poll_secs: u64,
    pub challenge_timeout_secs: u64,
    pub debug_page_path: Option<String>,
    /// Page visited before the target to pick up session cookies. Unset means
    /// the target's site root; an empty value turns the visit off.
    pub warmup_url: Option<String>,
    pub warmup_settle_secs: u64,

    pub log_file: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    Http,
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Gmail,
    Outlook,
    Yahoo,
}

impl MailProvider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gmail" => Some(MailProvider::Gmail),
            "outlook" => Some(MailProvider::Outlook),
            "yahoo" => Some(MailProvider::Yahoo),
            _ => None,
        }
    }

    pub fn server(&self) -> &'static str {
        match self {
            MailProvider::Gmail => "smtp.gmail.com",
            MailProvider::Outlook => "smtp-mail.outlook.com",
            MailProvider::Yahoo => "smtp.mail.yahoo.com",
        }
    }

    pub fn port(&self) -> u16 {
        587
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub fetch_mode: FetchMode,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub chrome_path: Option<PathBuf>,
    pub navigation_attempts: u32,
    pub navigation_retry_delay: Duration,
    pub challenge_poll_interval: Duration,
    pub challenge_timeout: Duration,
    pub debug_page_path: Option<PathBuf>,
    pub warmup_url: Option<String>,
    pub warmup_settle: Duration,
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub from_email: Option<String>,
    pub password: Option<String>,
    /// Falls back to the sender when unset.
    pub to_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_file: PathBuf,
    pub level: String,
}

impl MonitorConfig {
    /// Defaults, then the optional config file, then the process environment.
    /// Environment values stay strings until deserialization, so secrets and
    /// ids made of digits keep their exact text.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_sources(config_file, Environment::default())
    }

    pub fn from_sources(config_file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("product_id", "100-10653")?
            .set_default(
                "product_name",
                "Pokémon TCG: Scarlet & Violet-Destined Rivals Pokémon Center Elite Trainer Box",
            )?
            .set_default("target_url", "https://www.pokemoncenter.com/search/destined-rivals-etb")?
            .set_default(
                "product_url",
                "https://www.pokemoncenter.com/product/100-10653/pokemon-tcg-scarlet-and-violet-destined-rivals-pokemon-center-elite-trainer-box",
            )?
            .set_default("email_provider", "gmail")?
            .set_default("check_time", "00:00")?
            .set_default("poll_interval_secs", 60)?
            .set_default("request_timeout_secs", 30)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("fetch_mode", "http")?
            .set_default("navigation_attempts", 3)?
            .set_default("navigation_retry_delay_secs", 10)?
            .set_default("challenge_poll_secs", 2)?
            .set_default("challenge_timeout_secs", 30)?
            .set_default("warmup_settle_secs", 5)?
            .set_default("log_file", "logs/stock_watcher.log")?
            .set_default("log_level", "info")?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path));
        }

        let config: MonitorConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.product_id.trim().is_empty() {
            return Err(ConfigError::Message("PRODUCT_ID must not be empty".into()));
        }

        if Url::parse(&self.target_url).is_err() {
            return Err(ConfigError::Message(format!("Invalid TARGET_URL: {}", self.target_url)));
        }

        if Url::parse(&self.product_url).is_err() {
            return Err(ConfigError::Message(format!("Invalid PRODUCT_URL: {}", self.product_url)));
        }

        if let Some(warmup) = self.warmup_url.as_deref().filter(|w| !w.trim().is_empty()) {
            if Url::parse(warmup).is_err() {
                return Err(ConfigError::Message(format!("Invalid WARMUP_URL: {}", warmup)));
            }
        }

        if self.schedule().is_none() {
            return Err(ConfigError::Message(format!(
                "CHECK_TIME must be HH:MM, got '{}'",
                self.check_time
            )));
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Message("POLL_INTERVAL_SECS must be greater than 0".into()));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Message("REQUEST_TIMEOUT_SECS must be greater than 0".into()));
        }

        if self.navigation_attempts == 0 {
            return Err(ConfigError::Message("NAVIGATION_ATTEMPTS must be greater than 0".into()));
        }

        if self.challenge_poll_secs == 0 || self.challenge_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "CHALLENGE_POLL_SECS and CHALLENGE_TIMEOUT_SECS must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn schedule(&self) -> Option<DailySchedule> {
        DailySchedule::parse(&self.check_time)
    }

    pub fn product(&self) -> ProductTarget {
        ProductTarget {
            id: self.product_id.trim().to_string(),
            name: self.product_name.clone(),
            page_url: self.target_url.clone(),
            product_url: self.product_url.clone(),
        }
    }

    pub fn scraper(&self) -> ScraperConfig {
        ScraperConfig {
            fetch_mode: self.fetch_mode,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
            chrome_path: self.chrome_path.as_ref().map(PathBuf::from),
            navigation_attempts: self.navigation_attempts,
            navigation_retry_delay: Duration::from_secs(self.navigation_retry_delay_secs),
            challenge_poll_interval: Duration::from_secs(self.challenge_poll_secs),
            challenge_timeout: Duration::from_secs(self.challenge_timeout_secs),
            debug_page_path: self.debug_page_path.as_ref().map(PathBuf::from),
            warmup_url: self.resolved_warmup_url(),
            warmup_settle: Duration::from_secs(self.warmup_settle_secs),
        }
    }

    fn resolved_warmup_url(&self) -> Option<String> {
        match self.warmup_url.as_deref().map(str::trim) {
            Some("") => None,
            Some(url) => Some(url.to_string()),
            None => Url::parse(&self.target_url)
                .and_then(|target| target.join("/"))
                .ok()
                .map(String::from),
        }
    }

    pub fn mail(&self) -> MailSettings {
        let provider = MailProvider::from_name(&self.email_provider).unwrap_or_else(|| {
            tracing::warn!(
                provider = %self.email_provider,
                "Unknown EMAIL_PROVIDER, falling back to gmail"
            );
            MailProvider::Gmail
        });

        MailSettings {
            smtp_server: provider.server().to_string(),
            smtp_port: provider.port(),
            from_email: self.from_email.clone(),
            password: self.email_password.clone(),
            to_email: self
                .to_email
                .clone()
                .filter(|to| !to.trim().is_empty())
                .or_else(|| self.from_email.clone()),
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            log_file: PathBuf::from(&self.log_file),
            level: self.log_level.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
