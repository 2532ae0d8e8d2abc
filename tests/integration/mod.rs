// Integration tests for Stock Watcher
// These tests drive the public API against a local mock shop

pub mod check_flow_tests;
pub mod config_tests;
pub mod notification_tests;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use stock_watcher::{
    Classifier, StockMonitor,
    config::{FetchMode, MailSettings, ScraperConfig},
    fetcher::HttpFetcher,
    models::{NotificationMessage, ProductTarget},
    notifier::{EmailNotifier, MailTransport},
    utils::error::{MonitorError, Result},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PRODUCT_ID: &str = "100-10653";
pub const SEARCH_PATH: &str = "/search/destined-rivals-etb";

/// A listing tile whose image carries the sold-out overlay.
pub const SOLD_OUT_LISTING: &str = r#"<html><body>
    <div class="results">
        <a href="/product/100-10653/destined-rivals-etb">
            <div class="product-image-oos--Lae0t">SOLD OUT</div>
            <span>Destined Rivals Elite Trainer Box</span>
        </a>
    </div>
</body></html>"#;

/// The same tile without the overlay.
pub const IN_STOCK_LISTING: &str = r#"<html><body>
    <div class="results">
        <a href="/product/100-10653/destined-rivals-etb">
            <div class="product-image">img</div>
            <span>Destined Rivals Elite Trainer Box</span>
        </a>
    </div>
</body></html>"#;

pub const EMPTY_LISTING: &str = "<html><body>No products found</body></html>";

pub const CHALLENGE_PAGE: &str = r#"<html><head><title>Request unsuccessful</title></head>
<body><iframe id="main-iframe" src="/_Incapsula_Resource?SWUDNSAI=31"></iframe>
Request unsuccessful. Incapsula incident ID: 938000780185371286</body></html>"#;

/// Records every message instead of talking to a server.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub sent: Rc<RefCell<Vec<NotificationMessage>>>,
    pub fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|m| m.subject.clone()).collect()
    }
}

impl MailTransport for RecordingTransport {
    fn send(&self, message: &NotificationMessage) -> Result<()> {
        if self.fail {
            return Err(MonitorError::Delivery("421 service not available".to_string()));
        }
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

pub fn test_product(page_url: String) -> ProductTarget {
    ProductTarget {
        id: PRODUCT_ID.to_string(),
        name: "Destined Rivals Elite Trainer Box".to_string(),
        page_url,
        product_url: format!("https://shop.example.com/product/{}/destined-rivals-etb", PRODUCT_ID),
    }
}

pub fn test_scraper_config() -> ScraperConfig {
    ScraperConfig {
        fetch_mode: FetchMode::Http,
        request_timeout: Duration::from_secs(2),
        user_agent: "StockWatcher-Test/1.0".to_string(),
        chrome_path: None,
        navigation_attempts: 1,
        navigation_retry_delay: Duration::from_millis(10),
        challenge_poll_interval: Duration::from_millis(10),
        challenge_timeout: Duration::from_millis(50),
        debug_page_path: None,
        warmup_url: None,
        warmup_settle: Duration::ZERO,
    }
}

pub fn test_mail_settings(configured: bool) -> MailSettings {
    MailSettings {
        smtp_server: "smtp.gmail.com".to_string(),
        smtp_port: 587,
        from_email: configured.then(|| "watcher@example.com".to_string()),
        password: configured.then(|| "app-password".to_string()),
        to_email: None,
    }
}

/// Serve `body` at the search path with the given status.
pub async fn mock_shop(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

/// The search page URL on a mock shop.
pub fn shop_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), SEARCH_PATH)
}

/// A monitor wired to a real HTTP fetcher pointed at `page_url`.
pub fn create_test_monitor(
    page_url: String,
    transport: RecordingTransport,
    configured: bool,
) -> anyhow::Result<StockMonitor> {
    let product = test_product(page_url);
    let fetcher = HttpFetcher::new(&test_scraper_config())?;
    let notifier = EmailNotifier::with_transport(
        test_mail_settings(configured),
        product.clone(),
        Box::new(transport),
    );

    Ok(StockMonitor::new(Box::new(fetcher), Classifier::new(product), notifier))
}
