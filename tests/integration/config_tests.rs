use super::*;
use config::Environment;
use std::io::Write;
use stock_watcher::MonitorConfig;

fn env_from(pairs: &[(&str, &str)]) -> Environment {
    let vars = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Environment::default().source(Some(vars))
}

#[tokio::test]
async fn test_monitor_from_config_checks_configured_page() -> anyhow::Result<()> {
    let server = mock_shop(200, SOLD_OUT_LISTING).await;
    let target_url = shop_url(&server);

    let config = MonitorConfig::from_sources(
        None,
        env_from(&[("TARGET_URL", target_url.as_str()), ("REQUEST_TIMEOUT_SECS", "5")]),
    )?;
    let monitor = StockMonitor::from_config(&config)?;

    let result = monitor.check_stock().await;
    assert_eq!(result.status_label(), "SOLD OUT");
    assert!(!monitor.notifier().is_configured());
    Ok(())
}

#[tokio::test]
async fn test_config_file_sets_product_and_snapshot() -> anyhow::Result<()> {
    let server = mock_shop(200, IN_STOCK_LISTING).await;
    let dir = tempfile::tempdir()?;
    let snapshot = dir.path().join("pages").join("last.html");

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(file, "target_url = \"{}{}\"", server.uri(), SEARCH_PATH)?;
    writeln!(file, "debug_page_path = \"{}\"", snapshot.display())?;
    writeln!(file, "from_email = \"watcher@example.com\"")?;
    writeln!(file, "email_password = \"app-password\"")?;

    let config = MonitorConfig::from_sources(Some(file.path()), env_from(&[]))?;
    let monitor = StockMonitor::from_config(&config)?;

    assert!(monitor.notifier().is_configured());
    assert_eq!(monitor.notifier().recipient(), "watcher@example.com");

    let result = monitor.check_stock().await;
    assert!(result.available());
    assert!(snapshot.exists());
    Ok(())
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let err =
        MonitorConfig::from_sources(None, env_from(&[("POLL_INTERVAL_SECS", "0")])).unwrap_err();
    assert!(err.to_string().contains("POLL_INTERVAL_SECS"));

    let err =
        MonitorConfig::from_sources(None, env_from(&[("TARGET_URL", "shop page")])).unwrap_err();
    assert!(err.to_string().contains("TARGET_URL"));
}
