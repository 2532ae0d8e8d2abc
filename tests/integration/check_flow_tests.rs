use super::*;

async fn check_page(status: u16, body: &str) -> anyhow::Result<stock_watcher::StockCheckResult> {
    let server = mock_shop(status, body).await;
    let monitor = create_test_monitor(shop_url(&server), RecordingTransport::default(), true)?;
    Ok(monitor.check_stock().await)
}

#[tokio::test]
async fn test_sold_out_listing() -> anyhow::Result<()> {
    let result = check_page(200, SOLD_OUT_LISTING).await?;

    assert!(!result.available());
    assert_eq!(result.status_label(), "SOLD OUT");
    Ok(())
}

#[tokio::test]
async fn test_in_stock_listing() -> anyhow::Result<()> {
    let result = check_page(200, IN_STOCK_LISTING).await?;

    assert!(result.available());
    assert_eq!(result.status_label(), "IN STOCK");
    Ok(())
}

#[tokio::test]
async fn test_product_missing_from_listing() -> anyhow::Result<()> {
    let result = check_page(200, EMPTY_LISTING).await?;

    assert!(!result.available());
    assert_eq!(result.status_label(), "Product not found on page");
    Ok(())
}

#[tokio::test]
async fn test_challenge_page_is_blocked() -> anyhow::Result<()> {
    let result = check_page(200, CHALLENGE_PAGE).await?;

    assert!(!result.available());
    assert_eq!(result.status_label(), "BLOCKED BY SECURITY");
    Ok(())
}

#[tokio::test]
async fn test_server_error_is_reported_not_raised() -> anyhow::Result<()> {
    let result = check_page(503, "Service Unavailable").await?;

    assert!(!result.available());
    assert!(result.status_label().starts_with("Error checking stock"));
    assert!(result.status_label().contains("503"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_shop_is_reported_not_raised() -> anyhow::Result<()> {
    let monitor = create_test_monitor(
        "http://127.0.0.1:1/search".to_string(),
        RecordingTransport::default(),
        true,
    )?;
    let result = monitor.check_stock().await;

    assert!(!result.available());
    assert!(result.status_label().contains("Error"));
    Ok(())
}

#[tokio::test]
async fn test_repeated_checks_agree() -> anyhow::Result<()> {
    let server = mock_shop(200, SOLD_OUT_LISTING).await;
    let monitor = create_test_monitor(shop_url(&server), RecordingTransport::default(), true)?;

    let first = monitor.check_stock().await;
    let second = monitor.check_stock().await;

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_debug_snapshot_written_for_checked_page() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let snapshot = dir.path().join("last_page.html");

    let server = mock_shop(200, IN_STOCK_LISTING).await;
    let monitor = create_test_monitor(shop_url(&server), RecordingTransport::default(), true)?
        .with_debug_page(Some(snapshot.clone()));
    monitor.check_stock().await;

    assert_eq!(std::fs::read_to_string(&snapshot)?, IN_STOCK_LISTING);
    Ok(())
}
