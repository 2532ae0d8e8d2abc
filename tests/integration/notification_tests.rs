use super::*;

#[tokio::test]
async fn test_daily_check_emails_sold_out_status() -> anyhow::Result<()> {
    let server = mock_shop(200, SOLD_OUT_LISTING).await;
    let transport = RecordingTransport::default();
    let monitor = create_test_monitor(shop_url(&server), transport.clone(), true)?;

    assert!(monitor.run_daily_check().await);

    let sent = transport.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "watcher@example.com");
    assert_eq!(sent[0].subject, "Destined Rivals Elite Trainer Box Stock Alert - SOLD OUT");
    assert!(sent[0].body.contains("We'll keep monitoring"));
    assert!(
        sent[0]
            .body
            .contains("https://shop.example.com/product/100-10653/destined-rivals-etb")
    );
    Ok(())
}

#[tokio::test]
async fn test_daily_check_emails_in_stock_status() -> anyhow::Result<()> {
    let server = mock_shop(200, IN_STOCK_LISTING).await;
    let transport = RecordingTransport::default();
    let monitor = create_test_monitor(shop_url(&server), transport.clone(), true)?;

    assert!(monitor.run_daily_check().await);

    let sent = transport.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.ends_with("IN STOCK"));
    assert!(sent[0].body.contains("GOOD NEWS"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_still_notifies_with_error_label() -> anyhow::Result<()> {
    let transport = RecordingTransport::default();
    let monitor =
        create_test_monitor("http://127.0.0.1:1/search".to_string(), transport.clone(), true)?;

    assert!(monitor.run_daily_check().await);

    let subjects = transport.subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].contains("Error checking stock"));
    Ok(())
}

#[tokio::test]
async fn test_unconfigured_email_sends_nothing() -> anyhow::Result<()> {
    let server = mock_shop(200, IN_STOCK_LISTING).await;
    let transport = RecordingTransport::default();
    let monitor = create_test_monitor(shop_url(&server), transport.clone(), false)?;

    assert!(!monitor.notifier().is_configured());
    assert!(!monitor.run_daily_check().await);
    assert!(!monitor.run_test_check().await);
    assert!(transport.sent.borrow().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_delivery_failure_is_reported_as_false() -> anyhow::Result<()> {
    let server = mock_shop(200, SOLD_OUT_LISTING).await;
    let monitor = create_test_monitor(shop_url(&server), RecordingTransport::failing(), true)?;

    assert!(!monitor.run_daily_check().await);
    assert!(!monitor.run_test_check().await);
    Ok(())
}

#[tokio::test]
async fn test_test_check_sends_both_emails_in_order() -> anyhow::Result<()> {
    let server = mock_shop(200, SOLD_OUT_LISTING).await;
    let transport = RecordingTransport::default();
    let monitor = create_test_monitor(shop_url(&server), transport.clone(), true)?;

    assert!(monitor.run_test_check().await);

    assert_eq!(
        transport.subjects(),
        vec![
            "Stock Watcher - Test Email".to_string(),
            "Destined Rivals Elite Trainer Box Stock Alert - SOLD OUT".to_string(),
        ]
    );
    Ok(())
}
