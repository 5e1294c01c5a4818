// tests/integration/notify.rs - Delivery against the mock messaging API

use pretty_assertions::assert_eq;
use std::time::Duration;

use loadwatch::notify::{MessagingChannel, QueueReport, TelegramChannel, CONNECTION_TEST_MESSAGE};
use loadwatch::{AlertLevel, LoadwatchError};

use super::{TestHarness, TEST_CHAT};
use crate::helpers::assertions::assert_close;

#[tokio::test]
async fn test_alert_reaches_messaging_api() {
    println!("📨 Testing alert delivery...");

    let harness = TestHarness::new().await;

    let sent = harness
        .notifier
        .send_alert(
            "Forecast error exceeds acceptable threshold. Manual review recommended.",
            AlertLevel::Error,
            Some("ARIMA"),
            Some(7.25),
        )
        .await;
    assert!(sent);

    let messages = harness.server.get_messages().await;
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.path_segment, "bot123456789:TEST-token-value");
    assert_eq!(message.chat_id, TEST_CHAT);
    assert_eq!(message.parse_mode, "Markdown");
    assert!(message.text.starts_with("🚨 *Load Forecasting Alert* 🚨\n\n*Model:* `ARIMA`\n"));
    assert!(message.text.contains("*Forecast Error:* `7.25%`"));
    assert!(message.text.contains("+05:30`"));
}

#[tokio::test]
async fn test_server_failure_queues_then_retry_succeeds() {
    println!("🔁 Testing retry queue against a failing server...");

    let harness = TestHarness::new().await;
    harness.server.set_should_fail(true).await;

    assert!(
        !harness
            .notifier
            .send_alert("Critical", AlertLevel::Critical, Some("LSTM"), Some(15.0))
            .await
    );
    assert_eq!(harness.notifier.queue_len().await, 1);

    harness.server.set_should_fail(false).await;
    let report = harness.notifier.process_queue().await;

    assert_eq!(
        report,
        QueueReport {
            attempted: 1,
            delivered: 1,
            requeued: 0
        }
    );
    assert_eq!(harness.notifier.queue_len().await, 0);
    assert_eq!(harness.server.get_messages().await.len(), 1);
}

#[tokio::test]
async fn test_api_rejection_is_a_failure() {
    let harness = TestHarness::new().await;
    harness.server.set_reject(true).await;

    assert!(
        !harness
            .notifier
            .send_alert("x", AlertLevel::Error, Some("SMA"), Some(6.0))
            .await
    );
    assert_eq!(harness.notifier.queue_len().await, 1);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    println!("⏱️  Testing request timeout...");

    let harness = TestHarness::with_timeout(Duration::from_secs(1)).await;
    harness.server.set_delay(2500).await;

    let channel =
        TelegramChannel::new(&harness.base_url, "1:a", Duration::from_secs(1)).unwrap();
    let result = channel.post(TEST_CHAT, "ping").await;
    assert!(matches!(
        result,
        Err(LoadwatchError::Timeout { timeout_seconds: 1 })
    ));

    assert!(
        !harness
            .notifier
            .send_alert("late", AlertLevel::Error, None, None)
            .await
    );
    assert_eq!(harness.notifier.queue_len().await, 1);
}

#[tokio::test]
async fn test_connection_probe() {
    let harness = TestHarness::new().await;

    assert!(harness.notifier.test_connection().await);
    let messages = harness.server.get_messages().await;
    assert_eq!(messages[0].text, CONNECTION_TEST_MESSAGE);

    harness.server.set_should_fail(true).await;
    assert!(!harness.notifier.test_connection().await);
    assert_eq!(harness.notifier.queue_len().await, 0);
}

#[tokio::test]
async fn test_evaluation_alerts_end_to_end() {
    println!("🔥 Testing evaluation through delivery...");

    let harness = TestHarness::new().await;

    let error = harness.evaluator.evaluate(400.0, 452.0, "SARIMAX", None).await;
    assert_close(error, 13.0);

    let messages = harness.server.get_messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].text.starts_with("🔥"));
    assert!(messages[0].text.contains("Immediate review required"));

    let history = harness.store.get_model_history("SARIMAX").await;
    let obs = history.values().next().unwrap();
    assert_eq!(obs.abs_error, Some(52.0));
}
