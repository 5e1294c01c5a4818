// tests/integration/cli.rs - CLI integration tests

use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::process::Command;

use loadwatch::storage::FileSnapshotStorage;
use loadwatch::ErrorHistoryStore;

use crate::helpers::mock_server::MockMessagingServer;
use crate::helpers::test_data::create_test_history;
use crate::helpers::wait_for_service;
use crate::integration::{TEST_CHAT, TEST_TOKEN};

/// Run the binary with a clean environment pointed at `dir`
async fn run_cli(dir: &Path, envs: &[(&str, &str)], args: &[&str]) -> Output {
    let history_path = dir.join("error_history.json");
    Command::new(env!("CARGO_BIN_EXE_loadwatch"))
        .env_clear()
        .current_dir(dir)
        .env("LOADWATCH_HISTORY_PATH", &history_path)
        .env("RUST_LOG", "loadwatch=warn")
        .envs(envs.iter().copied())
        .args(args)
        .output()
        .await
        .expect("Failed to execute CLI command")
}

async fn seed_history(dir: &Path) {
    let storage = Arc::new(FileSnapshotStorage::new(dir.join("error_history.json")));
    let store = ErrorHistoryStore::open(storage, 30).await;
    assert!(
        store
            .import(
                create_test_history(&[("ARIMA", 2, 3.0), ("ARIMA", 1, 7.0), ("LSTM", 1, 12.0)]),
                true,
            )
            .await
    );
}

#[tokio::test]
async fn test_cli_report_command() {
    let dir = TempDir::new().unwrap();
    seed_history(dir.path()).await;

    let output = run_cli(dir.path(), &[], &["report", "--days", "30"]).await;
    assert!(output.status.success(), "CLI report command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FORECAST ERROR SUMMARY REPORT (30 days)"));
    assert!(stdout.contains("ARIMA"));
    assert!(stdout.contains("LSTM"));
}

#[tokio::test]
async fn test_cli_report_with_huge_window() {
    let dir = TempDir::new().unwrap();
    seed_history(dir.path()).await;

    let output = run_cli(dir.path(), &[], &["report", "--model", "ARIMA", "--days", "100000000"]).await;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("ARIMA"));
}

#[tokio::test]
async fn test_cli_report_without_history_fails() {
    let dir = TempDir::new().unwrap();

    let output = run_cli(dir.path(), &[], &["report"]).await;
    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_cli_rejects_unknown_subcommand() {
    let dir = TempDir::new().unwrap();

    let output = run_cli(dir.path(), &[], &["process-queue"]).await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("process-queue"));
}

#[tokio::test]
async fn test_cli_rejects_invalid_date_argument() {
    let dir = TempDir::new().unwrap();

    let output = run_cli(
        dir.path(),
        &[],
        &["record", "--model", "ARIMA", "--actual", "100", "--predicted", "95", "--date", "01/06/2024"],
    )
    .await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid date"));
}

#[tokio::test]
async fn test_cli_test_alert_uses_presentation_tiers() {
    let server = MockMessagingServer::new();
    let (base_url, _handle) = server.start().await;
    assert!(wait_for_service(base_url.trim_start_matches("http://"), 2000).await);

    let dir = TempDir::new().unwrap();
    let envs = [
        ("LOADWATCH_TELEGRAM_API_BASE", base_url.as_str()),
        ("TELEGRAM_BOT_TOKEN", TEST_TOKEN),
        ("TELEGRAM_CHAT_ID", TEST_CHAT),
    ];

    for error in ["3", "7.5", "15"] {
        let output = run_cli(dir.path(), &envs, &["test-alert", "--error", error]).await;
        assert!(
            output.status.success(),
            "test-alert --error {} failed: {}",
            error,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let messages = server.get_messages().await;
    assert_eq!(messages.len(), 3);
    for (message, emoji) in messages.iter().zip(["ℹ️", "⚠️", "🔥"]) {
        assert!(message.text.starts_with(emoji), "unexpected alert: {}", message.text);
        assert_eq!(message.chat_id, TEST_CHAT);
    }
    assert!(messages.iter().all(|m| !m.text.starts_with("🚨")));
}
