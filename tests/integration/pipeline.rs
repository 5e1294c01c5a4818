// tests/integration/pipeline.rs - Daily run over CSV sources

use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

use loadwatch::pipeline::{CsvActualsSource, CsvForecaster, ForecastRun, SkipReason};

use super::TestHarness;
use crate::helpers::assertions::assert_close;
use crate::helpers::test_data::{days_ago, write_actuals_csv, write_prediction_csv};

fn csv_run(harness: &TestHarness, dir: &TempDir, models: &[&str]) -> ForecastRun {
    ForecastRun::new(
        harness.evaluator.clone(),
        Arc::new(CsvForecaster::new(dir.path().join("predictions"))),
        Arc::new(CsvActualsSource::new(dir.path().join("SLDC_Data"))),
        models.iter().map(|m| m.to_string()).collect(),
    )
}

#[tokio::test]
async fn test_daily_run_over_csv_sources() {
    println!("📊 Testing a daily run over CSV files...");

    let harness = TestHarness::new().await;
    let dir = TempDir::new().unwrap();
    let date = days_ago(1);

    write_actuals_csv(&dir.path().join("SLDC_Data"), date, &[380.0, 420.0]);
    write_prediction_csv(&dir.path().join("predictions"), "ARIMA", date, &[404.0, 412.0]);
    write_prediction_csv(&dir.path().join("predictions"), "LSTM", date, &[440.0, 460.0]);

    let summary = csv_run(&harness, &dir, &["ARIMA", "LSTM", "SMA"]).run_daily().await;

    assert_eq!(summary.date, Some(date));
    assert_eq!(summary.actual, Some(400.0));
    assert_eq!(summary.evaluations.len(), 2);
    assert_eq!(summary.skipped, vec![("SMA".to_string(), SkipReason::NoForecast)]);

    // ARIMA: 408 vs 400 -> 2%, no alert. LSTM: 450 vs 400 -> 12.5%, critical.
    assert_close(summary.evaluations[0].error_pct, 2.0);
    assert_close(summary.evaluations[1].error_pct, 12.5);
    assert_eq!(summary.alerts(), 1);

    let messages = harness.server.get_messages().await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].text.contains("*Model:* `LSTM`"));

    let lstm = harness.store.get_model_history("LSTM").await;
    assert_eq!(lstm[&date].predicted, Some(450.0));
}

#[tokio::test]
async fn test_run_drains_queue_before_evaluating() {
    println!("🔁 Testing queue drain at the start of a run...");

    let harness = TestHarness::new().await;
    let dir = TempDir::new().unwrap();

    harness.server.set_should_fail(true).await;
    harness.evaluator.evaluate(100.0, 130.0, "ARIMA", Some(days_ago(3))).await;
    assert_eq!(harness.notifier.queue_len().await, 1);

    harness.server.set_should_fail(false).await;
    let summary = csv_run(&harness, &dir, &["ARIMA"]).run_for_date(days_ago(1)).await;

    assert_eq!(summary.queue.delivered, 1);
    assert_eq!(summary.actual, None);
    assert_eq!(harness.notifier.queue_len().await, 0);
    assert_eq!(harness.server.get_messages().await.len(), 1);
}
