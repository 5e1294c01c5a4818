// tests/integration/report.rs - Reports and exports over stored history

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use loadwatch::report::{export, generate_synthetic_history, ExportFormat, SummaryReport};

use crate::helpers::assertions::assert_stats_consistent;
use crate::helpers::test_data::{create_test_history, create_test_store};

#[tokio::test]
async fn test_generated_history_reports_cleanly() {
    println!("📈 Testing report over generated history...");

    let (store, _) = create_test_store().await;
    let models = vec!["ARIMA".to_string(), "LSTM".to_string()];
    let mut rng = fastrand::Rng::with_seed(2024);
    assert!(
        store
            .import(generate_synthetic_history(&models, 30, &mut rng), true)
            .await
    );

    let report = SummaryReport::build(&store, None, 30).await.unwrap();
    assert_eq!(report.models.len(), 2);
    for model in &report.models {
        assert_eq!(model.stats.count, 30);
        assert_eq!(model.recent.len(), 5);
        assert_stats_consistent(&model.stats);
    }
}

#[tokio::test]
async fn test_generate_without_clear_keeps_existing_entries() {
    let (store, _) = create_test_store().await;
    store.import(create_test_history(&[("ARIMA", 0, 99.0)]), true).await;

    let mut rng = fastrand::Rng::with_seed(1);
    let generated = generate_synthetic_history(&["ARIMA".to_string()], 5, &mut rng);
    store.import(generated, false).await;

    let history = store.get_model_history("ARIMA").await;
    assert_eq!(history.len(), 5);
    assert_eq!(history.values().last().unwrap().error_pct, 99.0);
}

#[tokio::test]
async fn test_csv_export_file() {
    println!("📤 Testing CSV export...");

    let (store, _) = create_test_store().await;
    store
        .import(
            create_test_history(&[("ARIMA", 0, 4.0), ("ARIMA", 1, 6.0), ("SMA", 0, 2.0)]),
            true,
        )
        .await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out").join("errors.csv");

    let path = export(&store, None, 30, ExportFormat::Csv, Some(&output), dir.path())
        .await
        .unwrap();
    assert_eq!(path, output);

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "model,date,error,actual,predicted,abs_error");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("ARIMA,"));
    assert!(lines[3].starts_with("SMA,"));
}

#[tokio::test]
async fn test_export_unknown_model_fails() {
    let (store, _) = create_test_store().await;
    store.import(create_test_history(&[("ARIMA", 0, 4.0)]), true).await;
    let dir = TempDir::new().unwrap();

    let result = export(&store, Some("GRU"), 30, ExportFormat::Json, None, dir.path()).await;
    assert!(result.is_err());
}
