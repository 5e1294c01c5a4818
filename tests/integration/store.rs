// tests/integration/store.rs - Error history store over real backends

use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

use loadwatch::config::HistoryConfig;
use loadwatch::{create_storage, ErrorHistoryStore};

use crate::helpers::assertions::{assert_close, assert_model_entries, assert_stats_consistent};
use crate::helpers::test_data::{create_test_store, days_ago};

fn file_config(dir: &TempDir) -> HistoryConfig {
    HistoryConfig {
        backend: "file".to_string(),
        path: dir
            .path()
            .join("data")
            .join("error_history.json")
            .to_string_lossy()
            .to_string(),
        max_days: 30,
    }
}

#[tokio::test]
async fn test_file_backed_history_survives_restart() {
    println!("💾 Testing file-backed history across restarts...");

    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);

    {
        let store = ErrorHistoryStore::open(create_storage(&config).await.unwrap(), 30).await;
        let extra = BTreeMap::from([("actual".to_string(), 400.0), ("mape".to_string(), 2.0)]);
        assert!(store.add_error("ARIMA", 3.5, Some(days_ago(1)), Some(&extra)).await);
        assert!(store.add_error("LSTM", 11.0, Some(days_ago(0)), None).await);
    }

    let reopened = ErrorHistoryStore::open(create_storage(&config).await.unwrap(), 30).await;
    assert_eq!(reopened.models().await, vec!["ARIMA".to_string(), "LSTM".to_string()]);

    let arima = reopened.get_model_history("ARIMA").await;
    let obs = &arima[&days_ago(1)];
    assert_close(obs.error_pct, 3.5);
    assert_eq!(obs.actual, Some(400.0));
    assert_eq!(obs.extra.get("mape"), Some(&2.0));

    // No temp file left behind by the atomic write
    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("data"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_legacy_snapshot_is_readable() {
    println!("📜 Testing snapshots written by earlier tooling...");

    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);
    let recent = days_ago(2).format("%Y-%m-%d").to_string();
    let stale = days_ago(45).format("%Y-%m-%d").to_string();
    let legacy = format!(
        r#"{{
  "SARIMAX": {{
    "{recent}": {{"error": 6.25, "timestamp": "2024-01-02T00:15:03.123456"}},
    "{stale}": {{"error": 1.0, "timestamp": "2023-11-20T00:15:00"}}
  }}
}}"#
    );
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(&config.path, legacy).unwrap();

    let store = ErrorHistoryStore::open(create_storage(&config).await.unwrap(), 30).await;
    assert_model_entries(&store, "SARIMAX", 2).await;

    // The next write prunes the stale entry
    assert!(store.add_error("SARIMAX", 4.0, None, None).await);
    assert_model_entries(&store, "SARIMAX", 2).await;

    let stats = store.get_error_statistics("SARIMAX", 7).await;
    assert_stats_consistent(&stats);
    assert_eq!(stats.count, 2);
    assert_eq!(stats.above_threshold_count, 1);
}

#[tokio::test]
async fn test_concurrent_writers_do_not_lose_entries() {
    println!("🔀 Testing concurrent writes...");

    let (store, storage) = create_test_store().await;
    let mut handles = Vec::new();

    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let model = format!("MODEL_{}", i % 3);
            store.add_error(&model, i as f64, Some(days_ago(i)), None).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    let snapshot = store.snapshot().await;
    let total: usize = snapshot.values().map(|entries| entries.len()).sum();
    assert_eq!(total, 10);
    assert_eq!(storage.save_count(), 10);

    // The last saved document matches memory
    let reopened = ErrorHistoryStore::open(Arc::new(storage.clone()), 30).await;
    assert_eq!(reopened.snapshot().await.len(), snapshot.len());
}
