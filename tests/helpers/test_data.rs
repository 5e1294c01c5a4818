// tests/helpers/test_data.rs - Test data generators

use chrono::{Duration, NaiveDate};
use std::path::Path;
use std::sync::Arc;

use loadwatch::observation::today;
use loadwatch::storage::MemorySnapshotStorage;
use loadwatch::{ErrorHistory, ErrorHistoryStore, ErrorObservation};

pub fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

/// Store over a fresh in-memory backend, with the backend handle for
/// inspection and failure injection
pub async fn create_test_store() -> (Arc<ErrorHistoryStore>, MemorySnapshotStorage) {
    let storage = MemorySnapshotStorage::new();
    let store = ErrorHistoryStore::open(Arc::new(storage.clone()), 30).await;
    (Arc::new(store), storage)
}

/// History with one observation per `(model, days_ago, error)` triple
pub fn create_test_history(entries: &[(&str, i64, f64)]) -> ErrorHistory {
    let mut history = ErrorHistory::new();
    for (model, age, error) in entries {
        history
            .entry(model.to_string())
            .or_default()
            .insert(days_ago(*age), ErrorObservation::new(*error));
    }
    history
}

/// Write a predictions file in the `{dir}/{MODEL}/{YYYY-MM-DD}.csv` layout
pub fn write_prediction_csv(dir: &Path, model: &str, date: NaiveDate, loads: &[f64]) {
    let model_dir = dir.join(model);
    std::fs::create_dir_all(&model_dir).unwrap();

    let mut body = String::from("timestamp,load\n");
    for (slot, load) in loads.iter().enumerate() {
        body.push_str(&format!("{},{}\n", slot, load));
    }
    std::fs::write(model_dir.join(format!("{}.csv", date.format("%Y-%m-%d"))), body).unwrap();
}

/// Write an actuals file in the `{dir}/{YYYY}/{MM}/{DD-MM-YYYY}.csv` layout
pub fn write_actuals_csv(dir: &Path, date: NaiveDate, values: &[f64]) {
    let day_dir = dir
        .join(date.format("%Y").to_string())
        .join(date.format("%m").to_string());
    std::fs::create_dir_all(&day_dir).unwrap();

    let mut body = String::from("time,value\n");
    for (slot, value) in values.iter().enumerate() {
        body.push_str(&format!("{:02}:00,{}\n", slot, value));
    }
    std::fs::write(day_dir.join(format!("{}.csv", date.format("%d-%m-%Y"))), body).unwrap();
}
