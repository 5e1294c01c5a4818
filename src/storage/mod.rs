// src/storage/mod.rs - Snapshot storage trait and factory

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::HistoryConfig;
use crate::error::{LoadwatchError, Result};
use crate::observation::ErrorHistory;

pub mod file;
pub mod memory;

pub use file::FileSnapshotStorage;
pub use memory::MemorySnapshotStorage;

/// Durable home of the error history snapshot.
///
/// Every save replaces the whole snapshot; there is no incremental log.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Load the last saved snapshot. `Ok(None)` when nothing was ever saved,
    /// `Err` when the stored data cannot be read or parsed.
    async fn load(&self) -> Result<Option<ErrorHistory>>;

    /// Replace the stored snapshot with `history`
    async fn save(&self, history: &ErrorHistory) -> Result<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Factory function to create a snapshot backend based on configuration
pub async fn create_storage(config: &HistoryConfig) -> Result<Arc<dyn SnapshotStorage>> {
    match config.backend.as_str() {
        "file" => {
            tracing::info!("Creating file snapshot storage at {}", config.path);
            Ok(Arc::new(FileSnapshotStorage::new(&config.path)))
        }
        "memory" => {
            tracing::info!("Creating memory snapshot storage");
            Ok(Arc::new(MemorySnapshotStorage::new()))
        }
        backend => Err(LoadwatchError::Configuration(format!(
            "Unknown storage backend: {}",
            backend
        ))),
    }
}

/// Serialize a history into the human-inspectable snapshot format
pub fn encode_snapshot(history: &ErrorHistory) -> Result<String> {
    Ok(serde_json::to_string_pretty(history)?)
}

/// Parse a snapshot. Any error rejects the whole document.
pub fn decode_snapshot(data: &str) -> Result<ErrorHistory> {
    Ok(serde_json::from_str(data)?)
}
