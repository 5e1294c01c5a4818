// src/storage/memory.rs - In-memory snapshot storage

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{decode_snapshot, encode_snapshot, SnapshotStorage};
use crate::error::{LoadwatchError, Result};
use crate::observation::ErrorHistory;

/// Keeps the serialized snapshot in memory.
///
/// The document goes through the same encoder as the file backend, so dry
/// runs and tests exercise the real format. Writes can be made to fail on
/// demand.
#[derive(Clone, Default)]
pub struct MemorySnapshotStorage {
    document: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
    saves: Arc<AtomicU64>,
}

impl MemorySnapshotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing raw document (may be malformed)
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(document.into()))),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Raw stored document
    pub async fn document(&self) -> Option<String> {
        self.document.lock().await.clone()
    }
}

#[async_trait]
impl SnapshotStorage for MemorySnapshotStorage {
    async fn load(&self) -> Result<Option<ErrorHistory>> {
        match self.document.lock().await.as_deref() {
            Some(data) => Ok(Some(decode_snapshot(data)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, history: &ErrorHistory) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LoadwatchError::Storage(anyhow::anyhow!(
                "Simulated write failure"
            )));
        }

        let serialized = encode_snapshot(history)?;
        *self.document.lock().await = Some(serialized);
        self.saves.fetch_add(1, Ordering::SeqCst);

        debug!("Saved history snapshot in memory ({} models)", history.len());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
