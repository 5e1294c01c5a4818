// src/storage/file.rs - JSON snapshot file storage

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{decode_snapshot, encode_snapshot, SnapshotStorage};
use crate::error::{LoadwatchError, Result};
use crate::observation::ErrorHistory;

/// Stores the whole history as one pretty-printed JSON document.
///
/// Saves write a sibling `.tmp` file and rename it over the target, so a
/// reader sees either the previous snapshot or the new one.
#[derive(Debug, Clone)]
pub struct FileSnapshotStorage {
    path: PathBuf,
}

impl FileSnapshotStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "error_history.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Ensure the snapshot directory exists
    async fn ensure_parent_directory(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    LoadwatchError::Storage(anyhow::anyhow!(
                        "Failed to create history directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                info!("Created history directory: {}", parent.display());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStorage for FileSnapshotStorage {
    async fn load(&self) -> Result<Option<ErrorHistory>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            LoadwatchError::Storage(anyhow::anyhow!(
                "Failed to read history file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let history = decode_snapshot(&data)?;
        debug!(
            "Read history snapshot from {} ({} models)",
            self.path.display(),
            history.len()
        );
        Ok(Some(history))
    }

    async fn save(&self, history: &ErrorHistory) -> Result<()> {
        self.ensure_parent_directory().await?;

        let serialized = encode_snapshot(history)?;
        let temp_path = self.temp_path();

        tokio::fs::write(&temp_path, serialized.as_bytes())
            .await
            .map_err(|e| {
                LoadwatchError::Storage(anyhow::anyhow!(
                    "Failed to write history snapshot {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            LoadwatchError::Storage(anyhow::anyhow!(
                "Failed to replace history snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(
            "Saved history snapshot to {} ({} bytes)",
            self.path.display(),
            serialized.len()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
