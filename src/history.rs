// src/history.rs - Error history store

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::observation::{today, window_start, ErrorHistory, ErrorObservation, ModelHistory};
use crate::statistics::ErrorStatistics;
use crate::storage::SnapshotStorage;

/// Default retention window in days
pub const DEFAULT_MAX_DAYS: i64 = 30;

/// Owns the per-model error history and its durable snapshot.
///
/// Every write replaces the (model, date) entry, prunes entries older than
/// `max_days` and rewrites the whole snapshot while holding the write lock.
/// Readers get clones; nothing outside the store mutates the map.
pub struct ErrorHistoryStore {
    history: RwLock<ErrorHistory>,
    storage: Arc<dyn SnapshotStorage>,
    max_days: i64,
}

impl ErrorHistoryStore {
    /// Load the history from `storage`. Missing or unreadable snapshots
    /// start an empty history.
    pub async fn open(storage: Arc<dyn SnapshotStorage>, max_days: i64) -> Self {
        let history = match storage.load().await {
            Ok(Some(history)) => {
                info!(
                    "Loaded error history from {} ({} models)",
                    storage.describe(),
                    history.len()
                );
                history
            }
            Ok(None) => {
                info!(
                    "No history found at {}, starting a new one",
                    storage.describe()
                );
                ErrorHistory::new()
            }
            Err(e) => {
                warn!(
                    "Could not load error history from {}: {}. Starting a new history",
                    storage.describe(),
                    e
                );
                ErrorHistory::new()
            }
        };

        Self {
            history: RwLock::new(history),
            storage,
            max_days,
        }
    }

    pub fn max_days(&self) -> i64 {
        self.max_days
    }

    /// Record an error for `model_name` on `date` (today when `None`).
    ///
    /// Returns `false` when the input is rejected or the snapshot could not
    /// be written; in the latter case the in-memory history keeps the entry.
    pub async fn add_error(
        &self,
        model_name: &str,
        error_value: f64,
        date: Option<NaiveDate>,
        extra_metrics: Option<&BTreeMap<String, f64>>,
    ) -> bool {
        let mut observation = ErrorObservation::new(error_value);
        if let Some(metrics) = extra_metrics {
            let rejected = observation.merge_metrics(metrics);
            if !rejected.is_empty() {
                debug!(
                    model = %model_name,
                    keys = ?rejected,
                    "Ignoring reserved keys in extra metrics"
                );
            }
        }
        self.record(model_name, date, observation).await
    }

    /// Store a fully built observation. Same semantics as `add_error`.
    pub async fn record(
        &self,
        model_name: &str,
        date: Option<NaiveDate>,
        observation: ErrorObservation,
    ) -> bool {
        if model_name.is_empty() {
            warn!("Refusing to record an error without a model name");
            return false;
        }
        if observation.error_pct.is_nan() || observation.error_pct < 0.0 {
            warn!(
                model = %model_name,
                error_pct = observation.error_pct,
                "Refusing to record an invalid error value"
            );
            return false;
        }

        let date = date.unwrap_or_else(today);
        let mut history = self.history.write().await;

        history
            .entry(model_name.to_string())
            .or_default()
            .insert(date, observation);

        let pruned = prune_history(&mut history, today(), self.max_days);
        if pruned > 0 {
            debug!("Pruned {} entries older than {} days", pruned, self.max_days);
        }

        match self.storage.save(&history).await {
            Ok(()) => {
                debug!(model = %model_name, date = %date, "Saved error history");
                true
            }
            Err(e) => {
                error!(
                    model = %model_name,
                    date = %date,
                    error = %e,
                    "Failed to save error history"
                );
                false
            }
        }
    }

    /// Entries for one model; empty for unknown models
    pub async fn get_model_history(&self, model_name: &str) -> ModelHistory {
        self.history
            .read()
            .await
            .get(model_name)
            .cloned()
            .unwrap_or_default()
    }

    /// `(date, error)` pairs from the trailing `days` window, oldest first
    pub async fn get_recent_errors(&self, model_name: &str, days: i64) -> Vec<(NaiveDate, f64)> {
        let cutoff = window_start(today(), days);
        let history = self.history.read().await;

        match history.get(model_name) {
            Some(entries) => entries
                .range(cutoff..)
                .map(|(date, obs)| (*date, obs.error_pct))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Aggregates over the trailing `days` window
    pub async fn get_error_statistics(&self, model_name: &str, days: i64) -> ErrorStatistics {
        ErrorStatistics::from_recent(&self.get_recent_errors(model_name, days).await)
    }

    /// Tracked model names in sorted order
    pub async fn models(&self) -> Vec<String> {
        self.history.read().await.keys().cloned().collect()
    }

    /// Copy of the whole history
    pub async fn snapshot(&self) -> ErrorHistory {
        self.history.read().await.clone()
    }

    /// Merge `entries` into the history in one write, keeping existing
    /// observations unless `overwrite` is set. Returns whether the snapshot
    /// was saved.
    pub async fn import(&self, entries: ErrorHistory, overwrite: bool) -> bool {
        let mut history = self.history.write().await;

        for (model_name, observations) in entries {
            let target = history.entry(model_name).or_default();
            for (date, observation) in observations {
                if overwrite || !target.contains_key(&date) {
                    target.insert(date, observation);
                }
            }
        }
        prune_history(&mut history, today(), self.max_days);

        match self.storage.save(&history).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save imported error history: {}", e);
                false
            }
        }
    }

    /// Drop every model's history
    pub async fn clear(&self) -> bool {
        let mut history = self.history.write().await;
        history.clear();
        match self.storage.save(&history).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save cleared error history: {}", e);
                false
            }
        }
    }
}

/// Remove entries dated before `now - max_days`; models left without
/// entries are dropped. Returns the number of removed entries.
fn prune_history(history: &mut ErrorHistory, now: NaiveDate, max_days: i64) -> usize {
    let cutoff = window_start(now, max_days);
    let mut removed = 0;

    for entries in history.values_mut() {
        let before = entries.len();
        entries.retain(|date, _| *date >= cutoff);
        removed += before - entries.len();
    }
    history.retain(|_, entries| !entries.is_empty());

    removed
}
