// src/statistics.rs - Rolling error statistics

use chrono::NaiveDate;
use serde::Serialize;

/// Errors above this percentage count as threshold violations and trigger
/// alerts. Shared by the statistics and the alert policy.
pub const ERROR_THRESHOLD_PCT: f64 = 5.0;

/// Errors above this percentage are critical
pub const CRITICAL_THRESHOLD_PCT: f64 = 10.0;

/// Aggregates over a trailing window of observations.
///
/// `min`, `max` and `avg` are `None` when `count == 0`; check `count`
/// before relying on them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorStatistics {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub above_threshold_count: usize,
}

impl ErrorStatistics {
    pub fn empty() -> Self {
        Self {
            count: 0,
            min: None,
            max: None,
            avg: None,
            above_threshold_count: 0,
        }
    }

    pub fn from_errors(errors: &[f64]) -> Self {
        if errors.is_empty() {
            return Self::empty();
        }

        let min = errors.iter().copied().fold(f64::INFINITY, f64::min);
        let max = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = errors.iter().sum();

        Self {
            count: errors.len(),
            min: Some(min),
            max: Some(max),
            avg: Some(sum / errors.len() as f64),
            above_threshold_count: errors.iter().filter(|e| **e > ERROR_THRESHOLD_PCT).count(),
        }
    }

    /// Build from the dated output of `get_recent_errors`
    pub fn from_recent(recent: &[(NaiveDate, f64)]) -> Self {
        let errors: Vec<f64> = recent.iter().map(|(_, e)| *e).collect();
        Self::from_errors(&errors)
    }

    /// Share of observations above the threshold, in percent
    pub fn violation_rate(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.above_threshold_count as f64 / self.count as f64 * 100.0)
        }
    }
}
