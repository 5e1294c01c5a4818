// src/observation.rs - Error observation records and the per-model history map

use chrono::{DateTime, Days, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Date format used for history keys and CLI arguments
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-model history ordered by forecast date
pub type ModelHistory = BTreeMap<NaiveDate, ErrorObservation>;

/// Full error history: model name to its dated observations
pub type ErrorHistory = BTreeMap<String, ModelHistory>;

/// Keys callers may not set through extra metrics
pub const RESERVED_METRIC_KEYS: [&str; 2] = ["error", "timestamp"];

/// One recorded forecast error for a (model, date) pair.
///
/// Serialized as a flat JSON object so the snapshot stays readable by the
/// dashboard and export tooling: `error` and `timestamp` are always present,
/// `actual`, `predicted` and `abs_error` only when known, and any other
/// numeric metrics sit alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObservation {
    #[serde(rename = "error", with = "saturating_f64")]
    pub error_pct: f64,
    #[serde(deserialize_with = "lenient_timestamp::deserialize")]
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_error: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, f64>,
}

impl ErrorObservation {
    pub fn new(error_pct: f64) -> Self {
        Self {
            error_pct,
            timestamp: Local::now(),
            actual: None,
            predicted: None,
            abs_error: None,
            extra: BTreeMap::new(),
        }
    }

    /// Observation carrying the actual/predicted context of a forecast run
    pub fn with_forecast(error_pct: f64, actual: f64, predicted: f64) -> Self {
        Self {
            actual: Some(actual),
            predicted: Some(predicted),
            abs_error: Some((actual - predicted).abs()),
            ..Self::new(error_pct)
        }
    }

    /// Merge caller-supplied metrics. Reserved keys are skipped and returned.
    pub fn merge_metrics(&mut self, metrics: &BTreeMap<String, f64>) -> Vec<String> {
        let mut rejected = Vec::new();
        for (key, value) in metrics {
            match key.as_str() {
                k if RESERVED_METRIC_KEYS.contains(&k) => rejected.push(key.clone()),
                "actual" => self.actual = Some(*value),
                "predicted" => self.predicted = Some(*value),
                "abs_error" => self.abs_error = Some(*value),
                _ => {
                    self.extra.insert(key.clone(), *value);
                }
            }
        }
        rejected
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        crate::LoadwatchError::InvalidInput(format!("Invalid date '{}': {}", value, e))
    })
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First date of a trailing `days` window ending at `now`, saturating at
/// the calendar bounds
pub fn window_start(now: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        now.checked_sub_days(Days::new(days.unsigned_abs()))
            .unwrap_or(NaiveDate::MIN)
    } else {
        now.checked_add_days(Days::new(days.unsigned_abs()))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Older snapshots carry naive ISO timestamps without an offset; those are
/// read as local time.
mod lenient_timestamp {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Local>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Local));
        }
        let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| serde::de::Error::custom(format!("nonexistent local time '{}'", raw)))
    }
}

/// JSON has no infinity literal, so a saturated error is stored as the string
/// "Infinity". Finite values stay plain numbers.
mod saturating_f64 {
    use super::*;

    const INFINITY: &str = "Infinity";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_str(INFINITY)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) if s == INFINITY => Ok(f64::INFINITY),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "invalid error value: {}",
                s
            ))),
        }
    }
}
