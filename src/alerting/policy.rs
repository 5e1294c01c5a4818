// src/alerting/policy.rs - Forecast error severity and alert composition

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::AlertingConfig;
use crate::statistics::{ErrorStatistics, CRITICAL_THRESHOLD_PCT, ERROR_THRESHOLD_PCT};

/// Absolute percentage error of a forecast.
///
/// A zero actual saturates instead of dividing: `0` when the prediction is
/// also zero, `+inf` otherwise.
pub fn percentage_error(actual: f64, predicted: f64) -> f64 {
    if actual == 0.0 {
        if predicted == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        ((actual - predicted) / actual).abs() * 100.0
    }
}

/// Alert severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

/// Name given to the tier between the alert and critical thresholds.
///
/// Forecast evaluation calls it `error`; ad-hoc test notifications call it
/// `warning`. Both share the same boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierScheme {
    Evaluation,
    Presentation,
}

impl AlertLevel {
    /// Tier for an error percentage: `<= 5` info, `(5, 10]` error or
    /// warning depending on `scheme`, `> 10` critical
    pub fn for_error(error_pct: f64, scheme: TierScheme) -> Self {
        if error_pct > CRITICAL_THRESHOLD_PCT {
            AlertLevel::Critical
        } else if error_pct > ERROR_THRESHOLD_PCT {
            match scheme {
                TierScheme::Evaluation => AlertLevel::Error,
                TierScheme::Presentation => AlertLevel::Warning,
            }
        } else {
            AlertLevel::Info
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Error => "error",
            AlertLevel::Critical => "critical",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertLevel::Info => "ℹ️",
            AlertLevel::Warning => "⚠️",
            AlertLevel::Error => "🚨",
            AlertLevel::Critical => "🔥",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(AlertLevel::Info),
            "warning" => Ok(AlertLevel::Warning),
            "error" => Ok(AlertLevel::Error),
            "critical" => Ok(AlertLevel::Critical),
            other => Err(format!("unknown alert level '{}'", other)),
        }
    }
}

impl FromStr for TierScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "evaluation" => Ok(TierScheme::Evaluation),
            "presentation" => Ok(TierScheme::Presentation),
            other => Err(format!("unknown tier scheme '{}'", other)),
        }
    }
}

/// Outcome of applying the policy to one forecast error
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDecision {
    pub error_pct: f64,
    pub level: AlertLevel,
    /// Alert body, present only when an alert should be sent
    pub message: Option<String>,
}

impl AlertDecision {
    pub fn should_alert(&self) -> bool {
        self.message.is_some()
    }
}

/// Stateless decision function for forecast errors
#[derive(Debug, Clone)]
pub struct AlertPolicy {
    pub scheme: TierScheme,
    pub trend_window_days: i64,
    pub trend_multiplier: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::from_config(&AlertingConfig::default())
    }
}

impl AlertPolicy {
    pub fn from_config(config: &AlertingConfig) -> Self {
        Self {
            scheme: config.tier_scheme,
            trend_window_days: config.trend_window_days,
            trend_multiplier: config.trend_multiplier,
        }
    }

    /// Decide whether `error_pct` warrants an alert, using the trailing
    /// window statistics for trend context
    pub fn decide(&self, error_pct: f64, stats: &ErrorStatistics) -> AlertDecision {
        let level = AlertLevel::for_error(error_pct, self.scheme);

        let message = match level {
            AlertLevel::Info => None,
            AlertLevel::Critical => Some(
                "Critical forecast deviation detected. Immediate review required.".to_string(),
            ),
            AlertLevel::Warning | AlertLevel::Error => Some(
                "Forecast error exceeds acceptable threshold. Manual review recommended."
                    .to_string(),
            ),
        }
        .map(|mut body| {
            if let Some(clause) = self.trend_clause(error_pct, stats) {
                body.push_str(&clause);
            }
            body
        });

        AlertDecision {
            error_pct,
            level,
            message,
        }
    }

    fn trend_clause(&self, error_pct: f64, stats: &ErrorStatistics) -> Option<String> {
        let avg = stats.avg?;
        if !error_pct.is_finite() || !avg.is_finite() {
            return None;
        }
        if avg > 0.0 && error_pct > avg * self.trend_multiplier {
            Some(format!(
                "\n\nThis error is {:.1}x higher than the {}-day average ({:.2}%).",
                error_pct / avg,
                self.trend_window_days,
                avg
            ))
        } else {
            None
        }
    }
}
