// src/alerting/evaluator.rs - Forecast evaluation: record, compare, notify

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use super::policy::{percentage_error, AlertLevel, AlertPolicy};
use crate::history::ErrorHistoryStore;
use crate::notify::Notifier;
use crate::observation::{today, ErrorObservation};

/// What happened while evaluating one forecast
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub model_name: String,
    pub date: NaiveDate,
    pub error_pct: f64,
    pub level: AlertLevel,
    /// Whether the observation reached durable storage
    pub recorded: bool,
    /// `None` when no alert was due or no notifier is configured
    pub delivered: Option<bool>,
}

/// Compares a forecast with the actual load, records the error and alerts
/// when it exceeds the threshold.
///
/// Runs without a notifier in degraded mode: alerts are logged only.
pub struct ForecastEvaluator {
    store: Arc<ErrorHistoryStore>,
    notifier: Option<Arc<Notifier>>,
    policy: AlertPolicy,
}

impl ForecastEvaluator {
    pub fn new(
        store: Arc<ErrorHistoryStore>,
        notifier: Option<Arc<Notifier>>,
        policy: AlertPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<ErrorHistoryStore> {
        &self.store
    }

    pub fn notifier(&self) -> Option<&Arc<Notifier>> {
        self.notifier.as_ref()
    }

    /// Evaluate and return the percentage error, whether or not an alert
    /// went out
    pub async fn evaluate(
        &self,
        actual: f64,
        predicted: f64,
        model_name: &str,
        date: Option<NaiveDate>,
    ) -> f64 {
        self.evaluate_detailed(actual, predicted, model_name, date)
            .await
            .error_pct
    }

    pub async fn evaluate_detailed(
        &self,
        actual: f64,
        predicted: f64,
        model_name: &str,
        date: Option<NaiveDate>,
    ) -> Evaluation {
        let error_pct = percentage_error(actual, predicted);
        let date = date.unwrap_or_else(today);

        info!(
            model = %model_name,
            date = %date,
            actual,
            predicted,
            "{} forecast error: {:.2}%",
            model_name,
            error_pct
        );

        let observation = ErrorObservation::with_forecast(error_pct, actual, predicted);
        let recorded = self.store.record(model_name, Some(date), observation).await;
        if !recorded {
            warn!(
                model = %model_name,
                date = %date,
                error_pct,
                "Forecast error was not persisted"
            );
        }

        let stats = self
            .store
            .get_error_statistics(model_name, self.policy.trend_window_days)
            .await;
        if let (Some(avg), Some(min), Some(max)) = (stats.avg, stats.min, stats.max) {
            info!(
                model = %model_name,
                "{} {}-day avg error: {:.2}% (min: {:.2}%, max: {:.2}%)",
                model_name,
                self.policy.trend_window_days,
                avg,
                min,
                max
            );
        }

        let decision = self.policy.decide(error_pct, &stats);
        let delivered = match (&decision.message, &self.notifier) {
            (Some(message), Some(notifier)) => {
                let sent = notifier
                    .send_alert(message, decision.level, Some(model_name), Some(error_pct))
                    .await;
                if sent {
                    info!(model = %model_name, level = %decision.level, "Alert notification sent");
                }
                Some(sent)
            }
            (Some(message), None) => {
                warn!(
                    model = %model_name,
                    date = %date,
                    error_pct,
                    level = %decision.level,
                    "Notifications disabled, alert not sent: {}",
                    message
                );
                None
            }
            (None, _) => None,
        };

        Evaluation {
            model_name: model_name.to_string(),
            date,
            error_pct,
            level: decision.level,
            recorded,
            delivered,
        }
    }
}
