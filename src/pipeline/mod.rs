// src/pipeline/mod.rs - Daily forecast evaluation run

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::alerting::{AlertLevel, Evaluation, ForecastEvaluator};
use crate::error::Result;
use crate::notify::QueueReport;
use crate::observation::today;

pub mod csv_source;
pub mod scheduler;

pub use csv_source::{CsvActualsSource, CsvForecaster};
pub use scheduler::DailyScheduler;

/// Produces the average forecast load of a model for a date.
/// `Ok(None)` means no forecast is available and the model is skipped.
#[async_trait]
pub trait Forecaster: Send + Sync {
    async fn predict(&self, model_name: &str, date: NaiveDate) -> Result<Option<f64>>;
}

/// Produces the average measured load for a date
#[async_trait]
pub trait ActualsSource: Send + Sync {
    async fn get_actual(&self, date: NaiveDate) -> Result<Option<f64>>;
}

/// Why a model produced no evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoForecast,
    SourceError(String),
}

/// Outcome of one run over all models
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub date: Option<NaiveDate>,
    pub queue: QueueReport,
    pub actual: Option<f64>,
    pub evaluations: Vec<Evaluation>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl RunSummary {
    pub fn alerts(&self) -> usize {
        self.evaluations
            .iter()
            .filter(|e| e.level != AlertLevel::Info)
            .count()
    }
}

/// Evaluates every configured model against the actual load of one day
pub struct ForecastRun {
    evaluator: Arc<ForecastEvaluator>,
    forecaster: Arc<dyn Forecaster>,
    actuals: Arc<dyn ActualsSource>,
    models: Vec<String>,
}

impl ForecastRun {
    pub fn new(
        evaluator: Arc<ForecastEvaluator>,
        forecaster: Arc<dyn Forecaster>,
        actuals: Arc<dyn ActualsSource>,
        models: Vec<String>,
    ) -> Self {
        Self {
            evaluator,
            forecaster,
            actuals,
            models,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Evaluate yesterday's forecasts
    pub async fn run_daily(&self) -> RunSummary {
        self.run_for_date(today() - Duration::days(1)).await
    }

    /// Drain the retry queue, then evaluate each model for `date`.
    /// Source failures skip the affected model; nothing aborts the run.
    pub async fn run_for_date(&self, date: NaiveDate) -> RunSummary {
        info!("📊 Starting forecast evaluation for {}", date);
        let mut summary = RunSummary {
            date: Some(date),
            ..RunSummary::default()
        };

        if let Some(notifier) = self.evaluator.notifier() {
            summary.queue = notifier.process_queue().await;
        }

        let actual = match self.actuals.get_actual(date).await {
            Ok(Some(actual)) => actual,
            Ok(None) => {
                warn!(date = %date, "No actual load data available, skipping evaluation");
                return summary;
            }
            Err(e) => {
                error!(date = %date, error = %e, "Failed to read actual load data");
                return summary;
            }
        };
        summary.actual = Some(actual);

        for model in &self.models {
            match self.forecaster.predict(model, date).await {
                Ok(Some(predicted)) => {
                    let evaluation = self
                        .evaluator
                        .evaluate_detailed(actual, predicted, model, Some(date))
                        .await;
                    summary.evaluations.push(evaluation);
                }
                Ok(None) => {
                    debug!(model = %model, date = %date, "No forecast available");
                    summary.skipped.push((model.clone(), SkipReason::NoForecast));
                }
                Err(e) => {
                    error!(model = %model, date = %date, error = %e, "Failed to produce forecast");
                    summary
                        .skipped
                        .push((model.clone(), SkipReason::SourceError(e.to_string())));
                }
            }
        }

        info!(
            "✅ Evaluation for {} finished: {} evaluated, {} skipped, {} alerts",
            date,
            summary.evaluations.len(),
            summary.skipped.len(),
            summary.alerts()
        );
        summary
    }
}
