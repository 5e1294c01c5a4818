// src/startup.rs - Component wiring shared by the binary and tests

use std::sync::Arc;
use tracing::{info, warn};

use crate::alerting::{AlertPolicy, ForecastEvaluator};
use crate::config::Config;
use crate::error::{LoadwatchError, Result};
use crate::history::ErrorHistoryStore;
use crate::notify::Notifier;
use crate::pipeline::{CsvActualsSource, CsvForecaster, DailyScheduler, ForecastRun};
use crate::storage::create_storage;

/// Handles application startup and component initialization
pub struct ApplicationStartup {
    config: Arc<Config>,
}

impl ApplicationStartup {
    /// Validate the configuration and create the startup handler
    pub fn new(config: Config) -> Result<Self> {
        let validation = config.validate_detailed();
        for warning in &validation.warnings {
            warn!("Configuration warning on {}: {}", warning.field, warning.message);
        }
        if !validation.success {
            let messages: Vec<String> = validation
                .errors
                .iter()
                .map(|e| format!("{} ({}): {}", e.field, e.error_type, e.message))
                .collect();
            return Err(LoadwatchError::Configuration(messages.join("; ")));
        }

        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Open the error history store
    pub async fn initialize_store(&self) -> Result<Arc<ErrorHistoryStore>> {
        info!(
            "💾 Initializing history storage backend: {}",
            self.config.history.backend
        );
        let storage = create_storage(&self.config.history).await?;
        let store = ErrorHistoryStore::open(storage, self.config.history.max_days).await;
        Ok(Arc::new(store))
    }

    /// Build the notifier. Missing or invalid credentials leave alerting
    /// in log-only mode.
    pub fn initialize_notifier(&self) -> Option<Arc<Notifier>> {
        match Notifier::from_config(&self.config.notifier) {
            Ok(notifier) => {
                info!("📨 Notifications enabled");
                Some(Arc::new(notifier))
            }
            Err(e) => {
                warn!("Notifications disabled: {}. Alerts will only be logged", e);
                None
            }
        }
    }

    pub async fn build_evaluator(&self) -> Result<Arc<ForecastEvaluator>> {
        let store = self.initialize_store().await?;
        let notifier = self.initialize_notifier();
        let policy = AlertPolicy::from_config(&self.config.alerting);
        Ok(Arc::new(ForecastEvaluator::new(store, notifier, policy)))
    }

    /// Forecast run over the configured CSV sources
    pub fn build_run(&self, evaluator: Arc<ForecastEvaluator>) -> ForecastRun {
        let pipeline = &self.config.pipeline;
        ForecastRun::new(
            evaluator,
            Arc::new(CsvForecaster::new(&pipeline.predictions_dir)),
            Arc::new(CsvActualsSource::new(&pipeline.actuals_dir)),
            pipeline.models.clone(),
        )
    }

    pub fn build_scheduler(&self, run: Arc<ForecastRun>) -> Result<DailyScheduler> {
        let at = self.config.run_at().ok_or_else(|| {
            LoadwatchError::Configuration(format!(
                "Invalid run time: {}",
                self.config.pipeline.run_at
            ))
        })?;
        Ok(DailyScheduler::new(run, at))
    }

    /// Run the daily scheduler until ctrl-c
    pub async fn start(&self) -> Result<()> {
        info!("🚀 Starting loadwatch v{}", crate::VERSION);

        let evaluator = self.build_evaluator().await?;
        let run = Arc::new(self.build_run(evaluator));
        let scheduler = self.build_scheduler(run)?;

        info!("✅ Application startup completed successfully");
        scheduler.start().await;
        Ok(())
    }
}
