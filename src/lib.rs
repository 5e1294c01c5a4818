// src/lib.rs - Forecast error tracking and threshold alerting

pub mod alerting;
pub mod config;
pub mod error;
pub mod history;
pub mod notify;
pub mod observation;
pub mod pipeline;
pub mod report;
pub mod statistics;
pub mod storage;

// Startup wiring
pub mod startup;

// Re-export commonly used items for convenience
pub use alerting::{
    percentage_error, AlertDecision, AlertLevel, AlertPolicy, Evaluation, ForecastEvaluator,
    TierScheme,
};
pub use config::Config;
pub use error::{LoadwatchError, Result};
pub use history::{ErrorHistoryStore, DEFAULT_MAX_DAYS};
pub use notify::{MessagingChannel, Notifier, QueueReport, TelegramChannel};
pub use observation::{ErrorHistory, ErrorObservation, ModelHistory};
pub use pipeline::{ActualsSource, DailyScheduler, ForecastRun, Forecaster, RunSummary};
pub use statistics::{ErrorStatistics, CRITICAL_THRESHOLD_PCT, ERROR_THRESHOLD_PCT};
pub use storage::{create_storage, SnapshotStorage};

// Re-export startup
pub use startup::ApplicationStartup;

/// loadwatch version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
