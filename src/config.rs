// src/config.rs - Configuration loading and validation

use anyhow::Result;
use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::alerting::TierScheme;

/// Upper bound for retention and statistics windows, in days
pub const MAX_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub history: HistoryConfig,
    pub alerting: AlertingConfig,
    pub notifier: NotifierConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Snapshot backend: "file" or "memory"
    pub backend: String,
    /// Snapshot location for the file backend
    pub path: String,
    /// Days of history kept per model
    pub max_days: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            path: "data/error_history.json".to_string(),
            max_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// Window used for the trend comparison in alert messages
    pub trend_window_days: i64,
    /// An error this many times the window average gets a trend clause
    pub trend_multiplier: f64,
    /// Which name the 5-10% tier carries
    pub tier_scheme: TierScheme,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            trend_window_days: 7,
            trend_multiplier: 1.5,
            tier_scheme: TierScheme::Evaluation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Messaging API base URL
    pub api_base: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Per-request timeout (in seconds)
    pub timeout_seconds: u64,
    /// Offset applied to alert timestamps (in minutes east of UTC)
    pub utc_offset_minutes: i32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: None,
            chat_id: None,
            timeout_seconds: 10,
            utc_offset_minutes: 330, // Asia/Kolkata
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Models evaluated on every run
    pub models: Vec<String>,
    /// Root of `{MODEL}/{YYYY-MM-DD}.csv` prediction files
    pub predictions_dir: String,
    /// Root of `{YYYY}/{MM}/{DD-MM-YYYY}.csv` actual load files
    pub actuals_dir: String,
    /// Local time of the daily run, `HH:MM`
    pub run_at: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "ARIMA".to_string(),
                "SARIMAX".to_string(),
                "SMA".to_string(),
                "LSTM".to_string(),
            ],
            predictions_dir: "predictions".to_string(),
            actuals_dir: "SLDC_Data".to_string(),
            run_at: "00:15".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            alerting: AlertingConfig::default(),
            notifier: NotifierConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Detailed validation result with specific error information
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub success: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub error_type: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

fn parse_env<T>(name: &str, target: &mut T, parse_errors: &mut Vec<String>)
where
    T: std::str::FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(name) {
        match raw.parse::<T>() {
            Ok(value) => {
                debug!("Found {}: {:?}", name, value);
                *target = value;
            }
            Err(e) => parse_errors.push(format!("Invalid {} '{}': {}", name, raw, e)),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        let mut parse_errors = Vec::new();

        debug!("Loading configuration from environment variables");

        if let Some(backend) = non_empty_env("LOADWATCH_HISTORY_BACKEND") {
            config.history.backend = backend;
        }
        if let Some(path) = non_empty_env("LOADWATCH_HISTORY_PATH") {
            config.history.path = path;
        }
        parse_env("LOADWATCH_MAX_DAYS", &mut config.history.max_days, &mut parse_errors);

        parse_env(
            "LOADWATCH_TREND_WINDOW_DAYS",
            &mut config.alerting.trend_window_days,
            &mut parse_errors,
        );
        parse_env(
            "LOADWATCH_TREND_MULTIPLIER",
            &mut config.alerting.trend_multiplier,
            &mut parse_errors,
        );
        if let Some(scheme) = non_empty_env("LOADWATCH_TIER_SCHEME") {
            match scheme.parse() {
                Ok(s) => config.alerting.tier_scheme = s,
                Err(e) => parse_errors.push(format!("Invalid LOADWATCH_TIER_SCHEME: {}", e)),
            }
        }

        // Credential names kept compatible with existing deployments
        config.notifier.bot_token = non_empty_env("TELEGRAM_BOT_TOKEN");
        config.notifier.chat_id = non_empty_env("TELEGRAM_CHAT_ID");
        if let Some(api_base) = non_empty_env("LOADWATCH_TELEGRAM_API_BASE") {
            config.notifier.api_base = api_base;
        }
        parse_env(
            "LOADWATCH_NOTIFY_TIMEOUT",
            &mut config.notifier.timeout_seconds,
            &mut parse_errors,
        );
        parse_env(
            "LOADWATCH_UTC_OFFSET_MINUTES",
            &mut config.notifier.utc_offset_minutes,
            &mut parse_errors,
        );

        if let Some(models) = non_empty_env("LOADWATCH_MODELS") {
            config.pipeline.models = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Some(dir) = non_empty_env("LOADWATCH_PREDICTIONS_DIR") {
            config.pipeline.predictions_dir = dir;
        }
        if let Some(dir) = non_empty_env("LOADWATCH_ACTUALS_DIR") {
            config.pipeline.actuals_dir = dir;
        }
        if let Some(run_at) = non_empty_env("LOADWATCH_RUN_AT") {
            config.pipeline.run_at = run_at;
        }

        if !parse_errors.is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration parsing failed with {} errors: {}",
                parse_errors.len(),
                parse_errors.join(", ")
            ));
        }

        info!(
            "Configuration loaded from environment (history: {} at {}, credentials: {})",
            config.history.backend,
            config.history.path,
            config.has_credentials()
        );

        Ok(config)
    }

    /// Load a TOML/JSON/YAML file layered over the defaults, then
    /// `LOADWATCH__SECTION__KEY` environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?)
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix("LOADWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("pipeline.models"),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        if config.notifier.bot_token.is_none() {
            config.notifier.bot_token = non_empty_env("TELEGRAM_BOT_TOKEN");
        }
        if config.notifier.chat_id.is_none() {
            config.notifier.chat_id = non_empty_env("TELEGRAM_CHAT_ID");
        }

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn validate_detailed(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        match self.history.backend.as_str() {
            "file" => {
                if self.history.path.trim().is_empty() {
                    errors.push(ValidationError {
                        field: "history.path".to_string(),
                        error_type: "empty_path".to_string(),
                        message: "History path cannot be empty for the file backend".to_string(),
                    });
                }
            }
            "memory" => warnings.push(ValidationWarning {
                field: "history.backend".to_string(),
                message: "Memory backend does not persist history across restarts".to_string(),
            }),
            backend => errors.push(ValidationError {
                field: "history.backend".to_string(),
                error_type: "unsupported_backend".to_string(),
                message: format!("Unsupported history backend: {}", backend),
            }),
        }

        if self.history.max_days <= 0 || self.history.max_days > MAX_WINDOW_DAYS {
            errors.push(ValidationError {
                field: "history.max_days".to_string(),
                error_type: "invalid_range".to_string(),
                message: format!(
                    "max_days must be between 1 and {}, got {}",
                    MAX_WINDOW_DAYS, self.history.max_days
                ),
            });
        }

        if self.alerting.trend_window_days <= 0
            || self.alerting.trend_window_days > MAX_WINDOW_DAYS
        {
            errors.push(ValidationError {
                field: "alerting.trend_window_days".to_string(),
                error_type: "invalid_range".to_string(),
                message: format!(
                    "Trend window must be between 1 and {} days",
                    MAX_WINDOW_DAYS
                ),
            });
        } else if self.alerting.trend_window_days > self.history.max_days {
            warnings.push(ValidationWarning {
                field: "alerting.trend_window_days".to_string(),
                message: format!(
                    "Trend window ({} days) is longer than retained history ({} days)",
                    self.alerting.trend_window_days, self.history.max_days
                ),
            });
        }

        if !self.alerting.trend_multiplier.is_finite() || self.alerting.trend_multiplier < 1.0 {
            errors.push(ValidationError {
                field: "alerting.trend_multiplier".to_string(),
                error_type: "invalid_range".to_string(),
                message: "Trend multiplier must be a finite value >= 1.0".to_string(),
            });
        }

        if !self.has_credentials() {
            warnings.push(ValidationWarning {
                field: "notifier".to_string(),
                message: "Messaging credentials missing; alerts will only be logged".to_string(),
            });
        }

        if url::Url::parse(&self.notifier.api_base).is_err() {
            errors.push(ValidationError {
                field: "notifier.api_base".to_string(),
                error_type: "invalid_url".to_string(),
                message: format!("Invalid API base URL: {}", self.notifier.api_base),
            });
        }

        if self.notifier.timeout_seconds == 0 {
            errors.push(ValidationError {
                field: "notifier.timeout_seconds".to_string(),
                error_type: "invalid_range".to_string(),
                message: "Notification timeout must be at least one second".to_string(),
            });
        }

        if self.utc_offset().is_none() {
            errors.push(ValidationError {
                field: "notifier.utc_offset_minutes".to_string(),
                error_type: "invalid_range".to_string(),
                message: format!(
                    "UTC offset out of range: {} minutes",
                    self.notifier.utc_offset_minutes
                ),
            });
        }

        if self.run_at().is_none() {
            errors.push(ValidationError {
                field: "pipeline.run_at".to_string(),
                error_type: "invalid_time".to_string(),
                message: format!("Expected HH:MM, got '{}'", self.pipeline.run_at),
            });
        }

        if self.pipeline.models.is_empty() {
            warnings.push(ValidationWarning {
                field: "pipeline.models".to_string(),
                message: "No models configured; scheduled runs will do nothing".to_string(),
            });
        }

        ValidationResult {
            success: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.notifier.bot_token.is_some() && self.notifier.chat_id.is_some()
    }

    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.notifier.utc_offset_minutes.checked_mul(60)?)
    }

    pub fn run_at(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.pipeline.run_at, "%H:%M").ok()
    }

    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            history_backend: self.history.backend.clone(),
            history_path: self.history.path.clone(),
            max_days: self.history.max_days,
            tier_scheme: self.alerting.tier_scheme,
            notifications_enabled: self.has_credentials(),
            models: self.pipeline.models.clone(),
            run_at: self.pipeline.run_at.clone(),
        }
    }
}

/// Configuration summary for startup logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub history_backend: String,
    pub history_path: String,
    pub max_days: i64,
    pub tier_scheme: TierScheme,
    pub notifications_enabled: bool,
    pub models: Vec<String>,
    pub run_at: String,
}
