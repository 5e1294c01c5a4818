// src/report.rs - Summary reports, exports and synthetic history

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::config::MAX_WINDOW_DAYS;
use crate::error::{LoadwatchError, Result};
use crate::history::ErrorHistoryStore;
use crate::observation::{today, window_start, ErrorHistory, ErrorObservation, DATE_FORMAT};
use crate::statistics::{ErrorStatistics, ERROR_THRESHOLD_PCT};

/// Number of most recent errors listed per model
pub const RECENT_ERRORS_SHOWN: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub model_name: String,
    pub stats: ErrorStatistics,
    /// Newest first
    pub recent: Vec<(NaiveDate, f64)>,
}

/// Per-model statistics over a trailing window
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub days: i64,
    pub generated_at: DateTime<Local>,
    pub models: Vec<ModelSummary>,
}

impl SummaryReport {
    /// Build a report for one model or for every tracked model
    pub async fn build(store: &ErrorHistoryStore, model: Option<&str>, days: i64) -> Result<Self> {
        let names = select_models(store, model).await?;

        let mut models = Vec::with_capacity(names.len());
        for model_name in names {
            let recent_errors = store.get_recent_errors(&model_name, days).await;
            let stats = ErrorStatistics::from_recent(&recent_errors);
            let recent = recent_errors
                .into_iter()
                .rev()
                .take(RECENT_ERRORS_SHOWN)
                .collect();
            models.push(ModelSummary {
                model_name,
                stats,
                recent,
            });
        }

        Ok(Self {
            days,
            generated_at: Local::now(),
            models,
        })
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "FORECAST ERROR SUMMARY REPORT ({} days)", self.days)?;
        writeln!(f, "Generated at: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "{}", rule)?;

        for model in &self.models {
            let stats = &model.stats;
            writeln!(f)?;
            writeln!(f, "MODEL: {}", model.model_name)?;
            writeln!(f, "  - Forecasts analyzed: {}", stats.count)?;

            let (Some(avg), Some(min), Some(max)) = (stats.avg, stats.min, stats.max) else {
                writeln!(f, "  - No error data available")?;
                continue;
            };
            writeln!(f, "  - Average error: {:.2}%", avg)?;
            writeln!(f, "  - Min error: {:.2}%", min)?;
            writeln!(f, "  - Max error: {:.2}%", max)?;
            writeln!(
                f,
                "  - Forecasts exceeding {}% threshold: {} ({:.1}%)",
                ERROR_THRESHOLD_PCT,
                stats.above_threshold_count,
                stats.violation_rate().unwrap_or(0.0)
            )?;

            if !model.recent.is_empty() {
                writeln!(f)?;
                writeln!(f, "  RECENT ERRORS (last {} days):", RECENT_ERRORS_SHOWN)?;
                for (date, error) in &model.recent {
                    let status = if *error <= ERROR_THRESHOLD_PCT { "✓" } else { "✗" };
                    writeln!(f, "    {}: {:.2}% {}", date.format(DATE_FORMAT), error, status)?;
                }
            }
        }

        writeln!(f)?;
        write!(f, "{}", rule)
    }
}

async fn select_models(store: &ErrorHistoryStore, model: Option<&str>) -> Result<Vec<String>> {
    let models = store.models().await;
    if models.is_empty() {
        return Err(LoadwatchError::InvalidInput(
            "No error history found".to_string(),
        ));
    }

    match model {
        Some(name) if models.iter().any(|m| m == name) => Ok(vec![name.to_string()]),
        Some(name) => Err(LoadwatchError::InvalidInput(format!(
            "Model '{}' not found in history. Available models: {}",
            name,
            models.join(", ")
        ))),
        None => Ok(models),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = LoadwatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(LoadwatchError::InvalidInput(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

/// Entries of the selected models within the trailing window
pub async fn collect_export(
    store: &ErrorHistoryStore,
    model: Option<&str>,
    days: i64,
) -> Result<ErrorHistory> {
    let cutoff = window_start(today(), days);
    let mut export = ErrorHistory::new();

    for model_name in select_models(store, model).await? {
        let entries: crate::observation::ModelHistory = store
            .get_model_history(&model_name)
            .await
            .range(cutoff..)
            .map(|(date, obs)| (*date, obs.clone()))
            .collect();
        if !entries.is_empty() {
            export.insert(model_name, entries);
        }
    }

    if export.is_empty() {
        return Err(LoadwatchError::InvalidInput("No data to export".to_string()));
    }
    Ok(export)
}

/// Same layout as the snapshot file
pub fn write_json<W: Write>(history: &ErrorHistory, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, history)?;
    Ok(())
}

/// One row per observation. Extra metric columns are the union over all
/// rows, sorted; missing values are empty.
pub fn write_csv<W: Write>(history: &ErrorHistory, writer: W) -> Result<()> {
    let extra_keys: BTreeSet<&String> = history
        .values()
        .flat_map(|entries| entries.values())
        .flat_map(|obs| obs.extra.keys())
        .collect();

    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["model", "date", "error", "actual", "predicted", "abs_error"];
    header.extend(extra_keys.iter().map(|k| k.as_str()));
    csv_writer.write_record(&header)?;

    for (model_name, entries) in history {
        for (date, obs) in entries {
            let mut row = vec![
                model_name.clone(),
                date.format(DATE_FORMAT).to_string(),
                obs.error_pct.to_string(),
                optional(obs.actual),
                optional(obs.predicted),
                optional(obs.abs_error),
            ];
            row.extend(extra_keys.iter().map(|k| optional(obs.extra.get(*k).copied())));
            csv_writer.write_record(&row)?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// `{dir}/error_export[_{model}]_{YYYYmmdd_HHMMSS}.{ext}`
pub fn default_export_path(
    dir: &Path,
    model: Option<&str>,
    format: ExportFormat,
    now: DateTime<Local>,
) -> PathBuf {
    let suffix = model.map(|m| format!("_{}", m)).unwrap_or_default();
    dir.join(format!(
        "error_export{}_{}.{}",
        suffix,
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}

/// Export the selected history to `output`, or to a timestamped file under
/// `default_dir`. Returns the written path.
pub async fn export(
    store: &ErrorHistoryStore,
    model: Option<&str>,
    days: i64,
    format: ExportFormat,
    output: Option<&Path>,
    default_dir: &Path,
) -> Result<PathBuf> {
    let history = collect_export(store, model, days).await?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => default_export_path(default_dir, model, format, Local::now()),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut buffer = Vec::new();
    match format {
        ExportFormat::Csv => write_csv(&history, &mut buffer)?,
        ExportFormat::Json => write_json(&history, &mut buffer)?,
    }
    tokio::fs::write(&path, buffer).await?;

    info!(
        "Data exported to {} in {} format",
        path.display(),
        format.extension().to_uppercase()
    );
    Ok(path)
}

/// Random history for dashboards and demos: mostly errors under the alert
/// threshold with roughly one day in five above it. `days` is capped at
/// `MAX_WINDOW_DAYS`.
pub fn generate_synthetic_history(
    models: &[String],
    days: i64,
    rng: &mut fastrand::Rng,
) -> ErrorHistory {
    let mut history = ErrorHistory::new();
    let now = today();

    for model in models {
        let entries = history.entry(model.clone()).or_default();
        for day in 0..days.clamp(0, MAX_WINDOW_DAYS) {
            let mut error = if rng.f64() < 0.8 {
                uniform(rng, 1.5, 4.8)
            } else {
                uniform(rng, 5.1, 12.0)
            };
            match model.as_str() {
                "ARIMA" => error *= 1.1,
                "LSTM" => error *= 0.9,
                _ => {}
            }

            let actual = uniform(rng, 350.0, 450.0);
            let sign = if rng.bool() { 1.0 } else { -1.0 };
            let predicted = actual * (1.0 + (error / 100.0) * sign);

            entries.insert(
                window_start(now, day),
                ErrorObservation::with_forecast(error, actual, predicted),
            );
        }
    }

    history
}

fn uniform(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}
