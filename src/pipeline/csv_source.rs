// src/pipeline/csv_source.rs - Forecast and actual load readers over CSV files

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ActualsSource, Forecaster};
use crate::error::{LoadwatchError, Result};

/// Reads precomputed forecasts from `{dir}/{MODEL}/{YYYY-MM-DD}.csv`,
/// averaging the `load` column
#[derive(Debug, Clone)]
pub struct CsvForecaster {
    dir: PathBuf,
    column: String,
}

impl CsvForecaster {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            column: "load".to_string(),
        }
    }

    pub fn path_for(&self, model_name: &str, date: NaiveDate) -> PathBuf {
        self.dir
            .join(model_name)
            .join(format!("{}.csv", date.format("%Y-%m-%d")))
    }
}

#[async_trait]
impl Forecaster for CsvForecaster {
    async fn predict(&self, model_name: &str, date: NaiveDate) -> Result<Option<f64>> {
        let path = self.path_for(model_name, date);
        let value = read_column_mean(&path, &self.column).await?;
        if let Some(avg) = value {
            info!(model = %model_name, date = %date, "{} forecast for {}: {:.2}", model_name, date, avg);
        }
        Ok(value)
    }
}

/// Reads measured load from `{dir}/{YYYY}/{MM}/{DD-MM-YYYY}.csv`,
/// averaging the `value` column
#[derive(Debug, Clone)]
pub struct CsvActualsSource {
    dir: PathBuf,
    column: String,
}

impl CsvActualsSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            column: "value".to_string(),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(date.format("%Y").to_string())
            .join(date.format("%m").to_string())
            .join(format!("{}.csv", date.format("%d-%m-%Y")))
    }
}

#[async_trait]
impl ActualsSource for CsvActualsSource {
    async fn get_actual(&self, date: NaiveDate) -> Result<Option<f64>> {
        let value = read_column_mean(&self.path_for(date), &self.column).await?;
        if let Some(avg) = value {
            info!(date = %date, "Actual load for {}: {:.2}", date, avg);
        }
        Ok(value)
    }
}

/// Mean of a numeric column. `None` when the file does not exist or the
/// column has no numeric values.
pub async fn read_column_mean(path: &Path, column: &str) -> Result<Option<f64>> {
    if !tokio::fs::try_exists(path).await? {
        debug!("No data file at {}", path.display());
        return Ok(None);
    }

    let data = tokio::fs::read(path).await?;
    let mut reader = csv::Reader::from_reader(data.as_slice());

    let index = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| {
            LoadwatchError::InvalidInput(format!(
                "Column '{}' not found in {}",
                column,
                path.display()
            ))
        })?;

    let mut sum = 0.0;
    let mut count = 0usize;
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(index).and_then(|v| v.trim().parse::<f64>().ok()) {
            if value.is_finite() {
                sum += value;
                count += 1;
            }
        }
    }

    if count == 0 {
        debug!("Column '{}' in {} has no numeric values", column, path.display());
        return Ok(None);
    }
    Ok(Some(sum / count as f64))
}
