//! Output records of the forecasting approaches

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One week of one series after forecasting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub model_id: String,
    pub time_var: NaiveDate,
    #[serde(rename = "shipments")]
    pub actual: Option<f64>,
    #[serde(rename = "y_hat")]
    pub predicted: Option<f64>,
    #[serde(rename = "y_ci_lower")]
    pub lower: Option<f64>,
    #[serde(rename = "y_ci_upper")]
    pub upper: Option<f64>,
}

/// Accuracy of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    pub model_id: String,
    pub accuracy: f64,
}

/// A series an approach could not forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFailure {
    pub model_id: String,
    pub kind: String,
    pub message: String,
}

impl SeriesFailure {
    /// Create a failure record from an error
    pub fn new(model_id: impl Into<String>, err: &ForecastError) -> Self {
        Self {
            model_id: model_id.into(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Write serializable records to a CSV file with a header row
pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
