//! Model-input table handling
//!
//! The model-input table is wide: one row per `(model_id, week)` with the
//! target and a shared list of numeric predictors. Rows are kept sorted by
//! series then week, so each series is a contiguous slice.

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// Series key column
pub const ID_COLUMN: &str = "model_id";
/// Week column
pub const TIME_COLUMN: &str = "time_var";
/// Target column
pub const TARGET_COLUMN: &str = "shipments";

/// One row of the model-input table
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub model_id: String,
    pub time: NaiveDate,
    /// Observed demand, `None` where the week was never filled
    pub target: Option<f64>,
    pub features: Vec<f64>,
}

/// Validated model-input table
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    feature_names: Vec<String>,
    rows: Vec<InputRow>,
}

impl ModelInput {
    /// Create a model-input table, validating shape and keys
    pub fn new(feature_names: Vec<String>, mut rows: Vec<InputRow>) -> Result<Self> {
        let mut names = HashSet::new();
        for name in &feature_names {
            if [ID_COLUMN, TIME_COLUMN, TARGET_COLUMN].contains(&name.as_str()) {
                return Err(ForecastError::DataError(format!(
                    "{} cannot be used as a predictor",
                    name
                )));
            }
            if !names.insert(name.as_str()) {
                return Err(ForecastError::DataError(format!(
                    "Duplicate predictor column {}",
                    name
                )));
            }
        }

        for row in &rows {
            if row.features.len() != feature_names.len() {
                return Err(ForecastError::DataError(format!(
                    "Row {} at {} has {} predictors, expected {}",
                    row.model_id,
                    row.time,
                    row.features.len(),
                    feature_names.len()
                )));
            }
            if let Some(col) = row.features.iter().position(|v| !v.is_finite()) {
                return Err(ForecastError::DataError(format!(
                    "Null predictor {} for {} at {}",
                    feature_names[col], row.model_id, row.time
                )));
            }
            if matches!(row.target, Some(t) if !t.is_finite()) {
                return Err(ForecastError::DataError(format!(
                    "Non-finite target for {} at {}",
                    row.model_id, row.time
                )));
            }
        }

        rows.sort_by(|a, b| (&a.model_id, a.time).cmp(&(&b.model_id, b.time)));
        if let Some(pair) = rows
            .windows(2)
            .find(|w| w[0].model_id == w[1].model_id && w[0].time == w[1].time)
        {
            return Err(ForecastError::DataError(format!(
                "Duplicate key ({}, {})",
                pair[0].model_id, pair[0].time
            )));
        }

        Ok(Self {
            feature_names,
            rows,
        })
    }

    /// Get the predictor names
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Get all rows, sorted by series then week
    pub fn rows(&self) -> &[InputRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Contiguous per-series slices, in `model_id` order
    pub fn series(&self) -> Vec<(&str, &[InputRow])> {
        let mut series = Vec::new();
        let mut start = 0;
        for end in 1..=self.rows.len() {
            if end == self.rows.len() || self.rows[end].model_id != self.rows[start].model_id {
                series.push((self.rows[start].model_id.as_str(), &self.rows[start..end]));
                start = end;
            }
        }
        series
    }

    /// Rows of one series
    pub fn series_rows(&self, model_id: &str) -> Option<&[InputRow]> {
        self.series()
            .into_iter()
            .find(|(id, _)| *id == model_id)
            .map(|(_, rows)| rows)
    }

    /// Write the table as CSV with the key columns first
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        let mut header = vec![
            ID_COLUMN.to_string(),
            TIME_COLUMN.to_string(),
            TARGET_COLUMN.to_string(),
        ];
        header.extend(self.feature_names.iter().cloned());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![
                row.model_id.clone(),
                row.time.to_string(),
                row.target.map(|t| t.to_string()).unwrap_or_default(),
            ];
            record.extend(row.features.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Data loader for model-input tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a model-input table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<ModelInput> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Build a model-input table from a data frame; every column other than
    /// the key and target columns is a predictor
    pub fn from_dataframe(df: &DataFrame) -> Result<ModelInput> {
        let columns = df.get_column_names();
        for required in [ID_COLUMN, TIME_COLUMN, TARGET_COLUMN] {
            if !columns.contains(&required) {
                return Err(ForecastError::DataError(format!(
                    "Missing column {}",
                    required
                )));
            }
        }

        let ids = df.column(ID_COLUMN)?.cast(&DataType::Utf8)?;
        let times = df.column(TIME_COLUMN)?.cast(&DataType::Utf8)?;
        let targets = df.column(TARGET_COLUMN)?.cast(&DataType::Float64)?;

        let feature_names: Vec<String> = columns
            .iter()
            .filter(|c| ![ID_COLUMN, TIME_COLUMN, TARGET_COLUMN].contains(c))
            .map(|c| c.to_string())
            .collect();

        let mut feature_columns = Vec::with_capacity(feature_names.len());
        for name in &feature_names {
            let column = df.column(name)?.cast(&DataType::Float64)?;
            if column.null_count() > 0 {
                return Err(ForecastError::DataError(format!(
                    "Predictor {} has {} null values",
                    name,
                    column.null_count()
                )));
            }
            feature_columns.push(column);
        }
        let feature_values = feature_columns
            .iter()
            .map(|c| Ok(c.f64()?.into_no_null_iter().collect::<Vec<f64>>()))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(df.height());
        for (i, ((id, time), target)) in ids
            .utf8()?
            .into_iter()
            .zip(times.utf8()?.into_iter())
            .zip(targets.f64()?.into_iter())
            .enumerate()
        {
            let model_id = id
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ForecastError::DataError(format!("Row {} has no model_id", i)))?;
            let time = time.and_then(parse_date).ok_or_else(|| {
                ForecastError::DataError(format!("Row {} has an unparseable {}", i, TIME_COLUMN))
            })?;

            rows.push(InputRow {
                model_id: model_id.to_string(),
                time,
                target,
                features: feature_values.iter().map(|col| col[i]).collect(),
            });
        }

        ModelInput::new(feature_names, rows)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.date())
    })
}
