//! One boosted tree model trained on every series at once
//!
//! The cutoff is the first held-out week of a reference series. Every row
//! strictly before it is training data and every row at or after it is
//! scored, so no training row ever shares a week with a scored row.

use crate::approaches::ApproachOutput;
use crate::data::{InputRow, ModelInput};
use crate::error::{ForecastError, Result};
use crate::metrics::accuracy_by_series;
use crate::models::gbdt::{GradientBoosting, TreeParams};
use crate::records::{ForecastRecord, SeriesFailure};
use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

/// Trains once on the pooled history, then scores each series
#[derive(Debug, Clone)]
pub struct GlobalTreeForecaster {
    params: TreeParams,
    horizon: usize,
    reference_id: Option<String>,
}

/// Outcome of a global tree run
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalTreeRun {
    pub output: ApproachOutput,
    pub reference_id: String,
    /// First scored week
    pub cutoff: NaiveDate,
    pub training_rows: usize,
    pub scored_rows: usize,
}

impl GlobalTreeForecaster {
    /// Create a forecaster; `horizon` fixes the cutoff on the reference series
    pub fn new(params: TreeParams, horizon: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        params.validate()?;
        Ok(Self {
            params,
            horizon,
            reference_id: None,
        })
    }

    /// Pin the series the cutoff is taken from
    pub fn with_reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Pick the reference series: the configured one, else the one whose
    /// last week is latest, ties going to the smallest `model_id`.
    pub fn reference_series<'a>(&self, input: &'a ModelInput) -> Result<(&'a str, &'a [InputRow])> {
        let series = input.series();
        match &self.reference_id {
            Some(id) => series
                .into_iter()
                .find(|(model_id, _)| *model_id == id.as_str())
                .ok_or_else(|| {
                    ForecastError::DataError(format!("Reference series {} is not in the input", id))
                }),
            None => series
                .into_iter()
                .filter_map(|(id, rows)| rows.last().map(|last| (id, rows, last.time)))
                .max_by(|a, b| a.2.cmp(&b.2).then(b.0.cmp(a.0)))
                .map(|(id, rows, _)| (id, rows))
                .ok_or_else(|| ForecastError::DataError("Model input is empty".to_string())),
        }
    }

    /// Week at which scoring starts
    pub fn cutoff(&self, input: &ModelInput) -> Result<(String, NaiveDate)> {
        let (id, rows) = self.reference_series(input)?;
        if rows.len() < self.horizon {
            return Err(ForecastError::InsufficientData {
                needed: self.horizon,
                got: rows.len(),
            });
        }
        Ok((id.to_string(), rows[rows.len() - self.horizon].time))
    }

    /// Train on rows before the cutoff and score the rest
    pub fn run(&self, input: &ModelInput) -> Result<GlobalTreeRun> {
        let (reference_id, cutoff) = self.cutoff(input)?;

        let mut features = Vec::new();
        let mut targets = Vec::new();
        let mut unlabelled = 0;
        for row in input.rows().iter().filter(|r| r.time < cutoff) {
            match row.target {
                Some(target) => {
                    features.push(row.features.clone());
                    targets.push(target);
                }
                None => unlabelled += 1,
            }
        }
        if unlabelled > 0 {
            warn!(rows = unlabelled, "Excluding training rows without a target");
        }
        let training_rows = targets.len();
        info!(
            reference_id = reference_id.as_str(),
            cutoff = %cutoff,
            training_rows,
            "Training global tree model"
        );

        let model = GradientBoosting::fit(&self.params, &features, &targets)?;

        let results: Vec<(&str, Result<Vec<ForecastRecord>>)> = input
            .series()
            .into_par_iter()
            .map(|(model_id, rows)| (model_id, score_series(&model, rows, cutoff)))
            .collect();

        let mut output = ApproachOutput::default();
        for (model_id, result) in results {
            match result {
                Ok(records) => output.forecasts.extend(records),
                Err(err) => {
                    warn!(model_id, error = %err, "Skipping series in global tree scoring");
                    output.failures.push(SeriesFailure::new(model_id, &err));
                }
            }
        }
        output.accuracy = accuracy_by_series(&output.forecasts)?;
        let scored_rows = output
            .forecasts
            .iter()
            .filter(|r| r.predicted.is_some())
            .count();

        info!(
            cutoff = %cutoff,
            training_rows,
            scored_rows,
            failed_series = output.failures.len(),
            "Global tree forecast finished"
        );

        Ok(GlobalTreeRun {
            output,
            reference_id,
            cutoff,
            training_rows,
            scored_rows,
        })
    }
}

/// Every row of the series, predicted only from the cutoff on
fn score_series(
    model: &GradientBoosting,
    rows: &[InputRow],
    cutoff: NaiveDate,
) -> Result<Vec<ForecastRecord>> {
    rows.iter()
        .map(|row| {
            let predicted = if row.time >= cutoff {
                Some(model.predict(&row.features)?)
            } else {
                None
            };
            Ok(ForecastRecord {
                model_id: row.model_id.clone(),
                time_var: row.time,
                actual: row.target,
                predicted,
                lower: None,
                upper: None,
            })
        })
        .collect()
}
