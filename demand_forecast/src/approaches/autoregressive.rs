//! One seasonal ARIMA per series, scored on a held-out tail

use crate::approaches::ApproachOutput;
use crate::data::{InputRow, ModelInput};
use crate::error::{ForecastError, Result};
use crate::metrics::accuracy_by_series;
use crate::models::sarima::SarimaModel;
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::records::{ForecastRecord, SeriesFailure};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Fits every series independently and forecasts its last `horizon` weeks
#[derive(Debug, Clone)]
pub struct AutoregressiveForecaster {
    model: SarimaModel,
    horizon: usize,
}

impl AutoregressiveForecaster {
    /// Create a forecaster holding out `horizon` weeks per series
    pub fn new(model: SarimaModel, horizon: usize) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        Ok(Self { model, horizon })
    }

    /// Get the held-out length
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Forecast every series in `input`.
    ///
    /// A series that cannot be fitted is reported in `failures` and left out
    /// of `forecasts`; the others are unaffected.
    pub fn run(&self, input: &ModelInput) -> Result<ApproachOutput> {
        let results: Vec<(&str, Result<Vec<ForecastRecord>>)> = input
            .series()
            .into_par_iter()
            .map(|(model_id, rows)| (model_id, self.forecast_series(rows)))
            .collect();

        let mut output = ApproachOutput::default();
        for (model_id, result) in results {
            match result {
                Ok(records) => output.forecasts.extend(records),
                Err(err) => {
                    warn!(
                        model_id,
                        model = self.model.name(),
                        horizon = self.horizon,
                        error = %err,
                        "Skipping series in autoregressive forecast"
                    );
                    output.failures.push(SeriesFailure::new(model_id, &err));
                }
            }
        }
        output.accuracy = accuracy_by_series(&output.forecasts)?;

        info!(
            model = self.model.name(),
            forecast_series = output.accuracy.len(),
            failed_series = output.failures.len(),
            "Autoregressive forecast finished"
        );
        Ok(output)
    }

    /// Fit on all but the last `horizon` rows and attach the forecast to them
    pub fn forecast_series(&self, rows: &[InputRow]) -> Result<Vec<ForecastRecord>> {
        if rows.len() <= self.horizon {
            return Err(ForecastError::InsufficientData {
                needed: self.horizon + self.model.min_observations(),
                got: rows.len(),
            });
        }

        let split = rows.len() - self.horizon;
        let history = rows[..split]
            .iter()
            .map(|r| {
                r.target.ok_or_else(|| {
                    ForecastError::DataError(format!("Missing target at {}", r.time))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let trained = self.model.train(&history)?;
        let forecast = trained.forecast(self.horizon)?;
        debug!(
            model_id = rows[0].model_id.as_str(),
            sigma2 = trained.sigma2(),
            converged = trained.converged(),
            "Fitted series"
        );

        let intervals = forecast.intervals().unwrap_or_default();
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let step = i.checked_sub(split);
                let predicted = step.and_then(|h| forecast.values().get(h).copied());
                let bounds = step.and_then(|h| intervals.get(h).copied());
                ForecastRecord {
                    model_id: row.model_id.clone(),
                    time_var: row.time,
                    actual: row.target,
                    predicted,
                    lower: bounds.map(|b| b.0),
                    upper: bounds.map(|b| b.1),
                }
            })
            .collect();
        Ok(records)
    }
}
