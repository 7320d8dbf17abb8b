//! The two forecasting approaches
//!
//! Both consume a [`ModelInput`](crate::data::ModelInput) and produce the
//! same output shape so their accuracy tables can be compared directly.

use crate::records::{AccuracyRecord, ForecastRecord, SeriesFailure};

pub mod autoregressive;
pub mod global_tree;

pub use autoregressive::AutoregressiveForecaster;
pub use global_tree::{GlobalTreeForecaster, GlobalTreeRun};

/// Forecasts, accuracy and failures of one approach
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApproachOutput {
    /// Every input row of each successful series, grouped by `model_id` in
    /// week order. `predicted` is set only inside the held-out range.
    pub forecasts: Vec<ForecastRecord>,
    /// One record per series with at least one scored row
    pub accuracy: Vec<AccuracyRecord>,
    /// Series excluded from `forecasts`
    pub failures: Vec<SeriesFailure>,
}
