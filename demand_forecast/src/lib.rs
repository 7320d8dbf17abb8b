//! # Demand Forecast
//!
//! Two ways of forecasting the tail of many weekly demand series and scoring
//! them against what actually shipped.
//!
//! ## Features
//!
//! - Model-input table loading and validation (one row per series and week)
//! - Per-series seasonal ARIMA with normal prediction intervals
//! - One gradient boosted tree model trained on all series before a cutoff
//! - Per-series accuracy on held-out weeks
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::approaches::{AutoregressiveForecaster, GlobalTreeForecaster};
//! use demand_forecast::data::DataLoader;
//! use demand_forecast::models::gbdt::TreeParams;
//! use demand_forecast::models::sarima::{ArimaOrder, SarimaModel, SeasonalOrder, Trend};
//!
//! # fn main() -> demand_forecast::Result<()> {
//! let input = DataLoader::from_csv("model_input.csv")?;
//!
//! let sarima = SarimaModel::new(ArimaOrder(1, 1, 1), SeasonalOrder(0, 0, 0, 0), Trend::N)?;
//! let arima = AutoregressiveForecaster::new(sarima, 4)?.run(&input)?;
//!
//! let tree = GlobalTreeForecaster::new(TreeParams::default(), 4)?.run(&input)?;
//! println!("cutoff {} trained on {} rows", tree.cutoff, tree.training_rows);
//! # let _ = arima;
//! # Ok(())
//! # }
//! ```

pub mod approaches;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod records;

// Re-export commonly used types
pub use crate::approaches::{ApproachOutput, AutoregressiveForecaster, GlobalTreeForecaster};
pub use crate::data::{DataLoader, InputRow, ModelInput};
pub use crate::error::{ForecastError, Result};
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::records::{AccuracyRecord, ForecastRecord, SeriesFailure};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
