//! # Demandcast
//!
//! Cleans weekly demand shipments and forecasts them two ways: a seasonal
//! ARIMA per series and one gradient boosted tree model over all series.
//!
//! The heavy lifting lives in the workspace crates:
//!
//! - `demand_math`: STL, winsorization, the accuracy score and the optimizer
//! - `demand_prep`: loading, cleaning and feature engineering
//! - `demand_forecast`: model input, both forecasting approaches, outputs
//!
//! This crate ties them together behind a TOML configuration and a CLI.
//!
//! ## Quick Start
//!
//! ```no_run
//! use demandcast::{pipeline, PipelineConfig};
//!
//! # fn main() -> demandcast::Result<()> {
//! let config = PipelineConfig::from_file("demandcast.toml")?;
//! let (prepared, forecasts) = pipeline::run(&config)?;
//! println!(
//!     "{} cleaned rows, tree cutoff {}",
//!     prepared.cleaning.records.len(),
//!     forecasts.tree.cutoff
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod model_input;
pub mod pipeline;

pub use crate::config::PipelineConfig;
pub use crate::error::{PipelineError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
