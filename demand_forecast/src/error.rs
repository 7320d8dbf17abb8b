//! Error types for the demand_forecast crate

use demand_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// A series is too short for the model
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The estimator produced a non-finite objective
    #[error("Fit did not converge: {0}")]
    FitConvergence(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl ForecastError {
    /// Short label used in failure reports
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::DataError(_) => "data",
            ForecastError::InsufficientData { .. } => "insufficient_data",
            ForecastError::FitConvergence(_) => "fit_convergence",
            ForecastError::InvalidParameter(_) => "configuration",
            ForecastError::Math(_) => "math",
            ForecastError::IoError(_) => "io",
            ForecastError::Csv(_) => "csv",
            ForecastError::PolarsError(_) => "polars",
        }
    }
}
