//! Error types for the demand_prep crate

use demand_math::MathError;
use thiserror::Error;

/// Errors raised while loading and cleaning demand tables
#[derive(Debug, Error)]
pub enum PrepError {
    /// Malformed timestamps, non-unique keys, negative demand and similar
    #[error("Data shape error: {0}")]
    DataShape(String),

    /// A series is too short for the requested operation
    #[error("Insufficient data for {model_id}: need at least {needed} points, got {got}")]
    InsufficientData {
        model_id: String,
        needed: usize,
        got: usize,
    },

    /// A series carries missing values where complete data is required
    #[error("Missing values in {model_id}: {count} null points")]
    MissingValues { model_id: String, count: usize },

    /// Invalid configuration, detected before any data is touched
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),
}

/// Result type for cleaning operations
pub type Result<T> = std::result::Result<T, PrepError>;

impl From<polars::prelude::PolarsError> for PrepError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        PrepError::Polars(err.to_string())
    }
}
