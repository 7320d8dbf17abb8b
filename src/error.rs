//! Error types for the demandcast pipeline

use demand_forecast::ForecastError;
use demand_prep::PrepError;
use thiserror::Error;

/// Errors raised while configuring or running the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration, raised before any data is read
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration
    #[error("Cannot parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Error from cleaning or feature engineering
    #[error(transparent)]
    Prep(#[from] PrepError),

    /// Error from forecasting or output writing
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, PipelineError>;
