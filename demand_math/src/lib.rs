//! # Demand Math
//!
//! Numeric kernels shared by the cleaning and forecasting crates.
//! This crate provides the seasonal decomposition, the winsorization and
//! rounding conventions used by outlier correction, a bounded Nelder-Mead
//! optimizer, and the accuracy metric both forecasting approaches report.

use thiserror::Error;

pub mod accuracy;
pub mod decomposition;
pub mod optimization;
pub mod stats;
pub mod winsorize;

pub use accuracy::{accuracy, accuracy_from_pairs};
pub use decomposition::{Decomposition, Stl};
pub use winsorize::winsorize;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
