//! # Demand Prep
//!
//! Cleaning and feature engineering for weekly demand shipments.
//!
//! ## Features
//!
//! - Raw table loading from CSV (shipments, promotions, holidays)
//! - Weekly calendar reindexing with configurable fill methods
//! - Removal of series dominated by zero demand
//! - STL-based outlier correction with residual winsorization
//! - Promotion and holiday cleaning plus weekly feature tables
//! - Categorical and cyclical calendar features for shipments
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use demand_prep::clean::{clean_shipments, CleaningConfig};
//! use demand_prep::data::DataLoader;
//!
//! let raw = DataLoader::shipments_from_csv("shipments.csv")?;
//! let report = clean_shipments(raw, &CleaningConfig::default())?;
//! println!("{} rows, {} points changed", report.records.len(), report.changed_points);
//! # Ok::<(), demand_prep::PrepError>(())
//! ```

pub mod calendar;
pub mod clean;
pub mod data;
pub mod error;
pub mod features;
pub mod holidays;
pub mod identity;
pub mod outliers;
pub mod partition;
pub mod promotions;
pub mod zeros;

// Re-export commonly used types
pub use crate::calendar::FillMethod;
pub use crate::clean::{clean_shipments, CleaningConfig, CleaningReport};
pub use crate::data::{DataLoader, RawObservation, SeriesIdentity, ShipmentRecord};
pub use crate::error::{PrepError, Result};
pub use crate::features::{FeatureTable, SeriesFacts, ShipmentFeatures};
pub use crate::outliers::{OutlierConfig, ShortSeriesPolicy};
pub use crate::promotions::PromotionsConfig;
