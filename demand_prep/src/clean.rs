//! Shipments cleaning: calendar, zero filter, outliers, identities

use crate::calendar::{make_continuous, FillMethod};
use crate::data::{RawObservation, ShipmentRecord};
use crate::error::{PrepError, Result};
use crate::identity::normalize_identities;
use crate::outliers::{remove_outliers, OutlierConfig, ShortSeriesPolicy, SkippedSeries};
use crate::zeros::remove_zero_runs;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Settings for [`clean_shipments`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningConfig {
    pub fill_method: FillMethod,
    /// Series with at least this many zero weeks are dropped
    pub n_zeros: i64,
    /// Residual winsorization limit, in `[0, 0.5)`
    pub winsor_threshold: f64,
    pub seasonal_period: usize,
    pub seasonal_window: usize,
    pub short_series: ShortSeriesPolicy,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        let outliers = OutlierConfig::default();
        Self {
            fill_method: FillMethod::default(),
            n_zeros: 26,
            winsor_threshold: outliers.threshold,
            seasonal_period: outliers.period,
            seasonal_window: outliers.seasonal,
            short_series: outliers.short_series,
        }
    }
}

impl CleaningConfig {
    /// Outlier stage settings
    pub fn outliers(&self) -> OutlierConfig {
        OutlierConfig {
            threshold: self.winsor_threshold,
            period: self.seasonal_period,
            seasonal: self.seasonal_window,
            short_series: self.short_series,
        }
    }

    /// Check the settings without touching any data
    pub fn validate(&self) -> Result<()> {
        self.outliers().validate()
    }
}

/// Result of [`clean_shipments`]
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningReport {
    /// Cleaned rows with normalized identities, ordered by series then week
    pub records: Vec<ShipmentRecord>,
    pub injected_rows: usize,
    pub duplicate_rows: usize,
    pub merged_rows: usize,
    /// Series removed by the zero filter
    pub dropped_identities: Vec<String>,
    pub changed_points: usize,
    /// Series the outlier stage skipped
    pub skipped: Vec<SkippedSeries>,
}

/// Run the full shipments cleaning sequence
pub fn clean_shipments(
    raw: Vec<RawObservation>,
    config: &CleaningConfig,
) -> Result<CleaningReport> {
    config.validate()?;
    info!(?config, rows = raw.len(), "Cleaning shipments");

    let reindexed = make_continuous(raw, config.fill_method)?;
    let filtered = remove_zero_runs(reindexed.records, config.n_zeros);
    let corrected = remove_outliers(filtered.records, &config.outliers())?;
    let records = normalize_identities(corrected.records)?;

    if records.is_empty() {
        info!("No series survived cleaning");
    }

    Ok(CleaningReport {
        records,
        injected_rows: reindexed.injected_rows,
        duplicate_rows: reindexed.duplicate_rows,
        merged_rows: reindexed.merged_rows,
        dropped_identities: filtered.dropped,
        changed_points: corrected.changed_points,
        skipped: corrected.skipped,
    })
}

impl CleaningReport {
    /// Fail when every series was removed
    pub fn require_rows(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(PrepError::DataShape(
                "Cleaning removed every series".to_string(),
            ));
        }
        Ok(())
    }
}
