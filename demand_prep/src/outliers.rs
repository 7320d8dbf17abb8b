//! Seasonal outlier correction
//!
//! Each series is decomposed with STL and its residuals winsorized. Points
//! whose residual moved by at least half a unit under the clip are flagged:
//! their residual is removed entirely and the point is rebuilt from trend
//! and seasonal alone. Every other point keeps its clipped residual, which
//! rounds back to the original value.

use crate::data::ShipmentRecord;
use crate::error::{PrepError, Result};
use crate::partition::{map_partitions, partition_by};
use demand_math::stats::round_half_even;
use demand_math::{winsorize, MathError, Stl};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What to do with a series that cannot be decomposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortSeriesPolicy {
    /// Exclude the series from the output
    #[default]
    Drop,
    /// Pass the series through unchanged
    Keep,
}

/// Outlier correction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlierConfig {
    /// Winsorization limit applied to both tails, in `[0, 0.5)`
    pub threshold: f64,
    /// Seasonal period in weeks
    pub period: usize,
    /// Seasonal smoother window
    pub seasonal: usize,
    /// Policy for series the decomposition cannot handle
    pub short_series: ShortSeriesPolicy,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            period: 52,
            seasonal: 53,
            short_series: ShortSeriesPolicy::Drop,
        }
    }
}

impl OutlierConfig {
    /// Check the settings without touching any data
    pub fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.threshold) {
            return Err(PrepError::Configuration(format!(
                "Winsorization threshold must be in [0, 0.5), got {}",
                self.threshold
            )));
        }
        Stl::new(self.period, self.seasonal)
            .map_err(|e| PrepError::Configuration(e.to_string()))?;
        Ok(())
    }
}

/// Correction of a single series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesCorrection {
    /// Reconstructed, non-negative integer-valued demand
    pub corrected: Vec<f64>,
    /// Points whose residual was removed
    pub flagged: Vec<bool>,
    /// Trend plus seasonal component
    pub baseline: Vec<f64>,
    /// Points where `corrected` differs from the input
    pub changed: usize,
}

/// Correct outliers in one complete series
pub fn correct_series(
    values: &[f64],
    config: &OutlierConfig,
) -> demand_math::Result<SeriesCorrection> {
    let decomposition = Stl::new(config.period, config.seasonal)?.decompose(values)?;
    let clipped = winsorize(&decomposition.residual, config.threshold, config.threshold)?;
    let baseline = decomposition.baseline();

    let mut corrected = Vec::with_capacity(values.len());
    let mut flagged = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let adjustment = round_half_even(clipped[i] - decomposition.residual[i]);
        let is_flagged = adjustment != 0.0;
        let residual = if is_flagged { 0.0 } else { clipped[i] };

        let rebuilt = round_half_even(baseline[i] + residual);
        corrected.push(if rebuilt > 0.0 { rebuilt } else { 0.0 });
        flagged.push(is_flagged);
    }

    let changed = corrected
        .iter()
        .zip(values.iter())
        .filter(|(c, v)| c != v)
        .count();

    Ok(SeriesCorrection {
        corrected,
        flagged,
        baseline,
        changed,
    })
}

/// A series left out of (or passed through) a per-series stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSeries {
    pub model_id: String,
    pub reason: String,
}

/// Output of [`remove_outliers`]
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierCorrected {
    /// Corrected rows, ordered by series then week
    pub records: Vec<ShipmentRecord>,
    /// Number of points whose value changed
    pub changed_points: usize,
    /// Series the decomposition could not handle
    pub skipped: Vec<SkippedSeries>,
}

enum SeriesOutcome {
    Corrected(Vec<ShipmentRecord>, usize),
    Skipped(Vec<ShipmentRecord>, PrepError),
}

/// Correct outliers in every series of a continuous table
pub fn remove_outliers(
    records: Vec<ShipmentRecord>,
    config: &OutlierConfig,
) -> Result<OutlierCorrected> {
    config.validate()?;
    let total_points = records.len();
    let groups = partition_by(records, |r| r.model_id());

    let outcomes = map_partitions(groups, |model_id, mut rows| {
        rows.sort_by_key(|r| r.week);
        correct_rows(model_id, rows, config)
    });

    let mut corrected = Vec::with_capacity(total_points);
    let mut changed_points = 0;
    let mut skipped = Vec::new();
    for (model_id, outcome) in outcomes {
        match outcome {
            SeriesOutcome::Corrected(rows, changed) => {
                changed_points += changed;
                corrected.extend(rows);
            }
            SeriesOutcome::Skipped(rows, err) => {
                warn!(
                    model_id = %model_id,
                    period = config.period,
                    seasonal = config.seasonal,
                    policy = ?config.short_series,
                    error = %err,
                    "Skipping outlier correction"
                );
                if config.short_series == ShortSeriesPolicy::Keep {
                    corrected.extend(rows);
                }
                skipped.push(SkippedSeries {
                    model_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        changed_points,
        total_points,
        skipped = skipped.len(),
        threshold = config.threshold,
        "Corrected seasonal outliers"
    );

    Ok(OutlierCorrected {
        records: corrected,
        changed_points,
        skipped,
    })
}

fn correct_rows(
    model_id: &str,
    mut rows: Vec<ShipmentRecord>,
    config: &OutlierConfig,
) -> SeriesOutcome {
    let missing = rows.iter().filter(|r| r.shipments.is_none()).count();
    if missing > 0 {
        let err = PrepError::MissingValues {
            model_id: model_id.to_string(),
            count: missing,
        };
        return SeriesOutcome::Skipped(rows, err);
    }

    let values: Vec<f64> = rows.iter().filter_map(|r| r.shipments).collect();
    match correct_series(&values, config) {
        Ok(correction) => {
            for (row, value) in rows.iter_mut().zip(correction.corrected) {
                row.shipments = Some(value);
            }
            SeriesOutcome::Corrected(rows, correction.changed)
        }
        Err(MathError::InsufficientData { needed, got }) => {
            let err = PrepError::InsufficientData {
                model_id: model_id.to_string(),
                needed,
                got,
            };
            SeriesOutcome::Skipped(rows, err)
        }
        Err(other) => SeriesOutcome::Skipped(rows, PrepError::Math(other)),
    }
}
