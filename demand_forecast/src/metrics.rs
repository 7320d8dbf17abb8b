//! Per-series accuracy scoring

use crate::error::Result;
use crate::records::{AccuracyRecord, ForecastRecord};
use demand_math::accuracy_from_pairs;

/// Score one series on its rows with both an actual and a prediction.
///
/// Returns `None` when no row has both.
pub fn series_accuracy(
    model_id: &str,
    records: &[ForecastRecord],
) -> Result<Option<AccuracyRecord>> {
    let score = accuracy_from_pairs(records.iter().map(|r| (r.actual, r.predicted)))?;
    Ok(score.map(|accuracy| AccuracyRecord {
        model_id: model_id.to_string(),
        accuracy,
    }))
}

/// Score every series in `records`, which must be grouped by `model_id`
pub fn accuracy_by_series(records: &[ForecastRecord]) -> Result<Vec<AccuracyRecord>> {
    let mut scores = Vec::new();
    let mut start = 0;
    for end in 1..=records.len() {
        if end == records.len() || records[end].model_id != records[start].model_id {
            if let Some(score) = series_accuracy(&records[start].model_id, &records[start..end])? {
                scores.push(score);
            }
            start = end;
        }
    }
    Ok(scores)
}

/// Mean of the per-series accuracies, `None` when there are none
pub fn mean_accuracy(scores: &[AccuracyRecord]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().map(|s| s.accuracy).sum::<f64>() / scores.len() as f64)
}
