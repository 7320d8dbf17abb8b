//! Bounded forecast accuracy
//!
//! `accuracy = max(0, 1 - sum|predicted - actual| / sum(actual))`, with the
//! zero-demand cases resolved to exactly 1 (perfect) or 0 (any error).
//! Both forecasting approaches score through this module.

use crate::{MathError, Result};

/// Accuracy of `predicted` against `actual`, always in `[0, 1]`.
///
/// Slices must have the same length. Empty input scores as a perfect
/// zero-demand series.
pub fn accuracy(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            actual.len(),
            predicted.len()
        )));
    }

    let total: f64 = actual.iter().sum();
    let abs_error: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (p - a).abs())
        .sum();

    if !total.is_finite() || !abs_error.is_finite() {
        return Err(MathError::CalculationError(
            "Accuracy inputs must be finite".to_string(),
        ));
    }

    let score = if total != 0.0 {
        (1.0 - abs_error / total).max(0.0)
    } else if abs_error == 0.0 {
        1.0
    } else {
        0.0
    };

    // A negative total would push the score above one.
    Ok(score.min(1.0))
}

/// Accuracy over the pairs where both actual and predicted are present.
///
/// Returns `Ok(None)` when no complete pair exists.
pub fn accuracy_from_pairs<I>(pairs: I) -> Result<Option<f64>>
where
    I: IntoIterator<Item = (Option<f64>, Option<f64>)>,
{
    let (actual, predicted): (Vec<f64>, Vec<f64>) = pairs
        .into_iter()
        .filter_map(|(a, p)| Some((a?, p?)))
        .unzip();

    if actual.is_empty() {
        return Ok(None);
    }

    accuracy(&actual, &predicted).map(Some)
}
