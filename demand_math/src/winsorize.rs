//! Symmetric and asymmetric winsorization
//!
//! Follows the masked-array convention: with `n` values and limit `l`, the
//! `floor(l * n)` smallest values are replaced by the smallest value that
//! survives, and likewise for the largest values at the upper end.

use crate::{MathError, Result};
use std::cmp::Ordering;

/// Clip the lower and upper tails of `values`, returning a new vector in the
/// original order.
pub fn winsorize(values: &[f64], lower_limit: f64, upper_limit: f64) -> Result<Vec<f64>> {
    for (name, limit) in [("lower", lower_limit), ("upper", upper_limit)] {
        if !(0.0..1.0).contains(&limit) {
            return Err(MathError::InvalidInput(format!(
                "The {} winsorization limit must be in [0, 1), got {}",
                name, limit
            )));
        }
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Cannot winsorize non-finite values".to_string(),
        ));
    }

    let n = values.len();
    let mut clipped = values.to_vec();
    if n == 0 {
        return Ok(clipped);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });

    let low_count = (lower_limit * n as f64).floor() as usize;
    let high_count = (upper_limit * n as f64).floor() as usize;
    if low_count + high_count >= n {
        return Err(MathError::InvalidInput(format!(
            "Limits ({}, {}) clip every one of the {} values",
            lower_limit, upper_limit, n
        )));
    }

    if low_count > 0 {
        let floor = values[order[low_count]];
        for &idx in &order[..low_count] {
            clipped[idx] = floor;
        }
    }

    if high_count > 0 {
        let upper_start = n - high_count;
        let ceiling = values[order[upper_start - 1]];
        for &idx in &order[upper_start..] {
            clipped[idx] = ceiling;
        }
    }

    Ok(clipped)
}
