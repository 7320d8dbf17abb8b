//! Statistical helpers and the rounding convention used by outlier correction

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Round to the nearest integer, ties to even.
///
/// This is the convention every "did this value change" comparison in the
/// cleaning path uses, so that `0.5` and `-0.5` both count as no change.
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Two-sided standard normal critical value for a confidence level.
///
/// `0.95` gives roughly `1.96`.
pub fn normal_critical_value(confidence_level: f64) -> Result<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must be between 0 and 1, got {}",
            confidence_level
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(format!("Standard normal: {}", e)))?;
    Ok(normal.inverse_cdf((1.0 + confidence_level) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round_half_even(0.5), 0.0);
        assert_eq!(round_half_even(1.5), 2.0);
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(-0.5), 0.0);
        assert_eq!(round_half_even(-1.6), -2.0);
    }

    #[test]
    fn critical_value_for_95_percent() {
        let z = normal_critical_value(0.95).unwrap();
        assert_abs_diff_eq!(z, 1.959964, epsilon = 1e-5);
        assert!(normal_critical_value(1.0).is_err());
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }
}
