//! STL (Seasonal-Trend decomposition using LOESS)
//!
//! Additive decomposition `y = trend + seasonal + residual` following
//! Cleveland et al. (1990): cycle-subseries smoothing with one period of
//! extrapolation at each end, a low-pass filter (two moving averages of the
//! period length, one of length 3, then LOESS), and LOESS trend smoothing.
//! Smoothers evaluate every `jump`-th point and interpolate linearly between.
//!
//! Defaults match the common statistical packages: trend window is the
//! smallest odd integer `>= 1.5 * period / (1 - 1.5 / seasonal)`, low-pass
//! window is the smallest odd integer greater than the period, every LOESS
//! is locally linear and jumps are `ceil(window / 10)`.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Result of an STL decomposition
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Trend component
    pub trend: Vec<f64>,
    /// Seasonal component
    pub seasonal: Vec<f64>,
    /// Residual component
    pub residual: Vec<f64>,
}

impl Decomposition {
    /// Trend plus seasonal at every point, the series without its residual
    pub fn baseline(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(self.seasonal.iter())
            .map(|(t, s)| t + s)
            .collect()
    }

    /// Number of points decomposed
    pub fn len(&self) -> usize {
        self.trend.len()
    }

    /// Whether the decomposition is empty
    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }
}

/// STL configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stl {
    /// Number of observations per seasonal cycle
    period: usize,
    /// Seasonal LOESS window (odd, >= 3)
    seasonal: usize,
    /// Trend LOESS window (odd)
    trend: usize,
    /// Low-pass LOESS window (odd)
    low_pass: usize,
    /// Inner loop passes
    inner_iterations: usize,
}

impl Stl {
    /// Create a decomposer for the given period and seasonal window.
    pub fn new(period: usize, seasonal: usize) -> Result<Self> {
        if period < 2 {
            return Err(MathError::InvalidInput(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }
        if seasonal < 3 || seasonal % 2 == 0 {
            return Err(MathError::InvalidInput(format!(
                "Seasonal window must be an odd integer >= 3, got {}",
                seasonal
            )));
        }

        let trend = (1.5 * period as f64 / (1.0 - 1.5 / seasonal as f64)).ceil() as usize;

        Ok(Self {
            period,
            seasonal,
            trend: next_odd(trend),
            low_pass: next_odd(period + 1),
            inner_iterations: 2,
        })
    }

    /// Override the trend window (rounded up to odd).
    pub fn with_trend_window(mut self, window: usize) -> Self {
        self.trend = next_odd(window.max(3));
        self
    }

    /// Override the number of inner passes.
    pub fn with_inner_iterations(mut self, iterations: usize) -> Self {
        self.inner_iterations = iterations.max(1);
        self
    }

    /// Seasonal period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Seasonal window
    pub fn seasonal_window(&self) -> usize {
        self.seasonal
    }

    /// Trend window
    pub fn trend_window(&self) -> usize {
        self.trend
    }

    /// Low-pass window
    pub fn low_pass_window(&self) -> usize {
        self.low_pass
    }

    /// Minimum series length this configuration accepts
    pub fn min_length(&self) -> usize {
        2 * self.period
    }

    /// Decompose `series`.
    pub fn decompose(&self, series: &[f64]) -> Result<Decomposition> {
        let n = series.len();
        if n < self.min_length() {
            return Err(MathError::InsufficientData {
                needed: self.min_length(),
                got: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains non-finite values".to_string(),
            ));
        }

        let np = self.period;
        let seasonal_jump = jump_for(self.seasonal);
        let trend_jump = jump_for(self.trend);
        let low_pass_jump = jump_for(self.low_pass);

        let mut trend = vec![0.0; n];
        let mut seasonal = vec![0.0; n];

        for _ in 0..self.inner_iterations {
            let detrended: Vec<f64> = series
                .iter()
                .zip(trend.iter())
                .map(|(y, t)| y - t)
                .collect();

            let cycle = self.smooth_cycle_subseries(&detrended, seasonal_jump);

            let low_pass = moving_average(&moving_average(&moving_average(&cycle, np), np), 3);
            let low_pass = loess(&low_pass, self.low_pass, low_pass_jump);

            for i in 0..n {
                seasonal[i] = cycle[np + i] - low_pass[i];
            }

            let deseasonalized: Vec<f64> = series
                .iter()
                .zip(seasonal.iter())
                .map(|(y, s)| y - s)
                .collect();
            trend = loess(&deseasonalized, self.trend, trend_jump);
        }

        let residual = series
            .iter()
            .zip(seasonal.iter().zip(trend.iter()))
            .map(|(y, (s, t))| y - s - t)
            .collect();

        Ok(Decomposition {
            trend,
            seasonal,
            residual,
        })
    }

    /// Smooth every cycle-subseries and extend each by one point on both
    /// sides. The result has `n + 2 * period` values.
    fn smooth_cycle_subseries(&self, detrended: &[f64], jump: usize) -> Vec<f64> {
        let n = detrended.len();
        let np = self.period;
        let window = self.seasonal;
        let mut extended = vec![0.0; n + 2 * np];

        for position in 0..np {
            let subseries: Vec<f64> = detrended.iter().skip(position).step_by(np).copied().collect();
            let k = subseries.len();
            let smoothed = loess(&subseries, window, jump);

            let before = local_fit(&subseries, window, 0.0, 1, window.min(k))
                .unwrap_or(smoothed[0]);
            let after = local_fit(
                &subseries,
                window,
                (k + 1) as f64,
                k.saturating_sub(window) + 1,
                k,
            )
            .unwrap_or(smoothed[k - 1]);

            extended[position] = before;
            for (m, value) in smoothed.iter().enumerate() {
                extended[(m + 1) * np + position] = *value;
            }
            extended[(k + 1) * np + position] = after;
        }

        extended
    }
}

fn next_odd(value: usize) -> usize {
    if value % 2 == 0 {
        value + 1
    } else {
        value
    }
}

fn jump_for(window: usize) -> usize {
    ((window as f64) / 10.0).ceil().max(1.0) as usize
}

/// Trailing moving average; output has `len - window + 1` values.
fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(values.len() - window + 1);
    let mut sum: f64 = values[..window].iter().sum();
    result.push(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        result.push(sum / window as f64);
    }
    result
}

/// Locally linear tricube-weighted fit of `values` evaluated at the 1-based
/// position `at`, using the 1-based inclusive neighbourhood `[left, right]`.
///
/// Returns `None` when every weight in the neighbourhood is zero.
fn local_fit(values: &[f64], window: usize, at: f64, left: usize, right: usize) -> Option<f64> {
    let n = values.len();
    let range = n as f64 - 1.0;

    let mut h = (at - left as f64).max(right as f64 - at);
    if window > n {
        h += ((window - n) / 2) as f64;
    }
    let h_upper = 0.999 * h;
    let h_lower = 0.001 * h;

    let mut weights = vec![0.0; right - left + 1];
    let mut total = 0.0;
    for (offset, j) in (left..=right).enumerate() {
        let r = (j as f64 - at).abs();
        if r <= h_upper {
            weights[offset] = if r <= h_lower {
                1.0
            } else {
                (1.0 - (r / h).powi(3)).powi(3)
            };
            total += weights[offset];
        }
    }

    if total <= 0.0 {
        return None;
    }

    for w in weights.iter_mut() {
        *w /= total;
    }

    if h > 0.0 {
        let centre: f64 = (left..=right)
            .zip(weights.iter())
            .map(|(j, w)| w * j as f64)
            .sum();
        let spread: f64 = (left..=right)
            .zip(weights.iter())
            .map(|(j, w)| w * (j as f64 - centre).powi(2))
            .sum();

        if spread.sqrt() > 0.001 * range {
            let slope = (at - centre) / spread;
            for (j, w) in (left..=right).zip(weights.iter_mut()) {
                *w *= slope * (j as f64 - centre) + 1.0;
            }
        }
    }

    Some(
        (left..=right)
            .zip(weights.iter())
            .map(|(j, w)| w * values[j - 1])
            .sum(),
    )
}

/// LOESS smoother over the whole slice, evaluated every `jump` points with
/// linear interpolation in between.
fn loess(values: &[f64], window: usize, jump: usize) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return values.to_vec();
    }

    let mut smoothed = vec![0.0; n];
    let jump = jump.min(n - 1).max(1);
    let half = (window + 1) / 2;

    let neighbourhood = |i: usize| -> (usize, usize) {
        if window >= n {
            (1, n)
        } else if i < half {
            (1, window)
        } else if i >= n - half + 1 {
            (n - window + 1, n)
        } else {
            (i + 1 - half, window + i - half)
        }
    };

    if window < n && jump == 1 {
        let (mut left, mut right) = (1, window);
        for i in 1..=n {
            if i > half && right != n {
                left += 1;
                right += 1;
            }
            smoothed[i - 1] =
                local_fit(values, window, i as f64, left, right).unwrap_or(values[i - 1]);
        }
        return smoothed;
    }

    for i in (1..=n).step_by(jump) {
        let (left, right) = neighbourhood(i);
        smoothed[i - 1] = local_fit(values, window, i as f64, left, right).unwrap_or(values[i - 1]);
    }

    if jump > 1 {
        let mut i = 1;
        while i + jump <= n {
            let delta = (smoothed[i + jump - 1] - smoothed[i - 1]) / jump as f64;
            for j in (i + 1)..(i + jump) {
                smoothed[j - 1] = smoothed[i - 1] + delta * (j - i) as f64;
            }
            i += jump;
        }

        let last_evaluated = ((n - 1) / jump) * jump + 1;
        if last_evaluated != n {
            let (left, right) = neighbourhood(n);
            smoothed[n - 1] =
                local_fit(values, window, n as f64, left, right).unwrap_or(values[n - 1]);
            if last_evaluated != n - 1 {
                let delta = (smoothed[n - 1] - smoothed[last_evaluated - 1])
                    / (n - last_evaluated) as f64;
                for j in (last_evaluated + 1)..n {
                    smoothed[j - 1] = smoothed[last_evaluated - 1] + delta * (j - last_evaluated) as f64;
                }
            }
        }
    }

    smoothed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_windows_follow_the_period() {
        let stl = Stl::new(52, 53).unwrap();
        assert_eq!(stl.trend_window(), 81);
        assert_eq!(stl.low_pass_window(), 53);

        let stl = Stl::new(12, 7).unwrap();
        assert_eq!(stl.trend_window(), 23);
        assert_eq!(stl.low_pass_window(), 13);
    }

    #[test]
    fn moving_average_shrinks_by_window() {
        let ma = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(ma, vec![2.0, 3.0, 4.0]);
        assert!(moving_average(&[1.0], 3).is_empty());
    }

    #[test]
    fn local_fit_reproduces_a_line() {
        let line: Vec<f64> = (1..=9).map(|x| 2.0 * x as f64 + 1.0).collect();
        let fitted = local_fit(&line, 5, 5.0, 3, 7).unwrap();
        assert_abs_diff_eq!(fitted, 11.0, epsilon = 1e-9);

        // Extrapolation one step beyond the end stays on the line
        let fitted = local_fit(&line, 5, 10.0, 5, 9).unwrap();
        assert_abs_diff_eq!(fitted, 21.0, epsilon = 1e-9);
    }

    #[test]
    fn loess_with_jumps_keeps_linear_data() {
        let line: Vec<f64> = (0..40).map(|x| 0.5 * x as f64).collect();
        let smoothed = loess(&line, 11, 2);
        for (s, y) in smoothed.iter().zip(line.iter()) {
            assert_abs_diff_eq!(s, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn overrides_apply_to_the_decomposition() {
        let stl = Stl::new(12, 7)
            .unwrap()
            .with_trend_window(20)
            .with_inner_iterations(0);
        assert_eq!(stl.trend_window(), 21);

        let series: Vec<f64> = (0..60)
            .map(|i| 0.3 * i as f64 + (i % 12) as f64)
            .collect();
        let decomposition = stl.with_inner_iterations(3).decompose(&series).unwrap();
        assert_eq!(decomposition.len(), 60);
        for (i, y) in series.iter().enumerate() {
            let rebuilt = decomposition.trend[i] + decomposition.seasonal[i] + decomposition.residual[i];
            assert_abs_diff_eq!(rebuilt, *y, epsilon = 1e-9);
        }
    }
}
