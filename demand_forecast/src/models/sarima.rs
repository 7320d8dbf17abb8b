//! Seasonal ARIMA estimated by conditional sum of squares
//!
//! The series is differenced (regular, then seasonal), the multiplicative
//! AR and MA polynomials are expanded into plain lag polynomials, and the
//! coefficients are found by minimising the sum of squared one-step errors
//! with a bounded Nelder-Mead search. Deterministic trend terms act on the
//! differenced scale, so a constant with `d = 1` is a drift.
//!
//! Forecasts run the difference equation forward with future shocks set to
//! zero and are then integrated back through the differencing polynomial.
//! Interval half-widths come from the MA(inf) weights of the full model.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use demand_math::optimization::NelderMead;
use demand_math::stats::{mean, normal_critical_value};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Bound on every AR and MA coefficient
const COEFFICIENT_BOUND: f64 = 0.99;

/// Deterministic trend specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// No trend
    #[default]
    N,
    /// Constant
    C,
    /// Linear time trend
    T,
    /// Constant plus linear time trend
    Ct,
}

impl Trend {
    fn has_constant(self) -> bool {
        matches!(self, Trend::C | Trend::Ct)
    }

    fn has_slope(self) -> bool {
        matches!(self, Trend::T | Trend::Ct)
    }

    fn len(self) -> usize {
        self.has_constant() as usize + self.has_slope() as usize
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trend::N => "n",
            Trend::C => "c",
            Trend::T => "t",
            Trend::Ct => "ct",
        };
        f.write_str(name)
    }
}

/// Non-seasonal order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder(pub usize, pub usize, pub usize);

impl Default for ArimaOrder {
    fn default() -> Self {
        ArimaOrder(1, 1, 1)
    }
}

/// Seasonal order `(P, D, Q, s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeasonalOrder(pub usize, pub usize, pub usize, pub usize);

impl SeasonalOrder {
    fn has_terms(&self) -> bool {
        self.0 + self.1 + self.2 > 0
    }
}

/// Seasonal ARIMA model specification
#[derive(Debug, Clone)]
pub struct SarimaModel {
    name: String,
    order: ArimaOrder,
    seasonal: SeasonalOrder,
    trend: Trend,
    confidence_level: f64,
    optimizer: NelderMead,
}

impl SarimaModel {
    /// Create a new seasonal ARIMA specification
    pub fn new(order: ArimaOrder, seasonal: SeasonalOrder, trend: Trend) -> Result<Self> {
        if seasonal.has_terms() && seasonal.3 < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal terms need a period of at least 2, got {}",
                seasonal.3
            )));
        }

        Ok(Self {
            name: format!(
                "SARIMA({},{},{})({},{},{},{}) trend={}",
                order.0, order.1, order.2, seasonal.0, seasonal.1, seasonal.2, seasonal.3, trend
            ),
            order,
            seasonal,
            trend,
            confidence_level: 0.95,
            optimizer: NelderMead::default(),
        })
    }

    /// Set the interval confidence level
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Result<Self> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be between 0 and 1, got {}",
                confidence_level
            )));
        }
        self.confidence_level = confidence_level;
        Ok(self)
    }

    /// Replace the optimizer settings
    pub fn with_optimizer(mut self, optimizer: NelderMead) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Number of estimated coefficients
    pub fn parameter_count(&self) -> usize {
        self.trend.len() + self.order.0 + self.order.2 + self.seasonal.0 + self.seasonal.2
    }

    /// Shortest series the model can be fitted on
    pub fn min_observations(&self) -> usize {
        let lost_to_differencing = self.order.1 + self.seasonal.1 * self.seasonal.3;
        let ar_lags = self.order.0 + self.seasonal.0 * self.seasonal.3;
        lost_to_differencing + ar_lags + self.parameter_count() + 1
    }

    fn period(&self) -> usize {
        self.seasonal.3
    }

    fn differencing_polynomial(&self) -> Vec<f64> {
        let mut poly = vec![1.0];
        for _ in 0..self.order.1 {
            poly = poly_mul(&poly, &[1.0, -1.0]);
        }
        for _ in 0..self.seasonal.1 {
            let mut seasonal = vec![0.0; self.period() + 1];
            seasonal[0] = 1.0;
            seasonal[self.period()] = -1.0;
            poly = poly_mul(&poly, &seasonal);
        }
        poly
    }

    /// Split a parameter vector into trend terms and expanded lag polynomials
    fn unpack(&self, params: &[f64]) -> Lags {
        let (trend, rest) = params.split_at(self.trend.len());
        let (ar, rest) = rest.split_at(self.order.0);
        let (seasonal_ar, rest) = rest.split_at(self.seasonal.0);
        let (ma, seasonal_ma) = rest.split_at(self.order.2);
        let s = self.period();

        let mut ar_poly = vec![1.0];
        ar_poly.extend(ar.iter().map(|c| -c));
        let mut seasonal_ar_poly = vec![0.0; self.seasonal.0 * s + 1];
        seasonal_ar_poly[0] = 1.0;
        for (j, c) in seasonal_ar.iter().enumerate() {
            seasonal_ar_poly[(j + 1) * s] = -c;
        }

        let mut ma_poly = vec![1.0];
        ma_poly.extend_from_slice(ma);
        let mut seasonal_ma_poly = vec![0.0; seasonal_ma.len() * s + 1];
        seasonal_ma_poly[0] = 1.0;
        for (j, c) in seasonal_ma.iter().enumerate() {
            seasonal_ma_poly[(j + 1) * s] = *c;
        }

        let ar_full = poly_mul(&ar_poly, &seasonal_ar_poly);
        let ma_full = poly_mul(&ma_poly, &seasonal_ma_poly);

        let (constant, slope) = match self.trend {
            Trend::N => (0.0, 0.0),
            Trend::C => (trend[0], 0.0),
            Trend::T => (0.0, trend[0]),
            Trend::Ct => (trend[0], trend[1]),
        };

        Lags {
            ar: ar_full[1..].iter().map(|c| -c).collect(),
            ma: ma_full[1..].to_vec(),
            constant,
            slope,
        }
    }

    fn initial_parameters(&self, differenced: &[f64]) -> (Vec<f64>, Vec<(f64, f64)>) {
        let mut initial = Vec::with_capacity(self.parameter_count());
        let mut bounds = Vec::with_capacity(self.parameter_count());

        if self.trend.has_constant() {
            initial.push(mean(differenced).unwrap_or(0.0));
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        if self.trend.has_slope() {
            initial.push(0.0);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }

        let coefficient = (-COEFFICIENT_BOUND, COEFFICIENT_BOUND);
        initial.extend((0..self.order.0).map(|i| 0.1 / (i + 1) as f64));
        initial.extend(std::iter::repeat(0.1).take(self.seasonal.0));
        initial.extend((0..self.order.2).map(|i| 0.1 / (i + 1) as f64));
        initial.extend(std::iter::repeat(0.1).take(self.seasonal.2));
        bounds.resize(initial.len(), coefficient);

        (initial, bounds)
    }
}

/// Expanded model at one parameter vector
#[derive(Debug, Clone, PartialEq)]
struct Lags {
    /// `w_t` depends on `ar[k - 1] * w_{t-k}`
    ar: Vec<f64>,
    /// `w_t` depends on `ma[k - 1] * e_{t-k}`
    ma: Vec<f64>,
    constant: f64,
    slope: f64,
}

impl Lags {
    fn mean_at(&self, t: usize) -> f64 {
        self.constant + self.slope * (t + 1) as f64
    }

    fn predict(&self, t: usize, w: &[f64], e: &[f64]) -> f64 {
        let mut prediction = self.mean_at(t);
        for (k, c) in self.ar.iter().enumerate() {
            let lag = t - (k + 1);
            prediction += c * (w[lag] - self.mean_at(lag));
        }
        for (k, c) in self.ma.iter().enumerate() {
            if let Some(lag) = t.checked_sub(k + 1) {
                prediction += c * e[lag];
            }
        }
        prediction
    }

    /// One-step residuals; the first `ar.len()` are zero by construction
    fn residuals(&self, w: &[f64]) -> Vec<f64> {
        let mut e = vec![0.0; w.len()];
        for t in self.ar.len()..w.len() {
            e[t] = w[t] - self.predict(t, w, &e);
        }
        e
    }
}

/// Fitted seasonal ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedSarimaModel {
    name: String,
    model: SarimaModel,
    params: Vec<f64>,
    lags: Lags,
    history: Vec<f64>,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    differencing: Vec<f64>,
    sigma2: f64,
    converged: bool,
}

impl ForecastModel for SarimaModel {
    type Trained = TrainedSarimaModel;

    fn train(&self, data: &[f64]) -> Result<TrainedSarimaModel> {
        let needed = self.min_observations();
        if data.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(
                "Training values must be finite".to_string(),
            ));
        }

        let differencing = self.differencing_polynomial();
        let differenced = apply_polynomial(&differencing, data);
        let start = self.order.0 + self.seasonal.0 * self.period();

        let objective = |params: &[f64]| -> f64 {
            let e = self.unpack(params).residuals(&differenced);
            e[start..].iter().map(|x| x * x).sum()
        };

        let (initial, bounds) = self.initial_parameters(&differenced);
        let (params, css, converged) = if initial.is_empty() {
            (Vec::new(), objective(initial.as_slice()), true)
        } else {
            let minimum = self.optimizer.minimize(&objective, &initial, Some(bounds.as_slice()))?;
            (minimum.point, minimum.value, minimum.converged)
        };

        if !css.is_finite() {
            return Err(ForecastError::FitConvergence(format!(
                "{} produced a non-finite sum of squares",
                self.name
            )));
        }
        if !converged {
            warn!(model = %self.name, css, "Nelder-Mead stopped before converging");
        }

        let lags = self.unpack(&params);
        let residuals = lags.residuals(&differenced);
        let sigma2 = css / (differenced.len() - start) as f64;

        Ok(TrainedSarimaModel {
            name: self.name.clone(),
            model: self.clone(),
            params,
            lags,
            history: data.to_vec(),
            differenced,
            residuals,
            differencing,
            sigma2,
            converged,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedSarimaModel {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }

        let n = self.differenced.len();
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();
        for t in n..n + horizon {
            let next = self.lags.predict(t, &w, &e);
            w.push(next);
            e.push(0.0);
        }

        let mut y = self.history.clone();
        for t in n..n + horizon {
            let mut level = w[t];
            for (k, c) in self.differencing.iter().enumerate().skip(1) {
                level -= c * y[y.len() - k];
            }
            y.push(level);
        }
        let values = y[self.history.len()..].to_vec();

        let z = normal_critical_value(self.model.confidence_level)?;
        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let intervals = values
            .iter()
            .zip(psi.iter())
            .map(|(v, p)| {
                cumulative += p * p;
                let half_width = z * (self.sigma2 * cumulative).sqrt();
                (v - half_width, v + half_width)
            })
            .collect();

        ForecastResult::new_with_intervals(values, horizon, intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSarimaModel {
    /// MA(inf) weights of the integrated model, `psi[0] = 1`
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let mut ar_poly = vec![1.0];
        ar_poly.extend(self.lags.ar.iter().map(|c| -c));
        let alpha: Vec<f64> = poly_mul(&ar_poly, &self.differencing)[1..]
            .iter()
            .map(|c| -c)
            .collect();

        let mut psi = vec![1.0];
        for j in 1..horizon {
            let mut value = self.lags.ma.get(j - 1).copied().unwrap_or(0.0);
            for k in 1..=j.min(alpha.len()) {
                value += alpha[k - 1] * psi[j - k];
            }
            psi.push(value);
        }
        psi
    }

    /// Estimated parameters: trend terms, AR, seasonal AR, MA, seasonal MA
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Get the non-seasonal AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        let start = self.model.trend.len();
        &self.params[start..start + self.model.order.0]
    }

    /// Get the non-seasonal MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        let start = self.model.trend.len() + self.model.order.0 + self.model.seasonal.0;
        &self.params[start..start + self.model.order.2]
    }

    /// Residual variance of the one-step errors
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Whether the optimizer met its tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

fn apply_polynomial(poly: &[f64], y: &[f64]) -> Vec<f64> {
    let lags = poly.len() - 1;
    (lags..y.len())
        .map(|t| poly.iter().enumerate().map(|(k, c)| c * y[t - k]).sum())
        .collect()
}
