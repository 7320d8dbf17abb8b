//! Bounded Nelder-Mead simplex minimisation
//!
//! Used by the seasonal ARIMA estimator to minimise the conditional sum of
//! squares. Every candidate vertex is clamped into its box before the
//! objective is evaluated, so the objective never sees an out-of-bounds
//! point.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Outcome of a minimisation
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the simplex met the tolerance before `max_iterations`
    pub converged: bool,
}

/// Nelder-Mead settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMead {
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Reflection coefficient
    pub reflection: f64,
    /// Expansion coefficient
    pub expansion: f64,
    /// Contraction coefficient
    pub contraction: f64,
    /// Shrink coefficient
    pub shrink: f64,
    /// Relative size of the initial simplex
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-8,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

impl NelderMead {
    /// Minimise `objective` starting at `initial`.
    ///
    /// `bounds`, when given, must hold one `(low, high)` pair per dimension.
    pub fn minimize<F>(
        &self,
        objective: F,
        initial: &[f64],
        bounds: Option<&[(f64, f64)]>,
    ) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        let dims = initial.len();
        if dims == 0 {
            return Err(MathError::InvalidInput(
                "Cannot minimise over zero parameters".to_string(),
            ));
        }
        if let Some(b) = bounds {
            if b.len() != dims {
                return Err(MathError::InvalidInput(format!(
                    "Expected {} bounds, got {}",
                    dims,
                    b.len()
                )));
            }
            if b.iter().any(|(lo, hi)| !(lo <= hi)) {
                return Err(MathError::InvalidInput(
                    "Every bound must satisfy low <= high".to_string(),
                ));
            }
        }

        let clamp = |point: Vec<f64>| -> Vec<f64> {
            match bounds {
                None => point,
                Some(b) => point
                    .into_iter()
                    .zip(b.iter())
                    .map(|(x, &(lo, hi))| x.clamp(lo, hi))
                    .collect(),
            }
        };

        let mut simplex = Vec::with_capacity(dims + 1);
        simplex.push(clamp(initial.to_vec()));
        for i in 0..dims {
            let mut vertex = initial.to_vec();
            vertex[i] += if initial[i].abs() > 1e-10 {
                self.initial_step * initial[i].abs()
            } else {
                self.initial_step
            };
            simplex.push(clamp(vertex));
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| score(&objective, v)).collect();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;

            let mut order: Vec<usize> = (0..=dims).collect();
            order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
            let best = order[0];
            let worst = order[dims];
            let second_worst = order[dims - 1];

            let centroid = centroid_without(&simplex, worst);
            let spread = simplex
                .iter()
                .map(|v| distance(v, &centroid))
                .fold(0.0, f64::max);
            if values[worst] - values[best] < self.tolerance || spread < self.tolerance {
                converged = true;
                break;
            }

            let reflected = clamp(toward(&centroid, &simplex[worst], -self.reflection));
            let reflected_value = score(&objective, &reflected);

            if reflected_value < values[best] {
                let expanded = clamp(toward(&centroid, &reflected, self.expansion));
                let expanded_value = score(&objective, &expanded);
                if expanded_value < reflected_value {
                    simplex[worst] = expanded;
                    values[worst] = expanded_value;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = reflected_value;
                }
                continue;
            }

            if reflected_value < values[second_worst] {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
                continue;
            }

            let (target, target_value) = if reflected_value < values[worst] {
                (reflected, reflected_value)
            } else {
                (simplex[worst].clone(), values[worst])
            };
            let contracted = clamp(toward(&centroid, &target, self.contraction));
            let contracted_value = score(&objective, &contracted);
            if contracted_value < target_value {
                simplex[worst] = contracted;
                values[worst] = contracted_value;
                continue;
            }

            let anchor = simplex[best].clone();
            for i in 0..=dims {
                if i == best {
                    continue;
                }
                let shrunk = toward(&anchor, &simplex[i], self.shrink);
                simplex[i] = clamp(shrunk);
                values[i] = score(&objective, &simplex[i]);
            }
        }

        let best = values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);

        Ok(Minimum {
            point: simplex[best].clone(),
            value: values[best],
            iterations,
            converged,
        })
    }
}

/// NaN objective values rank worst.
fn score<F: Fn(&[f64]) -> f64>(objective: &F, point: &[f64]) -> f64 {
    let value = objective(point);
    if value.is_nan() {
        f64::INFINITY
    } else {
        value
    }
}

fn centroid_without(simplex: &[Vec<f64>], excluded: usize) -> Vec<f64> {
    let dims = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; dims];
    for (_, vertex) in simplex.iter().enumerate().filter(|(i, _)| *i != excluded) {
        for (c, x) in centroid.iter_mut().zip(vertex.iter()) {
            *c += x;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

/// `origin + factor * (point - origin)`
fn toward(origin: &[f64], point: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point.iter())
        .map(|(o, p)| o + factor * (p - o))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn finds_the_bowl_minimum() {
        let result = NelderMead::default()
            .minimize(
                |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
                &[0.0, 0.0],
                None,
            )
            .unwrap();

        assert!(result.converged);
        assert_abs_diff_eq!(result.point[0], 2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.point[1], -1.0, epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds() {
        let bounds = [(-0.99, 0.99)];
        let result = NelderMead::default()
            .minimize(|x| (x[0] - 5.0).powi(2), &[0.1], Some(&bounds[..]))
            .unwrap();

        assert_abs_diff_eq!(result.point[0], 0.99, epsilon = 1e-6);
    }

    #[test]
    fn rejects_empty_and_mismatched_input() {
        let nm = NelderMead::default();
        assert!(nm.minimize(|_| 0.0, &[], None).is_err());
        assert!(nm.minimize(|x| x[0], &[0.0, 0.0], Some(&[(0.0, 1.0)][..])).is_err());
    }
}
