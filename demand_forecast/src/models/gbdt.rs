//! Gradient boosted regression trees
//!
//! Parameters use LightGBM names; the common aliases from LightGBM and the
//! scikit-learn wrappers are accepted as well. Parameters normally arrive
//! as a loosely typed string-to-scalar mapping from configuration, so
//! [`TreeParams::from_mapping`] is the usual entry point.

use crate::error::{ForecastError, Result};
use crate::models::tree::{grow_tree, GainParams, GrowerParams, Tree};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Loss optimised by the booster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Objective {
    /// Squared error
    #[default]
    #[serde(
        rename = "regression",
        alias = "regression_l2",
        alias = "l2",
        alias = "mse",
        alias = "mean_squared_error"
    )]
    Regression,
}

/// Booster settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeParams {
    #[serde(alias = "application", alias = "loss")]
    pub objective: Objective,
    #[serde(
        alias = "num_iterations",
        alias = "num_boost_round",
        alias = "n_estimators",
        alias = "n_iter"
    )]
    pub num_trees: usize,
    #[serde(alias = "shrinkage_rate", alias = "eta")]
    pub learning_rate: f64,
    #[serde(alias = "num_leaf", alias = "max_leaves")]
    pub num_leaves: usize,
    /// Zero or negative means unbounded
    pub max_depth: i64,
    #[serde(alias = "min_child_samples", alias = "min_data_per_leaf", alias = "min_data")]
    pub min_data_in_leaf: usize,
    #[serde(alias = "reg_lambda", alias = "lambda")]
    pub lambda_l2: f64,
    #[serde(alias = "min_split_gain")]
    pub min_gain_to_split: f64,
    #[serde(alias = "colsample_bytree", alias = "sub_feature")]
    pub feature_fraction: f64,
    #[serde(alias = "random_state", alias = "random_seed")]
    pub seed: u64,
    #[serde(alias = "verbosity")]
    pub verbose: i64,
    /// Score rows whose width differs from the training width
    pub predict_disable_shape_check: bool,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            objective: Objective::Regression,
            num_trees: 100,
            learning_rate: 0.1,
            num_leaves: 31,
            max_depth: -1,
            min_data_in_leaf: 20,
            lambda_l2: 0.0,
            min_gain_to_split: 0.0,
            feature_fraction: 1.0,
            seed: 42,
            verbose: -1,
            predict_disable_shape_check: true,
        }
    }
}

impl TreeParams {
    /// Build from a name-to-value mapping; unset keys keep their defaults.
    ///
    /// Unknown keys and values of the wrong type are rejected.
    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self> {
        let params: TreeParams = serde_json::from_value(Value::Object(mapping.clone()))
            .map_err(|e| ForecastError::InvalidParameter(format!("Tree parameters: {}", e)))?;
        params.validate()?;
        Ok(params)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.num_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "num_trees must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.num_leaves < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "num_leaves must be at least 2, got {}",
                self.num_leaves
            )));
        }
        if !(self.lambda_l2 >= 0.0) || !(self.min_gain_to_split >= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "lambda_l2 and min_gain_to_split must be non-negative".to_string(),
            ));
        }
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "feature_fraction must be in (0, 1], got {}",
                self.feature_fraction
            )));
        }
        Ok(())
    }

    fn grower(&self) -> GrowerParams {
        GrowerParams {
            gain: GainParams {
                reg_lambda: self.lambda_l2,
                min_gain: self.min_gain_to_split,
                min_samples_leaf: self.min_data_in_leaf,
            },
            learning_rate: self.learning_rate,
            max_leaves: self.num_leaves,
            max_depth: (self.max_depth > 0).then_some(self.max_depth as usize),
        }
    }
}

/// A fitted ensemble
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    params: TreeParams,
    base_score: f64,
    n_features: usize,
    trees: Vec<Tree>,
}

impl GradientBoosting {
    /// Fit on a row-major feature matrix
    pub fn fit(params: &TreeParams, features: &[Vec<f64>], targets: &[f64]) -> Result<Self> {
        params.validate()?;
        if features.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }
        if features.len() != targets.len() {
            return Err(ForecastError::DataError(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        let n_features = features[0].len();
        if features.iter().any(|row| row.len() != n_features) {
            return Err(ForecastError::DataError(
                "Training rows have different widths".to_string(),
            ));
        }
        if features.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(
                "Training data must be finite".to_string(),
            ));
        }

        let n = targets.len();
        let base_score = targets.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_score; n];
        let hess = vec![1.0; n];
        let grower = params.grower();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let n_sampled = ((params.feature_fraction * n_features as f64).round() as usize)
            .clamp(1.min(n_features), n_features);

        let mut trees = Vec::with_capacity(params.num_trees);
        for iteration in 0..params.num_trees {
            let grad: Vec<f64> = predictions
                .iter()
                .zip(targets)
                .map(|(p, y)| p - y)
                .collect();

            let mut columns: Vec<usize> = if n_sampled < n_features {
                sample(&mut rng, n_features, n_sampled).into_vec()
            } else {
                (0..n_features).collect()
            };
            columns.sort_unstable();

            let tree = grow_tree(features, &grad, &hess, (0..n).collect(), &columns, &grower);
            predictions
                .par_iter_mut()
                .zip(features.par_iter())
                .for_each(|(p, row)| *p += tree.predict(row));

            if params.verbose > 0 {
                let mse = predictions
                    .iter()
                    .zip(targets)
                    .map(|(p, y)| (p - y).powi(2))
                    .sum::<f64>()
                    / n as f64;
                debug!(iteration, leaves = tree.n_leaves(), mse, "Boosting round");
            }
            trees.push(tree);
        }

        info!(
            rows = n,
            features = n_features,
            trees = trees.len(),
            "Fitted gradient boosting model"
        );

        Ok(Self {
            params: params.clone(),
            base_score,
            n_features,
            trees,
        })
    }

    /// Predict one row.
    ///
    /// With the shape check disabled a short row is scored as if the missing
    /// trailing features were absent and extra values are ignored.
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features && !self.params.predict_disable_shape_check {
            return Err(ForecastError::DataError(format!(
                "Row has {} features, model was trained on {}",
                row.len(),
                self.n_features
            )));
        }
        Ok(self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>())
    }

    /// Get the training mean the ensemble starts from
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Get the number of training features
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Get the fitted trees
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }
}
