//! Pipeline configuration
//!
//! One TOML file drives a whole run:
//!
//! ```toml
//! [cleaning]
//! fill_method = "ffill"
//! n_zeros = 26
//! winsor_threshold = 0.05
//!
//! [forecast]
//! horizon = 4
//!
//! [forecast.arima]
//! order = [1, 1, 1]
//! seasonal_order = [0, 0, 0, 0]
//! trend = "n"
//!
//! [forecast.tree_params]
//! num_leaves = 15
//! learning_rate = 0.05
//!
//! [paths]
//! shipments = "data/shipments.csv"
//! output_dir = "output"
//! ```
//!
//! Every section is optional. Unknown keys are rejected everywhere except
//! `[forecast.tree_params]`, whose keys are checked against the booster's
//! parameter names during [`PipelineConfig::validate`].

use crate::error::{PipelineError, Result};
use demand_forecast::models::gbdt::TreeParams;
use demand_forecast::models::sarima::{ArimaOrder, SarimaModel, SeasonalOrder, Trend};
use demand_prep::{CleaningConfig, PromotionsConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub cleaning: CleaningConfig,
    pub promotions: PromotionsConfig,
    pub forecast: ForecastConfig,
    pub paths: PathsConfig,
}

/// Settings shared by both forecasting approaches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Weeks held out and forecast per series
    pub horizon: usize,
    /// Series whose held-out window fixes the tree model cutoff
    pub reference_id: Option<String>,
    pub arima: ArimaConfig,
    /// Booster parameters by LightGBM name
    pub tree_params: toml::Table,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 4,
            reference_id: None,
            arima: ArimaConfig::default(),
            tree_params: toml::Table::new(),
        }
    }
}

/// Seasonal ARIMA settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArimaConfig {
    pub order: ArimaOrder,
    pub seasonal_order: SeasonalOrder,
    pub trend: Trend,
    pub confidence_level: f64,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            order: ArimaOrder::default(),
            seasonal_order: SeasonalOrder::default(),
            trend: Trend::default(),
            confidence_level: 0.95,
        }
    }
}

/// Input tables and output directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub shipments: PathBuf,
    pub promotions: Option<PathBuf>,
    pub holidays: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            shipments: PathBuf::from("data/shipments.csv"),
            promotions: None,
            holidays: None,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading pipeline configuration");
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check every section; nothing here touches input data
    pub fn validate(&self) -> Result<()> {
        self.cleaning
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        self.promotions
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        if self.forecast.horizon == 0 {
            return Err(PipelineError::Config(
                "forecast.horizon must be positive".to_string(),
            ));
        }
        self.sarima()?;
        self.tree_params()?;
        Ok(())
    }

    /// Build the seasonal ARIMA specification
    pub fn sarima(&self) -> Result<SarimaModel> {
        let arima = &self.forecast.arima;
        SarimaModel::new(arima.order, arima.seasonal_order, arima.trend)
            .and_then(|m| m.with_confidence_level(arima.confidence_level))
            .map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Build the booster parameters from `[forecast.tree_params]`
    pub fn tree_params(&self) -> Result<TreeParams> {
        let mapping = match serde_json::to_value(&self.forecast.tree_params) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => serde_json::Map::new(),
            Err(e) => return Err(PipelineError::Config(format!("tree_params: {}", e))),
        };
        TreeParams::from_mapping(&mapping).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Replace the output directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.paths.output_dir = output_dir.into();
        self
    }
}
