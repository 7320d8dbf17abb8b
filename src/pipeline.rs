//! End-to-end runs: cleaning, features, both forecasters and CSV outputs

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::model_input::{build_model_input, ModelInputTables};
use demand_forecast::approaches::{
    ApproachOutput, AutoregressiveForecaster, GlobalTreeForecaster, GlobalTreeRun,
};
use demand_forecast::metrics::mean_accuracy;
use demand_forecast::records::write_csv;
use demand_forecast::ModelInput;
use demand_prep::data::{CleanedShipmentRow, RawHoliday, RawPromotion};
use demand_prep::features::shipment_features;
use demand_prep::holidays::{clean_holidays, holiday_features};
use demand_prep::promotions::{clean_promotions, promotion_features};
use demand_prep::{clean_shipments, CleaningReport, DataLoader, RawObservation};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Raw input tables of one run
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub shipments: Vec<RawObservation>,
    pub promotions: Vec<RawPromotion>,
    pub holidays: Vec<RawHoliday>,
}

impl RawTables {
    /// Load the tables named in the configuration; absent optional tables
    /// are empty
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let paths = &config.paths;
        let shipments = DataLoader::shipments_from_csv(&paths.shipments)?;
        let promotions = match &paths.promotions {
            Some(path) => DataLoader::promotions_from_csv(path)?,
            None => Vec::new(),
        };
        let holidays = match &paths.holidays {
            Some(path) => DataLoader::holidays_from_csv(path)?,
            None => Vec::new(),
        };
        Ok(Self {
            shipments,
            promotions,
            holidays,
        })
    }
}

/// Cleaned shipments and the model input built from them
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub cleaning: CleaningReport,
    pub tables: ModelInputTables,
}

/// Forecasts of both approaches
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub arima: ApproachOutput,
    pub tree: GlobalTreeRun,
}

impl ForecastRun {
    /// Mean per-series accuracy of each approach
    pub fn mean_accuracies(&self) -> (Option<f64>, Option<f64>) {
        (
            mean_accuracy(&self.arima.accuracy),
            mean_accuracy(&self.tree.output.accuracy),
        )
    }
}

/// Clean shipments, build every feature table and join them
pub fn prepare(raw: RawTables, config: &PipelineConfig) -> Result<PreparedData> {
    let cleaning = clean_shipments(raw.shipments, &config.cleaning)?;
    cleaning.require_rows()?;

    let shipments = shipment_features(&cleaning.records);
    let promotions = clean_promotions(raw.promotions, &config.promotions)?;
    let promotions = promotion_features(&promotions, &config.promotions);
    let holidays = holiday_features(&clean_holidays(raw.holidays));

    let tables = build_model_input(&shipments, &promotions, &holidays)?;
    Ok(PreparedData { cleaning, tables })
}

/// Run both forecasters concurrently on the same input
pub fn forecast(input: &ModelInput, config: &PipelineConfig) -> Result<ForecastRun> {
    let horizon = config.forecast.horizon;
    let arima = AutoregressiveForecaster::new(config.sarima()?, horizon)?;
    let mut tree = GlobalTreeForecaster::new(config.tree_params()?, horizon)?;
    if let Some(reference_id) = &config.forecast.reference_id {
        tree = tree.with_reference_id(reference_id.clone());
    }

    let (arima, tree) = rayon::join(|| arima.run(input), || tree.run(input));
    let run = ForecastRun {
        arima: arima?,
        tree: tree?,
    };

    let (arima_accuracy, tree_accuracy) = run.mean_accuracies();
    info!(
        horizon,
        arima_accuracy = ?arima_accuracy,
        tree_accuracy = ?tree_accuracy,
        "Forecasting finished"
    );
    Ok(run)
}

/// Write the cleaning outputs and return the files written
pub fn write_prepared(prepared: &PreparedData, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let cleaned: Vec<CleanedShipmentRow> = prepared
        .cleaning
        .records
        .iter()
        .map(CleanedShipmentRow::from)
        .collect();

    let shipments = dir.join("shipments_processed.csv");
    let skipped = dir.join("cleaning_skipped.csv");
    let model_input = dir.join("model_input.csv");
    let facts = dir.join("facts.csv");

    write_csv(&shipments, &cleaned)?;
    write_csv(&skipped, &prepared.cleaning.skipped)?;
    prepared.tables.input.write_csv(&model_input)?;
    write_csv(&facts, &prepared.tables.facts)?;

    Ok(vec![shipments, skipped, model_input, facts])
}

/// Write forecasts, accuracies and failures of both approaches
pub fn write_forecasts(run: &ForecastRun, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (prefix, output) in [("arima", &run.arima), ("ml", &run.tree.output)] {
        let forecasts = dir.join(format!("{}_results.csv", prefix));
        let accuracy = dir.join(format!("{}_accuracy.csv", prefix));
        let failures = dir.join(format!("{}_failures.csv", prefix));
        write_csv(&forecasts, &output.forecasts)?;
        write_csv(&accuracy, &output.accuracy)?;
        write_csv(&failures, &output.failures)?;
        written.extend([forecasts, accuracy, failures]);
    }
    Ok(written)
}

/// Validate, load, clean, forecast and write everything
pub fn run(config: &PipelineConfig) -> Result<(PreparedData, ForecastRun)> {
    config.validate()?;

    let raw = RawTables::load(config)?;
    let prepared = prepare(raw, config)?;
    let forecasts = forecast(&prepared.tables.input, config)?;

    let dir = &config.paths.output_dir;
    let mut written = write_prepared(&prepared, dir)?;
    written.extend(write_forecasts(&forecasts, dir)?);
    info!(files = written.len(), dir = %dir.display(), "Wrote outputs");

    Ok((prepared, forecasts))
}
