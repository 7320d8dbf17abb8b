//! demandcast - command-line entry point
//!
//! ```text
//! demandcast --config demandcast.toml run
//! demandcast --config demandcast.toml clean
//! demandcast --config demandcast.toml forecast --input output/model_input.csv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use demand_forecast::DataLoader;
use demandcast::pipeline::{self, RawTables};
use demandcast::PipelineConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for demandcast
#[derive(Parser, Debug)]
#[command(name = "demandcast")]
#[command(about = "Weekly demand cleaning and forecasting")]
#[command(version)]
struct Args {
    /// Pipeline configuration file
    #[arg(short, long, default_value = "demandcast.toml", env = "DEMANDCAST_CONFIG")]
    config: PathBuf,

    /// Log filter, e.g. `info` or `demand_prep=debug`; overrides RUST_LOG
    #[arg(short, long, env = "DEMANDCAST_LOG")]
    log_level: Option<String>,

    /// Output directory, overrides `paths.output_dir`
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean, build features and forecast
    Run,
    /// Clean and build the model input only
    Clean,
    /// Forecast from an existing model-input CSV
    Forecast {
        /// Model-input CSV; defaults to `model_input.csv` in the output directory
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log filter {:?}", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = PipelineConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(dir) = args.output_dir {
        config = config.with_output_dir(dir);
    }
    config.validate().context("Invalid configuration")?;
    let output_dir = config.paths.output_dir.clone();

    match args.command {
        Command::Run => {
            let (prepared, forecasts) = pipeline::run(&config).context("Pipeline failed")?;
            let (arima, tree) = forecasts.mean_accuracies();
            info!(
                series = prepared.tables.facts.len(),
                arima_accuracy = ?arima,
                tree_accuracy = ?tree,
                cutoff = %forecasts.tree.cutoff,
                "Run complete"
            );
        }
        Command::Clean => {
            let raw = RawTables::load(&config).context("Failed to read input tables")?;
            let prepared = pipeline::prepare(raw, &config).context("Cleaning failed")?;
            let written = pipeline::write_prepared(&prepared, &output_dir)
                .context("Failed to write cleaning outputs")?;
            info!(files = written.len(), "Cleaning complete");
        }
        Command::Forecast { input } => {
            let path = input.unwrap_or_else(|| output_dir.join("model_input.csv"));
            let model_input = DataLoader::from_csv(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let forecasts = pipeline::forecast(&model_input, &config).context("Forecast failed")?;
            let written = pipeline::write_forecasts(&forecasts, &output_dir)
                .context("Failed to write forecasts")?;
            info!(files = written.len(), "Forecast complete");
        }
    }

    Ok(())
}
