use demand_forecast::models::sarima::{ArimaOrder, SeasonalOrder, Trend};
use demand_prep::FillMethod;
use demandcast::{PipelineConfig, PipelineError};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const FULL: &str = r#"
[cleaning]
fill_method = "pad"
n_zeros = 10
winsor_threshold = 0.1

[promotions]
empty_markers = ["-", "sin promo"]

[promotions.mapping]
"3x2" = "p3x2"

[promotions.customer_groups]
national = ["MERCADONA"]

[forecast]
horizon = 8
reference_id = "6860_07#MERCADONA#VITORIA"

[forecast.arima]
order = [2, 1, 0]
seasonal_order = [1, 0, 0, 52]
trend = "ct"

[forecast.tree_params]
num_leaves = 15
n_estimators = 200
learning_rate = 0.05

[paths]
shipments = "in/shipments.csv"
holidays = "in/holidays.csv"
output_dir = "out"
"#;

#[test]
fn test_full_config_parses() {
    let config = PipelineConfig::from_toml_str(FULL).unwrap();

    assert_eq!(config.cleaning.fill_method, FillMethod::Ffill);
    assert_eq!(config.cleaning.n_zeros, 10);
    assert_eq!(config.promotions.mapping.len(), 1);
    assert_eq!(config.forecast.horizon, 8);
    assert_eq!(config.forecast.arima.order, ArimaOrder(2, 1, 0));
    assert_eq!(config.forecast.arima.seasonal_order, SeasonalOrder(1, 0, 0, 52));
    assert_eq!(config.forecast.arima.trend, Trend::Ct);
    assert_eq!(config.paths.promotions, None);
    assert_eq!(config.paths.output_dir, PathBuf::from("out"));

    config.validate().unwrap();
    let params = config.tree_params().unwrap();
    assert_eq!(params.num_leaves, 15);
    assert_eq!(params.num_trees, 200);
    assert_eq!(params.learning_rate, 0.05);
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = PipelineConfig::from_toml_str("").unwrap();

    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.cleaning.n_zeros, 26);
    assert_eq!(config.forecast.horizon, 4);
    config.validate().unwrap();
}

#[test]
fn test_unknown_keys_are_rejected() {
    let err = PipelineConfig::from_toml_str("[cleaning]\nfill = \"ffill\"\n").unwrap_err();
    assert!(matches!(err, PipelineError::Toml(_)));

    let config =
        PipelineConfig::from_toml_str("[forecast.tree_params]\nnum_leafs = 8\n").unwrap();
    assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
}

#[test]
fn test_invalid_values_fail_validation() {
    for content in [
        "[forecast]\nhorizon = 0\n",
        "[cleaning]\nwinsor_threshold = 0.5\n",
        "[forecast.arima]\nseasonal_order = [1, 0, 0, 1]\n",
        "[forecast.arima]\nconfidence_level = 1.0\n",
        "[forecast.tree_params]\nfeature_fraction = 0.0\n",
    ] {
        let config = PipelineConfig::from_toml_str(content).unwrap();
        assert!(
            matches!(config.validate(), Err(PipelineError::Config(_))),
            "accepted {:?}",
            content
        );
    }
}

#[test]
fn test_config_from_file_and_output_override() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", FULL).unwrap();

    let config = PipelineConfig::from_file(file.path())
        .unwrap()
        .with_output_dir("elsewhere");

    assert_eq!(config.paths.output_dir, PathBuf::from("elsewhere"));
    assert_eq!(config.paths.shipments, PathBuf::from("in/shipments.csv"));
}
