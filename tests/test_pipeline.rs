use demandcast::pipeline::{self, RawTables};
use demandcast::PipelineConfig;
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WEEKS: usize = 120;

fn monday(week: usize) -> String {
    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
    (start + chrono::Duration::weeks(week as i64)).to_string()
}

fn demand(series: usize, i: usize) -> f64 {
    let t = i as f64;
    (150.0 + 30.0 * series as f64 + 0.3 * t + 25.0 * (2.0 * PI * t / 52.0).sin()
        + ((i * 7 + series) % 5) as f64)
        .round()
}

fn write_inputs(dir: &Path) {
    let mut shipments = String::from("prod_code,customer,location,category,time_var,shipments\n");
    for (s, (prod, customer)) in [("P1", "Mercadona"), ("P2", "eroski")].iter().enumerate() {
        for i in 0..WEEKS {
            // week 30 is missing and gets filled forward
            if s == 0 && i == 30 {
                continue;
            }
            writeln!(
                shipments,
                "{},{},Vitoria,SNACKS,{},{}",
                prod,
                customer,
                monday(i),
                demand(s, i)
            )
            .unwrap();
        }
    }
    fs::write(dir.join("shipments.csv"), shipments).unwrap();

    let promotions = format!(
        "prod_code,customer,location,time_var,promo_type\n\
         P1,Mercadona,Vitoria,{},3x2\n\
         P1,Mercadona,Vitoria,{},-\n\
         P2,eroski,Vitoria,{},menos 50%\n",
        monday(10),
        monday(11),
        monday(60)
    );
    fs::write(dir.join("promotions.csv"), promotions).unwrap();

    let holidays = format!(
        "DT,HOL_NM\n{},Navidad\n{},Navidad\n{},Dia de Reyes\n",
        monday(50),
        monday(50),
        monday(52)
    );
    fs::write(dir.join("holidays.csv"), holidays).unwrap();
}

fn config(dir: &Path) -> PipelineConfig {
    let content = format!(
        r#"
[cleaning]
fill_method = "ffill"

[forecast]
horizon = 4

[forecast.arima]
order = [1, 0, 0]
trend = "c"

[forecast.tree_params]
num_trees = 20
min_data_in_leaf = 5

[paths]
shipments = "{dir}/shipments.csv"
promotions = "{dir}/promotions.csv"
holidays = "{dir}/holidays.csv"
output_dir = "{dir}/out"
"#,
        dir = dir.display()
    );
    PipelineConfig::from_toml_str(&content).unwrap()
}

#[test]
fn test_prepare_builds_joined_model_input() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let config = config(dir.path());

    let raw = RawTables::load(&config).unwrap();
    let prepared = pipeline::prepare(raw, &config).unwrap();

    assert_eq!(prepared.cleaning.injected_rows, 1);
    assert!(prepared.cleaning.dropped_identities.is_empty());
    let input = &prepared.tables.input;
    assert_eq!(input.len(), 2 * WEEKS);
    assert_eq!(prepared.tables.facts.len(), 2);

    let names = input.feature_names();
    let column = |name: &str| {
        names
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("missing column {}", name))
    };
    let p3x2 = column("promo_p3x2");
    let national = column("is_national");
    let holidays = column("number_of_holidays");
    column("hol_Navidad");
    column("hol_DiaReyes");

    let p1 = input.series_rows("P1#MERCADONA#VITORIA").unwrap();
    assert_eq!(p1[10].features[p3x2], 1.0);
    assert_eq!(p1[10].features[national], 1.0);
    assert_eq!(p1[11].features[p3x2], 0.0);
    assert_eq!(p1[50].features[holidays], 1.0);
    assert_eq!(p1[51].features[holidays], 0.0);
    assert!(p1[30].target.is_some());
}

#[test]
fn test_run_writes_both_approaches() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    let config = config(dir.path());

    let (prepared, forecasts) = pipeline::run(&config).unwrap();

    assert!(forecasts.arima.failures.is_empty());
    assert_eq!(forecasts.arima.accuracy.len(), 2);
    let predicted = forecasts
        .arima
        .forecasts
        .iter()
        .filter(|r| r.predicted.is_some())
        .count();
    assert_eq!(predicted, 2 * 4);

    let input = &prepared.tables.input;
    let tree = &forecasts.tree;
    let before = input.rows().iter().filter(|r| r.time < tree.cutoff).count();
    assert_eq!(tree.training_rows, before);
    assert_eq!(tree.scored_rows, 2 * 4);

    let out = dir.path().join("out");
    for file in [
        "shipments_processed.csv",
        "model_input.csv",
        "facts.csv",
        "arima_results.csv",
        "arima_accuracy.csv",
        "ml_results.csv",
        "ml_accuracy.csv",
    ] {
        assert!(out.join(file).exists(), "{} not written", file);
    }
    let header = fs::read_to_string(out.join("shipments_processed.csv")).unwrap();
    assert!(header.starts_with("prod_code,customer,location,category,model_id,time_var,shipments"));
}

#[test]
fn test_invalid_config_fails_before_reading_data() {
    let dir = TempDir::new().unwrap();
    // no input files written
    let mut config = config(dir.path());
    config.forecast.horizon = 0;

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err, demandcast::PipelineError::Config(_)));
}
