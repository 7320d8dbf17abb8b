mod common;

use chrono::NaiveDate;
use common::{aligned_input, feature_names, series_rows};
use demand_forecast::{DataLoader, ForecastError, ModelInput};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_model_input_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "model_id,time_var,shipments,sin_week,is_holiday").unwrap();
    writeln!(file, "B#C#L,2021-01-11,12.0,0.5,0").unwrap();
    writeln!(file, "A#C#L,2021-01-04,10.0,0.1,1").unwrap();
    writeln!(file, "B#C#L,2021-01-04,,0.1,1").unwrap();

    let input = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(input.feature_names(), &["sin_week", "is_holiday"]);
    assert_eq!(input.len(), 3);
    let first = &input.rows()[0];
    assert_eq!(first.model_id, "A#C#L");
    assert_eq!(first.time, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
    assert_eq!(first.features, vec![0.1, 1.0]);

    let b = input.series_rows("B#C#L").unwrap();
    assert_eq!(b.len(), 2);
    assert_eq!(b[0].target, None);
    assert_eq!(b[1].target, Some(12.0));
}

#[test]
fn test_null_predictor_is_a_data_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "model_id,time_var,shipments,sin_week").unwrap();
    writeln!(file, "A#C#L,2021-01-04,10.0,").unwrap();
    writeln!(file, "A#C#L,2021-01-11,11.0,0.2").unwrap();

    let err = DataLoader::from_csv(file.path()).unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));
}

#[test]
fn test_missing_key_column_is_a_data_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "model_id,shipments,sin_week").unwrap();
    writeln!(file, "A#C#L,10.0,0.1").unwrap();

    let err = DataLoader::from_csv(file.path()).unwrap_err();
    assert!(err.to_string().contains("time_var"));
}

#[test]
fn test_duplicate_key_is_rejected() {
    let mut rows = series_rows("A#C#L", 0, 0, 3);
    rows.push(rows[1].clone());

    let err = ModelInput::new(feature_names(), rows).unwrap_err();
    assert!(err.to_string().contains("Duplicate key"));
}

#[test]
fn test_reserved_predictor_name_is_rejected() {
    let rows = series_rows("A#C#L", 0, 0, 3);
    let mut names = feature_names();
    names[0] = "shipments".to_string();

    assert!(matches!(
        ModelInput::new(names, rows),
        Err(ForecastError::DataError(_))
    ));
}

#[test]
fn test_write_then_load_keeps_the_table() {
    let input = aligned_input(6);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model_input.csv");

    input.write_csv(&path).unwrap();
    let loaded = DataLoader::from_csv(&path).unwrap();

    assert_eq!(loaded.feature_names(), input.feature_names());
    assert_eq!(loaded.len(), input.len());
    assert_eq!(loaded.series().len(), 3);
}
