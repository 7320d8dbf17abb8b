use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use demand_forecast::metrics::{accuracy_by_series, mean_accuracy, series_accuracy};
use demand_forecast::records::write_csv;
use demand_forecast::{AccuracyRecord, ForecastRecord};

fn record(model_id: &str, day: u32, actual: Option<f64>, predicted: Option<f64>) -> ForecastRecord {
    ForecastRecord {
        model_id: model_id.to_string(),
        time_var: NaiveDate::from_ymd_opt(2021, 1, day).unwrap(),
        actual,
        predicted,
        lower: None,
        upper: None,
    }
}

#[test]
fn test_series_accuracy_skips_incomplete_rows() {
    let records = vec![
        record("A", 4, Some(10.0), None),
        record("A", 11, Some(10.0), Some(8.0)),
        record("A", 18, None, Some(3.0)),
        record("A", 25, Some(10.0), Some(12.0)),
    ];

    let score = series_accuracy("A", &records).unwrap().unwrap();
    assert_abs_diff_eq!(score.accuracy, 0.8, epsilon = 1e-12);
}

#[test]
fn test_series_without_pairs_has_no_record() {
    let records = vec![record("A", 4, Some(10.0), None)];
    assert_eq!(series_accuracy("A", &records).unwrap(), None);
}

#[test]
fn test_accuracy_by_series_groups_contiguous_ids() {
    let records = vec![
        record("A", 4, Some(0.0), Some(0.0)),
        record("A", 11, Some(0.0), Some(0.0)),
        record("B", 4, Some(10.0), Some(20.0)),
        record("B", 11, Some(10.0), Some(20.0)),
        record("C", 4, Some(5.0), None),
    ];

    let scores = accuracy_by_series(&records).unwrap();

    assert_eq!(
        scores,
        vec![
            AccuracyRecord {
                model_id: "A".to_string(),
                accuracy: 1.0
            },
            AccuracyRecord {
                model_id: "B".to_string(),
                accuracy: 0.0
            },
        ]
    );
    assert_eq!(mean_accuracy(&scores), Some(0.5));
    assert_eq!(mean_accuracy(&[]), None);
}

#[test]
fn test_forecast_records_use_output_column_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forecast.csv");
    write_csv(&path, &[record("A", 4, Some(10.0), Some(9.5))]).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, "model_id,time_var,shipments,y_hat,y_ci_lower,y_ci_upper");
    assert!(text.contains("A,2021-01-04,10.0,9.5,,"));
}
