#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use demand_forecast::{InputRow, ModelInput};

/// Monday `weeks` after 2021-01-04
pub fn week(weeks: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 4).unwrap() + Duration::weeks(weeks)
}

/// Seasonal demand with a 13-week cycle and a small deterministic wobble
pub fn demand(series: usize, i: usize) -> f64 {
    let phase = 2.0 * std::f64::consts::PI * i as f64 / 13.0;
    100.0 + 10.0 * series as f64 + 15.0 * phase.sin() + ((i * 7 + series) % 5) as f64
}

/// One series of `len` weeks starting at week `start`
pub fn series_rows(model_id: &str, series: usize, start: i64, len: usize) -> Vec<InputRow> {
    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / 13.0;
            InputRow {
                model_id: model_id.to_string(),
                time: week(start + i as i64),
                target: Some(demand(series, i)),
                features: vec![series as f64, phase.sin(), phase.cos()],
            }
        })
        .collect()
}

pub fn feature_names() -> Vec<String> {
    vec![
        "customer_encoded".to_string(),
        "sin_week".to_string(),
        "cos_week".to_string(),
    ]
}

/// Three aligned series of `len` weeks
pub fn aligned_input(len: usize) -> ModelInput {
    let mut rows = Vec::new();
    for (s, id) in ["A#C1#L1", "B#C1#L1", "C#C2#L1"].iter().enumerate() {
        rows.extend(series_rows(id, s, 0, len));
    }
    ModelInput::new(feature_names(), rows).unwrap()
}
