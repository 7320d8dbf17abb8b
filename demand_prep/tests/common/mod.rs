#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use demand_math::stats::round_half_even;
use demand_prep::data::{RawObservation, SeriesIdentity, ShipmentRecord};
use std::f64::consts::PI;

pub fn monday(offset_weeks: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 6).unwrap() + Duration::weeks(offset_weeks)
}

pub fn identity(prod: &str) -> SeriesIdentity {
    SeriesIdentity::new(prod, "Mercadona", "Vitoria")
}

pub fn raw(prod: &str, time: NaiveDate, shipments: f64) -> RawObservation {
    RawObservation {
        identity: identity(prod),
        category: "SNACKS".to_string(),
        time,
        shipments,
    }
}

pub fn record(prod: &str, week: i64, shipments: Option<f64>) -> ShipmentRecord {
    ShipmentRecord {
        identity: identity(prod),
        category: "SNACKS".to_string(),
        week: monday(week),
        shipments,
    }
}

/// Integer-valued yearly seasonal series with a mild trend
pub fn seasonal_series(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            round_half_even(200.0 + 0.5 * t + 40.0 * (2.0 * PI * t / 52.0).sin() + ((i * 7) % 5) as f64)
        })
        .collect()
}

pub fn series_records(prod: &str, values: &[f64]) -> Vec<ShipmentRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| record(prod, i as i64, Some(*v)))
        .collect()
}
