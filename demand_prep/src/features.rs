//! Feature tables and shipments features

use crate::data::ShipmentRecord;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;

/// Named numeric columns keyed by `K`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable<K: Ord> {
    pub names: Vec<String>,
    pub rows: BTreeMap<K, Vec<f64>>,
}

impl<K: Ord> FeatureTable<K> {
    /// Create an empty table with the given columns
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            rows: BTreeMap::new(),
        }
    }

    /// Get the values stored for `key`
    pub fn get(&self, key: &K) -> Option<&[f64]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.names.len()
    }

    /// Number of keyed rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert `values`, combining with any existing row by element-wise max
    pub fn merge_max(&mut self, key: K, values: Vec<f64>) {
        match self.rows.get_mut(&key) {
            Some(existing) => {
                for (current, new) in existing.iter_mut().zip(values) {
                    *current = current.max(new);
                }
            }
            None => {
                self.rows.insert(key, values);
            }
        }
    }
}

/// Descriptive attributes of one series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesFacts {
    pub model_id: String,
    pub customer: String,
    pub location: String,
    pub category: String,
}

/// One featured shipments row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub model_id: String,
    pub week: NaiveDate,
    pub target: Option<f64>,
    pub values: Vec<f64>,
}

/// Shipments features plus the per-series facts table
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentFeatures {
    pub names: Vec<String>,
    pub rows: Vec<FeatureRow>,
    pub facts: Vec<SeriesFacts>,
}

/// Encode categorical identity fields and calendar position of every row.
///
/// Category codes are positions in the sorted distinct values. Year dummies
/// exist for every year present except the earliest.
pub fn shipment_features(records: &[ShipmentRecord]) -> ShipmentFeatures {
    let customers = category_codes(records.iter().map(|r| r.identity.customer.as_str()));
    let locations = category_codes(records.iter().map(|r| r.identity.location.as_str()));
    let categories = category_codes(records.iter().map(|r| r.category.as_str()));

    let years: Vec<i32> = records
        .iter()
        .map(|r| r.week.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .skip(1)
        .collect();

    let mut names: Vec<String> = ["customer_encoded", "location_encoded", "category_encoded"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    names.extend(years.iter().map(|y| format!("year_{}", y)));
    names.extend(
        ["sin_month", "cos_month", "sin_week", "cos_week"]
            .iter()
            .map(|s| s.to_string()),
    );

    let mut facts: BTreeMap<String, SeriesFacts> = BTreeMap::new();
    let rows = records
        .iter()
        .map(|r| {
            let model_id = r.model_id();
            facts.entry(model_id.clone()).or_insert_with(|| SeriesFacts {
                model_id: model_id.clone(),
                customer: r.identity.customer.clone(),
                location: r.identity.location.clone(),
                category: r.category.clone(),
            });

            let mut values = vec![
                customers[&r.identity.customer],
                locations[&r.identity.location],
                categories[&r.category],
            ];
            let year = r.week.year();
            values.extend(years.iter().map(|y| if *y == year { 1.0 } else { 0.0 }));

            let month = r.week.month() as f64 / 12.0 * 2.0 * PI;
            let week = r.week.iso_week().week() as f64 / 52.0 * 2.0 * PI;
            values.extend([month.sin(), month.cos(), week.sin(), week.cos()]);

            FeatureRow {
                model_id,
                week: r.week,
                target: r.shipments,
                values,
            }
        })
        .collect();

    ShipmentFeatures {
        names,
        rows,
        facts: facts.into_values().collect(),
    }
}

fn category_codes<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, f64> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .map(|(code, value)| (value.to_string(), code as f64))
        .collect()
}
