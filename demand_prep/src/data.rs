//! Raw and cleaned demand tables
//!
//! Tables are held as typed rows. CSV input goes through polars, which
//! handles type inference and quoting; every column is then cast to the type
//! the row expects so that numeric product codes and integer demand load the
//! same way as their string and float spellings.

use crate::error::{PrepError, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Column names of the shipments table
pub const SHIPMENT_COLUMNS: [&str; 6] = [
    "prod_code",
    "customer",
    "location",
    "category",
    "time_var",
    "shipments",
];

/// Column names of the promotions table
pub const PROMOTION_COLUMNS: [&str; 5] =
    ["prod_code", "customer", "location", "time_var", "promo_type"];

/// Column names of the holidays table
pub const HOLIDAY_COLUMNS: [&str; 2] = ["DT", "HOL_NM"];

/// Product/customer/location triple identifying one series
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesIdentity {
    pub prod_code: String,
    pub customer: String,
    pub location: String,
}

impl SeriesIdentity {
    /// Create a new identity
    pub fn new(
        prod_code: impl Into<String>,
        customer: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            prod_code: prod_code.into(),
            customer: customer.into(),
            location: location.into(),
        }
    }

    /// Grouping key used by every downstream stage
    pub fn model_id(&self) -> String {
        format!("{}#{}#{}", self.prod_code, self.customer, self.location)
    }

    /// Copy with customer and location uppercased
    pub fn normalized(&self) -> Self {
        Self {
            prod_code: self.prod_code.clone(),
            customer: self.customer.to_uppercase(),
            location: self.location.to_uppercase(),
        }
    }
}

/// One row of the raw shipments table
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub identity: SeriesIdentity,
    pub category: String,
    pub time: NaiveDate,
    pub shipments: f64,
}

/// One week of a reindexed series; `shipments` is `None` where the calendar
/// was extended and the fill method left the gap open
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRecord {
    pub identity: SeriesIdentity,
    pub category: String,
    pub week: NaiveDate,
    pub shipments: Option<f64>,
}

impl ShipmentRecord {
    /// Get the model id of this row
    pub fn model_id(&self) -> String {
        self.identity.model_id()
    }
}

/// Flat cleaned-shipments row as written to CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedShipmentRow {
    pub prod_code: String,
    pub customer: String,
    pub location: String,
    pub category: String,
    pub model_id: String,
    pub time_var: NaiveDate,
    pub shipments: Option<f64>,
}

impl From<&ShipmentRecord> for CleanedShipmentRow {
    fn from(record: &ShipmentRecord) -> Self {
        Self {
            prod_code: record.identity.prod_code.clone(),
            customer: record.identity.customer.clone(),
            location: record.identity.location.clone(),
            category: record.category.clone(),
            model_id: record.model_id(),
            time_var: record.week,
            shipments: record.shipments,
        }
    }
}

/// One row of the raw promotions table
#[derive(Debug, Clone, PartialEq)]
pub struct RawPromotion {
    pub identity: SeriesIdentity,
    pub time: NaiveDate,
    pub promo_type: Option<String>,
}

/// One row of the raw holidays table
#[derive(Debug, Clone, PartialEq)]
pub struct RawHoliday {
    pub date: NaiveDate,
    pub name: String,
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Parse a calendar date, accepting a trailing time of day
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Loader for the raw input tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load the raw shipments table from a CSV file
    pub fn shipments_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawObservation>> {
        Self::shipments_from_dataframe(&Self::read_csv(path)?)
    }

    /// Load the raw promotions table from a CSV file
    pub fn promotions_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawPromotion>> {
        Self::promotions_from_dataframe(&Self::read_csv(path)?)
    }

    /// Load the raw holidays table from a CSV file
    pub fn holidays_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RawHoliday>> {
        Self::holidays_from_dataframe(&Self::read_csv(path)?)
    }

    fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;
        Ok(df)
    }

    /// Convert a shipments data frame into raw observations
    pub fn shipments_from_dataframe(df: &DataFrame) -> Result<Vec<RawObservation>> {
        require_columns(df, &SHIPMENT_COLUMNS)?;

        let prod_codes = string_column(df, "prod_code")?;
        let customers = string_column(df, "customer")?;
        let locations = string_column(df, "location")?;
        let categories = string_column(df, "category")?;
        let times = string_column(df, "time_var")?;
        let values = float_column(df, "shipments")?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let identity = SeriesIdentity::new(
                required(&prod_codes[i], "prod_code", i)?,
                required(&customers[i], "customer", i)?,
                required(&locations[i], "location", i)?,
            );
            let category = required(&categories[i], "category", i)?;
            let time = required_date(&times[i], i)?;
            let shipments = values[i].ok_or_else(|| {
                PrepError::DataShape(format!(
                    "Row {} ({}) has no shipments value",
                    i,
                    identity.model_id()
                ))
            })?;

            rows.push(RawObservation {
                identity,
                category,
                time,
                shipments,
            });
        }

        Ok(rows)
    }

    /// Convert a promotions data frame into raw promotion rows
    pub fn promotions_from_dataframe(df: &DataFrame) -> Result<Vec<RawPromotion>> {
        require_columns(df, &PROMOTION_COLUMNS)?;

        let prod_codes = string_column(df, "prod_code")?;
        let customers = string_column(df, "customer")?;
        let locations = string_column(df, "location")?;
        let times = string_column(df, "time_var")?;
        let promo_types = string_column(df, "promo_type")?;

        (0..df.height())
            .map(|i| {
                Ok(RawPromotion {
                    identity: SeriesIdentity::new(
                        required(&prod_codes[i], "prod_code", i)?,
                        required(&customers[i], "customer", i)?,
                        required(&locations[i], "location", i)?,
                    ),
                    time: required_date(&times[i], i)?,
                    promo_type: promo_types[i].clone(),
                })
            })
            .collect()
    }

    /// Convert a holidays data frame into raw holiday rows
    pub fn holidays_from_dataframe(df: &DataFrame) -> Result<Vec<RawHoliday>> {
        require_columns(df, &HOLIDAY_COLUMNS)?;

        let dates = string_column(df, "DT")?;
        let names = string_column(df, "HOL_NM")?;

        (0..df.height())
            .map(|i| {
                Ok(RawHoliday {
                    date: required_date(&dates[i], i)?,
                    name: required(&names[i], "HOL_NM", i)?,
                })
            })
            .collect()
    }
}

fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<&str> = columns
        .iter()
        .filter(|c| !present.contains(*c))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PrepError::DataShape(format!(
            "Missing columns: {}",
            missing.join(", ")
        )))
    }
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::Utf8)?;
    let values = column
        .utf8()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect();
    Ok(values)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?.into_iter().collect();
    Ok(values)
}

fn required(value: &Option<String>, column: &str, row: usize) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(PrepError::DataShape(format!(
            "Row {} has an empty {} value",
            row, column
        ))),
    }
}

fn required_date(value: &Option<String>, row: usize) -> Result<NaiveDate> {
    let raw = value.as_deref().unwrap_or("");
    parse_date(raw).ok_or_else(|| {
        PrepError::DataShape(format!(
            "Row {} has a timestamp that cannot be ordered: {:?}",
            row, raw
        ))
    })
}
