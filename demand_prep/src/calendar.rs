//! Weekly calendar reindexing
//!
//! Every series is extended to a gap-free run of Monday-anchored weeks from
//! its first to its last observation. Before reindexing, timestamps are
//! snapped to the Monday of their ISO week, exact duplicate rows are dropped
//! and rows that still share a week are summed.

use crate::data::{week_start, RawObservation, SeriesIdentity, ShipmentRecord};
use crate::error::{PrepError, Result};
use crate::partition::{map_partitions, partition_by};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// How weeks injected by the reindexer get their value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMethod {
    /// Leave the injected week empty
    #[default]
    None,
    /// Carry the previous observation forward
    #[serde(alias = "pad")]
    Ffill,
    /// Carry the next observation backward
    #[serde(alias = "backfill")]
    Bfill,
    /// Take the closest observation; ties go to the later one
    Nearest,
    /// Fill with zero demand
    Zero,
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FillMethod::None => "none",
            FillMethod::Ffill => "ffill",
            FillMethod::Bfill => "bfill",
            FillMethod::Nearest => "nearest",
            FillMethod::Zero => "zero",
        };
        f.write_str(name)
    }
}

/// Output of [`make_continuous`]
#[derive(Debug, Clone, PartialEq)]
pub struct Reindexed {
    /// Continuous series, ordered by identity then week
    pub records: Vec<ShipmentRecord>,
    /// Weeks added to close gaps
    pub injected_rows: usize,
    /// Exact duplicate rows dropped
    pub duplicate_rows: usize,
    /// Rows folded into another row of the same week
    pub merged_rows: usize,
}

struct SeriesCalendar {
    records: Vec<ShipmentRecord>,
    observed: usize,
    merged: usize,
}

/// Make every series continuous over a weekly calendar
pub fn make_continuous(raw: Vec<RawObservation>, method: FillMethod) -> Result<Reindexed> {
    if let Some(bad) = raw
        .iter()
        .find(|r| !r.shipments.is_finite() || r.shipments < 0.0)
    {
        return Err(PrepError::DataShape(format!(
            "Demand must be a non-negative number, got {} for {} at {}",
            bad.shipments,
            bad.identity.model_id(),
            bad.time
        )));
    }

    let input_rows = raw.len();
    let mut seen = HashSet::with_capacity(input_rows);
    let deduplicated: Vec<RawObservation> = raw
        .into_iter()
        .filter(|r| {
            seen.insert((
                r.identity.clone(),
                r.category.clone(),
                r.time,
                r.shipments.to_bits(),
            ))
        })
        .collect();
    let duplicate_rows = input_rows - deduplicated.len();

    let groups = partition_by(deduplicated, |r| r.identity.clone());
    for (identity, rows) in &groups {
        let category = &rows[0].category;
        if let Some(other) = rows.iter().find(|r| &r.category != category) {
            return Err(PrepError::DataShape(format!(
                "{} appears with more than one category ({} and {})",
                identity.model_id(),
                category,
                other.category
            )));
        }
    }

    let mut records = Vec::new();
    let mut observed = 0;
    let mut merged_rows = 0;
    for (_, series) in map_partitions(groups, |identity, rows| reindex_series(identity, rows, method)) {
        observed += series.observed;
        merged_rows += series.merged;
        records.extend(series.records);
    }
    let injected_rows = records.len() - observed;

    info!(
        method = %method,
        injected_rows,
        duplicate_rows,
        merged_rows,
        total_rows = records.len(),
        "Reindexed shipments onto a weekly calendar"
    );

    Ok(Reindexed {
        records,
        injected_rows,
        duplicate_rows,
        merged_rows,
    })
}

fn reindex_series(
    identity: &SeriesIdentity,
    rows: Vec<RawObservation>,
    method: FillMethod,
) -> SeriesCalendar {
    let row_count = rows.len();
    let category = rows[0].category.clone();

    let mut weekly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        *weekly.entry(week_start(row.time)).or_insert(0.0) += row.shipments;
    }
    let observed: Vec<(NaiveDate, f64)> = weekly.into_iter().collect();
    let merged = row_count - observed.len();

    let filled = fill_calendar(&observed, method);
    debug!(
        model_id = %identity.model_id(),
        observed = observed.len(),
        weeks = filled.len(),
        "Reindexed series"
    );

    let records = filled
        .into_iter()
        .map(|(week, shipments)| ShipmentRecord {
            identity: identity.clone(),
            category: category.clone(),
            week,
            shipments,
        })
        .collect();

    SeriesCalendar {
        records,
        observed: observed.len(),
        merged,
    }
}

/// Lay `observed` (sorted, Monday-aligned, non-empty) onto the full weekly
/// calendar between its first and last week.
pub fn fill_calendar(
    observed: &[(NaiveDate, f64)],
    method: FillMethod,
) -> Vec<(NaiveDate, Option<f64>)> {
    let (first, last) = match (observed.first(), observed.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => return Vec::new(),
    };

    let mut filled = Vec::new();
    let mut next = 0;
    let mut week = first;
    while week <= last {
        if observed[next].0 == week {
            filled.push((week, Some(observed[next].1)));
            next += 1;
        } else {
            // The first week is always observed, so a gap has both neighbours
            let (before_week, before) = observed[next - 1];
            let (after_week, after) = observed[next];
            let value = match method {
                FillMethod::None => None,
                FillMethod::Ffill => Some(before),
                FillMethod::Bfill => Some(after),
                FillMethod::Zero => Some(0.0),
                FillMethod::Nearest => {
                    if (week - before_week) < (after_week - week) {
                        Some(before)
                    } else {
                        Some(after)
                    }
                }
            };
            filled.push((week, value));
        }
        week += Duration::weeks(1);
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday(offset_weeks: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::weeks(offset_weeks)
    }

    #[test]
    fn nearest_breaks_ties_towards_the_later_observation() {
        let observed = vec![(monday(0), 1.0), (monday(2), 5.0)];
        let filled = fill_calendar(&observed, FillMethod::Nearest);
        assert_eq!(filled[1], (monday(1), Some(5.0)));

        let observed = vec![(monday(0), 1.0), (monday(3), 5.0)];
        let filled = fill_calendar(&observed, FillMethod::Nearest);
        assert_eq!(filled[1].1, Some(1.0));
        assert_eq!(filled[2].1, Some(5.0));
    }

    #[test]
    fn empty_observations_give_an_empty_calendar() {
        assert!(fill_calendar(&[], FillMethod::Ffill).is_empty());
    }
}
