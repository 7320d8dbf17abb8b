//! Holidays cleaning and weekly holiday features

use crate::data::{week_start, RawHoliday};
use crate::features::FeatureTable;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::info;

/// One cleaned holiday
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CleanHoliday {
    pub date: NaiveDate,
    pub name: String,
}

/// Strip connecting words, spaces and apostrophes so a name can be a column
pub fn normalize_holiday_name(name: &str) -> String {
    name.replace(" de ", "")
        .replace(' ', "")
        .replace('ñ', "n")
        .replace('Ñ', "N")
        .replace('\'', "")
}

/// Drop duplicate rows, then normalize names
pub fn clean_holidays(raw: Vec<RawHoliday>) -> Vec<CleanHoliday> {
    let total = raw.len();
    let mut seen = HashSet::with_capacity(total);
    let cleaned: Vec<CleanHoliday> = raw
        .into_iter()
        .filter(|h| seen.insert((h.date, h.name.clone())))
        .map(|h| CleanHoliday {
            date: h.date,
            name: normalize_holiday_name(&h.name),
        })
        .collect();

    info!(
        rows = cleaned.len(),
        duplicates = total - cleaned.len(),
        "Cleaned holidays"
    );
    cleaned
}

/// Per week: number of holidays, a holiday flag and one column per holiday
pub fn holiday_features(holidays: &[CleanHoliday]) -> FeatureTable<NaiveDate> {
    let names: Vec<&str> = holidays
        .iter()
        .map(|h| h.name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut columns = vec!["number_of_holidays".to_string(), "is_holiday".to_string()];
    columns.extend(names.iter().map(|n| format!("hol_{}", n)));

    let mut by_week: BTreeMap<NaiveDate, Vec<&CleanHoliday>> = BTreeMap::new();
    for holiday in holidays {
        by_week.entry(week_start(holiday.date)).or_default().push(holiday);
    }

    let mut table = FeatureTable::new(columns);
    for (week, in_week) in by_week {
        let mut values = vec![in_week.len() as f64, 1.0];
        values.extend(names.iter().map(|n| {
            if in_week.iter().any(|h| h.name == *n) {
                1.0
            } else {
                0.0
            }
        }));
        table.rows.insert(week, values);
    }

    table
}
