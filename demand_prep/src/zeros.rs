//! Removal of series dominated by zero demand

use crate::data::ShipmentRecord;
use crate::partition::{map_partitions, partition_by};
use tracing::info;

/// Output of [`remove_zero_runs`]
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroFiltered {
    /// Rows of the series that were kept, in input order per series
    pub records: Vec<ShipmentRecord>,
    /// Model ids of the dropped series, sorted
    pub dropped: Vec<String>,
}

/// Drop every series with at least `n_zeros` zero-valued weeks.
///
/// The decision is all-or-nothing per series. Missing values do not count
/// as zeros. `n_zeros <= 0` drops every series.
pub fn remove_zero_runs(records: Vec<ShipmentRecord>, n_zeros: i64) -> ZeroFiltered {
    let groups = partition_by(records, |r| r.model_id());
    let total = groups.len();

    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (model_id, (zeros, rows)) in map_partitions(groups, |_, rows| {
        let zeros = rows.iter().filter(|r| r.shipments == Some(0.0)).count();
        (zeros, rows)
    }) {
        if zeros as i64 >= n_zeros {
            dropped.push(model_id);
        } else {
            kept.extend(rows);
        }
    }

    info!(
        n_zeros,
        dropped = dropped.len(),
        total,
        "Removed series with too many zero weeks"
    );

    ZeroFiltered {
        records: kept,
        dropped,
    }
}
