//! Identity normalization

use crate::data::ShipmentRecord;
use crate::error::{PrepError, Result};
use std::collections::HashSet;

/// Uppercase customer and location on every row.
///
/// Two raw spellings of one customer collapse into the same series here, so
/// `(model_id, week)` uniqueness is re-checked afterwards.
pub fn normalize_identities(records: Vec<ShipmentRecord>) -> Result<Vec<ShipmentRecord>> {
    let normalized: Vec<ShipmentRecord> = records
        .into_iter()
        .map(|mut r| {
            r.identity = r.identity.normalized();
            r
        })
        .collect();

    let mut keys = HashSet::with_capacity(normalized.len());
    for record in &normalized {
        if !keys.insert((record.identity.clone(), record.week)) {
            return Err(PrepError::DataShape(format!(
                "Duplicate week {} for {} after normalizing customer and location",
                record.week,
                record.model_id()
            )));
        }
    }

    Ok(normalized)
}
