//! Promotions cleaning and features
//!
//! Raw promotion labels are free text. They are mapped through an explicit
//! table onto short promo codes; anything the table does not know is
//! rejected rather than silently turned into a new column.

use crate::data::{week_start, RawPromotion, SeriesIdentity};
use crate::error::{PrepError, Result};
use crate::features::FeatureTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Promotion label mapping and customer groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromotionsConfig {
    /// Raw label to promo code
    pub mapping: BTreeMap<String, String>,
    /// Raw labels that mean "no promotion"
    pub empty_markers: Vec<String>,
    /// Flag name to the (uppercase) customers it covers
    pub customer_groups: BTreeMap<String, Vec<String>>,
}

impl Default for PromotionsConfig {
    fn default() -> Self {
        let mapping = [
            ("10% descuento", "d10%"),
            ("10% desc", "d10%"),
            ("menos 50%", "d50%"),
            ("20%", "d20%"),
            ("tres por dos", "p3x2"),
            ("3x2", "p3x2"),
        ]
        .iter()
        .map(|(raw, code)| (raw.to_string(), code.to_string()))
        .collect();

        let customer_groups = [
            ("national", vec!["BM", "EROSKI", "MERCADONA"]),
            ("basque", vec!["BM", "EROSKI"]),
        ]
        .into_iter()
        .map(|(name, customers)| {
            (
                name.to_string(),
                customers.into_iter().map(String::from).collect(),
            )
        })
        .collect();

        Self {
            mapping,
            empty_markers: vec!["-".to_string()],
            customer_groups,
        }
    }
}

impl PromotionsConfig {
    /// Check the mapping without touching any data
    pub fn validate(&self) -> Result<()> {
        if let Some((raw, _)) = self.mapping.iter().find(|(_, code)| code.trim().is_empty()) {
            return Err(PrepError::Configuration(format!(
                "Promotion label {:?} maps to an empty code",
                raw
            )));
        }
        if let Some(marker) = self
            .empty_markers
            .iter()
            .find(|m| self.mapping.contains_key(*m))
        {
            return Err(PrepError::Configuration(format!(
                "{:?} is both a promotion label and a no-promotion marker",
                marker
            )));
        }
        if self.customer_groups.keys().any(|g| g.trim().is_empty()) {
            return Err(PrepError::Configuration(
                "Customer group names cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Distinct promo codes, sorted
    pub fn codes(&self) -> BTreeSet<&str> {
        self.mapping.values().map(String::as_str).collect()
    }

    fn resolve(&self, label: Option<&str>) -> Result<Option<String>> {
        let label = match label.map(str::trim) {
            None => return Ok(None),
            Some(l) if l.is_empty() || self.empty_markers.iter().any(|m| m == l) => {
                return Ok(None)
            }
            Some(l) => l,
        };

        if let Some(code) = self.mapping.get(label) {
            return Ok(Some(code.clone()));
        }
        if self.codes().contains(label) {
            return Ok(Some(label.to_string()));
        }
        Err(PrepError::DataShape(format!(
            "Unmapped promotion type {:?}",
            label
        )))
    }
}

/// One cleaned promotion row
#[derive(Debug, Clone, PartialEq)]
pub struct CleanPromotion {
    pub identity: SeriesIdentity,
    pub week: NaiveDate,
    pub promo: Option<String>,
}

impl CleanPromotion {
    /// Get the model id of this row
    pub fn model_id(&self) -> String {
        self.identity.model_id()
    }
}

/// Normalize identities, snap to weeks and map promotion labels
pub fn clean_promotions(
    raw: Vec<RawPromotion>,
    config: &PromotionsConfig,
) -> Result<Vec<CleanPromotion>> {
    config.validate()?;

    let cleaned = raw
        .into_iter()
        .map(|row| {
            Ok(CleanPromotion {
                identity: row.identity.normalized(),
                week: week_start(row.time),
                promo: config.resolve(row.promo_type.as_deref())?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        rows = cleaned.len(),
        with_promotion = cleaned.iter().filter(|p| p.promo.is_some()).count(),
        "Cleaned promotions"
    );
    Ok(cleaned)
}

/// One-hot promo codes and customer-group flags per `(model_id, week)`.
///
/// Rows without a promotion contribute nothing. Several promotions in the
/// same week combine by max.
pub fn promotion_features(
    promotions: &[CleanPromotion],
    config: &PromotionsConfig,
) -> FeatureTable<(String, NaiveDate)> {
    let codes: Vec<&str> = config.codes().into_iter().collect();
    let groups: Vec<(&String, &Vec<String>)> = config.customer_groups.iter().collect();

    let mut names: Vec<String> = codes.iter().map(|c| format!("promo_{}", c)).collect();
    names.extend(groups.iter().map(|(g, _)| format!("is_{}", g)));

    let mut table = FeatureTable::new(names);
    for promotion in promotions {
        let Some(promo) = promotion.promo.as_deref() else {
            continue;
        };

        let mut values: Vec<f64> = codes
            .iter()
            .map(|c| if *c == promo { 1.0 } else { 0.0 })
            .collect();
        values.extend(groups.iter().map(|(_, customers)| {
            if customers.contains(&promotion.identity.customer) {
                1.0
            } else {
                0.0
            }
        }));

        table.merge_max((promotion.model_id(), promotion.week), values);
    }

    table
}
