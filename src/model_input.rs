//! Joining shipments, promotion and holiday features into the model input

use crate::error::Result;
use chrono::NaiveDate;
use demand_forecast::{InputRow, ModelInput};
use demand_prep::{FeatureTable, SeriesFacts, ShipmentFeatures};
use tracing::info;

/// Model-input table plus the per-series facts kept beside it
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputTables {
    pub input: ModelInput,
    pub facts: Vec<SeriesFacts>,
}

/// Left-join promotion features on `(model_id, week)` and holiday features
/// on `week`; rows with no match get zeros in the joined columns.
pub fn build_model_input(
    shipments: &ShipmentFeatures,
    promotions: &FeatureTable<(String, NaiveDate)>,
    holidays: &FeatureTable<NaiveDate>,
) -> Result<ModelInputTables> {
    let mut names = shipments.names.clone();
    names.extend(promotions.names.iter().cloned());
    names.extend(holidays.names.iter().cloned());

    let no_promotion = vec![0.0; promotions.width()];
    let no_holiday = vec![0.0; holidays.width()];
    let mut promoted_rows = 0;
    let mut holiday_rows = 0;

    let rows = shipments
        .rows
        .iter()
        .map(|row| {
            let promotion = promotions.get(&(row.model_id.clone(), row.week));
            let holiday = holidays.get(&row.week);
            promoted_rows += promotion.is_some() as usize;
            holiday_rows += holiday.is_some() as usize;

            let mut features = row.values.clone();
            features.extend_from_slice(promotion.unwrap_or(&no_promotion));
            features.extend_from_slice(holiday.unwrap_or(&no_holiday));
            InputRow {
                model_id: row.model_id.clone(),
                time: row.week,
                target: row.target,
                features,
            }
        })
        .collect();

    let input = ModelInput::new(names, rows)?;
    info!(
        rows = input.len(),
        predictors = input.feature_names().len(),
        promoted_rows,
        holiday_rows,
        "Built model input"
    );

    Ok(ModelInputTables {
        input,
        facts: shipments.facts.clone(),
    })
}
