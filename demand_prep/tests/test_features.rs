use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use demand_prep::data::{SeriesIdentity, ShipmentRecord};
use demand_prep::features::{shipment_features, FeatureTable};
use pretty_assertions::assert_eq;
use std::f64::consts::PI;

fn row(customer: &str, category: &str, week: NaiveDate, value: f64) -> ShipmentRecord {
    ShipmentRecord {
        identity: SeriesIdentity::new("P1", customer, "VITORIA"),
        category: category.to_string(),
        week,
        shipments: Some(value),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_shipment_features() {
    let records = vec![
        row("MERCADONA", "SNACKS", date(2021, 12, 27), 5.0),
        row("MERCADONA", "SNACKS", date(2022, 1, 3), 6.0),
        row("BM", "DRINKS", date(2023, 3, 6), 7.0),
    ];

    let features = shipment_features(&records);

    assert_eq!(
        features.names,
        vec![
            "customer_encoded",
            "location_encoded",
            "category_encoded",
            "year_2022",
            "year_2023",
            "sin_month",
            "cos_month",
            "sin_week",
            "cos_week",
        ]
    );
    assert_eq!(features.rows.len(), 3);
    assert_eq!(features.facts.len(), 2);

    let first = &features.rows[0].values;
    // MERCADONA sorts after BM, SNACKS after DRINKS
    assert_eq!(&first[..5], &[1.0, 0.0, 1.0, 0.0, 0.0]);
    assert_abs_diff_eq!(first[5], (2.0 * PI).sin(), epsilon = 1e-12);
    assert_abs_diff_eq!(first[6], 1.0, epsilon = 1e-12);
    // 2021-12-27 is ISO week 52
    assert_abs_diff_eq!(first[7], (2.0 * PI).sin(), epsilon = 1e-12);

    let second = &features.rows[1].values;
    assert_eq!(&second[3..5], &[1.0, 0.0]);
    assert_abs_diff_eq!(second[5], (2.0 * PI / 12.0).sin(), epsilon = 1e-12);
    assert_abs_diff_eq!(second[7], (2.0 * PI / 52.0).sin(), epsilon = 1e-12);

    let third = &features.rows[2];
    assert_eq!(&third.values[..5], &[0.0, 0.0, 0.0, 0.0, 1.0]);
    assert_eq!(third.target, Some(7.0));
    assert_eq!(third.model_id, "P1#BM#VITORIA");
}

#[test]
fn test_feature_table_merges_by_max() {
    let mut table: FeatureTable<u32> = FeatureTable::new(vec!["a".into(), "b".into()]);
    table.merge_max(1, vec![1.0, 0.0]);
    table.merge_max(1, vec![0.0, 3.0]);
    table.merge_max(2, vec![2.0, 2.0]);

    assert_eq!(table.width(), 2);
    assert_eq!(table.get(&1).unwrap(), &[1.0, 3.0]);
    assert_eq!(table.get(&2).unwrap(), &[2.0, 2.0]);
}
