mod common;

use chrono::Duration;
use common::{monday, raw};
use demand_prep::calendar::{make_continuous, FillMethod};
use demand_prep::PrepError;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn gappy_series() -> Vec<demand_prep::RawObservation> {
    vec![
        raw("A", monday(0), 10.0),
        raw("A", monday(3), 40.0),
        raw("A", monday(1), 20.0),
        raw("A", monday(6), 70.0),
    ]
}

#[test]
fn test_weeks_are_consecutive_and_originals_kept() {
    let original = gappy_series();
    let result = make_continuous(original.clone(), FillMethod::Ffill).unwrap();

    assert_eq!(result.records.len(), 7);
    assert_eq!(result.injected_rows, 3);
    for pair in result.records.windows(2) {
        assert_eq!(pair[1].week - pair[0].week, Duration::days(7));
    }
    for obs in &original {
        let row = result
            .records
            .iter()
            .find(|r| r.week == obs.time)
            .expect("original week present");
        assert_eq!(row.shipments, Some(obs.shipments));
    }
}

#[rstest]
#[case(FillMethod::None, vec![Some(10.0), Some(20.0), None, Some(40.0), None, None, Some(70.0)])]
#[case(FillMethod::Ffill, vec![Some(10.0), Some(20.0), Some(20.0), Some(40.0), Some(40.0), Some(40.0), Some(70.0)])]
#[case(FillMethod::Bfill, vec![Some(10.0), Some(20.0), Some(40.0), Some(40.0), Some(70.0), Some(70.0), Some(70.0)])]
#[case(FillMethod::Nearest, vec![Some(10.0), Some(20.0), Some(40.0), Some(40.0), Some(40.0), Some(70.0), Some(70.0)])]
#[case(FillMethod::Zero, vec![Some(10.0), Some(20.0), Some(0.0), Some(40.0), Some(0.0), Some(0.0), Some(70.0)])]
fn test_fill_methods(#[case] method: FillMethod, #[case] expected: Vec<Option<f64>>) {
    let result = make_continuous(gappy_series(), method).unwrap();
    let values: Vec<Option<f64>> = result.records.iter().map(|r| r.shipments).collect();
    assert_eq!(values, expected);
}

#[test]
fn test_single_observation_passes_through() {
    let result = make_continuous(vec![raw("A", monday(4), 5.0)], FillMethod::Zero).unwrap();
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.injected_rows, 0);
    assert_eq!(result.records[0].shipments, Some(5.0));
}

#[test]
fn test_midweek_dates_snap_and_merge() {
    let rows = vec![
        raw("A", monday(0), 10.0),
        raw("A", monday(0), 10.0),
        raw("A", monday(0) + Duration::days(3), 5.0),
        raw("A", monday(2) + Duration::days(6), 1.0),
    ];
    let result = make_continuous(rows, FillMethod::Zero).unwrap();

    assert_eq!(result.duplicate_rows, 1);
    assert_eq!(result.merged_rows, 1);
    assert_eq!(result.injected_rows, 1);
    let values: Vec<Option<f64>> = result.records.iter().map(|r| r.shipments).collect();
    assert_eq!(values, vec![Some(15.0), Some(0.0), Some(1.0)]);
    assert_eq!(result.records[2].week, monday(2));
}

#[test]
fn test_series_are_reindexed_independently() {
    let mut rows = gappy_series();
    rows.push(raw("B", monday(10), 1.0));
    rows.push(raw("B", monday(12), 3.0));

    let result = make_continuous(rows, FillMethod::Ffill).unwrap();
    let b: Vec<_> = result
        .records
        .iter()
        .filter(|r| r.identity.prod_code == "B")
        .collect();

    assert_eq!(b.len(), 3);
    assert_eq!(b[0].week, monday(10));
    assert_eq!(result.injected_rows, 4);
}

#[test]
fn test_negative_demand_is_rejected() {
    let rows = vec![raw("A", monday(0), 1.0), raw("A", monday(1), -2.0)];
    let result = make_continuous(rows, FillMethod::None);
    assert!(matches!(result, Err(PrepError::DataShape(_))));
}

#[test]
fn test_conflicting_categories_are_rejected() {
    let mut second = raw("A", monday(1), 2.0);
    second.category = "DRINKS".to_string();
    let result = make_continuous(vec![raw("A", monday(0), 1.0), second], FillMethod::None);
    assert!(matches!(result, Err(PrepError::DataShape(_))));
}
