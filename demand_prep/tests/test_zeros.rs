mod common;

use common::record;
use demand_prep::zeros::remove_zero_runs;
use pretty_assertions::assert_eq;

fn table() -> Vec<demand_prep::ShipmentRecord> {
    let mut rows = Vec::new();
    // A: two zeros, B: three zeros, C: no zeros but a gap
    for (week, v) in [5.0, 0.0, 3.0, 0.0].iter().enumerate() {
        rows.push(record("A", week as i64, Some(*v)));
    }
    for (week, v) in [0.0, 0.0, 0.0, 1.0].iter().enumerate() {
        rows.push(record("B", week as i64, Some(*v)));
    }
    rows.push(record("C", 0, Some(4.0)));
    rows.push(record("C", 1, None));
    rows.push(record("C", 2, Some(4.0)));
    rows
}

#[test]
fn test_threshold_is_inclusive() {
    let result = remove_zero_runs(table(), 3);

    assert_eq!(result.dropped, vec!["B#Mercadona#Vitoria".to_string()]);
    assert!(result.records.iter().all(|r| r.identity.prod_code != "B"));
    assert_eq!(result.records.len(), 7);
}

#[test]
fn test_whole_series_are_dropped() {
    let result = remove_zero_runs(table(), 2);

    assert_eq!(result.dropped.len(), 2);
    assert_eq!(result.records.len(), 3);
    assert!(result.records.iter().all(|r| r.identity.prod_code == "C"));
}

#[test]
fn test_missing_values_are_not_zeros() {
    let result = remove_zero_runs(table(), 1);
    assert_eq!(result.dropped.len(), 2);
    assert_eq!(result.records.len(), 3);
}

#[test]
fn test_non_positive_threshold_drops_everything() {
    for n_zeros in [0, -5] {
        let result = remove_zero_runs(table(), n_zeros);
        assert!(result.records.is_empty());
        assert_eq!(result.dropped.len(), 3);
    }
}

#[test]
fn test_filter_is_idempotent() {
    let once = remove_zero_runs(table(), 3);
    let twice = remove_zero_runs(once.records.clone(), 3);

    assert_eq!(twice.records, once.records);
    assert!(twice.dropped.is_empty());
}
