use approx::assert_abs_diff_eq;
use demand_math::{accuracy, accuracy_from_pairs, MathError};
use rstest::rstest;

#[rstest]
#[case(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0], 1.0)]
#[case(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], 0.0)]
#[case(&[10.0, 10.0], &[10.0, 10.0], 1.0)]
#[case(&[10.0, 10.0], &[20.0, 20.0], 0.0)]
#[case(&[10.0, 10.0], &[30.0, 30.0], 0.0)]
#[case(&[10.0, 20.0, 30.0, 40.0], &[12.0, 18.0, 33.0, 37.0], 0.9)]
fn test_accuracy_branches(#[case] actual: &[f64], #[case] predicted: &[f64], #[case] expected: f64) {
    let score = accuracy(actual, predicted).unwrap();
    assert_abs_diff_eq!(score, expected, epsilon = 1e-12);
}

#[test]
fn test_accuracy_stays_in_unit_interval() {
    let actual = [5.0, 0.0, 3.0, 8.0, 1.0];
    for shift in [-10.0, -1.0, 0.0, 0.5, 2.0, 100.0] {
        let predicted: Vec<f64> = actual.iter().map(|a| a + shift).collect();
        let score = accuracy(&actual, &predicted).unwrap();
        assert!((0.0..=1.0).contains(&score), "score {} for shift {}", score, shift);
    }
}

#[test]
fn test_accuracy_rejects_mismatched_lengths() {
    let result = accuracy(&[1.0, 2.0], &[1.0]);
    assert!(matches!(result, Err(MathError::InvalidInput(_))));
}

#[test]
fn test_accuracy_from_pairs_skips_incomplete_rows() {
    let pairs = vec![
        (Some(10.0), None),
        (Some(10.0), Some(12.0)),
        (None, Some(3.0)),
        (Some(10.0), Some(8.0)),
    ];

    let score = accuracy_from_pairs(pairs).unwrap().unwrap();
    assert_abs_diff_eq!(score, 0.8, epsilon = 1e-12);
}

#[test]
fn test_accuracy_from_pairs_without_complete_pairs() {
    let pairs = vec![(Some(1.0), None), (None, Some(1.0))];
    assert_eq!(accuracy_from_pairs(pairs).unwrap(), None);
}
