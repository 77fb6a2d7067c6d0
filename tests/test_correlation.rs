//! Unit tests for correlation analysis

use hirank::pipeline::{
    filter_correlated, find_correlated_pairs, find_correlated_pairs_auto,
    find_correlated_pairs_matrix, select_features_to_drop, CorrelatedPair,
};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn pair_names(pairs: &[CorrelatedPair]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|p| (p.feature1.clone(), p.feature2.clone()))
        .collect()
}

#[test]
fn test_find_perfectly_correlated_pair() {
    let df = create_correlation_test_dataframe();

    let pairs = find_correlated_pairs(&df, 0.9, Some("approved")).unwrap();

    let ab_pair = pairs
        .iter()
        .find(|p| p.feature1 == "a" && p.feature2 == "b")
        .expect("Should find correlation between a and b");
    assert!(
        (ab_pair.correlation - 1.0).abs() < 1e-9,
        "Correlation between a and b should be 1, got {}",
        ab_pair.correlation
    );
}

#[test]
fn test_negative_correlation_is_not_redundancy() {
    let df = create_correlation_test_dataframe();

    let pairs = find_correlated_pairs(&df, 0.9, Some("approved")).unwrap();

    // c = reversed a: correlation -1 stays below a positive threshold
    assert!(pairs.iter().all(|p| p.feature1 != "c" && p.feature2 != "c"));
    assert_eq!(pair_names(&pairs), vec![("a".to_string(), "b".to_string())]);
}

#[test]
fn test_constant_column_never_paired() {
    let df = create_correlation_test_dataframe();

    let pairs = find_correlated_pairs(&df, -2.0, None).unwrap();

    assert!(!pairs.is_empty());
    assert!(pairs.iter().all(|p| p.feature1 != "k" && p.feature2 != "k"));
}

#[test]
fn test_threshold_is_strict() {
    let df = create_near_duplicate_pair_dataframe();
    let expected = 31.0 / 33.0;

    let below = find_correlated_pairs(&df, 0.9, None).unwrap();
    assert_eq!(below.len(), 1);
    assert!((below[0].correlation - expected).abs() < 1e-9);

    let above = find_correlated_pairs(&df, 0.95, None).unwrap();
    assert!(above.is_empty());
}

#[test]
fn test_later_column_of_pair_is_dropped() {
    let df = create_near_duplicate_pair_dataframe();

    let (filtered, dropped) = filter_correlated(&df, 0.9, None).unwrap();

    assert_eq!(dropped, vec!["second".to_string()]);
    assert_has_columns(&filtered, &["first"]);
    assert_missing_columns(&filtered, &["second"]);
}

#[test]
fn test_filter_keeps_first_of_each_group() {
    let df = create_correlation_test_dataframe();

    let (filtered, dropped) = filter_correlated(&df, 0.9, Some("approved")).unwrap();

    assert_eq!(dropped, vec!["b".to_string()]);
    assert_has_columns(&filtered, &["approved", "a", "c", "d", "k"]);
    assert_eq!(filtered.width(), df.width() - 1);
}

#[test]
fn test_protected_column_is_never_dropped() {
    // `leak` duplicates the label exactly and precedes it
    let df = df! {
        "leak" => [0.0f64, 1.0, 0.0, 1.0, 1.0, 0.0],
        "approved" => [0i32, 1, 0, 1, 1, 0],
        "x" => [0.5f64, 0.1, 0.9, 0.3, 0.2, 0.8],
    }
    .unwrap();

    let (filtered, dropped) = filter_correlated(&df, 0.9, Some("approved")).unwrap();
    assert!(dropped.is_empty());
    assert_has_columns(&filtered, &["leak", "approved", "x"]);

    // without protection the label would go
    let (_, dropped) = filter_correlated(&df, 0.9, None).unwrap();
    assert_eq!(dropped, vec!["approved".to_string()]);
}

#[test]
fn test_transitive_chain_drops_every_later_column() {
    // b ~ a and c ~ b, so both b and c go even though b is dropped itself
    let df = df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        "b" => [1.1f64, 2.0, 3.2, 3.9, 5.1, 6.0, 7.2, 7.9],
        "c" => [1.2f64, 2.1, 3.1, 4.0, 5.2, 5.9, 7.1, 8.1],
    }
    .unwrap();

    let (filtered, dropped) = filter_correlated(&df, 0.9, None).unwrap();

    assert_eq!(dropped, vec!["b".to_string(), "c".to_string()]);
    assert_shape(&filtered, 8, 1);
}

#[test]
fn test_matrix_and_pairwise_agree() {
    let df = create_ordered_signal_dataframe(120, 7);
    let mut encoder = hirank::pipeline::FeatureEncoder::new();
    let encoded = encoder.preprocess(&df).unwrap();

    for threshold in [0.25, 0.5, 0.9] {
        let pairwise = find_correlated_pairs(&encoded, threshold, None).unwrap();
        let matrix = find_correlated_pairs_matrix(&encoded, threshold, None).unwrap();

        assert_eq!(pair_names(&pairwise), pair_names(&matrix));
        for (p, m) in pairwise.iter().zip(matrix.iter()) {
            assert!((p.correlation - m.correlation).abs() < 1e-9);
        }
    }
}

#[test]
fn test_auto_matches_pairwise_on_small_tables() {
    let df = create_correlation_test_dataframe();

    let auto = find_correlated_pairs_auto(&df, 0.5, None).unwrap();
    let pairwise = find_correlated_pairs(&df, 0.5, None).unwrap();

    assert_eq!(auto, pairwise);
}

#[test]
fn test_select_features_to_drop_dedups() {
    let pairs = vec![
        CorrelatedPair {
            feature1: "a".to_string(),
            feature2: "b".to_string(),
            correlation: 0.99,
        },
        CorrelatedPair {
            feature1: "a".to_string(),
            feature2: "c".to_string(),
            correlation: 0.97,
        },
        CorrelatedPair {
            feature1: "b".to_string(),
            feature2: "c".to_string(),
            correlation: 0.96,
        },
    ];

    assert_eq!(select_features_to_drop(&pairs), vec!["b", "c"]);
}

#[test]
fn test_single_column_has_no_pairs() {
    let df = df! { "a" => [1.0f64, 2.0, 3.0] }.unwrap();

    assert!(find_correlated_pairs(&df, 0.1, None).unwrap().is_empty());
    assert!(find_correlated_pairs_matrix(&df, 0.1, None).unwrap().is_empty());
}
