//! Shared test utilities and fixture generators

#![allow(dead_code)]

use hirank::pipeline::models::{BoostingParams, ForestParams, LogisticParams};
use hirank::pipeline::schema::*;
use hirank::pipeline::{ClassWeight, ModelSpec, ModelVariant};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

/// Six raw candidate records covering the matching heuristics
///
/// - row 0: São Paulo vacancy, candidate from area code 11, every level matches
/// - row 1: Rio vacancy with area code 11, nothing matches
/// - row 3: missing values on both sides
pub fn create_candidate_dataframe() -> DataFrame {
    df! {
        VACANCY_CONTRACT_TYPE => ["CLT", "PJ", "CLT", "CLT", "PJ", "CLT"],
        VACANCY_REGION => [Some("São Paulo"), Some("Rio de Janeiro"), Some(" são paulo "), None, Some("Minas Gerais"), Some("São Paulo")],
        VACANCY_PCD => [Some("Sim"), Some("Não"), Some("Sim"), None, Some("Sim"), Some("Não")],
        VACANCY_EDUCATION_LEVEL => [Some("Mestrado"), Some("Doutorado"), Some("Mestrado"), None, Some("Mestrado"), Some("Mestrado")],
        VACANCY_ENGLISH_LEVEL => [Some("Avançado"), Some("Fluente"), Some("Básico"), None, Some("Nenhum"), Some("Intermediário")],
        PROSPECT_CANDIDATE_STATUS => ["Aprovado", "Rejeitado", "Em processo seletivo", "Aprovado", "Rejeitado", "Aprovado"],
        PROSPECT_APPLICATION_DATE => ["2021-01-04", "2021-02-11", "2022-07-30", "2023-03-15", "2022-01-01", "2021-09-09"],
        CANDIDATE_DDD_MOBILE => [Some(11i64), Some(11), Some(19), None, Some(31), Some(21)],
        CANDIDATE_PCD => [Some(1i64), Some(0), Some(0), None, Some(1), Some(0)],
        CANDIDATE_CERTIFICATIONS => [Some(2i64), Some(0), None, Some(1), Some(1), Some(0)],
        CANDIDATE_ACADEMIC_LEVEL => [Some("mestrado"), Some("Mestrado"), Some("Mestrado "), None, Some("Ensino Médio"), Some("Mestrado")],
        CANDIDATE_ENGLISH_LEVEL => [Some(" AVANÇADO"), Some("Básico"), Some("Básico"), None, Some("Nenhum"), Some("Avançado")],
    }
    .unwrap()
}

/// Columns with known correlation patterns
///
/// - `b`: exactly 2·a (correlation 1)
/// - `c`: reversed a (correlation -1)
/// - `d`: shuffled, weakly related to a
/// - `k`: constant
pub fn create_correlation_test_dataframe() -> DataFrame {
    df! {
        "approved" => [0i32, 1, 0, 1, 0, 1, 0, 1, 0, 1],
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0],
        "c" => [10.0f64, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        "d" => [5.0f64, 1.0, 8.0, 2.0, 9.0, 3.0, 7.0, 4.0, 6.0, 0.0],
        "k" => [3.0f64; 10],
    }
    .unwrap()
}

/// Pair of columns with Pearson correlation 31/33 (about 0.94)
pub fn create_near_duplicate_pair_dataframe() -> DataFrame {
    df! {
        "first" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "second" => [2.0f64, 1.0, 4.0, 3.0, 6.0, 5.0, 8.0, 7.0, 10.0, 9.0],
    }
    .unwrap()
}

/// Candidate table where row order carries the label signal.
///
/// `next_outcome` on row r equals the approval of row r+1, so the last row of
/// every window predicts the window's label exactly. The label itself comes
/// from the status column (about 30% "Aprovado"); the remaining columns are noise.
pub fn create_ordered_signal_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let approved: Vec<bool> = (0..rows).map(|_| rng.gen_bool(0.3)).collect();

    let status: Vec<&str> = approved
        .iter()
        .map(|&a| {
            if a {
                "Aprovado"
            } else {
                *["Rejeitado", "Em processo seletivo"]
                    .choose(&mut rng)
                    .unwrap()
            }
        })
        .collect();
    let next_outcome: Vec<f64> = (0..rows)
        .map(|r| approved.get(r + 1).map_or(0.0, |&a| a as i32 as f64))
        .collect();
    let regions = ["São Paulo", "Pernambuco", "Rio de Janeiro", "Minas Gerais"];
    let levels = ["Fluente", "Avançado", "Intermediário", "Básico", "Nenhum"];
    let region: Vec<&str> = (0..rows).map(|_| *regions.choose(&mut rng).unwrap()).collect();
    let vacancy_english: Vec<&str> = (0..rows).map(|_| *levels.choose(&mut rng).unwrap()).collect();
    let candidate_english: Vec<&str> = (0..rows).map(|_| *levels.choose(&mut rng).unwrap()).collect();
    let ddd: Vec<i64> = (0..rows).map(|_| *[11i64, 21, 31].choose(&mut rng).unwrap()).collect();
    let noise: Vec<f64> = (0..rows).map(|_| rng.gen_range(0.0..1.0)).collect();

    df! {
        VACANCY_REGION => region,
        VACANCY_ENGLISH_LEVEL => vacancy_english,
        PROSPECT_CANDIDATE_STATUS => status,
        CANDIDATE_DDD_MOBILE => ddd,
        CANDIDATE_ENGLISH_LEVEL => candidate_english,
        "next_outcome" => next_outcome,
        "noise" => noise,
    }
    .unwrap()
}

/// Default variants with fewer trees, rounds and iterations, for fast tests
pub fn light_variants() -> Vec<ModelVariant> {
    vec![
        ModelVariant::new(
            "RandomForest",
            ClassWeight::Balanced,
            ModelSpec::RandomForest(ForestParams {
                n_trees: 25,
                max_depth: Some(8),
                ..ForestParams::default()
            }),
        ),
        ModelVariant::new(
            "XGBoost",
            ClassWeight::ScalePositive,
            ModelSpec::GradientBoosting(BoostingParams {
                n_rounds: 40,
                learning_rate: 0.3,
                max_depth: 3,
                ..BoostingParams::default()
            }),
        ),
        ModelVariant::new(
            "LogisticRegression",
            ClassWeight::Balanced,
            ModelSpec::LogisticRegression(LogisticParams {
                max_iter: 300,
                ..LogisticParams::default()
            }),
        ),
    ]
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}

/// Float values of a column, nulls as NaN
pub fn f64_values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}
