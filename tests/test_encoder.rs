//! Tests for match features and categorical encoding

use hirank::pipeline::encoder::*;
use hirank::pipeline::schema::*;
use hirank::pipeline::{EncodingScheme, EncodingTable, FeatureEncoder};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_match_features_on_candidate_records() {
    let df = create_candidate_dataframe();
    let out = add_match_features(&df).unwrap();

    assert_eq!(f64_values(&out, MATCH_EDUCATION_LEVEL), vec![1.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    assert_eq!(f64_values(&out, MATCH_ENGLISH_LEVEL), vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    assert_eq!(f64_values(&out, MATCH_PCD), vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    assert_eq!(f64_values(&out, MOBILE_REGION_MATCH), vec![1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    // no spanish columns in the fixture
    assert_eq!(f64_values(&out, MATCH_SPANISH_LEVEL), vec![0.0; 6]);
}

#[test]
fn test_match_is_symmetric() {
    let pairs = [
        (Some("Avançado"), Some(" avançado ")),
        (Some("Fluente"), Some("Básico")),
        (None, Some("Básico")),
    ];
    for (a, b) in pairs {
        assert_eq!(match_exact(a, b), match_exact(b, a));
    }
    assert_eq!(match_exact(Some("Avançado"), Some(" avançado ")), 1);
    assert_eq!(match_exact(None, Some("Básico")), 0);
}

#[test]
fn test_region_match_only_for_sao_paulo_codes() {
    assert_eq!(mobile_region_match(Some("São Paulo"), Some("11")), 1);
    assert_eq!(mobile_region_match(Some("Rio de Janeiro"), Some("11")), 0);
    for ddd in 11..=19 {
        assert_eq!(mobile_region_match(Some("são paulo"), Some(ddd.to_string().as_str())), 1);
    }
    assert_eq!(mobile_region_match(Some("São Paulo"), Some("20")), 0);
}

#[test]
fn test_preprocess_drops_date_and_area_code() {
    let df = create_candidate_dataframe();
    let mut encoder = FeatureEncoder::new();

    let out = encoder.preprocess(&df).unwrap();

    assert_missing_columns(&out, &[PROSPECT_APPLICATION_DATE, CANDIDATE_DDD_MOBILE]);
    assert_has_columns(
        &out,
        &[MATCH_EDUCATION_LEVEL, MOBILE_REGION_MATCH, CANDIDATE_CERTIFICATIONS],
    );
    assert_eq!(out.height(), 6);
    for col in out.get_columns() {
        assert_eq!(col.dtype(), &DataType::Float64, "column {} not numeric", col.name());
        assert_eq!(col.null_count(), 0, "column {} has nulls", col.name());
    }
}

#[test]
fn test_two_value_columns_keep_their_place() {
    let df = create_candidate_dataframe();
    let mut encoder = FeatureEncoder::new();

    let out = encoder.preprocess(&df).unwrap();

    // CLT < PJ in sorted order
    assert_eq!(
        f64_values(&out, VACANCY_CONTRACT_TYPE),
        vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0]
    );
    // "0" < "1"; the missing flag becomes the unknown code
    assert_eq!(
        f64_values(&out, CANDIDATE_PCD),
        vec![1.0, 0.0, 0.0, UNKNOWN_LABEL_CODE as f64, 1.0, 0.0]
    );
    assert_eq!(out.get_column_names()[0].as_str(), VACANCY_CONTRACT_TYPE);
}

#[test]
fn test_many_value_columns_are_expanded_at_the_end() {
    let df = create_candidate_dataframe();
    let mut encoder = FeatureEncoder::new();

    let out = encoder.preprocess(&df).unwrap();

    assert_missing_columns(&out, &[VACANCY_ENGLISH_LEVEL]);
    let english: Vec<String> = out
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .filter(|c| c.starts_with("vacancy_english_level_"))
        .collect();
    assert_eq!(
        english,
        vec![
            "vacancy_english_level_Avançado",
            "vacancy_english_level_Básico",
            "vacancy_english_level_Fluente",
            "vacancy_english_level_Intermediário",
            "vacancy_english_level_Nenhum",
        ]
    );
    assert_eq!(
        f64_values(&out, "vacancy_english_level_Básico"),
        vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0]
    );

    let last = out.get_column_names().last().unwrap().to_string();
    assert!(last.contains('_'));
    assert!(lookup(&last).is_none());
}

#[test]
fn test_column_count_follows_encoding_policy() {
    let df = df! {
        VACANCY_SAP => ["Sim", "Não", "Sim", "Não"],
        VACANCY_PROFESSIONAL_LEVEL => ["Pleno", "Senior", "Junior", "Estágio"],
    }
    .unwrap();

    let table = EncodingTable::fit(&df, [VACANCY_SAP, VACANCY_PROFESSIONAL_LEVEL], 1).unwrap();
    let out = table.transform(&df).unwrap();

    // 2 distinct -> unchanged, 4 distinct -> +4 -1
    assert_shape(&out, 4, 1 + 4);
    assert!(matches!(table.get(VACANCY_SAP), Some(EncodingScheme::Label { .. })));
    assert!(matches!(
        table.get(VACANCY_PROFESSIONAL_LEVEL),
        Some(EncodingScheme::OneHot { .. })
    ));
}

#[test]
fn test_encode_reuses_fitted_table() {
    let reference = create_candidate_dataframe();
    let mut encoder = FeatureEncoder::new();
    let fitted = encoder.preprocess(&reference).unwrap();
    let generation = encoder.table().unwrap().generation;

    let batch = df! {
        VACANCY_CONTRACT_TYPE => ["PJ", "Cooperado"],
        VACANCY_ENGLISH_LEVEL => ["Nativo", "Fluente"],
    }
    .unwrap();
    let out = encoder.encode(&batch).unwrap();

    assert_eq!(encoder.table().unwrap().generation, generation);
    assert_eq!(f64_values(&out, VACANCY_CONTRACT_TYPE), vec![1.0, -1.0]);
    assert_eq!(f64_values(&out, "vacancy_english_level_Fluente"), vec![0.0, 1.0]);
    assert_eq!(f64_values(&out, "vacancy_english_level_Avançado"), vec![0.0, 0.0]);
    // fitted columns the batch lacks still produce their outputs
    assert_has_columns(&out, &["candidate_english_level_Nenhum", CANDIDATE_PCD]);
    assert_eq!(f64_values(&out, CANDIDATE_PCD), vec![-1.0, -1.0]);
    // everything but certifications, which is not encoded
    assert_eq!(out.width(), fitted.width() - 1);
}

#[test]
fn test_refit_starts_new_generation() {
    let df = create_candidate_dataframe();
    let mut encoder = FeatureEncoder::new();

    encoder.preprocess(&df).unwrap();
    let first = encoder.table().unwrap().clone();
    encoder.preprocess(&df.head(Some(2))).unwrap();
    let second = encoder.table().unwrap();

    assert_eq!(first.generation + 1, second.generation);
    // the first table is untouched by the re-fit
    assert!(matches!(
        first.get(VACANCY_ENGLISH_LEVEL),
        Some(EncodingScheme::OneHot { categories }) if categories.len() == 5
    ));
    assert!(matches!(
        second.get(VACANCY_ENGLISH_LEVEL),
        Some(EncodingScheme::Label { .. })
    ));
}

#[test]
fn test_missing_categorical_columns_are_skipped() {
    let df = df! { VACANCY_SAP => ["Sim", "Não"] }.unwrap();
    let mut encoder = FeatureEncoder::new();

    let out = encoder.preprocess(&df).unwrap();

    let table = encoder.table().unwrap();
    assert!(table.skipped.contains(&VACANCY_REGION.to_string()));
    assert_eq!(table.columns.len(), 1);
    assert_has_columns(&out, &[VACANCY_SAP, MATCH_PCD]);
}

#[test]
fn test_encoding_table_serializes() {
    let df = create_candidate_dataframe();
    let table = EncodingTable::fit(&df, columns_of_kind(ColumnKind::Categorical), 3).unwrap();

    let json = serde_json::to_string(&table).unwrap();
    let back: EncodingTable = serde_json::from_str(&json).unwrap();

    assert_eq!(back, table);
    assert!(json.contains("\"scheme\":\"one_hot\""));
}
