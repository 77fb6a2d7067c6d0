//! Column registry for vacancy/candidate application tables
//!
//! Every column the pipeline knows about is declared here once, with its
//! kind and what happens when it is absent. Stages look columns up in this
//! registry instead of probing the data frame ad hoc.

use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

pub const VACANCY_CONTRACT_TYPE: &str = "vacancy_contract_type";
pub const VACANCY_SAP: &str = "vacancy_sap";
pub const VACANCY_REGION: &str = "vacancy_region";
pub const VACANCY_PCD: &str = "vacancy_pcd";
pub const VACANCY_PROFESSIONAL_LEVEL: &str = "vacancy_professional_level";
pub const VACANCY_EDUCATION_LEVEL: &str = "vacancy_education_level";
pub const VACANCY_ENGLISH_LEVEL: &str = "vacancy_english_level";
pub const VACANCY_SPANISH_LEVEL: &str = "vacancy_spanish_level";
pub const PROSPECT_CANDIDATE_STATUS: &str = "prospect_candidate_status";
pub const PROSPECT_APPLICATION_DATE: &str = "prospect_application_date";
pub const CANDIDATE_DDD_MOBILE: &str = "candidate_ddd_mobile";
pub const CANDIDATE_PCD: &str = "candidate_pcd";
pub const CANDIDATE_CERTIFICATIONS: &str = "candidate_certifications";
pub const CANDIDATE_ACADEMIC_LEVEL: &str = "candidate_academic_level";
pub const CANDIDATE_ENGLISH_LEVEL: &str = "candidate_english_level";
pub const CANDIDATE_SPANISH_LEVEL: &str = "candidate_spanish_level";

/// How a registered column is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    /// Label- or one-hot-encoded depending on cardinality
    Categorical,
    /// Used as a numeric feature as-is
    Numeric,
    /// Dropped before encoding
    Date,
    /// Feeds the region heuristic, then dropped
    AreaCode,
    /// Source of the approval label, never a feature
    Status,
}

/// What the pipeline does when a registered column is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissingPolicy {
    /// Log a warning and leave the column out of encoding
    SkipWithWarning,
    /// Derived features that read it evaluate to 0
    FillZero,
    /// Nothing depends on it
    Ignore,
}

/// A registered input column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub missing: MissingPolicy,
}

const fn spec(name: &'static str, kind: ColumnKind, missing: MissingPolicy) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        missing,
    }
}

/// Expected input columns, in canonical order.
pub const CANDIDATE_SCHEMA: &[ColumnSpec] = &[
    spec(VACANCY_CONTRACT_TYPE, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(VACANCY_SAP, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(VACANCY_REGION, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(VACANCY_PCD, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(VACANCY_PROFESSIONAL_LEVEL, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(VACANCY_EDUCATION_LEVEL, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(VACANCY_ENGLISH_LEVEL, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(VACANCY_SPANISH_LEVEL, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(PROSPECT_CANDIDATE_STATUS, ColumnKind::Status, MissingPolicy::Ignore),
    spec(PROSPECT_APPLICATION_DATE, ColumnKind::Date, MissingPolicy::Ignore),
    spec(CANDIDATE_DDD_MOBILE, ColumnKind::AreaCode, MissingPolicy::FillZero),
    spec(CANDIDATE_PCD, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(CANDIDATE_CERTIFICATIONS, ColumnKind::Numeric, MissingPolicy::Ignore),
    spec(CANDIDATE_ACADEMIC_LEVEL, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(CANDIDATE_ENGLISH_LEVEL, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
    spec(CANDIDATE_SPANISH_LEVEL, ColumnKind::Categorical, MissingPolicy::SkipWithWarning),
];

/// Look up a column in the registry
pub fn lookup(name: &str) -> Option<&'static ColumnSpec> {
    CANDIDATE_SCHEMA.iter().find(|spec| spec.name == name)
}

/// Names of registered columns of the given kind, in registry order
pub fn columns_of_kind(kind: ColumnKind) -> impl Iterator<Item = &'static str> {
    CANDIDATE_SCHEMA
        .iter()
        .filter(move |spec| spec.kind == kind)
        .map(|spec| spec.name)
}

/// Whether a data frame has a column with this name
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// A registered column that the input table does not provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub policy: MissingPolicy,
}

/// Result of checking an input table against the registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    /// Registered columns found in the input
    pub present: Vec<String>,
    /// Registered columns absent from the input
    pub missing: Vec<MissingColumn>,
    /// Input columns the registry does not know about
    pub unexpected: Vec<String>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Whether a registered column is absent
    pub fn is_missing(&self, name: &str) -> bool {
        self.missing.iter().any(|m| m.name == name)
    }

    /// Emit one log line per finding
    pub fn log(&self) {
        info!(
            present = self.present.len(),
            missing = self.missing.len(),
            unexpected = self.unexpected.len(),
            "schema validated"
        );
        for column in &self.missing {
            match column.policy {
                MissingPolicy::SkipWithWarning => warn!(
                    column = %column.name,
                    "expected categorical column not found, it will be skipped"
                ),
                MissingPolicy::FillZero => warn!(
                    column = %column.name,
                    "column not found, features derived from it will be 0"
                ),
                MissingPolicy::Ignore => info!(column = %column.name, "optional column not found"),
            }
        }
        for column in &self.unexpected {
            info!(column = %column, "column is not part of the candidate schema");
        }
    }
}

/// Check which registered columns a table provides
pub fn validate_schema(df: &DataFrame) -> SchemaReport {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();

    let mut report = SchemaReport::default();
    for spec in CANDIDATE_SCHEMA {
        if columns.iter().any(|c| c == spec.name) {
            report.present.push(spec.name.to_string());
        } else {
            report.missing.push(MissingColumn {
                name: spec.name.to_string(),
                kind: spec.kind,
                policy: spec.missing,
            });
        }
    }
    report.unexpected = columns
        .into_iter()
        .filter(|c| lookup(c).is_none())
        .collect();

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_every_input_column_once() {
        assert_eq!(CANDIDATE_SCHEMA.len(), 16);
        for spec in CANDIDATE_SCHEMA {
            let count = CANDIDATE_SCHEMA.iter().filter(|s| s.name == spec.name).count();
            assert_eq!(count, 1, "column '{}' registered more than once", spec.name);
        }
    }

    #[test]
    fn test_status_is_not_categorical() {
        let categorical: Vec<&str> = columns_of_kind(ColumnKind::Categorical).collect();
        assert_eq!(categorical.len(), 12);
        assert!(!categorical.contains(&PROSPECT_CANDIDATE_STATUS));
        assert_eq!(categorical[0], VACANCY_CONTRACT_TYPE);
    }

    #[test]
    fn test_validate_schema_reports_missing_and_unexpected() {
        let df = df! {
            VACANCY_REGION => ["São Paulo", "Minas Gerais"],
            CANDIDATE_DDD_MOBILE => [11i32, 31],
            "candidate_id" => ["a", "b"],
        }
        .unwrap();

        let report = validate_schema(&df);

        assert_eq!(report.present, vec![VACANCY_REGION, CANDIDATE_DDD_MOBILE]);
        assert_eq!(report.missing.len(), 14);
        assert!(report.is_missing(VACANCY_SAP));
        assert!(!report.is_missing(VACANCY_REGION));
        assert_eq!(report.unexpected, vec!["candidate_id".to_string()]);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(CANDIDATE_DDD_MOBILE).unwrap().kind, ColumnKind::AreaCode);
        assert!(lookup("nope").is_none());
    }
}
