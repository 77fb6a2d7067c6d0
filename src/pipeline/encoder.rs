//! Feature encoding: match features, column dropping and categorical encoding
//!
//! Raw vacancy/candidate attributes are turned into numeric columns in three
//! steps: derived match features are appended, columns that cannot be used
//! directly are dropped, and categorical columns are encoded through an
//! [`EncodingTable`] fitted once on a reference batch.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{FrameContext, PipelineError, PipelineResult};
use super::schema::{
    columns_of_kind, has_column, lookup, ColumnKind, CANDIDATE_ACADEMIC_LEVEL,
    CANDIDATE_DDD_MOBILE, CANDIDATE_ENGLISH_LEVEL, CANDIDATE_PCD, CANDIDATE_SPANISH_LEVEL,
    VACANCY_EDUCATION_LEVEL, VACANCY_ENGLISH_LEVEL, VACANCY_PCD, VACANCY_REGION,
    VACANCY_SPANISH_LEVEL,
};

pub const MATCH_EDUCATION_LEVEL: &str = "match_education_level";
pub const MATCH_ENGLISH_LEVEL: &str = "match_english_level";
pub const MATCH_SPANISH_LEVEL: &str = "match_spanish_level";
pub const MATCH_PCD: &str = "match_pcd";
pub const MOBILE_REGION_MATCH: &str = "mobile_region_match";

/// Mobile area codes of the São Paulo state
pub const SAO_PAULO_AREA_CODES: RangeInclusive<i64> = 11..=19;

/// Vacancy region (lowercase) the area-code heuristic applies to
pub const SAO_PAULO_REGION: &str = "são paulo";

/// Values (lowercase) that mark a PCD flag as set
const AFFIRMATIVE_VALUES: &[&str] = &["sim", "1"];

/// Code assigned to missing or unseen values in label-encoded columns
pub const UNKNOWN_LABEL_CODE: i32 = -1;

/// Case-insensitive, whitespace-trimmed equality. Missing on either side is no match.
pub fn match_exact(a: Option<&str>, b: Option<&str>) -> i32 {
    match (a, b) {
        (Some(a), Some(b)) => (normalize(a) == normalize(b)) as i32,
        _ => 0,
    }
}

/// 1 only when both PCD flags are set, not merely equal
pub fn match_pcd(vacancy: Option<&str>, candidate: Option<&str>) -> i32 {
    (is_affirmative(vacancy) && is_affirmative(candidate)) as i32
}

/// 1 when the vacancy is in São Paulo and the candidate's mobile area code is a São Paulo one
pub fn mobile_region_match(region: Option<&str>, area_code: Option<&str>) -> i32 {
    let in_sao_paulo = region.is_some_and(|r| normalize(r) == SAO_PAULO_REGION);
    let local_code = area_code
        .and_then(parse_area_code)
        .is_some_and(|ddd| SAO_PAULO_AREA_CODES.contains(&ddd));
    (in_sao_paulo && local_code) as i32
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn is_affirmative(value: Option<&str>) -> bool {
    value.is_some_and(|v| AFFIRMATIVE_VALUES.contains(&normalize(v).as_str()))
}

/// Area codes arrive as integers, floats ("11.0") or strings
fn parse_area_code(value: &str) -> Option<i64> {
    let parsed: f64 = value.trim().parse().ok()?;
    (parsed.fract() == 0.0).then_some(parsed as i64)
}

/// Render any column as optional strings, nulls and NaNs as `None`
pub fn column_as_strings(col: &Column) -> PolarsResult<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.filter(|n| !n.is_nan()).map(format_float))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}

/// Whole floats print without a fractional part so "11.0" and "11" agree
fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn strings_or_missing(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    if has_column(df, name) {
        column_as_strings(df.column(name)?)
    } else {
        Ok(vec![None; df.height()])
    }
}

/// Append the five derived match features
pub fn add_match_features(df: &DataFrame) -> PipelineResult<DataFrame> {
    let pairs = [
        (MATCH_EDUCATION_LEVEL, VACANCY_EDUCATION_LEVEL, CANDIDATE_ACADEMIC_LEVEL),
        (MATCH_ENGLISH_LEVEL, VACANCY_ENGLISH_LEVEL, CANDIDATE_ENGLISH_LEVEL),
        (MATCH_SPANISH_LEVEL, VACANCY_SPANISH_LEVEL, CANDIDATE_SPANISH_LEVEL),
    ];

    let mut out = df.clone();
    for (feature, vacancy_col, candidate_col) in pairs {
        let vacancy = strings_or_missing(df, vacancy_col).in_stage("encode")?;
        let candidate = strings_or_missing(df, candidate_col).in_stage("encode")?;
        let values: Vec<i32> = vacancy
            .iter()
            .zip(candidate.iter())
            .map(|(a, b)| match_exact(a.as_deref(), b.as_deref()))
            .collect();
        out.with_column(Column::new(feature.into(), values))
            .in_stage("encode")?;
    }

    let vacancy_pcd = strings_or_missing(df, VACANCY_PCD).in_stage("encode")?;
    let candidate_pcd = strings_or_missing(df, CANDIDATE_PCD).in_stage("encode")?;
    let pcd: Vec<i32> = vacancy_pcd
        .iter()
        .zip(candidate_pcd.iter())
        .map(|(a, b)| match_pcd(a.as_deref(), b.as_deref()))
        .collect();
    out.with_column(Column::new(MATCH_PCD.into(), pcd))
        .in_stage("encode")?;

    let region = strings_or_missing(df, VACANCY_REGION).in_stage("encode")?;
    let area_code = strings_or_missing(df, CANDIDATE_DDD_MOBILE).in_stage("encode")?;
    let region_match: Vec<i32> = region
        .iter()
        .zip(area_code.iter())
        .map(|(r, d)| mobile_region_match(r.as_deref(), d.as_deref()))
        .collect();
    out.with_column(Column::new(MOBILE_REGION_MATCH.into(), region_match))
        .in_stage("encode")?;

    debug!(rows = df.height(), "derived match features");
    Ok(out)
}

/// Drop the application date and raw area code columns (ignored when absent)
pub fn drop_unusable_columns(df: &DataFrame) -> DataFrame {
    let to_drop: Vec<&str> = columns_of_kind(ColumnKind::Date)
        .chain(columns_of_kind(ColumnKind::AreaCode))
        .filter(|name| has_column(df, name))
        .collect();
    df.drop_many(to_drop)
}

/// Encoding chosen for one categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum EncodingScheme {
    /// At most two distinct values: category -> integer code
    Label { codes: BTreeMap<String, i32> },
    /// More than two distinct values: one indicator column per category
    OneHot { categories: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEncoding {
    pub column: String,
    pub scheme: EncodingScheme,
}

impl ColumnEncoding {
    /// Output column names this encoding produces
    pub fn output_columns(&self) -> Vec<String> {
        match &self.scheme {
            EncodingScheme::Label { .. } => vec![self.column.clone()],
            EncodingScheme::OneHot { categories } => categories
                .iter()
                .map(|c| indicator_name(&self.column, c))
                .collect(),
        }
    }
}

fn indicator_name(column: &str, category: &str) -> String {
    format!("{}_{}", column, category)
}

/// Per-column encodings fitted once on a reference batch.
///
/// Immutable after `fit`; every later batch goes through `transform` so the
/// scheme of a column is never re-decided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingTable {
    /// Incremented each time an encoder fits a new table
    pub generation: u64,
    pub columns: Vec<ColumnEncoding>,
    /// Requested columns the reference batch did not have
    pub skipped: Vec<String>,
}

impl EncodingTable {
    /// Decide label vs one-hot encoding for each column from its distinct non-null values
    pub fn fit<'a>(
        df: &DataFrame,
        columns: impl IntoIterator<Item = &'a str>,
        generation: u64,
    ) -> PipelineResult<Self> {
        let mut table = EncodingTable {
            generation,
            ..Default::default()
        };

        for name in columns {
            if !has_column(df, name) {
                warn!(column = name, "categorical column not found, skipping");
                table.skipped.push(name.to_string());
                continue;
            }

            let values = df
                .column(name)
                .and_then(column_as_strings)
                .in_stage("encode")?;
            let distinct: BTreeSet<String> = values.into_iter().flatten().collect();

            let scheme = if distinct.len() > 2 {
                EncodingScheme::OneHot {
                    categories: distinct.into_iter().collect(),
                }
            } else {
                EncodingScheme::Label {
                    codes: distinct
                        .into_iter()
                        .enumerate()
                        .map(|(code, category)| (category, code as i32))
                        .collect(),
                }
            };
            debug!(column = name, ?scheme, "fitted column encoding");
            table.columns.push(ColumnEncoding {
                column: name.to_string(),
                scheme,
            });
        }

        Ok(table)
    }

    pub fn get(&self, column: &str) -> Option<&EncodingScheme> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.scheme)
    }

    /// Apply the fitted encodings.
    ///
    /// Label-encoded columns are replaced in place; missing or unseen values
    /// get [`UNKNOWN_LABEL_CODE`]. One-hot columns are removed and their
    /// indicators appended at the end of the table in sorted category order;
    /// missing or unseen values produce all-zero indicators. A fitted column
    /// absent from `df` still yields its output columns.
    pub fn transform(&self, df: &DataFrame) -> PipelineResult<DataFrame> {
        let mut out = df.clone();
        let mut indicators: Vec<Column> = Vec::new();
        let mut expanded: Vec<&str> = Vec::new();

        for encoding in &self.columns {
            let values = if has_column(df, &encoding.column) {
                df.column(&encoding.column)
                    .and_then(column_as_strings)
                    .in_stage("encode")?
            } else {
                warn!(
                    column = %encoding.column,
                    "encoded column missing from batch, treating every value as unseen"
                );
                vec![None; df.height()]
            };

            match &encoding.scheme {
                EncodingScheme::Label { codes } => {
                    let encoded: Vec<i32> = values
                        .iter()
                        .map(|v| {
                            v.as_deref()
                                .and_then(|s| codes.get(s).copied())
                                .unwrap_or(UNKNOWN_LABEL_CODE)
                        })
                        .collect();
                    out.with_column(Column::new(encoding.column.as_str().into(), encoded))
                        .in_stage("encode")?;
                }
                EncodingScheme::OneHot { categories } => {
                    for category in categories {
                        let indicator: Vec<i32> = values
                            .iter()
                            .map(|v| (v.as_deref() == Some(category.as_str())) as i32)
                            .collect();
                        indicators.push(Column::new(
                            indicator_name(&encoding.column, category).into(),
                            indicator,
                        ));
                    }
                    if has_column(df, &encoding.column) {
                        expanded.push(encoding.column.as_str());
                    }
                }
            }
        }

        let mut out = out.drop_many(expanded);
        for indicator in indicators {
            out.with_column(indicator).in_stage("encode")?;
        }

        Ok(out)
    }
}

/// Cast every column to Float64 with no nulls left.
///
/// String columns are only kept when the registry declares them numeric
/// (unparseable values become 0); other text columns are dropped.
pub fn finalize_numeric(df: &DataFrame) -> PipelineResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());

    for col in df.get_columns() {
        let name = col.name().as_str();
        let numeric = col.dtype().is_primitive_numeric() || matches!(col.dtype(), DataType::Boolean);
        let declared_numeric = lookup(name).is_some_and(|spec| spec.kind == ColumnKind::Numeric);

        if !numeric && !declared_numeric {
            warn!(column = name, dtype = %col.dtype(), "non-numeric column left after encoding, dropping");
            continue;
        }

        let cast = col.cast(&DataType::Float64).map_err(|e| PipelineError::Encoding {
            column: name.to_string(),
            message: format!("cannot cast to Float64: {}", e),
        })?;
        let filled: Vec<f64> = cast
            .f64()
            .in_stage("encode")?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
            .collect();
        columns.push(Column::new(col.name().clone(), filled));
    }

    DataFrame::new(columns).in_stage("encode")
}

/// Turns raw application records into numeric feature columns.
///
/// Holds the encoding table of the last `preprocess` call. Re-fitting on a
/// new batch replaces that table with a new generation; use one encoder per
/// dataset generation that has to stay internally consistent.
#[derive(Debug, Default)]
pub struct FeatureEncoder {
    table: Option<EncodingTable>,
    generation: u64,
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive match features, drop unusable columns, fit a new encoding table and apply it
    pub fn preprocess(&mut self, df: &DataFrame) -> PipelineResult<DataFrame> {
        let derived = drop_unusable_columns(&add_match_features(df)?);

        self.generation += 1;
        let table = EncodingTable::fit(
            &derived,
            columns_of_kind(ColumnKind::Categorical),
            self.generation,
        )?;
        let encoded = table.transform(&derived)?;

        let one_hot = table
            .columns
            .iter()
            .filter(|c| matches!(c.scheme, EncodingScheme::OneHot { .. }))
            .count();
        info!(
            generation = table.generation,
            label_encoded = table.columns.len() - one_hot,
            one_hot,
            skipped = table.skipped.len(),
            "fitted encoding table"
        );

        self.table = Some(table);
        finalize_numeric(&encoded)
    }

    /// Encode another batch with the table fitted by the last `preprocess`
    pub fn encode(&self, df: &DataFrame) -> PipelineResult<DataFrame> {
        let table = self.table.as_ref().ok_or(PipelineError::EncoderNotFitted)?;
        let derived = drop_unusable_columns(&add_match_features(df)?);
        finalize_numeric(&table.transform(&derived)?)
    }

    pub fn table(&self) -> Option<&EncodingTable> {
        self.table.as_ref()
    }
}
