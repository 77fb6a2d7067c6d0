//! Approval label resolution
//!
//! The label is a binary column. When the input does not carry one, it is
//! synthesized from the application status column. The status column is
//! removed afterwards: it is the label's source, not a feature.

use polars::prelude::*;
use tracing::{info, warn};

use super::encoder::column_as_strings;
use super::error::{FrameContext, PipelineError, PipelineResult};
use super::schema::has_column;

/// Values (lowercase) accepted as "approved" in an existing label column
const TRUE_VALUES: &[&str] = &["1", "true", "sim", "yes"];

/// Ensure `target` exists as an Int32 0/1 column and drop `status`.
///
/// # Errors
/// [`PipelineError::MissingLabel`] when neither column exists.
pub fn resolve_target(
    df: &DataFrame,
    target: &str,
    status: &str,
    approved_value: &str,
) -> PipelineResult<DataFrame> {
    let labels: Vec<i32> = if has_column(df, target) {
        let values = df
            .column(target)
            .and_then(column_as_strings)
            .in_stage("label")?;
        let nulls = values.iter().filter(|v| v.is_none()).count();
        if nulls > 0 {
            warn!(column = target, nulls, "label column has null values, counting them as not approved");
        }
        values
            .iter()
            .map(|v| v.as_deref().map_or(0, |s| is_approved_label(s, approved_value) as i32))
            .collect()
    } else if has_column(df, status) {
        info!(target, status, approved_value, "synthesizing label from status column");
        df.column(status)
            .and_then(column_as_strings)
            .in_stage("label")?
            .iter()
            .map(|v| (v.as_deref().map(str::trim) == Some(approved_value)) as i32)
            .collect()
    } else {
        return Err(PipelineError::MissingLabel {
            target: target.to_string(),
            status: status.to_string(),
        });
    };

    let mut out = df.clone();
    out.with_column(Column::new(target.into(), labels))
        .in_stage("label")?;
    if status != target && has_column(&out, status) {
        out = out.drop(status).in_stage("label")?;
    }

    let (positives, negatives) = count_labels(&out, target)?;
    info!(positives, negatives, "resolved approval label");

    Ok(out)
}

fn is_approved_label(value: &str, approved_value: &str) -> bool {
    let value = value.trim();
    if value == approved_value {
        return true;
    }
    if let Ok(n) = value.parse::<f64>() {
        return n != 0.0;
    }
    TRUE_VALUES.contains(&value.to_lowercase().as_str())
}

/// Count approved and not-approved rows of a resolved label column
pub fn count_labels(df: &DataFrame, target: &str) -> PipelineResult<(usize, usize)> {
    let cast = df
        .column(target)
        .and_then(|c| c.cast(&DataType::Float64))
        .in_stage("label")?;
    let positives = cast
        .f64()
        .in_stage("label")?
        .into_iter()
        .filter(|v| v.is_some_and(|x| x >= 0.5))
        .count();
    Ok((positives, df.height() - positives))
}
