//! Correlation-based removal of redundant encoded columns

use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use super::error::PipelineResult;

/// A pair of columns whose correlation exceeds the threshold.
/// `feature1` precedes `feature2` in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Threshold for auto-selecting matrix vs pairwise correlation computation.
/// Matrix multiplication is more efficient when there are many columns.
const MATRIX_METHOD_COLUMN_THRESHOLD: usize = 15;

/// Numeric columns in table order, cast to Float64, minus the excluded ones
fn float_columns(df: &DataFrame, exclude: Option<&str>) -> Vec<(String, Column)> {
    df.get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric() && Some(col.name().as_str()) != exclude)
        .filter_map(|col| {
            col.cast(&DataType::Float64)
                .ok()
                .map(|cast| (col.name().to_string(), cast))
        })
        .collect()
}

/// Find column pairs (upper triangle, each pair once) with Pearson correlation above `threshold`.
///
/// Pairs are returned in column order: by the earlier column, then the later one.
/// Columns with zero variance have no defined correlation and never appear.
pub fn find_correlated_pairs(
    df: &DataFrame,
    threshold: f64,
    exclude: Option<&str>,
) -> PipelineResult<Vec<CorrelatedPair>> {
    let columns = float_columns(df, exclude);
    let num_cols = columns.len();
    if num_cols < 2 {
        return Ok(Vec::new());
    }

    let pairs: Vec<(usize, usize)> = (0..num_cols)
        .flat_map(|i| ((i + 1)..num_cols).map(move |j| (i, j)))
        .collect();

    // par_iter + collect keeps the upper-triangle order
    let correlated: Vec<CorrelatedPair> = pairs
        .par_iter()
        .filter_map(|&(i, j)| {
            let (name1, col1) = &columns[i];
            let (name2, col2) = &columns[j];
            pearson_correlation(col1, col2)
                .filter(|c| *c > threshold)
                .map(|c| CorrelatedPair {
                    feature1: name1.clone(),
                    feature2: name2.clone(),
                    correlation: c,
                })
        })
        .collect();

    Ok(correlated)
}

/// Pearson correlation using Welford's single-pass algorithm.
/// Rows where either value is null are skipped.
fn pearson_correlation(s1: &Column, s2: &Column) -> Option<f64> {
    let ca1 = s1.f64().ok()?;
    let ca2 = s2.f64().ok()?;
    if ca1.len() != ca2.len() {
        return None;
    }

    let mut n = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (x, y) in ca1.iter().zip(ca2.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            n += 1.0;
            let dx = x - mean_x;
            let dy = y - mean_y;
            mean_x += dx / n;
            mean_y += dy / n;
            var_x += dx * (x - mean_x);
            var_y += dy * (y - mean_y);
            cov_xy += dx * (y - mean_y);
        }
    }

    if n < 2.0 || var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    Some(cov_xy / (var_x.sqrt() * var_y.sqrt()))
}

/// Standardized columns as a Gram matrix: R = Zᵀ Z with Z = (X - mean) / (std · √n).
///
/// Returns the correlation matrix and the names of the columns that entered it
/// (constant columns are left out).
fn compute_correlation_matrix(columns: &[(String, Column)]) -> Option<(Mat<f64>, Vec<String>)> {
    let n_rows = columns.first()?.1.len();
    if n_rows < 2 {
        return None;
    }

    let standardized: Vec<Option<Vec<f64>>> = columns
        .par_iter()
        .map(|(_, col)| {
            let ca = col.f64().ok()?;
            let values: Vec<f64> = ca.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
            if valid.len() < 2 {
                return None;
            }

            let count = valid.len() as f64;
            let mean = valid.iter().sum::<f64>() / count;
            let std = (valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count).sqrt();
            if std == 0.0 {
                return None;
            }

            let scale = std * count.sqrt();
            Some(
                values
                    .iter()
                    .map(|v| if v.is_nan() { 0.0 } else { (v - mean) / scale })
                    .collect(),
            )
        })
        .collect();

    let valid: Vec<(&str, Vec<f64>)> = columns
        .iter()
        .zip(standardized)
        .filter_map(|((name, _), z)| z.map(|z| (name.as_str(), z)))
        .collect();
    if valid.len() < 2 {
        return None;
    }

    let mut z = Mat::<f64>::zeros(n_rows, valid.len());
    for (col_idx, (_, values)) in valid.iter().enumerate() {
        for (row_idx, &value) in values.iter().enumerate() {
            z[(row_idx, col_idx)] = value;
        }
    }

    let corr_matrix = z.transpose() * &z;
    let names = valid.iter().map(|(name, _)| name.to_string()).collect();

    Some((corr_matrix, names))
}

/// Same contract as [`find_correlated_pairs`], computed through one matrix product
pub fn find_correlated_pairs_matrix(
    df: &DataFrame,
    threshold: f64,
    exclude: Option<&str>,
) -> PipelineResult<Vec<CorrelatedPair>> {
    let columns = float_columns(df, exclude);
    let Some((corr_matrix, names)) = compute_correlation_matrix(&columns) else {
        return Ok(Vec::new());
    };

    let n = corr_matrix.nrows();
    let mut pairs = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let corr = corr_matrix[(i, j)];
            if corr > threshold && !corr.is_nan() {
                pairs.push(CorrelatedPair {
                    feature1: names[i].clone(),
                    feature2: names[j].clone(),
                    correlation: corr,
                });
            }
        }
    }

    Ok(pairs)
}

/// Pick the pairwise or matrix method by column count
pub fn find_correlated_pairs_auto(
    df: &DataFrame,
    threshold: f64,
    exclude: Option<&str>,
) -> PipelineResult<Vec<CorrelatedPair>> {
    let num_cols = df
        .get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric() && Some(col.name().as_str()) != exclude)
        .count();

    if num_cols >= MATRIX_METHOD_COLUMN_THRESHOLD {
        find_correlated_pairs_matrix(df, threshold, exclude)
    } else {
        find_correlated_pairs(df, threshold, exclude)
    }
}

/// Columns to drop: the later column of every pair, each once, in first-seen order.
///
/// A column is dropped when it correlates with any earlier column, even if that
/// earlier column is itself dropped.
pub fn select_features_to_drop(pairs: &[CorrelatedPair]) -> Vec<String> {
    let mut to_drop: Vec<String> = Vec::new();
    for pair in pairs {
        if !to_drop.contains(&pair.feature2) {
            to_drop.push(pair.feature2.clone());
        }
    }
    to_drop
}

/// Remove redundant numeric columns. `protected` (the label) neither participates nor is dropped.
pub fn filter_correlated(
    df: &DataFrame,
    threshold: f64,
    protected: Option<&str>,
) -> PipelineResult<(DataFrame, Vec<String>)> {
    let pairs = find_correlated_pairs_auto(df, threshold, protected)?;
    for pair in &pairs {
        debug!(
            kept = %pair.feature1,
            dropped = %pair.feature2,
            correlation = pair.correlation,
            "correlated pair"
        );
    }

    let to_drop = select_features_to_drop(&pairs);
    info!(
        pairs = pairs.len(),
        dropped = to_drop.len(),
        threshold,
        "correlation filter applied"
    );

    let filtered = df.drop_many(to_drop.iter().map(|s| s.as_str()));
    Ok((filtered, to_drop))
}
