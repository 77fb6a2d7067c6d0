//! Fixed-length windows over the encoded table
//!
//! Window `i` flattens rows `i..i+L` (every column except the label) into one
//! feature vector and takes its label from row `i+L`, the row right after the
//! window. Rows are assumed to be in a meaningful order (temporal or grouped
//! by vacancy); that order is not checked here.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{FrameContext, PipelineError, PipelineResult};
use super::schema::has_column;

/// Dense row-major matrix of model inputs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Empty matrix with a fixed row width
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_rows: 0,
            n_cols,
            data: Vec::new(),
        }
    }

    /// Build from rows of equal width
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut matrix = Self::new(n_cols);
        for row in rows {
            if row.len() != n_cols {
                return None;
            }
            matrix.push_row(row);
        }
        Some(matrix)
    }

    /// Callers guarantee `row.len() == n_cols`
    fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.n_cols);
        self.data.extend_from_slice(row);
        self.n_rows += 1;
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Copy of the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut out = Self::new(self.n_cols);
        out.data.reserve(indices.len() * self.n_cols);
        for &i in indices {
            out.push_row(self.row(i));
        }
        out
    }
}

/// Windowed model input
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedDataset {
    /// One flattened window per row
    pub features: FeatureMatrix,
    /// Label of the row following each window
    pub labels: Vec<u8>,
    /// Position in the windowed table of the row each label came from
    pub source_rows: Vec<usize>,
    /// Per-row column names, in flattening order
    pub column_names: Vec<String>,
    pub sequence_length: usize,
}

impl WindowedDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Build `height - length` windows over `df`.
///
/// # Errors
/// - `MissingLabel` if `label_column` is absent
/// - `InvalidConfig` if `length` is 0
/// - `NotEnoughRows` if the table has `length` rows or fewer
pub fn build_windows(
    df: &DataFrame,
    label_column: &str,
    length: usize,
) -> PipelineResult<WindowedDataset> {
    if length == 0 {
        return Err(PipelineError::InvalidConfig {
            field: "sequence_length",
            message: "must be at least 1".to_string(),
        });
    }
    if !has_column(df, label_column) {
        return Err(PipelineError::MissingLabel {
            target: label_column.to_string(),
            status: String::new(),
        });
    }

    let height = df.height();
    if height <= length {
        return Err(PipelineError::NotEnoughRows {
            stage: "window",
            rows: height,
            required: length + 1,
        });
    }

    let labels: Vec<u8> = df
        .column(label_column)
        .and_then(|c| c.cast(&DataType::Float64))
        .in_stage("window")?
        .f64()
        .in_stage("window")?
        .into_iter()
        .map(|v| v.is_some_and(|x| x >= 0.5) as u8)
        .collect();

    let mut column_names = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();
    for col in df.get_columns() {
        if col.name().as_str() == label_column {
            continue;
        }
        let values: Vec<f64> = col
            .cast(&DataType::Float64)
            .map_err(|e| PipelineError::Encoding {
                column: col.name().to_string(),
                message: format!("not numeric, cannot be windowed: {}", e),
            })?
            .f64()
            .in_stage("window")?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        column_names.push(col.name().to_string());
        columns.push(values);
    }

    let n_windows = height - length;
    let mut features = FeatureMatrix::new(length * columns.len());
    let mut window = Vec::with_capacity(length * columns.len());
    for i in 0..n_windows {
        window.clear();
        for row in i..i + length {
            window.extend(columns.iter().map(|col| col[row]));
        }
        features.push_row(&window);
    }

    info!(
        windows = n_windows,
        length,
        columns = column_names.len(),
        "built windows"
    );

    Ok(WindowedDataset {
        features,
        labels: labels[length..].to_vec(),
        source_rows: (length..height).collect(),
        column_names,
        sequence_length: length,
    })
}
