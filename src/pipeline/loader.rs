//! Candidate table loader

use std::path::Path;

use polars::prelude::*;
use tracing::info;

use super::error::{PipelineError, PipelineResult};

/// Read a CSV of candidate records into memory.
///
/// Any read or parse failure is fatal and reported as [`PipelineError::Parse`];
/// nothing is returned for a partially readable file.
pub fn load_candidates(path: &Path, infer_schema_length: usize) -> PipelineResult<DataFrame> {
    let parse_err = |source: PolarsError| PipelineError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "csv" {
        return Err(parse_err(PolarsError::InvalidOperation(
            format!("unsupported file format '{}', expected csv", extension).into(),
        )));
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(infer_schema_length))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(parse_err)?;

    info!(path = %path.display(), rows = df.height(), columns = df.width(), "loaded candidate table");
    Ok(df)
}

/// Shape and approximate in-memory size of a loaded table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub rows: usize,
    pub columns: usize,
    pub memory_mb: f64,
}

pub fn dataset_stats(df: &DataFrame) -> DatasetStats {
    let (rows, columns) = df.shape();
    DatasetStats {
        rows,
        columns,
        memory_mb: df.estimated_size() as f64 / (1024.0 * 1024.0),
    }
}
