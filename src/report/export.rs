//! Ranked output and diagnostics export

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{
    PipelineConfig, PipelineOutcome, PrecisionCurve, RankedCandidate, RocCurve, VariantScore,
};

/// Columns of the ranked output table, in order
pub const RANKED_COLUMNS: [&str; 4] = ["candidate_id", "approval_probability", "approved", "status"];

/// Ranked candidates as a table, best first
pub fn ranked_dataframe(ranked: &[RankedCandidate]) -> PolarsResult<DataFrame> {
    let ids: Vec<&str> = ranked.iter().map(|c| c.candidate_id.as_str()).collect();
    let probabilities: Vec<f64> = ranked.iter().map(|c| c.approval_probability).collect();
    let approved: Vec<i32> = ranked.iter().map(|c| c.approved as i32).collect();
    let status: Vec<&str> = ranked.iter().map(|c| c.status()).collect();

    DataFrame::new(vec![
        Column::new(RANKED_COLUMNS[0].into(), ids),
        Column::new(RANKED_COLUMNS[1].into(), probabilities),
        Column::new(RANKED_COLUMNS[2].into(), approved),
        Column::new(RANKED_COLUMNS[3].into(), status),
    ])
}

pub fn write_ranked_csv(ranked: &[RankedCandidate], output_path: &Path) -> Result<()> {
    let mut df = ranked_dataframe(ranked).context("Failed to build ranked table")?;
    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("Failed to write ranked CSV: {}", output_path.display()))?;
    Ok(())
}

/// Metadata about the ranking run
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub hirank_version: String,
    pub input_file: String,
    pub selected_variant: String,
    pub selected_roc_auc: f64,
    pub model_path: String,
    pub config: PipelineConfig,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsExport {
    pub metadata: RunMetadata,
    /// Successful variants in evaluation order
    pub scores: Vec<VariantScore>,
    /// One message per variant that could not be trained or scored
    pub failures: Vec<String>,
    pub dropped_correlated: Vec<String>,
    pub windows: usize,
    pub evaluated_candidates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roc: Option<RocCurve>,
    pub precision_at_k: PrecisionCurve,
}

impl DiagnosticsExport {
    pub fn from_outcome(outcome: &PipelineOutcome, config: &PipelineConfig, input_file: &str) -> Self {
        let selection = &outcome.selection;
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                hirank_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: input_file.to_string(),
                selected_variant: selection.best.variant.clone(),
                selected_roc_auc: selection.best.roc_auc,
                model_path: selection.model_path.display().to_string(),
                config: config.clone(),
            },
            scores: selection.scores.clone(),
            failures: selection.failures.iter().map(|f| f.to_string()).collect(),
            dropped_correlated: outcome.dropped_correlated.clone(),
            windows: outcome.windows,
            evaluated_candidates: selection.ranked.len(),
            roc: outcome.roc.clone(),
            precision_at_k: outcome.precision.clone(),
        }
    }
}

/// Write the diagnostics of a run as pretty-printed JSON
pub fn export_diagnostics(export: &DiagnosticsExport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(export).context("Failed to serialize diagnostics to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write diagnostics to {}", output_path.display()))?;

    Ok(())
}
