//! Pipeline configuration shared by the CLI and library callers

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::models::ModelVariant;
use super::schema::PROSPECT_CANDIDATE_STATUS;

pub const DEFAULT_TARGET_COLUMN: &str = "approved";
pub const DEFAULT_APPROVED_VALUE: &str = "Aprovado";
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.9;
pub const DEFAULT_SEQUENCE_LENGTH: usize = 10;
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_MAX_K: usize = 1000;

/// Parameters for every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Binary label column (synthesized from `status_column` when absent)
    pub target_column: String,
    /// Application status column the label is derived from
    pub status_column: String,
    /// Status value that means "approved"
    pub approved_value: String,
    /// Column holding candidate identifiers; row position is used when unset
    pub id_column: Option<String>,
    /// Columns whose correlation with an earlier column exceeds this are dropped
    pub correlation_threshold: f64,
    /// Rows per window
    pub sequence_length: usize,
    /// Share of windows held out for evaluation
    pub test_fraction: f64,
    /// Seed for the split and all randomized learners
    pub seed: u64,
    /// Directory the best model is persisted to
    pub models_dir: PathBuf,
    /// Largest K in the Precision@K curve
    pub max_k: usize,
    /// Classifier variants, evaluated in this order
    pub variants: Vec<ModelVariant>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            status_column: PROSPECT_CANDIDATE_STATUS.to_string(),
            approved_value: DEFAULT_APPROVED_VALUE.to_string(),
            id_column: None,
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            max_k: DEFAULT_MAX_K,
            variants: ModelVariant::default_set(),
        }
    }
}

impl PipelineConfig {
    /// Reject values no stage can work with
    pub fn validate(&self) -> PipelineResult<()> {
        if self.target_column.trim().is_empty() {
            return Err(invalid("target_column", "must not be empty"));
        }
        if !(self.correlation_threshold > 0.0 && self.correlation_threshold <= 1.0) {
            return Err(invalid(
                "correlation_threshold",
                format!("must be in (0, 1], got {}", self.correlation_threshold),
            ));
        }
        if self.sequence_length == 0 {
            return Err(invalid("sequence_length", "must be at least 1"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(invalid(
                "test_fraction",
                format!("must be in (0, 1), got {}", self.test_fraction),
            ));
        }
        if self.max_k == 0 {
            return Err(invalid("max_k", "must be at least 1"));
        }
        if self.variants.is_empty() {
            return Err(invalid("variants", "at least one model variant is required"));
        }
        for (i, variant) in self.variants.iter().enumerate() {
            if self.variants[..i].iter().any(|v| v.name == variant.name) {
                return Err(invalid(
                    "variants",
                    format!("duplicate variant name '{}'", variant.name),
                ));
            }
        }
        Ok(())
    }

    /// Where the model of the given variant is persisted
    pub fn model_path(&self, variant_name: &str) -> PathBuf {
        super::selector::model_path(&self.models_dir, variant_name)
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> PipelineError {
    PipelineError::InvalidConfig {
        field,
        message: message.into(),
    }
}
