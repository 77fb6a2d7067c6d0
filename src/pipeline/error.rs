//! Error types for the ranking pipeline.
//!
//! `PipelineError` covers failures that abort a run. `TrainError` is scoped
//! to a single model variant: the selector records it and moves on.

use std::path::PathBuf;

use polars::prelude::{PolarsError, PolarsResult};
use thiserror::Error;

/// Fatal errors raised by any pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neither the target column nor the status column it can be derived from exist.
    #[error(
        "[label] no label: target column '{target}' is absent and status column '{status}' is not available to synthesize it"
    )]
    MissingLabel { target: String, status: String },

    /// The input table could not be read or parsed.
    #[error("[load] failed to parse input table '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    /// A configuration value is outside its valid range.
    #[error("[config] invalid value for '{field}': {message}")]
    InvalidConfig { field: &'static str, message: String },

    /// A stage received fewer rows than it needs.
    #[error("[{stage}] not enough rows: got {rows}, need at least {required}")]
    NotEnoughRows {
        stage: &'static str,
        rows: usize,
        required: usize,
    },

    /// Encoding was requested before an encoding table was fitted.
    #[error("[encode] no encoding table has been fitted on this encoder")]
    EncoderNotFitted,

    /// A column could not be converted into numeric features.
    #[error("[encode] column '{column}': {message}")]
    Encoding { column: String, message: String },

    /// Every model variant failed to train or score.
    #[error(
        "[select] no model variant could be trained: {}",
        join_failures(.failures)
    )]
    NoTrainableVariant { failures: Vec<TrainError> },

    /// The best model could not be written to storage.
    #[error("[persist] failed to write model to '{}': {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted model file could not be opened.
    #[error("[persist] failed to read model from '{}': {source}", .path.display())]
    ModelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted model could not be serialized or read back.
    #[error("[persist] model serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A data frame operation failed inside a stage.
    #[error("[{stage}] data frame operation failed: {source}")]
    Frame {
        stage: &'static str,
        #[source]
        source: PolarsError,
    },
}

/// Failure of a single model variant. Never fatal on its own.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrainError {
    #[error("variant '{variant}': training partition contains a single class")]
    SingleClass { variant: String },

    #[error("variant '{variant}': held-out partition contains a single class, ROC-AUC is undefined")]
    DegenerateHoldout { variant: String },

    #[error("variant '{variant}': {message}")]
    Fit { variant: String, message: String },
}

impl TrainError {
    /// Name of the variant that failed.
    pub fn variant(&self) -> &str {
        match self {
            TrainError::SingleClass { variant }
            | TrainError::DegenerateHoldout { variant }
            | TrainError::Fit { variant, .. } => variant,
        }
    }
}

fn join_failures(failures: &[TrainError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Tags a polars failure with the stage it happened in.
pub trait FrameContext<T> {
    fn in_stage(self, stage: &'static str) -> PipelineResult<T>;
}

impl<T> FrameContext<T> for PolarsResult<T> {
    fn in_stage(self, stage: &'static str) -> PipelineResult<T> {
        self.map_err(|source| PipelineError::Frame { stage, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_trainable_variant_lists_every_failure() {
        let err = PipelineError::NoTrainableVariant {
            failures: vec![
                TrainError::SingleClass {
                    variant: "RandomForest".to_string(),
                },
                TrainError::DegenerateHoldout {
                    variant: "XGBoost".to_string(),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("RandomForest"));
        assert!(message.contains("XGBoost"));
        assert!(message.starts_with("[select]"));
    }

    #[test]
    fn test_missing_label_names_columns() {
        let err = PipelineError::MissingLabel {
            target: "approved".to_string(),
            status: "prospect_candidate_status".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("no label"));
        assert!(message.contains("approved"));
        assert!(message.contains("prospect_candidate_status"));
    }

    #[test]
    fn test_frame_error_names_stage() {
        let result: PolarsResult<()> = Err(PolarsError::ColumnNotFound("ghost".into()));
        let err = result.in_stage("window").unwrap_err();
        assert!(matches!(err, PipelineError::Frame { stage: "window", .. }));
        assert!(err.to_string().starts_with("[window] data frame operation failed"));
    }

    #[test]
    fn test_train_error_variant_accessor() {
        let err = TrainError::Fit {
            variant: "LogisticRegression".to_string(),
            message: "empty".to_string(),
        };
        assert_eq!(err.variant(), "LogisticRegression");
    }
}
