//! End-to-end ranking run over an in-memory candidate table

use polars::prelude::*;
use tracing::{info, warn};

use super::config::PipelineConfig;
use super::correlation::filter_correlated;
use super::encoder::{column_as_strings, EncodingTable, FeatureEncoder};
use super::error::{FrameContext, PipelineError, PipelineResult};
use super::ranking::{precision_curve, roc_curve, PrecisionCurve, RocCurve};
use super::schema::{has_column, validate_schema, SchemaReport};
use super::selector::{ModelSelector, SelectionOutcome};
use super::target::{count_labels, resolve_target};
use super::window::build_windows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Schema,
    Label,
    Encode,
    Correlation,
    Window,
    Select,
    Evaluate,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Schema,
        Stage::Label,
        Stage::Encode,
        Stage::Correlation,
        Stage::Window,
        Stage::Select,
        Stage::Evaluate,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Stage::Schema => "Schema Validation",
            Stage::Label => "Label Resolution",
            Stage::Encode => "Feature Encoding",
            Stage::Correlation => "Correlation Filter",
            Stage::Window => "Sequence Windows",
            Stage::Select => "Model Selection",
            Stage::Evaluate => "Ranking Evaluation",
        }
    }

    /// 1-based position in the run
    pub fn number(self) -> usize {
        Stage::ALL.iter().position(|s| *s == self).map_or(0, |i| i + 1)
    }
}

/// Hooks for progress reporting; every method defaults to doing nothing
pub trait StageObserver {
    fn stage_started(&mut self, _stage: Stage) {}

    fn stage_finished(&mut self, _stage: Stage, _summary: &str) {}
}

impl StageObserver for () {}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub schema: SchemaReport,
    pub encoding: EncodingTable,
    /// Feature columns after encoding, before the correlation filter
    pub encoded_columns: Vec<String>,
    pub dropped_correlated: Vec<String>,
    pub windows: usize,
    pub selection: SelectionOutcome,
    /// `None` if the held-out set has a single class
    pub roc: Option<RocCurve>,
    pub precision: PrecisionCurve,
}

/// One identifier per row: values of `id_column`, or the row position.
/// Null identifiers fall back to the row position.
pub fn candidate_ids(df: &DataFrame, id_column: Option<&str>) -> PipelineResult<Vec<String>> {
    let Some(name) = id_column else {
        return Ok((0..df.height()).map(|i| i.to_string()).collect());
    };
    if !has_column(df, name) {
        return Err(PipelineError::InvalidConfig {
            field: "id_column",
            message: format!("column '{}' not found in input", name),
        });
    }
    Ok(df
        .column(name)
        .and_then(column_as_strings)
        .in_stage("label")?
        .into_iter()
        .enumerate()
        .map(|(i, id)| id.unwrap_or_else(|| i.to_string()))
        .collect())
}

pub fn run_pipeline(df: &DataFrame, config: &PipelineConfig) -> PipelineResult<PipelineOutcome> {
    run_pipeline_with(df, config, &mut ())
}

/// Run every stage in order, reporting progress to `observer`
pub fn run_pipeline_with(
    df: &DataFrame,
    config: &PipelineConfig,
    observer: &mut impl StageObserver,
) -> PipelineResult<PipelineOutcome> {
    config.validate()?;

    observer.stage_started(Stage::Schema);
    let schema = validate_schema(df);
    schema.log();
    observer.stage_finished(
        Stage::Schema,
        &format!(
            "{} of {} expected columns present, {} extra",
            schema.present.len(),
            schema.present.len() + schema.missing.len(),
            schema.unexpected.len()
        ),
    );

    observer.stage_started(Stage::Label);
    let ids = candidate_ids(df, config.id_column.as_deref())?;
    let mut labelled = resolve_target(
        df,
        &config.target_column,
        &config.status_column,
        &config.approved_value,
    )?;
    if let Some(id) = config.id_column.as_deref() {
        if id != config.target_column.as_str() {
            labelled = labelled.drop(id).in_stage("label")?;
        }
    }
    let (positives, negatives) = count_labels(&labelled, &config.target_column)?;
    observer.stage_finished(
        Stage::Label,
        &format!("{} approved, {} not approved", positives, negatives),
    );

    observer.stage_started(Stage::Encode);
    let mut encoder = FeatureEncoder::new();
    let encoded = encoder.preprocess(&labelled)?;
    let encoding = encoder.table().cloned().unwrap_or_default();
    let encoded_columns: Vec<String> = encoded
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .filter(|c| *c != config.target_column)
        .collect();
    observer.stage_finished(
        Stage::Encode,
        &format!("{} feature columns", encoded_columns.len()),
    );

    observer.stage_started(Stage::Correlation);
    let (filtered, dropped_correlated) = filter_correlated(
        &encoded,
        config.correlation_threshold,
        Some(&config.target_column),
    )?;
    observer.stage_finished(
        Stage::Correlation,
        &format!(
            "dropped {} columns above {}",
            dropped_correlated.len(),
            config.correlation_threshold
        ),
    );

    observer.stage_started(Stage::Window);
    let windows = build_windows(&filtered, &config.target_column, config.sequence_length)?;
    observer.stage_finished(
        Stage::Window,
        &format!(
            "{} windows of {} rows x {} columns",
            windows.len(),
            windows.sequence_length,
            windows.column_names.len()
        ),
    );

    observer.stage_started(Stage::Select);
    let selection = ModelSelector::from_config(config).select(&windows, &ids)?;
    observer.stage_finished(
        Stage::Select,
        &format!(
            "{} selected with ROC-AUC {:.4}",
            selection.best.variant, selection.best.roc_auc
        ),
    );

    observer.stage_started(Stage::Evaluate);
    let (labels, scores) = selection.labels_and_scores();
    let roc = roc_curve(&labels, &scores);
    if roc.is_none() {
        warn!("held-out set has a single class, ROC curve is undefined");
    }
    let precision = precision_curve(&selection.ranked, config.max_k);
    info!(
        evaluated = selection.ranked.len(),
        base_rate = precision.base_rate,
        "ranking evaluated"
    );
    observer.stage_finished(
        Stage::Evaluate,
        &format!(
            "{} candidates ranked, base approval rate {:.1}%",
            selection.ranked.len(),
            precision.base_rate * 100.0
        ),
    );

    Ok(PipelineOutcome {
        schema,
        encoding,
        encoded_columns,
        dropped_correlated,
        windows: windows.len(),
        selection,
        roc,
        precision,
    })
}
