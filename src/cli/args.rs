//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::config::{
    PipelineConfig, DEFAULT_APPROVED_VALUE, DEFAULT_MAX_K, DEFAULT_TARGET_COLUMN,
};
use crate::pipeline::schema::PROSPECT_CANDIDATE_STATUS;

/// hirank - Rank job candidates by predicted probability of approval
#[derive(Parser, Debug)]
#[command(name = "hirank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input CSV with vacancy, candidate and application columns
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Binary approval label column.
    /// When absent from the input, it is derived from --status-column.
    #[arg(short, long, default_value = DEFAULT_TARGET_COLUMN)]
    pub target: String,

    /// Application status column the label is derived from
    #[arg(long, default_value = PROSPECT_CANDIDATE_STATUS)]
    pub status_column: String,

    /// Status value that counts as approved
    #[arg(long, default_value = DEFAULT_APPROVED_VALUE)]
    pub approved_value: String,

    /// Column identifying each candidate in the ranked output.
    /// Defaults to the row position in the input.
    #[arg(long)]
    pub id_column: Option<String>,

    /// Correlation threshold - drop the later column of pairs correlated above this value
    #[arg(long, default_value = "0.9", value_parser = validate_correlation_threshold)]
    pub correlation_threshold: f64,

    /// Rows per window fed to the classifiers
    #[arg(long, default_value = "10")]
    pub sequence_length: usize,

    /// Share of windows held out for model evaluation (0.0 to 1.0, exclusive)
    #[arg(long, default_value = "0.2", value_parser = validate_test_fraction)]
    pub test_fraction: f64,

    /// Seed for the train/test split and every randomized model
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Directory where the best model is saved as <variant>.json
    #[arg(long, default_value = "models")]
    pub models_dir: PathBuf,

    /// Ranked output CSV.
    /// Defaults to input directory with '_ranked' suffix (e.g., data.csv → data_ranked.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Diagnostics JSON with ROC and Precision@K series.
    /// Defaults to input directory with '_diagnostics.json' suffix.
    #[arg(long)]
    pub diagnostics: Option<PathBuf>,

    /// Largest K in the Precision@K curve (clamped to the evaluation size)
    #[arg(long, default_value_t = DEFAULT_MAX_K)]
    pub max_k: usize,

    /// Number of ranked candidates shown in the terminal
    #[arg(long, default_value = "20")]
    pub top: usize,

    /// Number of rows to use for schema inference.
    /// Higher values improve type detection for ambiguous columns but may be slower.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Log filter used when RUST_LOG is not set (e.g. "debug", "hirank=trace")
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a synthetic candidate CSV with the expected columns
    Simulate {
        /// Output file path (defaults to simulated_candidates.csv)
        output: Option<PathBuf>,

        /// Number of candidate rows to generate
        #[arg(long, default_value = "100")]
        rows: usize,

        /// Random seed for the generated values
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Get the ranked output path, deriving from input if not explicitly provided.
    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        derived_path(self.input.as_ref()?, "_ranked.csv")
    }

    /// Get the diagnostics path, deriving from input if not explicitly provided.
    pub fn diagnostics_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.diagnostics {
            return Some(path.clone());
        }
        derived_path(self.input.as_ref()?, "_diagnostics.json")
    }

    /// Stage parameters for a ranking run
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            target_column: self.target.clone(),
            status_column: self.status_column.clone(),
            approved_value: self.approved_value.clone(),
            id_column: self.id_column.clone(),
            correlation_threshold: self.correlation_threshold,
            sequence_length: self.sequence_length,
            test_fraction: self.test_fraction,
            seed: self.seed,
            models_dir: self.models_dir.clone(),
            max_k: self.max_k,
            ..PipelineConfig::default()
        }
    }
}

/// `<dir of input>/<stem of input><suffix>`
fn derived_path(input: &Path, suffix: &str) -> Option<PathBuf> {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input.file_stem().and_then(|s| s.to_str())?;
    Some(parent.join(format!("{}{}", stem, suffix)))
}

/// Validator for test_fraction parameter
fn validate_test_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_fraction must be between 0.0 and 1.0 (exclusive), got {}",
            value
        ))
    }
}

/// Validator for correlation_threshold parameter
fn validate_correlation_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "correlation_threshold must be in (0.0, 1.0], got {}",
            value
        ))
    }
}
