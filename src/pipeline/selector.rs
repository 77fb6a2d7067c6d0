//! Model selection: train every variant, keep the one with the best held-out ROC-AUC

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::config::{PipelineConfig, DEFAULT_MODELS_DIR, DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use super::error::{PipelineError, PipelineResult, TrainError};
use super::models::{Classifier, ModelVariant};
use super::ranking::{rank_candidates, roc_auc, RankedCandidate};
use super::window::WindowedDataset;

/// Extension of persisted model files
pub const MODEL_EXTENSION: &str = "json";

/// Row indices of a random train/test partition, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out the first `ceil(n · test_fraction)` indices.
/// Both partitions keep at least one row.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> PipelineResult<TrainTestSplit> {
    if n < 2 {
        return Err(PipelineError::NotEnoughRows {
            stage: "split",
            rows: n,
            required: 2,
        });
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidConfig {
            field: "test_fraction",
            message: format!("must be in (0, 1), got {}", test_fraction),
        });
    }

    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut test_rows = order[..n_test].to_vec();
    let mut train_rows = order[n_test..].to_vec();
    test_rows.sort_unstable();
    train_rows.sort_unstable();
    Ok(TrainTestSplit {
        train_rows,
        test_rows,
    })
}

/// A fitted classifier with the held-out score that earned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub variant: String,
    pub roc_auc: f64,
    pub classifier: Classifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantScore {
    pub variant: String,
    pub roc_auc: f64,
}

#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub best: TrainedModel,
    /// Held-out candidates, best first
    pub ranked: Vec<RankedCandidate>,
    /// Successful variants in evaluation order
    pub scores: Vec<VariantScore>,
    pub failures: Vec<TrainError>,
    pub model_path: PathBuf,
}

impl SelectionOutcome {
    /// Held-out labels and scores in ranking order
    pub fn labels_and_scores(&self) -> (Vec<u8>, Vec<f64>) {
        self.ranked
            .iter()
            .map(|c| (c.approved, c.approval_probability))
            .unzip()
    }
}

/// Highest-scoring item; the earliest one wins ties
pub fn select_best<T>(items: impl IntoIterator<Item = T>, score: impl Fn(&T) -> f64) -> Option<T> {
    items.into_iter().fold(None, |best, item| match best {
        Some(current) if !(score(&item) > score(&current)) => Some(current),
        _ => Some(item),
    })
}

struct Evaluated {
    model: TrainedModel,
    probabilities: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    variants: Vec<ModelVariant>,
    test_fraction: f64,
    seed: u64,
    models_dir: PathBuf,
}

impl ModelSelector {
    pub fn new(variants: Vec<ModelVariant>) -> Self {
        Self {
            variants,
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.variants.clone())
            .with_test_fraction(config.test_fraction)
            .with_seed(config.seed)
            .with_models_dir(&config.models_dir)
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_models_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.models_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn variants(&self) -> &[ModelVariant] {
        &self.variants
    }

    /// Split `data`, fit every variant on the training part, score it on the
    /// held-out part, persist the winner and rank the held-out candidates.
    ///
    /// `ids` maps rows of the original table to candidate identifiers; rows
    /// beyond its length are identified by position.
    ///
    /// A variant that fails to fit, predicts non-finite probabilities or
    /// cannot be scored is recorded in `failures` and skipped.
    ///
    /// # Errors
    /// - `NoTrainableVariant` if every variant fails
    /// - `Persist`/`Serialization` if the winner cannot be written
    pub fn select(&self, data: &WindowedDataset, ids: &[String]) -> PipelineResult<SelectionOutcome> {
        let split = train_test_split(data.len(), self.test_fraction, self.seed)?;
        let x_train = data.features.select_rows(&split.train_rows);
        let y_train: Vec<u8> = split.train_rows.iter().map(|&i| data.labels[i]).collect();
        let x_test = data.features.select_rows(&split.test_rows);
        let y_test: Vec<u8> = split.test_rows.iter().map(|&i| data.labels[i]).collect();

        info!(
            train = split.train_rows.len(),
            test = split.test_rows.len(),
            variants = self.variants.len(),
            "training model variants"
        );

        // collect keeps evaluation order
        let results: Vec<Result<Evaluated, TrainError>> = self
            .variants
            .par_iter()
            .map(|variant| {
                let classifier = variant.fit(&x_train, &y_train, self.seed)?;
                let probabilities = classifier.predict_proba(&x_test);
                let non_finite = probabilities.iter().filter(|p| !p.is_finite()).count();
                if non_finite > 0 {
                    return Err(TrainError::Fit {
                        variant: variant.name.clone(),
                        message: format!("{} held-out probabilities are not finite", non_finite),
                    });
                }
                let auc = roc_auc(&y_test, &probabilities).ok_or_else(|| {
                    TrainError::DegenerateHoldout {
                        variant: variant.name.clone(),
                    }
                })?;
                Ok(Evaluated {
                    model: TrainedModel {
                        variant: variant.name.clone(),
                        roc_auc: auc,
                        classifier,
                    },
                    probabilities,
                })
            })
            .collect();

        let mut evaluated = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(e) => {
                    info!(variant = %e.model.variant, roc_auc = e.model.roc_auc, "variant evaluated");
                    evaluated.push(e);
                }
                Err(err) => {
                    warn!(variant = err.variant(), error = %err, "variant skipped");
                    failures.push(err);
                }
            }
        }

        let scores: Vec<VariantScore> = evaluated
            .iter()
            .map(|e| VariantScore {
                variant: e.model.variant.clone(),
                roc_auc: e.model.roc_auc,
            })
            .collect();

        let Some(best) = select_best(evaluated, |e| e.model.roc_auc) else {
            return Err(PipelineError::NoTrainableVariant { failures });
        };

        let ranked = rank_candidates(
            split
                .test_rows
                .iter()
                .zip(&best.probabilities)
                .map(|(&i, &p)| {
                    let row = data.source_rows[i];
                    RankedCandidate {
                        candidate_id: ids.get(row).cloned().unwrap_or_else(|| row.to_string()),
                        row,
                        approval_probability: p,
                        approved: data.labels[i],
                    }
                })
                .collect(),
        );

        let model_path = persist_model(&self.models_dir, &best.model)?;
        info!(
            variant = %best.model.variant,
            roc_auc = best.model.roc_auc,
            path = %model_path.display(),
            "best model persisted"
        );

        Ok(SelectionOutcome {
            best: best.model,
            ranked,
            scores,
            failures,
            model_path,
        })
    }
}

/// `<dir>/<variant>.json`, with characters unsafe in file names replaced
pub fn model_path(dir: &Path, variant_name: &str) -> PathBuf {
    let stem: String = variant_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "model".to_string() } else { stem };
    dir.join(format!("{}.{}", stem, MODEL_EXTENSION))
}

/// Write `model` under `dir`, creating it if needed.
///
/// The file is written to a temporary sibling and renamed into place, so the
/// destination is either absent, the previous file, or the complete new one.
pub fn persist_model(dir: &Path, model: &TrainedModel) -> PipelineResult<PathBuf> {
    let path = model_path(dir, &model.variant);
    let persist_err = |source: io::Error| PipelineError::Persist {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(persist_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, model)?;
        writer.flush().map_err(persist_err)?;
    }
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(&path).map_err(|e| persist_err(e.error))?;

    Ok(path)
}

pub fn load_model(path: &Path) -> PipelineResult<TrainedModel> {
    let file = File::open(path).map_err(|source| PipelineError::ModelRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes_and_disjointness() {
        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.test_rows.len(), 2);
        assert_eq!(split.train_rows.len(), 8);

        let mut all: Vec<usize> = split.train_rows.iter().chain(&split.test_rows).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        assert_eq!(
            train_test_split(50, 0.2, 7).unwrap(),
            train_test_split(50, 0.2, 7).unwrap()
        );
        assert_ne!(
            train_test_split(50, 0.2, 7).unwrap(),
            train_test_split(50, 0.2, 8).unwrap()
        );
    }

    #[test]
    fn test_split_keeps_both_sides_non_empty() {
        let split = train_test_split(2, 0.9, 1).unwrap();
        assert_eq!(split.test_rows.len(), 1);
        assert_eq!(split.train_rows.len(), 1);
        assert!(train_test_split(1, 0.2, 1).is_err());
    }

    #[test]
    fn test_select_best_prefers_strictly_greater() {
        let scored = vec![("RandomForest", 0.55), ("XGBoost", 0.80), ("LogisticRegression", 0.70)];
        assert_eq!(select_best(scored, |s| s.1).map(|s| s.0), Some("XGBoost"));

        let tied = vec![("first", 0.8), ("second", 0.8)];
        assert_eq!(select_best(tied, |s| s.1).map(|s| s.0), Some("first"));

        assert_eq!(select_best(Vec::<(&str, f64)>::new(), |s| s.1), None);
    }

    #[test]
    fn test_model_path_sanitizes_names() {
        let dir = Path::new("models");
        assert_eq!(model_path(dir, "XGBoost"), dir.join("XGBoost.json"));
        assert_eq!(model_path(dir, "my model/v2"), dir.join("my_model_v2.json"));
        assert_eq!(model_path(dir, "  "), dir.join("model.json"));
    }
}
