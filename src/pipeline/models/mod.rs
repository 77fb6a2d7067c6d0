//! Candidate classifiers
//!
//! Each [`ModelVariant`] names a learner and its hyper-parameters. Fitting a
//! variant produces a [`Classifier`], a serializable model that scores
//! windowed feature rows with an approval probability.

pub mod boosting;
pub mod forest;
pub mod logistic;
pub mod tree;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use logistic::{LogisticParams, LogisticRegression};

use super::error::TrainError;
use super::window::FeatureMatrix;

/// How per-row weights are derived from class frequencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every row weighs 1
    Uniform,
    /// Class `c` weighs `n / (2 · n_c)`
    Balanced,
    /// Positives weigh `n_negative / n_positive`, negatives weigh 1
    ScalePositive,
}

/// Weight of class 0 and class 1 under `mode`.
/// A class absent from `labels` keeps weight 1.
pub fn class_weights(labels: &[u8], mode: ClassWeight) -> [f64; 2] {
    let n = labels.len() as f64;
    let positives = labels.iter().filter(|&&y| y == 1).count() as f64;
    let negatives = n - positives;
    if positives == 0.0 || negatives == 0.0 {
        return [1.0, 1.0];
    }
    match mode {
        ClassWeight::Uniform => [1.0, 1.0],
        ClassWeight::Balanced => [n / (2.0 * negatives), n / (2.0 * positives)],
        ClassWeight::ScalePositive => [1.0, negatives / positives],
    }
}

/// Per-row weights for `labels`
pub fn sample_weights(labels: &[u8], mode: ClassWeight) -> Vec<f64> {
    let weights = class_weights(labels, mode);
    labels.iter().map(|&y| weights[y as usize]).collect()
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Learner family and its hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ModelSpec {
    RandomForest(ForestParams),
    GradientBoosting(BoostingParams),
    LogisticRegression(LogisticParams),
}

impl ModelSpec {
    fn check(&self) -> Result<(), String> {
        match self {
            ModelSpec::RandomForest(p) if p.n_trees == 0 => Err("n_trees must be at least 1".into()),
            ModelSpec::GradientBoosting(p) if p.n_rounds == 0 => {
                Err("n_rounds must be at least 1".into())
            }
            ModelSpec::GradientBoosting(p) if !(p.learning_rate > 0.0) => {
                Err("learning_rate must be positive".into())
            }
            ModelSpec::LogisticRegression(p) if !(p.c > 0.0) => Err("C must be positive".into()),
            _ => Ok(()),
        }
    }
}

/// A named, independently trainable model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariant {
    pub name: String,
    pub class_weight: ClassWeight,
    pub spec: ModelSpec,
}

impl ModelVariant {
    pub fn new(name: impl Into<String>, class_weight: ClassWeight, spec: ModelSpec) -> Self {
        Self {
            name: name.into(),
            class_weight,
            spec,
        }
    }

    /// 100 fully grown trees with balanced class weights
    pub fn random_forest() -> Self {
        Self::new(
            "RandomForest",
            ClassWeight::Balanced,
            ModelSpec::RandomForest(ForestParams::default()),
        )
    }

    /// 200 boosting rounds at learning rate 0.05, positives up-weighted by the class ratio
    pub fn xgboost() -> Self {
        Self::new(
            "XGBoost",
            ClassWeight::ScalePositive,
            ModelSpec::GradientBoosting(BoostingParams::default()),
        )
    }

    /// L2-regularized logistic regression, 1000 iterations, balanced class weights
    pub fn logistic_regression() -> Self {
        Self::new(
            "LogisticRegression",
            ClassWeight::Balanced,
            ModelSpec::LogisticRegression(LogisticParams::default()),
        )
    }

    /// The three variants compared on every run, in tie-break order
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::random_forest(),
            Self::xgboost(),
            Self::logistic_regression(),
        ]
    }

    /// Fit on `x`/`labels`. Identical inputs and seed give identical models.
    ///
    /// # Errors
    /// - `SingleClass` if `labels` holds only one class
    /// - `Fit` for invalid hyper-parameters or mismatched inputs
    pub fn fit(&self, x: &FeatureMatrix, labels: &[u8], seed: u64) -> Result<Classifier, TrainError> {
        if x.n_rows() != labels.len() {
            return Err(TrainError::Fit {
                variant: self.name.clone(),
                message: format!("{} rows but {} labels", x.n_rows(), labels.len()),
            });
        }
        let positives = labels.iter().filter(|&&y| y == 1).count();
        if positives == 0 || positives == labels.len() {
            return Err(TrainError::SingleClass {
                variant: self.name.clone(),
            });
        }
        self.spec.check().map_err(|message| TrainError::Fit {
            variant: self.name.clone(),
            message,
        })?;

        let weights = sample_weights(labels, self.class_weight);
        let classifier = match &self.spec {
            ModelSpec::RandomForest(params) => {
                Classifier::RandomForest(RandomForest::fit(x, labels, &weights, params, seed))
            }
            ModelSpec::GradientBoosting(params) => {
                Classifier::GradientBoosting(GradientBoosting::fit(x, labels, &weights, params, seed))
            }
            ModelSpec::LogisticRegression(params) => {
                Classifier::LogisticRegression(LogisticRegression::fit(x, labels, &weights, params))
            }
        };
        Ok(classifier)
    }
}

/// A fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Classifier {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    /// Approval probability for one flattened window
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        match self {
            Classifier::RandomForest(m) => m.predict_proba_row(row),
            Classifier::GradientBoosting(m) => m.predict_proba_row(row),
            Classifier::LogisticRegression(m) => m.predict_proba_row(row),
        }
    }

    pub fn predict_proba(&self, x: &FeatureMatrix) -> Vec<f64> {
        (0..x.n_rows())
            .into_par_iter()
            .map(|i| self.predict_proba_row(x.row(i)))
            .collect()
    }

    /// Width of the rows the model was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            Classifier::RandomForest(m) => m.n_features(),
            Classifier::GradientBoosting(m) => m.n_features(),
            Classifier::LogisticRegression(m) => m.n_features(),
        }
    }
}
