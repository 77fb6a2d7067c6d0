//! Gradient-boosted trees on the logistic loss
//!
//! Each round fits a Newton tree to the weighted gradients and hessians of the
//! current margins and adds its output scaled by the learning rate.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::sigmoid;
use super::tree::{DecisionTree, SplitCriterion, TreeParams};
use crate::pipeline::window::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Minimum hessian sum on each side of a split
    pub min_child_weight: f64,
    /// L2 penalty on leaf values
    pub lambda: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 200,
            learning_rate: 0.05,
            max_depth: 6,
            min_child_weight: 1.0,
            lambda: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    learning_rate: f64,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl GradientBoosting {
    pub fn fit(
        x: &FeatureMatrix,
        labels: &[u8],
        weights: &[f64],
        params: &BoostingParams,
        seed: u64,
    ) -> Self {
        let n = labels.len();
        let rows: Vec<usize> = (0..n).collect();
        let tree_params = TreeParams {
            max_depth: Some(params.max_depth),
            min_samples_leaf: 1,
            min_child_weight: params.min_child_weight,
            max_features: None,
            criterion: SplitCriterion::Newton {
                lambda: params.lambda,
            },
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut margins = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_rounds);

        for _ in 0..params.n_rounds {
            let stats: Vec<(f64, f64)> = margins
                .iter()
                .zip(labels)
                .zip(weights)
                .map(|((&m, &y), &w)| {
                    let p = sigmoid(m);
                    (w * (p - y as f64), w * p * (1.0 - p))
                })
                .collect();

            let tree = DecisionTree::fit(x, &rows, &stats, &tree_params, &mut rng);
            margins
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, m)| *m += params.learning_rate * tree.predict_row(x.row(i)));
            trees.push(tree);
        }

        Self {
            learning_rate: params.learning_rate,
            trees,
            n_features: x.n_cols(),
        }
    }

    fn margin(&self, row: &[f64]) -> f64 {
        self.trees
            .iter()
            .map(|t| self.learning_rate * t.predict_row(row))
            .sum()
    }

    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        sigmoid(self.margin(row))
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
