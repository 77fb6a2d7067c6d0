//! Random forest of Gini trees, each grown on a bootstrap sample with its own seed

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, SplitCriterion, TreeParams};
use crate::pipeline::window::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    /// Draw a bootstrap sample per tree instead of using every row
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_leaf: 1,
            bootstrap: true,
        }
    }
}

/// Bagged Gini trees; the probability is the mean of the tree leaf rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

/// Independent, reproducible seed for tree `index`
fn tree_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl RandomForest {
    pub fn fit(
        x: &FeatureMatrix,
        labels: &[u8],
        weights: &[f64],
        params: &ForestParams,
        seed: u64,
    ) -> Self {
        let n = labels.len();
        let n_features = x.n_cols();
        let stats: Vec<(f64, f64)> = labels
            .iter()
            .zip(weights)
            .map(|(&y, &w)| (w * y as f64, w))
            .collect();

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_leaf: params.min_samples_leaf,
            min_child_weight: 0.0,
            max_features: Some(((n_features as f64).sqrt().round() as usize).max(1)),
            criterion: SplitCriterion::Gini,
        };

        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(tree_seed(seed, i));
                let rows: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(x, &rows, &stats, &tree_params, &mut rng)
            })
            .collect();

        Self { trees, n_features }
    }

    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_seeds_differ() {
        assert_ne!(tree_seed(42, 0), tree_seed(42, 1));
        assert_ne!(tree_seed(42, 0), tree_seed(43, 0));
    }

    #[test]
    fn test_forest_without_bootstrap_fits_training_rows() {
        let x = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let labels = [0, 0, 1, 1];
        let params = ForestParams {
            n_trees: 5,
            bootstrap: false,
            ..ForestParams::default()
        };

        let forest = RandomForest::fit(&x, &labels, &[1.0; 4], &params, 1);

        assert_eq!(forest.n_trees(), 5);
        assert_eq!(forest.predict_proba_row(&[0.5]), 0.0);
        assert_eq!(forest.predict_proba_row(&[2.5]), 1.0);
    }
}
