//! Weighted CART decision tree shared by the forest and boosting learners
//!
//! Each training row contributes two sums to a node:
//! - Gini criterion: (weighted events, weight); the leaf value is the weighted event rate
//! - Newton criterion: (gradient, hessian); the leaf value is the Newton step `-G / (H + λ)`

use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

use crate::pipeline::window::FeatureMatrix;

/// Values closer than this are treated as equal when looking for split points
const VALUE_TOLERANCE: f64 = 1e-10;

/// Splits must improve the node score by more than this
const MIN_GAIN: f64 = 1e-12;

/// How split quality and leaf values are computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SplitCriterion {
    /// Weighted Gini impurity on (event weight, total weight)
    Gini,
    /// Second-order gain on (gradient, hessian) with L2 regularization `lambda`
    Newton { lambda: f64 },
}

impl SplitCriterion {
    /// Node score, higher is better; a split's gain is `left + right - parent`
    fn score(&self, first: f64, second: f64) -> f64 {
        match *self {
            SplitCriterion::Gini => -second * gini_impurity(first, second - first),
            SplitCriterion::Newton { lambda } => first * first / (second + lambda),
        }
    }

    fn leaf_value(&self, first: f64, second: f64) -> f64 {
        match *self {
            SplitCriterion::Gini => {
                if second > 0.0 {
                    first / second
                } else {
                    0.5
                }
            }
            SplitCriterion::Newton { lambda } => -first / (second + lambda),
        }
    }

    fn is_pure(&self, first: f64, second: f64) -> bool {
        match self {
            SplitCriterion::Gini => first <= 0.0 || first >= second,
            SplitCriterion::Newton { .. } => false,
        }
    }
}

/// Gini impurity for binary classification: 2 · p · (1 - p)
fn gini_impurity(events: f64, non_events: f64) -> f64 {
    let total = events + non_events;
    if total <= 0.0 {
        return 0.0;
    }
    let p = events / total;
    2.0 * p * (1.0 - p)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
    /// Minimum sum of the second statistic on each side of a split
    pub min_child_weight: f64,
    /// Features considered per split; `None` considers all of them
    pub max_features: Option<usize>,
    pub criterion: SplitCriterion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Tree stored as a flat node arena; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    x: &'a FeatureMatrix,
    stats: &'a [(f64, f64)],
    params: &'a TreeParams,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Fit on `rows` (indices into `x`, duplicates allowed) with per-row statistics `stats`
    pub fn fit(
        x: &FeatureMatrix,
        rows: &[usize],
        stats: &[(f64, f64)],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = Builder {
            x,
            stats,
            params,
            nodes: Vec::new(),
        };
        builder.build(rows.to_vec(), 0, rng);
        DecisionTree {
            nodes: builder.nodes,
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Builder<'_> {
    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(a, b), &r| {
            (a + self.stats[r].0, b + self.stats[r].1)
        })
    }

    /// Push the subtree for `rows` and return its node index
    fn build(&mut self, rows: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let (first, second) = self.sums(&rows);
        let criterion = self.params.criterion;
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: criterion.leaf_value(first, second),
        });

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || rows.len() < 2 * self.params.min_samples_leaf.max(1)
            || criterion.is_pure(first, second)
        {
            return idx;
        }

        let Some(split) = self.find_best_split(&rows, first, second, rng) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.x.get(r, split.feature) <= split.threshold);

        let left = self.build(left_rows, depth + 1, rng);
        let right = self.build(right_rows, depth + 1, rng);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn candidate_features(&self, rng: &mut StdRng) -> Vec<usize> {
        let n_features = self.x.n_cols();
        match self.params.max_features {
            Some(k) if k < n_features => sample(rng, n_features, k.max(1)).into_vec(),
            _ => (0..n_features).collect(),
        }
    }

    /// Best threshold over the candidate features, scanning sorted values left to right
    fn find_best_split(
        &self,
        rows: &[usize],
        total_first: f64,
        total_second: f64,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let criterion = self.params.criterion;
        let min_leaf = self.params.min_samples_leaf.max(1);
        let min_weight = self.params.min_child_weight;
        let parent_score = criterion.score(total_first, total_second);
        let n = rows.len();

        let mut best: Option<SplitCandidate> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

        for feature in self.candidate_features(rng) {
            sorted.clear();
            sorted.extend(rows.iter().map(|&r| (self.x.get(r, feature), r)));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            if (sorted[n - 1].0 - sorted[0].0).abs() < VALUE_TOLERANCE {
                continue;
            }

            let mut left_first = 0.0;
            let mut left_second = 0.0;
            for i in 0..n - 1 {
                let (value, row) = sorted[i];
                left_first += self.stats[row].0;
                left_second += self.stats[row].1;

                let left_count = i + 1;
                if left_count < min_leaf || n - left_count < min_leaf {
                    continue;
                }
                // never split between equal values
                if (sorted[i + 1].0 - value).abs() < VALUE_TOLERANCE {
                    continue;
                }

                let right_first = total_first - left_first;
                let right_second = total_second - left_second;
                if left_second < min_weight || right_second < min_weight {
                    continue;
                }

                let gain = criterion.score(left_first, left_second)
                    + criterion.score(right_first, right_second)
                    - parent_score;
                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: value / 2.0 + sorted[i + 1].0 / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}
