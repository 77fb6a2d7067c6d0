//! L2-regularized logistic regression fitted by full-batch gradient descent
//! on standardized features. The intercept is not penalized.

use serde::{Deserialize, Serialize};

use super::sigmoid;
use crate::pipeline::window::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub max_iter: usize,
    /// Inverse regularization strength
    pub c: f64,
    /// Stop once every gradient component is below this
    pub tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            c: 1.0,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    standardizer: Standardizer,
    coefficients: Vec<f64>,
    intercept: f64,
    iterations: usize,
}

/// Per-column scaling `z = (v / magnitude - mean) / scale`.
///
/// Values are divided by the column's largest magnitude before any sum is
/// taken, so every finite input stays finite. Constant columns get scale 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Standardizer {
    magnitudes: Vec<f64>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Standardizer {
    fn fit(x: &FeatureMatrix) -> Self {
        let n = x.n_rows().max(1) as f64;
        let d = x.n_cols();

        let mut magnitudes = vec![0.0f64; d];
        for row in x.rows() {
            for (a, v) in magnitudes.iter_mut().zip(row) {
                *a = a.max(v.abs());
            }
        }
        for a in magnitudes.iter_mut() {
            if *a == 0.0 {
                *a = 1.0;
            }
        }

        let mut means = vec![0.0; d];
        for row in x.rows() {
            for ((m, v), a) in means.iter_mut().zip(row).zip(&magnitudes) {
                *m += v / a;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = vec![0.0; d];
        for row in x.rows() {
            for (((s, v), a), m) in scales.iter_mut().zip(row).zip(&magnitudes).zip(&means) {
                *s += (v / a - m).powi(2);
            }
        }
        for s in scales.iter_mut() {
            let std = (*s / n).sqrt();
            *s = if std > 1e-12 { std } else { 1.0 };
        }

        Self {
            magnitudes,
            means,
            scales,
        }
    }

    fn apply<'a>(&'a self, row: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
        row.iter()
            .zip(&self.magnitudes)
            .zip(&self.means)
            .zip(&self.scales)
            .map(|(((v, a), m), s)| (v / a - m) / s)
    }
}

impl LogisticRegression {
    pub fn fit(x: &FeatureMatrix, labels: &[u8], weights: &[f64], params: &LogisticParams) -> Self {
        let d = x.n_cols();
        let standardizer = Standardizer::fit(x);
        let z: Vec<Vec<f64>> = x.rows().map(|row| standardizer.apply(row).collect()).collect();

        let total_weight: f64 = weights.iter().sum::<f64>().max(f64::MIN_POSITIVE);
        let lambda = 1.0 / (params.c * total_weight);

        // Lipschitz bound of the averaged loss gradient, intercept included
        let lipschitz = 0.25
            * z.iter()
                .zip(weights)
                .map(|(row, w)| w / total_weight * (row.iter().map(|v| v * v).sum::<f64>() + 1.0))
                .sum::<f64>()
            + lambda;
        let step = 1.0 / lipschitz;

        let mut coefficients = vec![0.0; d];
        let mut intercept = 0.0;
        let mut grad = vec![0.0; d];
        let mut iterations = 0;

        while iterations < params.max_iter {
            iterations += 1;
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_intercept = 0.0;

            for ((row, &y), &w) in z.iter().zip(labels).zip(weights) {
                let margin = intercept + row.iter().zip(&coefficients).map(|(v, b)| v * b).sum::<f64>();
                let residual = w / total_weight * (sigmoid(margin) - y as f64);
                grad_intercept += residual;
                for (g, v) in grad.iter_mut().zip(row) {
                    *g += residual * v;
                }
            }
            for (g, b) in grad.iter_mut().zip(&coefficients) {
                *g += lambda * b;
            }

            let largest = grad
                .iter()
                .fold(grad_intercept.abs(), |acc, g| acc.max(g.abs()));
            if largest < params.tolerance {
                break;
            }

            intercept -= step * grad_intercept;
            for (b, g) in coefficients.iter_mut().zip(&grad) {
                *b -= step * g;
            }
        }

        Self {
            standardizer,
            coefficients,
            intercept,
            iterations,
        }
    }

    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        let margin = self.intercept
            + self
                .standardizer
                .apply(row)
                .zip(&self.coefficients)
                .map(|(z, b)| z * b)
                .sum::<f64>();
        sigmoid(margin)
    }

    /// Coefficients on the original feature scale
    pub fn coefficients(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.standardizer.scales)
            .zip(&self.standardizer.magnitudes)
            .map(|((b, s), a)| b / (s * a))
            .collect()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardization_handles_constant_column() {
        let x = FeatureMatrix::from_rows(&[vec![1.0, 5.0], vec![3.0, 5.0]]).unwrap();
        let standardizer = Standardizer::fit(&x);
        assert_eq!(standardizer.scales[1], 1.0);

        let low: Vec<f64> = standardizer.apply(x.row(0)).collect();
        let high: Vec<f64> = standardizer.apply(x.row(1)).collect();
        assert!((low[0] + 1.0).abs() < 1e-12);
        assert!((high[0] - 1.0).abs() < 1e-12);
        assert_eq!((low[1], high[1]), (0.0, 0.0));
    }

    #[test]
    fn test_standardization_survives_huge_values() {
        let rows: Vec<Vec<f64>> = (0..8)
            .map(|i| vec![if i % 2 == 0 { 1e307 } else { 1.5e307 }, -1.7e308])
            .collect();
        let x = FeatureMatrix::from_rows(&rows).unwrap();
        let labels: Vec<u8> = (0..8).map(|i| (i % 2) as u8).collect();

        let standardizer = Standardizer::fit(&x);
        assert!(x.rows().flat_map(|row| standardizer.apply(row)).all(f64::is_finite));

        let model = LogisticRegression::fit(&x, &labels, &[1.0; 8], &LogisticParams::default());
        let low = model.predict_proba_row(x.row(0));
        let high = model.predict_proba_row(x.row(1));
        assert!(low.is_finite() && high.is_finite());
        assert!(high > low);
    }

    #[test]
    fn test_learns_sign_of_signal() {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 5) as f64]).collect();
        let x = FeatureMatrix::from_rows(&rows).unwrap();
        let labels: Vec<u8> = (0..40).map(|i| (i >= 20) as u8).collect();

        let model = LogisticRegression::fit(&x, &labels, &[1.0; 40], &LogisticParams::default());

        assert!(model.coefficients()[0] > 0.0);
        assert!(model.predict_proba_row(&[35.0, 2.0]) > 0.9);
        assert!(model.predict_proba_row(&[4.0, 2.0]) < 0.1);
    }

    #[test]
    fn test_balanced_data_without_signal_stays_near_half() {
        let x = FeatureMatrix::from_rows(&[vec![1.0], vec![1.0], vec![1.0], vec![1.0]]).unwrap();
        let model = LogisticRegression::fit(&x, &[0, 1, 0, 1], &[1.0; 4], &LogisticParams::default());
        assert!((model.predict_proba_row(&[1.0]) - 0.5).abs() < 1e-9);
        assert_eq!(model.iterations(), 1);
    }
}
