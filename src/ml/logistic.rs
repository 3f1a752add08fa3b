//! Binary logistic regression fitted with batch gradient descent.

use serde::{Deserialize, Serialize};

use super::{check_training_set, BinaryClassifier, FitError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegressionParams {
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop early once the gradient norm falls below this.
    pub tolerance: f64,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self { learning_rate: 0.1, max_iter: 500, tolerance: 1e-6 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticRegression {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[u8],
        params: &LogisticRegressionParams,
    ) -> Result<Self, FitError> {
        let width = check_training_set(x, y)?;
        let n = x.len() as f64;

        let mut weights = vec![0.0; width];
        let mut bias = 0.0;

        for _ in 0..params.max_iter {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;

            for (row, &label) in x.iter().zip(y) {
                let p = sigmoid(dot(&weights, row) + bias);
                let diff = p - f64::from(label);
                for (g, &xi) in grad_w.iter_mut().zip(row) {
                    *g += diff * xi;
                }
                grad_b += diff;
            }

            let mut norm_sq = 0.0;
            for g in grad_w.iter_mut() {
                *g /= n;
                norm_sq += *g * *g;
            }
            grad_b /= n;
            norm_sq += grad_b * grad_b;

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * g;
            }
            bias -= params.learning_rate * grad_b;

            if norm_sq.sqrt() < params.tolerance {
                break;
            }
        }

        Ok(Self { weights, bias })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.bias
    }
}

impl BinaryClassifier for LogisticRegression {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(dot(&self.weights, features) + self.bias)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let offset = i as f64 * 0.05;
            x.push(vec![-2.0 - offset, -1.0]);
            y.push(0);
            x.push(vec![2.0 + offset, 1.0]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn learns_a_separable_problem() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, &LogisticRegressionParams::default()).unwrap();
        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(model.predict(row), label);
        }
    }

    #[test]
    fn probabilities_straddle_the_boundary() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, &LogisticRegressionParams::default()).unwrap();
        assert!(model.predict_proba(&[3.0, 1.0]) > 0.9);
        assert!(model.predict_proba(&[-3.0, -1.0]) < 0.1);
    }

    #[test]
    fn rejects_mismatched_labels() {
        let err = LogisticRegression::fit(
            &[vec![1.0], vec![2.0]],
            &[1],
            &LogisticRegressionParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, FitError::LengthMismatch { rows: 2, labels: 1 });
    }

    #[test]
    fn rejects_empty_training_set() {
        let err =
            LogisticRegression::fit(&[], &[], &LogisticRegressionParams::default()).unwrap_err();
        assert_eq!(err, FitError::Empty);
    }
}
