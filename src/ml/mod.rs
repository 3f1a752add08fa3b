//! Native implementations of the statistical primitives behind the ensemble:
//! preprocessing, the three classifiers, minority oversampling, and the
//! evaluation metrics used by the training CLI.

pub mod forest;
pub mod knn;
pub mod logistic;
pub mod metrics;
pub mod preprocess;
pub mod smote;

pub use forest::{RandomForest, RandomForestParams};
pub use knn::{KnnClassifier, KnnParams};
pub use logistic::{LogisticRegression, LogisticRegressionParams};
pub use preprocess::{Preprocessor, RawRow};

use thiserror::Error;

/// Errors shared by the `fit` operations in this module.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FitError {
    #[error("training set is empty")]
    Empty,
    #[error("feature matrix has {rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("feature matrix rows have inconsistent widths")]
    RaggedMatrix,
    #[error("minority class has {0} samples, oversampling needs at least 2")]
    TooFewMinoritySamples(usize),
}

/// A fitted binary classifier over a dense feature row.
pub trait BinaryClassifier {
    /// Positive-class probability in [0, 1].
    fn predict_proba(&self, features: &[f64]) -> f64;

    /// Hard 0/1 label at the 0.5 threshold.
    fn predict(&self, features: &[f64]) -> u8 {
        if self.predict_proba(features) >= 0.5 { 1 } else { 0 }
    }
}

pub(crate) fn check_training_set(x: &[Vec<f64>], y: &[u8]) -> Result<usize, FitError> {
    if x.is_empty() {
        return Err(FitError::Empty);
    }
    if x.len() != y.len() {
        return Err(FitError::LengthMismatch { rows: x.len(), labels: y.len() });
    }
    let width = x[0].len();
    if x.iter().any(|row| row.len() != width) {
        return Err(FitError::RaggedMatrix);
    }
    Ok(width)
}
