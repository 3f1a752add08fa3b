//! The persisted model artifact: one file holding the fitted preprocessor, the
//! three fitted classifiers, and the feature-name lists that fix the column
//! order. Loaded once at startup and shared read-only across requests.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::preprocess::PreprocessError;
use crate::ml::{BinaryClassifier, KnnClassifier, LogisticRegression, Preprocessor, RandomForest};
use crate::record::{self, PatientRecord, UnknownFeature};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub preprocessor: Preprocessor,
    pub knn: KnnClassifier,
    pub rf: RandomForest,
    pub lr: LogisticRegression,
    pub numeric_features: Vec<String>,
    pub categorical_features: Vec<String>,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredictError {
    #[error(transparent)]
    UnknownFeature(#[from] UnknownFeature),
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

/// One value per ensemble member, keyed the way the response serializes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOutputs<T> {
    pub knn: T,
    pub rf: T,
    pub lr: T,
}

/// Ephemeral result of one inference call. Probabilities are percentages
/// rounded to two decimals.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Hard vote: rounded mean of the three binary predictions.
    pub prediction: u8,
    /// Soft vote: unweighted mean of the positive-class probabilities.
    pub probability: f64,
    pub votes: ModelOutputs<u8>,
    pub probabilities: ModelOutputs<f64>,
}

impl ModelBundle {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open model bundle {}", path.display()))?;
        let bundle = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to decode model bundle {}", path.display()))?;
        Ok(bundle)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create model bundle {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), self)
            .with_context(|| format!("failed to encode model bundle {}", path.display()))?;
        Ok(())
    }

    pub fn predict(&self, patient: &PatientRecord) -> Result<Prediction, PredictError> {
        let row = patient.feature_row(&self.numeric_features, &self.categorical_features)?;
        let features = self.preprocessor.transform_row(&row)?;

        let probabilities = ModelOutputs {
            knn: self.knn.predict_proba(&features),
            rf: self.rf.predict_proba(&features),
            lr: self.lr.predict_proba(&features),
        };
        let votes = ModelOutputs {
            knn: self.knn.predict(&features),
            rf: self.rf.predict(&features),
            lr: self.lr.predict(&features),
        };

        let mean_probability =
            (probabilities.knn + probabilities.rf + probabilities.lr) / 3.0;
        // Odd ensemble: the vote mean never lands on .5, so round is a strict
        // majority.
        let vote_mean = f64::from(votes.knn + votes.rf + votes.lr) / 3.0;

        Ok(Prediction {
            prediction: vote_mean.round() as u8,
            probability: round2(mean_probability * 100.0),
            votes,
            probabilities: ModelOutputs {
                knn: round2(probabilities.knn * 100.0),
                rf: round2(probabilities.rf * 100.0),
                lr: round2(probabilities.lr * 100.0),
            },
        })
    }

    /// Values the request validator accepts but the trained encoder has never
    /// seen. Such values pass validation and then encode as all zeros, so they
    /// deserve a startup warning.
    pub fn category_drift(&self) -> Vec<String> {
        let mut drift = Vec::new();
        for column in &self.preprocessor.categorical {
            let allowed: &[&str] = match column.name.as_str() {
                "gender" => record::GENDER_CATEGORIES,
                "ever_married" => record::MARRIED_CATEGORIES,
                "work_type" => record::WORK_TYPE_CATEGORIES,
                "Residence_type" | "residence_type" => record::RESIDENCE_CATEGORIES,
                "smoking_status" => record::SMOKING_CATEGORIES,
                _ => continue,
            };
            for value in allowed {
                if !column.categories.iter().any(|c| c == value) {
                    drift.push(format!(
                        "{}={value:?} passes validation but was never seen in training",
                        column.name
                    ));
                }
            }
        }
        drift
    }
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::valid_record;
    use crate::train::{self, TrainParams};

    fn tiny_bundle() -> ModelBundle {
        let rows = train::tests::synthetic_rows(120);
        let (bundle, _) = train::train(&rows, &TrainParams::tiny()).unwrap();
        bundle
    }

    #[test]
    fn probability_is_a_percentage_in_range() {
        let bundle = tiny_bundle();
        let prediction = bundle.predict(&valid_record()).unwrap();
        assert!((0.0..=100.0).contains(&prediction.probability));
        assert!(prediction.prediction == 0 || prediction.prediction == 1);
    }

    #[test]
    fn hard_vote_is_the_rounded_vote_mean() {
        let bundle = tiny_bundle();
        let prediction = bundle.predict(&valid_record()).unwrap();
        let mean = f64::from(
            prediction.votes.knn + prediction.votes.rf + prediction.votes.lr,
        ) / 3.0;
        assert_eq!(prediction.prediction, mean.round() as u8);
    }

    #[test]
    fn missing_optionals_still_predict() {
        let bundle = tiny_bundle();
        let mut record = valid_record();
        record.avg_glucose_level = None;
        record.bmi = None;
        let prediction = bundle.predict(&record).unwrap();
        assert!((0.0..=100.0).contains(&prediction.probability));
    }

    #[test]
    fn save_load_roundtrip_predicts_identically() {
        let bundle = tiny_bundle();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        bundle.save(&path).unwrap();
        let reloaded = ModelBundle::load(&path).unwrap();

        let record = valid_record();
        let a = bundle.predict(&record).unwrap();
        let b = reloaded.predict(&record).unwrap();
        assert_eq!(a.prediction, b.prediction);
        assert_eq!(a.probability, b.probability);
        assert_eq!(a.probabilities, b.probabilities);
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        std::fs::write(&path, b"not a bundle").unwrap();
        assert!(ModelBundle::load(&path).is_err());
    }

    #[test]
    fn round2_rounds_half_up() {
        assert_eq!(round2(12.345), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(0.0), 0.0);
    }
}
