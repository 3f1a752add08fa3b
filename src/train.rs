//! Training pipeline: CSV ingest, stratified split, preprocessing fit,
//! minority oversampling, fitting the three classifiers, held-out evaluation,
//! and bundle persistence. Driven by the `stroke-train` binary.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::bundle::ModelBundle;
use crate::ml::metrics::{classification_report, roc_auc, ClassificationReport};
use crate::ml::preprocess::RawRow;
use crate::ml::{
    smote, BinaryClassifier, KnnClassifier, KnnParams, LogisticRegression,
    LogisticRegressionParams, Preprocessor, RandomForest, RandomForestParams,
};

/// Numeric dataset columns, in the order the preprocessor sees them. The two
/// 0/1 flags ride along as numerics, as the dataset encodes them.
pub const NUMERIC_FEATURES: &[&str] =
    &["age", "hypertension", "heart_disease", "avg_glucose_level", "bmi"];
/// Categorical dataset columns; `Residence_type` keeps the dataset's spelling.
pub const CATEGORICAL_FEATURES: &[&str] =
    &["gender", "ever_married", "work_type", "Residence_type", "smoking_status"];

/// One row of the stroke dataset. The CSV's `id` column is ignored; `bmi`
/// carries the literal string `N/A` for missing values.
#[derive(Debug, Clone, Deserialize)]
pub struct StrokeRow {
    pub gender: String,
    pub age: f64,
    pub hypertension: i64,
    pub heart_disease: i64,
    pub ever_married: String,
    pub work_type: String,
    #[serde(rename = "Residence_type")]
    pub residence_type: String,
    #[serde(deserialize_with = "optional_float")]
    pub avg_glucose_level: Option<f64>,
    #[serde(deserialize_with = "optional_float")]
    pub bmi: Option<f64>,
    pub smoking_status: String,
    pub stroke: u8,
}

fn optional_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("N/A") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone)]
pub struct TrainParams {
    pub test_fraction: f64,
    pub seed: u64,
    pub smote_neighbors: usize,
    pub knn: KnnParams,
    pub forest: RandomForestParams,
    pub logistic: LogisticRegressionParams,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            smote_neighbors: 5,
            knn: KnnParams::default(),
            forest: RandomForestParams::default(),
            logistic: LogisticRegressionParams::default(),
        }
    }
}

/// Held-out metrics for one ensemble member.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub name: &'static str,
    pub report: ClassificationReport,
    pub roc_auc: f64,
}

pub fn load_csv(path: &Path) -> anyhow::Result<Vec<StrokeRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: StrokeRow =
            record.with_context(|| format!("malformed row in {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Per-class shuffled index split; each class contributes `test_fraction` of
/// its rows to the test set.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [0u8, 1u8] {
        let mut indices: Vec<usize> =
            (0..labels.len()).filter(|&i| labels[i] == class).collect();
        indices.shuffle(&mut rng);
        let n_test = ((indices.len() as f64) * test_fraction).round() as usize;
        let n_test = n_test.min(indices.len());
        test.extend(indices.drain(..n_test));
        train.extend(indices);
    }
    (train, test)
}

fn raw_row(row: &StrokeRow) -> RawRow {
    RawRow {
        numeric: vec![
            Some(row.age),
            Some(row.hypertension as f64),
            Some(row.heart_disease as f64),
            row.avg_glucose_level,
            row.bmi,
        ],
        categorical: vec![
            Some(row.gender.clone()),
            Some(row.ever_married.clone()),
            Some(row.work_type.clone()),
            Some(row.residence_type.clone()),
            Some(row.smoking_status.clone()),
        ],
    }
}

pub fn train(
    rows: &[StrokeRow],
    params: &TrainParams,
) -> anyhow::Result<(ModelBundle, Vec<ModelReport>)> {
    anyhow::ensure!(!rows.is_empty(), "dataset is empty");

    let labels: Vec<u8> = rows.iter().map(|r| r.stroke.min(1)).collect();
    let (train_idx, test_idx) = stratified_split(&labels, params.test_fraction, params.seed);

    let numeric_features: Vec<String> =
        NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect();
    let categorical_features: Vec<String> =
        CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect();

    let train_raw: Vec<RawRow> = train_idx.iter().map(|&i| raw_row(&rows[i])).collect();
    let test_raw: Vec<RawRow> = test_idx.iter().map(|&i| raw_row(&rows[i])).collect();
    let y_train: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();
    let y_test: Vec<u8> = test_idx.iter().map(|&i| labels[i]).collect();

    // Fit the transform on the training split only; the test split must see
    // the same statistics the server will.
    let preprocessor =
        Preprocessor::fit(&numeric_features, &categorical_features, &train_raw)?;
    let x_train = preprocessor.transform(&train_raw)?;
    let x_test = preprocessor.transform(&test_raw)?;

    // Balance classes on the transformed training matrix only.
    let (x_balanced, y_balanced) =
        smote::oversample(&x_train, &y_train, params.smote_neighbors, params.seed)?;
    info!(
        train_rows = x_train.len(),
        balanced_rows = x_balanced.len(),
        test_rows = x_test.len(),
        "training set prepared"
    );

    let knn = KnnClassifier::fit(&x_balanced, &y_balanced, &params.knn)?;
    let rf = RandomForest::fit(&x_balanced, &y_balanced, &params.forest)?;
    let lr = LogisticRegression::fit(&x_balanced, &y_balanced, &params.logistic)?;

    let mut reports = Vec::new();
    if !x_test.is_empty() {
        reports.push(evaluate("knn", &knn, &x_test, &y_test));
        reports.push(evaluate("rf", &rf, &x_test, &y_test));
        reports.push(evaluate("lr", &lr, &x_test, &y_test));
    }

    let bundle = ModelBundle {
        preprocessor,
        knn,
        rf,
        lr,
        numeric_features,
        categorical_features,
        trained_at: Utc::now(),
    };
    Ok((bundle, reports))
}

fn evaluate<M: BinaryClassifier>(
    name: &'static str,
    model: &M,
    x_test: &[Vec<f64>],
    y_test: &[u8],
) -> ModelReport {
    let scores: Vec<f64> = x_test.iter().map(|row| model.predict_proba(row)).collect();
    let predictions: Vec<u8> = x_test.iter().map(|row| model.predict(row)).collect();
    ModelReport {
        name,
        report: classification_report(&predictions, y_test),
        roc_auc: roc_auc(&scores, y_test),
    }
}

/// End-to-end training run: dataset in, evaluated bundle file out.
pub fn run(data: &Path, out: &Path, params: &TrainParams) -> anyhow::Result<()> {
    let rows = load_csv(data)?;
    info!(rows = rows.len(), data = %data.display(), "dataset loaded");

    let (bundle, reports) = train(&rows, params)?;
    for report in &reports {
        info!(
            model = report.name,
            roc_auc = format!("{:.3}", report.roc_auc),
            "held-out metrics\n{}",
            report.report
        );
    }

    bundle.save(out)?;
    info!(out = %out.display(), "model bundle saved");
    Ok(())
}
