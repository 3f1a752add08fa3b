use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::bundle::{ModelOutputs, Prediction};
use crate::error::ApiError;
use crate::record::PatientRecord;

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: u8,
    pub probability: f64,
    pub probability_str: String,
    pub model_votes: ModelOutputs<u8>,
    pub model_probs: ModelOutputs<f64>,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            prediction: prediction.prediction,
            probability: prediction.probability,
            probability_str: format!("{:.2}%", prediction.probability),
            model_votes: prediction.votes,
            model_probs: prediction.probabilities,
        }
    }
}

pub async fn predict(
    State(state): State<AppState>,
    Json(patient): Json<PatientRecord>,
) -> Result<Json<PredictResponse>, ApiError> {
    patient.validate()?;

    let prediction = state.bundle.predict(&patient).map_err(|err| {
        tracing::error!(error = %err, "prediction failed");
        ApiError::PredictionFailed
    })?;

    Ok(Json(PredictResponse::from(prediction)))
}
