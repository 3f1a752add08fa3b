//! Client-facing error mapping. Validation problems carry their message;
//! anything that breaks during feature assembly or prediction collapses to a
//! generic failure after being logged server-side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::record::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Prediction failed")]
    PredictionFailed,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_keep_their_message() {
        let err = ApiError::from(ValidationError::AgeOutOfRange);
        assert_eq!(err.to_string(), "age must be between 0 and 120");
    }

    #[test]
    fn prediction_failures_are_generic() {
        assert_eq!(ApiError::PredictionFailed.to_string(), "Prediction failed");
    }

    #[test]
    fn responses_are_client_errors() {
        let response = ApiError::PredictionFailed.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
