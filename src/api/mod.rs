use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::bundle::ModelBundle;

pub mod health;
pub mod predict;

pub use health::{health_check, HealthResponse};
pub use predict::{predict, PredictResponse};

/// Shared request state: the model bundle, loaded once and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub bundle: Arc<ModelBundle>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_check))
        .route("/api/predict", post(predict::predict))
        .with_state(state)
}
