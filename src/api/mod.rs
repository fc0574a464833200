//! HTTP surface: router, shared state and route handlers.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use crate::config::ServiceConfig;
use crate::model_store::ModelHandle;

pub const PREDICT_PATH: &str = "/api/v1/predict";
pub const RETRAIN_PATH: &str = "/api/v1/retrain";

/// State cloned into each request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub model: ModelHandle,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(model: ModelHandle, config: ServiceConfig) -> Self {
        Self {
            model,
            config: Arc::new(config),
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::landing))
        .route(PREDICT_PATH, get(handlers::predict))
        .route(RETRAIN_PATH, get(handlers::retrain))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
