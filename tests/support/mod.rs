#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use irisd::api::{self, AppState};
use irisd::config::ServiceConfig;
use irisd::ml::logreg::IrisModel;
use irisd::model_store::{ModelHandle, load_or_initialize};
use tower::ServiceExt;

pub const IRIS_CSV: &str = include_str!("iris.csv");

/// Config pointing at `model.json` and `iris.csv` inside `dir`.
pub fn config_in(dir: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.paths.model = dir.join("model.json");
    config.paths.dataset = dir.join("iris.csv");
    config
}

pub fn write_dataset(config: &ServiceConfig) -> PathBuf {
    std::fs::write(&config.paths.dataset, IRIS_CSV).unwrap();
    config.paths.dataset.clone()
}

/// Model that predicts `label` for every input.
pub fn write_constant_model(path: &Path, label: &str) {
    let bias: Vec<f64> = ["Iris-setosa", "Iris-versicolor", "Iris-virginica"]
        .iter()
        .map(|class| if *class == label { 1.0 } else { 0.0 })
        .collect();
    let model = serde_json::json!({
        "model_version": 1,
        "feature_names": ["sepal_length", "sepal_width", "petal_length", "petal_width"],
        "classes": ["Iris-setosa", "Iris-versicolor", "Iris-virginica"],
        "weights": vec![0.0; 12],
        "bias": bias,
    });
    std::fs::write(path, serde_json::to_vec_pretty(&model).unwrap()).unwrap();
}

pub fn app(config: ServiceConfig) -> Router {
    let model: IrisModel =
        load_or_initialize(&config.paths.model, &config.paths.dataset, &config.training.options())
            .unwrap();
    api::router(AppState::new(ModelHandle::new(model), config))
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
