use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::ApiError;
use super::{AppState, PREDICT_PATH, RETRAIN_PATH};
use crate::dataset::{FEATURE_COUNT, FEATURE_NAMES};
use crate::model_store::save_model;
use crate::ml::logreg::train_from_path;
use crate::species::Species;

pub const WELCOME_MESSAGE: &str = "Welcome to the Iris model prediction API";
pub const RETRAINED_MESSAGE: &str = "Model retrained";
pub const MISSING_PARAMS_MESSAGE: &str = "All numeric parameters must be provided";
pub const MISSING_DATASET_MESSAGE: &str = "Dataset for retraining not found";

#[derive(Debug, Serialize, Deserialize)]
pub struct LandingResponse {
    pub message: String,
    pub endpoints: BTreeMap<String, String>,
}

/// Raw query values; parsing happens in the handler so failures map to 400.
#[derive(Debug, Default)]
pub struct PredictQuery {
    pub sepal_length: Option<String>,
    pub sepal_width: Option<String>,
    pub petal_length: Option<String>,
    pub petal_width: Option<String>,
}

impl PredictQuery {
    /// Collect the measurement keys from decoded query pairs.
    ///
    /// A repeated key keeps its first value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "sepal_length" => &mut query.sepal_length,
                "sepal_width" => &mut query.sepal_width,
                "petal_length" => &mut query.petal_length,
                "petal_width" => &mut query.petal_width,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// Parse all four measurements, reporting the first field that fails.
    ///
    /// `nan` and `inf` parse as floats but are rejected like any other
    /// non-numeric value.
    pub fn features(&self) -> Result<[f64; FEATURE_COUNT], &'static str> {
        let raw = [
            &self.sepal_length,
            &self.sepal_width,
            &self.petal_length,
            &self.petal_width,
        ];
        let mut features = [0.0; FEATURE_COUNT];
        for ((slot, value), name) in features.iter_mut().zip(raw).zip(FEATURE_NAMES) {
            *slot = value
                .as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .ok_or(name)?;
        }
        Ok(features)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: Species,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET / - service metadata.
pub async fn landing() -> Result<impl IntoResponse, ApiError> {
    let endpoints = BTreeMap::from([
        (
            PREDICT_PATH.to_string(),
            "Provides predictions based on input features (GET)".to_string(),
        ),
        (
            RETRAIN_PATH.to_string(),
            "Retrains the model with a new dataset (GET)".to_string(),
        ),
    ]);
    let body = serde_json::to_string_pretty(&LandingResponse {
        message: WELCOME_MESSAGE.to_string(),
        endpoints,
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// GET /api/v1/predict - classify one feature vector.
pub async fn predict(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Query(pairs) = query.map_err(|err| {
        ApiError::BadRequest(format!("{MISSING_PARAMS_MESSAGE}: {}", err.body_text()))
    })?;
    let features = PredictQuery::from_pairs(pairs).features().map_err(|field| {
        ApiError::BadRequest(format!("{MISSING_PARAMS_MESSAGE} (invalid or missing: {field})"))
    })?;
    let prediction = state.model.current().predict(&features);
    Ok(Json(PredictResponse { prediction }))
}

/// GET /api/v1/retrain - refit from the dataset and overwrite the model file.
pub async fn retrain(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    let dataset_path = state.config.paths.dataset.clone();
    if !dataset_path.is_file() {
        warn!("Retrain requested but {} does not exist", dataset_path.display());
        return Err(ApiError::NotFound(MISSING_DATASET_MESSAGE.to_string()));
    }
    let model_path = state.config.paths.model.clone();
    let options = state.config.training.options();
    let model = tokio::task::spawn_blocking(move || {
        let model = train_from_path(&dataset_path, &options).map_err(|err| err.to_string())?;
        save_model(&model, &model_path).map_err(|err| err.to_string())?;
        Ok::<_, String>(model)
    })
    .await
    .map_err(|err| ApiError::Internal(format!("retrain task failed: {err}")))?
    .map_err(ApiError::Internal)?;

    if state.config.serving.reload_after_retrain {
        state.model.publish(model);
        info!("Retrained model published to serving handle");
    } else {
        info!("Retrained model written; serving model unchanged until restart");
    }
    Ok(Json(MessageResponse {
        message: RETRAINED_MESSAGE.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(values: [Option<&str>; 4]) -> PredictQuery {
        let [sepal_length, sepal_width, petal_length, petal_width] =
            values.map(|v| v.map(str::to_string));
        PredictQuery {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        }
    }

    #[test]
    fn parses_all_four_features() {
        let q = query([Some("5.1"), Some(" 3.5"), Some("1.4"), Some("2e-1")]);
        assert_eq!(q.features().unwrap(), [5.1, 3.5, 1.4, 0.2]);
    }

    #[test]
    fn reports_first_bad_field() {
        let q = query([Some("5.1"), None, Some("abc"), Some("0.2")]);
        assert_eq!(q.features().unwrap_err(), "sepal_width");
        let q = query([Some("abc"), Some("3.5"), Some("1.4"), Some("0.2")]);
        assert_eq!(q.features().unwrap_err(), "sepal_length");
    }

    #[test]
    fn non_finite_values_are_invalid() {
        for bad in ["nan", "NaN", "inf", "-infinity"] {
            let q = query([Some("5.1"), Some("3.5"), Some(bad), Some("0.2")]);
            assert_eq!(q.features().unwrap_err(), "petal_length", "{bad}");
        }
    }

    #[test]
    fn repeated_key_keeps_first_value() {
        let pairs = [
            ("sepal_length", "5.1"),
            ("sepal_length", "6.0"),
            ("color", "blue"),
            ("sepal_width", "3.5"),
            ("petal_length", "1.4"),
            ("petal_width", "0.2"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .to_vec();
        let q = PredictQuery::from_pairs(pairs);
        assert_eq!(q.features().unwrap(), [5.1, 3.5, 1.4, 0.2]);
    }
}
