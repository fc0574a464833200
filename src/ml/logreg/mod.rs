//! Multinomial logistic regression model for Iris feature vectors.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{FEATURE_COUNT, FEATURE_NAMES};
use crate::species::Species;

mod train;
pub use train::{TrainError, TrainOptions, fit, train_from_path};

/// Current on-disk model format version.
pub const MODEL_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model JSON in {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid model: {0}")]
    Invalid(String),
}

/// Fitted classifier in its persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrisModel {
    pub model_version: i64,
    pub feature_names: Vec<String>,
    /// Species for each weight row, in row order.
    pub classes: Vec<Species>,
    /// Row-major `[classes][FEATURE_COUNT]`.
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
}

impl IrisModel {
    /// Validate dimensions and finiteness of the parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {})",
                self.model_version, MODEL_VERSION
            ));
        }
        if self.feature_names.len() != FEATURE_COUNT {
            return Err(format!(
                "Expected {FEATURE_COUNT} features, found {}",
                self.feature_names.len()
            ));
        }
        let classes = self.classes.len();
        if classes == 0 {
            return Err("No classes defined".to_string());
        }
        if self.weights.len() != classes * FEATURE_COUNT {
            return Err("weights length mismatch".to_string());
        }
        if self.bias.len() != classes {
            return Err("bias length mismatch".to_string());
        }
        if self.weights.iter().chain(self.bias.iter()).any(|v| !v.is_finite()) {
            return Err("parameters must be finite".to_string());
        }
        Ok(())
    }

    /// Load and validate a model from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model: Self = serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        model.validate().map_err(ModelError::Invalid)?;
        Ok(model)
    }

    pub(crate) fn feature_names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|name| (*name).to_string()).collect()
    }

    /// Raw per-class scores for a feature vector.
    pub fn decision_function(&self, features: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        self.bias
            .iter()
            .enumerate()
            .map(|(class_idx, bias)| {
                let row = &self.weights[class_idx * FEATURE_COUNT..(class_idx + 1) * FEATURE_COUNT];
                bias + row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>()
            })
            .collect()
    }

    /// Class probabilities aligned with `classes`.
    pub fn predict_proba(&self, features: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        softmax(&self.decision_function(features))
    }

    /// Predict the most likely species.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Species {
        let scores = self.decision_function(features);
        let mut best = 0usize;
        let mut best_val = f64::NEG_INFINITY;
        for (idx, &score) in scores.iter().enumerate() {
            if score > best_val {
                best_val = score;
                best = idx;
            }
        }
        self.classes[best]
    }
}

/// Numerically-stable softmax over raw scores.
fn softmax(raw: &[f64]) -> Vec<f64> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = raw.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / raw.len() as f64; raw.len()];
    }
    exps.into_iter().map(|v| v / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn petal_model() -> IrisModel {
        // Scores depend on petal length only; larger petals favour later classes.
        IrisModel {
            model_version: MODEL_VERSION,
            feature_names: IrisModel::feature_names(),
            classes: Species::ALL.to_vec(),
            weights: vec![
                0.0, 0.0, -2.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 2.0, 0.0,
            ],
            bias: vec![6.0, 0.0, -10.0],
        }
    }

    #[test]
    fn predicts_argmax_species() {
        let model = petal_model();
        model.validate().unwrap();
        assert_eq!(model.predict(&[5.1, 3.5, 1.4, 0.2]), Species::Setosa);
        assert_eq!(model.predict(&[6.0, 2.9, 4.5, 1.5]), Species::Versicolor);
        assert_eq!(model.predict(&[6.3, 3.3, 6.0, 2.5]), Species::Virginica);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let sum: f64 = petal_model().predict_proba(&[5.0, 3.0, 2.0, 0.5]).iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_shape_mismatch() {
        let mut model = petal_model();
        model.bias.pop();
        assert!(model.validate().is_err());
        let mut model = petal_model();
        model.weights[0] = f64::NAN;
        assert!(model.validate().is_err());
    }

    #[test]
    fn load_json_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            IrisModel::load_json(&path),
            Err(ModelError::Parse { .. })
        ));
    }
}
