//! Durable model artifact plus the shared in-memory serving handle.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{info, warn};

use crate::ml::logreg::{IrisModel, ModelError, TrainError, TrainOptions, train_from_path};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("No model at {model} and no dataset at {dataset} to train one")]
    Unavailable { model: PathBuf, dataset: PathBuf },
    #[error("Training failed: {0}")]
    Train(#[from] TrainError),
    #[error("Failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Load the model at `model_path`, or train and persist one from `dataset_path`.
pub fn load_or_initialize(
    model_path: &Path,
    dataset_path: &Path,
    options: &TrainOptions,
) -> Result<IrisModel, StoreError> {
    if model_path.is_file() {
        let model = IrisModel::load_json(model_path)?;
        info!("Loaded model from {}", model_path.display());
        return Ok(model);
    }
    if !dataset_path.is_file() {
        return Err(StoreError::Unavailable {
            model: model_path.to_path_buf(),
            dataset: dataset_path.to_path_buf(),
        });
    }
    warn!(
        "No model at {}; training from {}",
        model_path.display(),
        dataset_path.display()
    );
    let model = train_from_path(dataset_path, options)?;
    save_model(&model, model_path)?;
    Ok(model)
}

/// Persist `model` as pretty JSON, replacing `path` atomically.
pub fn save_model(model: &IrisModel, path: &Path) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;
    let bytes = serde_json::to_vec_pretty(model)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    info!("Saved model to {}", path.display());
    Ok(())
}

/// Shared reference to the model serving predictions.
///
/// Readers take an `Arc` snapshot, so a concurrent [`ModelHandle::publish`]
/// never affects a prediction already in flight.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    inner: Arc<RwLock<Arc<IrisModel>>>,
}

impl ModelHandle {
    pub fn new(model: IrisModel) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(model))),
        }
    }

    /// Snapshot of the current model.
    pub fn current(&self) -> Arc<IrisModel> {
        let guard = self.inner.read().unwrap_or_else(|err| err.into_inner());
        Arc::clone(&*guard)
    }

    /// Replace the serving model wholesale.
    pub fn publish(&self, model: IrisModel) {
        let mut guard = self.inner.write().unwrap_or_else(|err| err.into_inner());
        *guard = Arc::new(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::logreg::MODEL_VERSION;
    use crate::species::Species;
    use tempfile::tempdir;

    fn constant_model(winner: Species) -> IrisModel {
        let mut bias = vec![0.0; Species::COUNT];
        bias[winner.index()] = 1.0;
        IrisModel {
            model_version: MODEL_VERSION,
            feature_names: IrisModel::feature_names(),
            classes: Species::ALL.to_vec(),
            weights: vec![0.0; Species::COUNT * 4],
            bias,
        }
    }

    #[test]
    fn save_then_load_returns_same_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let model = constant_model(Species::Versicolor);
        save_model(&model, &path).unwrap();
        let loaded = load_or_initialize(&path, &dir.path().join("absent.csv"), &TrainOptions::default())
            .unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn missing_model_and_dataset_is_unavailable() {
        let dir = tempdir().unwrap();
        let err = load_or_initialize(
            &dir.path().join("model.json"),
            &dir.path().join("iris.csv"),
            &TrainOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[test]
    fn corrupt_model_file_is_fatal_even_with_dataset() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let dataset_path = dir.path().join("iris.csv");
        std::fs::write(&model_path, b"{}").unwrap();
        std::fs::write(&dataset_path, "h\n5.1,3.5,1.4,0.2,0\n").unwrap();
        let err = load_or_initialize(&model_path, &dataset_path, &TrainOptions::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::Model(_)));
    }

    #[test]
    fn handle_snapshots_survive_publish() {
        let handle = ModelHandle::new(constant_model(Species::Setosa));
        let before = handle.current();
        handle.publish(constant_model(Species::Virginica));
        let features = [1.0, 1.0, 1.0, 1.0];
        assert_eq!(before.predict(&features), Species::Setosa);
        assert_eq!(handle.current().predict(&features), Species::Virginica);
    }
}
