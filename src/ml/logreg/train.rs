use std::path::Path;

use linfa::prelude::*;
use linfa_logistic::MultiLogisticRegression;
use thiserror::Error;

use super::{IrisModel, MODEL_VERSION};
use crate::dataset::{DatasetError, FEATURE_COUNT, IrisDataset, load_dataset};
use crate::species::Species;

/// Solver settings for the logistic regression fit.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// L2 regularization strength.
    pub alpha: f64,
    pub max_iterations: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Failed to load dataset: {0}")]
    Dataset(#[from] DatasetError),
    #[error("Training set is empty")]
    Empty,
    #[error("Logistic regression fit failed: {0}")]
    Fit(String),
    #[error("Fitted model has unknown class index {0}")]
    UnknownClass(usize),
    #[error("Fitted model is invalid: {0}")]
    Invalid(String),
}

/// Read the dataset at `path` and fit a model on all of its rows.
pub fn train_from_path(path: &Path, options: &TrainOptions) -> Result<IrisModel, TrainError> {
    let dataset = load_dataset(path)?;
    fit(&dataset, options)
}

/// Fit a multinomial logistic regression on an in-memory dataset.
pub fn fit(dataset: &IrisDataset, options: &TrainOptions) -> Result<IrisModel, TrainError> {
    if dataset.is_empty() {
        return Err(TrainError::Empty);
    }
    let observations = Dataset::new(dataset.records.clone(), dataset.targets.clone());
    let fitted = MultiLogisticRegression::default()
        .alpha(options.alpha)
        .max_iterations(options.max_iterations)
        .fit(&observations)
        .map_err(|err| TrainError::Fit(err.to_string()))?;

    // `params` is `[features][classes]`; columns follow `classes()`.
    let params = fitted.params();
    let intercept = fitted.intercept();
    let mut classes = Vec::with_capacity(fitted.classes().len());
    let mut weights = Vec::with_capacity(fitted.classes().len() * FEATURE_COUNT);
    let mut bias = Vec::with_capacity(fitted.classes().len());
    for (column, &class_idx) in fitted.classes().iter().enumerate() {
        let species = Species::from_index(class_idx).ok_or(TrainError::UnknownClass(class_idx))?;
        classes.push(species);
        weights.extend(params.column(column).iter().copied());
        bias.push(intercept[column]);
    }

    let model = IrisModel {
        model_version: MODEL_VERSION,
        feature_names: IrisModel::feature_names(),
        classes,
        weights,
        bias,
    };
    model.validate().map_err(TrainError::Invalid)?;
    tracing::debug!(
        rows = dataset.len(),
        classes = model.classes.len(),
        "Fitted logistic regression"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_rows() -> IrisDataset {
        let mut rows = Vec::new();
        for i in 0..10 {
            let jitter = i as f64 * 0.05;
            rows.push(([5.0 + jitter, 3.4, 1.4 + jitter, 0.2], Species::Setosa));
            rows.push(([6.0 + jitter, 2.8, 4.3 + jitter, 1.3], Species::Versicolor));
            rows.push(([6.6 + jitter, 3.0, 5.8 + jitter, 2.2], Species::Virginica));
        }
        IrisDataset::from_rows(&rows)
    }

    #[test]
    fn fits_separable_clusters() {
        let model = fit(&separable_rows(), &TrainOptions::default()).unwrap();
        assert_eq!(model.classes, Species::ALL.to_vec());
        assert_eq!(model.predict(&[5.1, 3.5, 1.4, 0.2]), Species::Setosa);
        assert_eq!(model.predict(&[6.7, 3.0, 5.9, 2.3]), Species::Virginica);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset = IrisDataset::from_rows(&[]);
        assert!(matches!(
            fit(&dataset, &TrainOptions::default()),
            Err(TrainError::Empty)
        ));
    }

    #[test]
    fn missing_dataset_file_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = train_from_path(&dir.path().join("absent.csv"), &TrainOptions::default())
            .unwrap_err();
        assert!(matches!(err, TrainError::Dataset(DatasetError::Io(_))));
    }
}
