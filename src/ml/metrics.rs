//! Evaluation metrics for the species classifier.

use crate::dataset::{FEATURE_COUNT, IrisDataset};
use crate::ml::logreg::IrisModel;
use crate::species::Species;

#[derive(Debug, Clone, PartialEq)]
/// Confusion matrix over the known species.
pub struct ConfusionMatrix {
    /// Row-major counts (`truth * COUNT + predicted`).
    pub counts: [u32; Species::COUNT * Species::COUNT],
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self {
            counts: [0; Species::COUNT * Species::COUNT],
        }
    }
}

impl ConfusionMatrix {
    pub fn add(&mut self, truth: Species, predicted: Species) {
        let idx = truth.index() * Species::COUNT + predicted.index();
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: Species, predicted: Species) -> u32 {
        self.counts[truth.index() * Species::COUNT + predicted.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| v as u64).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Precision/recall statistics for a single species.
pub struct PerClassStats {
    pub species: Species,
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Total number of true examples for the class.
    pub support: u32,
}

impl PerClassStats {
    pub fn f1(&self) -> f64 {
        if self.precision + self.recall == 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / (self.precision + self.recall)
        }
    }
}

/// Compute per-species precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    Species::ALL
        .iter()
        .map(|&species| {
            let tp = cm.get(species, species) as f64;
            let mut fp = 0f64;
            let mut fn_ = 0f64;
            let mut support = 0u32;
            for other in Species::ALL {
                let row = cm.get(species, other);
                support = support.saturating_add(row);
                if other != species {
                    fn_ += row as f64;
                    fp += cm.get(other, species) as f64;
                }
            }
            let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
            let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
            PerClassStats {
                species,
                precision,
                recall,
                support,
            }
        })
        .collect()
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let total = cm.total();
    if total == 0 {
        return 0.0;
    }
    let correct: u64 = Species::ALL.iter().map(|&s| cm.get(s, s) as u64).sum();
    correct as f64 / total as f64
}

/// Run the model over every row and tally predictions against labels.
///
/// Rows whose label is outside the species table are skipped.
pub fn evaluate(model: &IrisModel, dataset: &IrisDataset) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix::default();
    for (row, &target) in dataset.records.outer_iter().zip(dataset.targets.iter()) {
        let Some(truth) = Species::from_index(target) else {
            continue;
        };
        cm.add(truth, model.predict(&row_features(row)));
    }
    cm
}

/// Mean probability the model assigns to its own prediction over `dataset`.
pub fn mean_confidence(model: &IrisModel, dataset: &IrisDataset) -> f64 {
    if dataset.is_empty() {
        return 0.0;
    }
    let total: f64 = dataset
        .records
        .outer_iter()
        .map(|row| {
            model
                .predict_proba(&row_features(row))
                .into_iter()
                .fold(0.0, f64::max)
        })
        .sum();
    total / dataset.len() as f64
}

fn row_features(row: ndarray::ArrayView1<'_, f64>) -> [f64; FEATURE_COUNT] {
    let mut features = [0.0; FEATURE_COUNT];
    for (slot, value) in features.iter_mut().zip(row.iter()) {
        *slot = *value;
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_and_recall_from_counts() {
        let mut cm = ConfusionMatrix::default();
        cm.add(Species::Setosa, Species::Setosa);
        cm.add(Species::Setosa, Species::Setosa);
        cm.add(Species::Versicolor, Species::Virginica);
        cm.add(Species::Virginica, Species::Virginica);

        assert!((accuracy(&cm) - 0.75).abs() < 1e-12);
        let stats = precision_recall_by_class(&cm);
        assert_eq!(stats[0].support, 2);
        assert_eq!(stats[0].recall, 1.0);
        assert_eq!(stats[1].recall, 0.0);
        assert_eq!(stats[2].precision, 0.5);
        assert!((stats[2].f1() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_matrix_has_zero_accuracy() {
        assert_eq!(accuracy(&ConfusionMatrix::default()), 0.0);
    }

    #[test]
    fn confidence_tracks_top_class_probability() {
        let model = IrisModel {
            model_version: crate::ml::logreg::MODEL_VERSION,
            feature_names: IrisModel::feature_names(),
            classes: Species::ALL.to_vec(),
            weights: vec![0.0; Species::COUNT * FEATURE_COUNT],
            bias: vec![0.0, 0.0, 0.0],
        };
        let dataset = IrisDataset::from_rows(&[
            ([5.1, 3.5, 1.4, 0.2], Species::Setosa),
            ([6.3, 3.3, 6.0, 2.5], Species::Virginica),
        ]);
        assert!((mean_confidence(&model, &dataset) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(mean_confidence(&model, &IrisDataset::from_rows(&[])), 0.0);
    }
}
