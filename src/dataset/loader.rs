//! CSV loader for the labeled Iris training table.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use thiserror::Error;

use crate::species::Species;

/// Number of feature columns preceding the label column.
pub const FEATURE_COUNT: usize = 4;

/// Feature column names in dataset order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected at least {expected} columns, found {found}")]
    MissingColumns {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid value {value:?} in column {column}")]
    InvalidFeature {
        line: usize,
        column: usize,
        value: String,
    },
    #[error("line {line}: unknown class label {value:?}")]
    InvalidLabel { line: usize, value: String },
    #[error("dataset has no rows")]
    Empty,
}

/// Labeled feature rows loaded from disk.
#[derive(Debug, Clone)]
pub struct IrisDataset {
    /// Shape: `[rows][FEATURE_COUNT]`.
    pub records: Array2<f64>,
    /// Class index per row.
    pub targets: Array1<usize>,
}

impl IrisDataset {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Build a dataset from in-memory rows.
    pub fn from_rows(rows: &[([f64; FEATURE_COUNT], Species)]) -> Self {
        let mut flat = Vec::with_capacity(rows.len() * FEATURE_COUNT);
        let mut targets = Vec::with_capacity(rows.len());
        for (features, species) in rows {
            flat.extend_from_slice(features);
            targets.push(species.index());
        }
        let records = Array2::from_shape_vec((rows.len(), FEATURE_COUNT), flat)
            .unwrap_or_else(|_| Array2::zeros((0, FEATURE_COUNT)));
        Self {
            records,
            targets: Array1::from(targets),
        }
    }

    /// Select rows by index, preserving the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            records: self.records.select(ndarray::Axis(0), indices),
            targets: self.targets.select(ndarray::Axis(0), indices),
        }
    }

    /// Shuffle rows deterministically and hold out `fraction` of them.
    ///
    /// Returns `(train, holdout)`. The holdout always keeps at least one row
    /// when `fraction > 0` and the dataset has more than one row.
    pub fn split_holdout(&self, fraction: f64, seed: u64) -> (Self, Self) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let mut holdout_len = (self.len() as f64 * fraction).round() as usize;
        if fraction > 0.0 && holdout_len == 0 && self.len() > 1 {
            holdout_len = 1;
        }
        holdout_len = holdout_len.min(self.len().saturating_sub(1));
        let (holdout, train) = indices.split_at(holdout_len);
        (self.select(train), self.select(holdout))
    }
}

/// Load the dataset CSV at `path`.
///
/// The first line is treated as a header. Blank lines are skipped and columns
/// after the label are ignored.
pub fn load_dataset(path: &Path) -> Result<IrisDataset, DatasetError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut flat = Vec::new();
    let mut targets = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 || line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < FEATURE_COUNT + 1 {
            return Err(DatasetError::MissingColumns {
                line: line_no,
                expected: FEATURE_COUNT + 1,
                found: fields.len(),
            });
        }
        for (column, raw) in fields.iter().take(FEATURE_COUNT).enumerate() {
            let value = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| DatasetError::InvalidFeature {
                    line: line_no,
                    column,
                    value: raw.to_string(),
                })?;
            flat.push(value);
        }
        let raw_label = fields[FEATURE_COUNT];
        let species = Species::parse_label(raw_label).ok_or_else(|| DatasetError::InvalidLabel {
            line: line_no,
            value: raw_label.to_string(),
        })?;
        targets.push(species.index());
    }
    if targets.is_empty() {
        return Err(DatasetError::Empty);
    }
    let records = Array2::from_shape_vec((targets.len(), FEATURE_COUNT), flat)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    Ok(IrisDataset {
        records,
        targets: Array1::from(targets),
    })
}
