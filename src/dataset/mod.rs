//! Labeled training data consumed by the training routine.

pub mod loader;

pub use loader::{DatasetError, FEATURE_COUNT, FEATURE_NAMES, IrisDataset, load_dataset};
