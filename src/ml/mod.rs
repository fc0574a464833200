//! Classifier training, persistence format and evaluation.

pub mod logreg;
pub mod metrics;
