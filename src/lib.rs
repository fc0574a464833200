//! Iris species classifier served over HTTP.
/// Application directory resolution.
pub mod app_dirs;
/// Service configuration.
pub mod config;
/// Training data loading.
pub mod dataset;
/// Tracing setup.
pub mod logging;
/// Classifier fitting, persistence format and evaluation.
pub mod ml;
/// Model artifact persistence and the serving handle.
pub mod model_store;
/// Class label table.
pub mod species;
/// HTTP routes.
pub mod api;
