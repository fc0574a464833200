//! Service configuration loaded from `config.toml` in the app directory.
//!
//! Missing files and sections fall back to defaults. Relative paths are
//! resolved against the app directory, and a handful of `IRISD_*` environment
//! variables override the file for container-style deployments.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::ml::logreg::TrainOptions;

/// Default filename used to store the service configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_MODEL_FILE: &str = "iris_model.json";
pub const DEFAULT_DATASET_FILE: &str = "data/iris.csv";

pub const BIND_ENV: &str = "IRISD_BIND";
pub const MODEL_PATH_ENV: &str = "IRISD_MODEL_PATH";
pub const DATASET_PATH_ENV: &str = "IRISD_DATASET_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to resolve application directory: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid bind address {value:?}: {source}")]
    InvalidBind {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Fully resolved settings used by the server and training tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub serving: ServingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Model artifact and dataset locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_model_path")]
    pub model: PathBuf,
    #[serde(default = "default_dataset_path")]
    pub dataset: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            model: default_model_path(),
            dataset: default_dataset_path(),
        }
    }
}

/// Logistic regression solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl TrainingSettings {
    pub fn options(&self) -> TrainOptions {
        TrainOptions {
            alpha: self.alpha,
            max_iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServingSettings {
    /// Publish the retrained model to running predictions instead of only
    /// writing it to disk.
    #[serde(default)]
    pub reload_after_retrain: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            paths: PathSettings::default(),
            training: TrainingSettings::default(),
            serving: ServingSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Resolve relative model/dataset paths against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        if self.paths.model.is_relative() {
            self.paths.model = base.join(&self.paths.model);
        }
        if self.paths.dataset.is_relative() {
            self.paths.dataset = base.join(&self.paths.dataset);
        }
        self
    }

    /// Apply `IRISD_*` overrides using the provided variable lookup.
    pub fn apply_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(BIND_ENV) {
            self.server.bind = value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidBind { value, source })?;
        }
        if let Some(value) = lookup(MODEL_PATH_ENV) {
            self.paths.model = PathBuf::from(value);
        }
        if let Some(value) = lookup(DATASET_PATH_ENV) {
            self.paths.dataset = PathBuf::from(value);
        }
        Ok(self)
    }
}

/// Resolve the configuration file path inside the app directory.
pub(crate) fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<ServiceConfig, ConfigError> {
    let path = config_path()?;
    let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let config = load_from(&path)?
        .apply_env_overrides(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))?;
    Ok(config.resolve_paths(&root))
}

/// Parse a config file without resolving paths; a missing file yields defaults.
pub fn load_from(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if !path.exists() {
        return Ok(ServiceConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_FILE)
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_FILE)
}

fn default_alpha() -> f64 {
    1.0
}

fn default_max_iterations() -> u64 {
    100
}
