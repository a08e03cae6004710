use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use spamshield_learning::TrainingSettings;

/// Runtime configuration of the service and the CLI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listen address of the HTTP server.
    pub bind: String,
    /// Tab-separated SMS dataset used by `/train` and the statistics endpoints.
    pub dataset_path: PathBuf,
    /// Directory holding the persisted model pair.
    pub model_dir: PathBuf,
    /// Optional JSON-lines log file.
    pub log_path: Option<PathBuf>,
    /// Training hyper-parameters.
    pub training: TrainingSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".into(),
            dataset_path: PathBuf::from("data/SMSSpamCollection.txt"),
            model_dir: PathBuf::from("models"),
            log_path: None,
            training: TrainingSettings::default(),
        }
    }
}

/// Command-line values taking precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Listen address.
    pub bind: Option<String>,
    /// Dataset path.
    pub dataset_path: Option<PathBuf>,
    /// Model directory.
    pub model_dir: Option<PathBuf>,
}

impl ServiceConfig {
    /// Loads configuration from a TOML file, resolving relative paths against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading service config {}", path.display()))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let source_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        config.resolved_against(&source_dir).validated()
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Applies command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(dataset_path) = overrides.dataset_path {
            self.dataset_path = dataset_path;
        }
        if let Some(model_dir) = overrides.model_dir {
            self.model_dir = model_dir;
        }
        self
    }

    fn resolved_against(mut self, base: &Path) -> Self {
        let resolve = |candidate: &Path| {
            if candidate.is_absolute() {
                candidate.to_path_buf()
            } else {
                base.join(candidate)
            }
        };
        self.dataset_path = resolve(&self.dataset_path);
        self.model_dir = resolve(&self.model_dir);
        self.log_path = self.log_path.as_deref().map(resolve);
        self
    }

    fn validated(self) -> Result<Self> {
        let ratio = self.training.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            bail!("training.test_ratio must lie in (0, 1), got {ratio}");
        }
        if self.training.alpha <= 0.0 {
            bail!("training.alpha must be positive, got {}", self.training.alpha);
        }
        if self.training.max_features == 0 {
            bail!("training.max_features must be at least 1");
        }
        Ok(self)
    }
}
