use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::json;
use shared_logging::{LogLevel, Telemetry};
use spamshield_learning::{ClassifierError, SpamClassifier, TrainingReport};
use spamshield_nlp::{Dataset, DatasetError, DatasetStats};
use tokio::sync::Mutex;

use crate::{config::ServiceConfig, error::ApiError};

/// Shared state injected into every handler.
///
/// The trained classifier and the loaded dataset are immutable snapshots
/// behind `Arc`; readers clone the `Arc` and never hold a lock while
/// working. Training runs one at a time and publishes its model only
/// after the model pair was persisted.
#[derive(Debug)]
pub struct AppContext {
    config: ServiceConfig,
    telemetry: Telemetry,
    classifier: RwLock<Option<Arc<SpamClassifier>>>,
    dataset: RwLock<Option<Arc<DatasetStats>>>,
    training: Mutex<()>,
}

impl AppContext {
    /// Context with nothing loaded.
    #[must_use]
    pub fn new(config: ServiceConfig, telemetry: Telemetry) -> Self {
        Self {
            config,
            telemetry,
            classifier: RwLock::new(None),
            dataset: RwLock::new(None),
            training: Mutex::new(()),
        }
    }

    /// Context with the persisted model and the dataset loaded when available.
    ///
    /// Failures are logged and otherwise only visible through `/status`.
    #[must_use]
    pub fn bootstrap(config: ServiceConfig, telemetry: Telemetry) -> Self {
        let context = Self::new(config, telemetry);
        match context.load_model() {
            Ok(true) => context.log(LogLevel::Info, "startup.model_loaded", json!({})),
            Ok(false) => context.log(
                LogLevel::Info,
                "startup.model_missing",
                json!({ "model_dir": context.config.model_dir.display().to_string() }),
            ),
            Err(err) => context.log(
                LogLevel::Warn,
                "startup.model_load_failed",
                json!({ "error": err.to_string() }),
            ),
        }
        match context.load_dataset() {
            Ok(stats) => context.log(
                LogLevel::Info,
                "startup.dataset_loaded",
                json!({ "messages": stats.summary().total_messages }),
            ),
            Err(err) => context.log(
                LogLevel::Warn,
                "startup.dataset_unavailable",
                json!({ "error": err.to_string() }),
            ),
        }
        context
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Current classifier snapshot, if trained.
    #[must_use]
    pub fn classifier(&self) -> Option<Arc<SpamClassifier>> {
        self.classifier.read().clone()
    }

    /// Current dataset snapshot, if loaded.
    #[must_use]
    pub fn dataset(&self) -> Option<Arc<DatasetStats>> {
        self.dataset.read().clone()
    }

    /// True once a model was trained or loaded.
    #[must_use]
    pub fn model_trained(&self) -> bool {
        self.classifier.read().is_some()
    }

    /// True once a dataset was loaded.
    #[must_use]
    pub fn data_loaded(&self) -> bool {
        self.dataset.read().is_some()
    }

    /// Loads the persisted model pair and publishes it when present.
    pub fn load_model(&self) -> Result<bool, ClassifierError> {
        let mut classifier = self.fresh_classifier();
        if !classifier.load(&self.config.model_dir)? {
            return Ok(false);
        }
        *self.classifier.write() = Some(Arc::new(classifier));
        Ok(true)
    }

    /// Loads the configured dataset and publishes its statistics.
    pub fn load_dataset(&self) -> Result<Arc<DatasetStats>, DatasetError> {
        let dataset = Dataset::load(&self.config.dataset_path)?;
        Ok(self.publish_dataset(dataset))
    }

    /// Dataset snapshot, loading it off the async runtime on first use.
    pub async fn dataset_or_load(&self) -> Result<Arc<DatasetStats>, DatasetError> {
        if let Some(stats) = self.dataset() {
            return Ok(stats);
        }
        let dataset = self.read_dataset().await?;
        Ok(self.publish_dataset(dataset))
    }

    /// Retrains from the configured dataset, persists, then publishes the model.
    ///
    /// The dataset is published as soon as it parses, even when training
    /// or saving fails afterwards.
    pub async fn train(&self) -> Result<TrainingReport, ApiError> {
        let _guard = self.training.lock().await;
        let path = &self.config.dataset_path;
        if !path.is_file() {
            return Err(ApiError::Data(format!(
                "Training data not found at {}",
                path.display()
            )));
        }

        let stats = match self.read_dataset().await {
            Ok(dataset) => self.publish_dataset(dataset),
            Err(err) => return Err(self.training_failure(err.into())),
        };

        let mut classifier = self.fresh_classifier();
        let model_dir = self.config.model_dir.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let report = classifier.train_dataset(stats.dataset())?;
            classifier.save(&model_dir)?;
            Ok::<_, ClassifierError>((classifier, report))
        })
        .await
        .map_err(|err| ApiError::internal("Training failed", &err))?;

        match outcome {
            Ok((classifier, report)) => {
                *self.classifier.write() = Some(Arc::new(classifier));
                Ok(report)
            }
            Err(err) => Err(self.training_failure(err)),
        }
    }

    async fn read_dataset(&self) -> Result<Dataset, DatasetError> {
        let path = self.config.dataset_path.clone();
        tokio::task::spawn_blocking(move || Dataset::load(&path))
            .await
            .map_err(|err| DatasetError::Io {
                path: self.config.dataset_path.clone(),
                source: std::io::Error::other(err),
            })?
    }

    fn training_failure(&self, err: ClassifierError) -> ApiError {
        if err.is_data_error() {
            self.log(LogLevel::Warn, "train.rejected", json!({ "error": err.to_string() }));
            ApiError::Data(format!("Training failed: {err}"))
        } else {
            self.log(LogLevel::Error, "train.failed", json!({ "error": err.to_string() }));
            ApiError::internal("Training failed", &err)
        }
    }

    fn fresh_classifier(&self) -> SpamClassifier {
        SpamClassifier::with_settings(self.config.training.clone())
            .with_telemetry(self.telemetry.scoped("spamshield.classifier"))
    }

    fn publish_dataset(&self, dataset: Dataset) -> Arc<DatasetStats> {
        let stats = Arc::new(DatasetStats::new(dataset));
        *self.dataset.write() = Some(Arc::clone(&stats));
        stats
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        let _ = self.telemetry.log(level, message, metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::tempdir;

    fn write_dataset(path: &Path, repeats: usize) {
        fs::write(path, "ham\tHello friend\nspam\tWIN FREE CASH NOW!!!\n".repeat(repeats)).unwrap();
    }

    fn config_in(dir: &Path) -> ServiceConfig {
        ServiceConfig {
            dataset_path: dir.join("sms.txt"),
            model_dir: dir.join("models"),
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn bootstrap_without_files_starts_empty() {
        let dir = tempdir().unwrap();
        let context = AppContext::bootstrap(config_in(dir.path()), Telemetry::console("test"));
        assert!(!context.model_trained());
        assert!(!context.data_loaded());
    }

    #[tokio::test]
    async fn train_publishes_model_and_dataset() {
        let dir = tempdir().unwrap();
        write_dataset(&dir.path().join("sms.txt"), 10);
        let context = AppContext::new(config_in(dir.path()), Telemetry::console("test"));
        let report = context.train().await.unwrap();
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert!(context.model_trained());
        assert!(context.data_loaded());
        assert!(dir.path().join("models/tfidf_vectorizer.json").is_file());

        let restarted = AppContext::bootstrap(config_in(dir.path()), Telemetry::console("test"));
        assert!(restarted.model_trained());
        assert!(restarted.data_loaded());
    }

    #[tokio::test]
    async fn train_without_dataset_is_data_error() {
        let dir = tempdir().unwrap();
        let context = AppContext::new(config_in(dir.path()), Telemetry::console("test"));
        let err = context.train().await.unwrap_err();
        assert!(matches!(err, ApiError::Data(message) if message.starts_with("Training data not found at")));
        assert!(!context.model_trained());
    }

    #[tokio::test]
    async fn rejected_training_still_publishes_dataset() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("sms.txt"),
            "ham\tHello friend\nham\tSee you soon\nham\tLunch at noon?\nspam\tWIN FREE CASH NOW!!!\n",
        )
        .unwrap();
        let context = AppContext::new(config_in(dir.path()), Telemetry::console("test"));
        let err = context.train().await.unwrap_err();
        assert!(matches!(err, ApiError::Data(message) if message.starts_with("Training failed")));
        assert!(!context.model_trained());
        assert!(context.data_loaded());
        assert_eq!(context.dataset().unwrap().summary().total_messages, 4);
    }

    #[tokio::test]
    async fn dataset_or_load_loads_once_and_reports_malformed_files() {
        let dir = tempdir().unwrap();
        let context = AppContext::new(config_in(dir.path()), Telemetry::console("test"));
        fs::write(dir.path().join("sms.txt"), "ham\thello\nmaybe\tsomething\n").unwrap();
        let err = context.dataset_or_load().await.unwrap_err();
        assert!(matches!(err, DatasetError::Malformed { line: 2, .. }));
        assert!(!context.data_loaded());

        write_dataset(&dir.path().join("sms.txt"), 2);
        let first = context.dataset_or_load().await.unwrap();
        fs::remove_file(dir.path().join("sms.txt")).unwrap();
        let second = context.dataset_or_load().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(context.data_loaded());
    }

    #[tokio::test]
    async fn failed_save_does_not_publish_model() {
        let dir = tempdir().unwrap();
        write_dataset(&dir.path().join("sms.txt"), 10);
        fs::write(dir.path().join("models"), "not a directory").unwrap();
        let context = AppContext::new(config_in(dir.path()), Telemetry::console("test"));
        let err = context.train().await.unwrap_err();
        assert!(matches!(err, ApiError::Internal { .. }));
        assert!(!context.model_trained());
        assert!(context.data_loaded());
    }
}
