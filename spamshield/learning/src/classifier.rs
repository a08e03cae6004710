use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use shared_logging::{LogLevel, Telemetry};
use spamshield_nlp::{Dataset, Label, TextPreprocessor};

use crate::{
    error::{ClassifierError, LearningError},
    naive_bayes::MultinomialNb,
    persistence::ModelStore,
    report::TrainingReport,
    split::stratified_split,
    tfidf::TfIdfVectorizer,
    traits::{ProbabilisticClassifier, TextVectorizer},
};

/// Hyper-parameters of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Fraction of each class held out for evaluation.
    pub test_ratio: f64,
    /// Seed of the split shuffle.
    pub seed: u64,
    /// Vocabulary bound of the vectorizer.
    pub max_features: usize,
    /// Additive smoothing of the naive Bayes model.
    pub alpha: f64,
    /// Minimum examples per class.
    pub min_class_examples: usize,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            max_features: 5000,
            alpha: 1.0,
            min_class_examples: 2,
        }
    }
}

/// Class probabilities reported with a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    /// Probability the message is spam.
    pub spam: f64,
    /// Probability the message is ham.
    pub ham: f64,
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted label.
    pub prediction: Label,
    /// Convenience flag, equal to `prediction == Label::Spam`.
    pub is_spam: bool,
    /// Class distribution.
    pub confidence: Confidence,
}

#[derive(Debug, Clone)]
struct TrainedModel<V, C> {
    vectorizer: V,
    classifier: C,
}

/// Spam classifier: preprocessing, a vectorizer, and a probabilistic model.
///
/// Starts untrained. `train*` and `load` replace the fitted pair only on
/// success, so a failed run keeps the previous model usable.
#[derive(Debug, Clone)]
pub struct SpamClassifier<V = TfIdfVectorizer, C = MultinomialNb> {
    preprocessor: TextPreprocessor,
    settings: TrainingSettings,
    blueprint: TrainedModel<V, C>,
    model: Option<TrainedModel<V, C>>,
    telemetry: Option<Telemetry>,
}

impl SpamClassifier {
    /// Untrained classifier with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(TrainingSettings::default())
    }

    /// Untrained classifier whose TF-IDF/naive Bayes pair follows `settings`.
    #[must_use]
    pub fn with_settings(settings: TrainingSettings) -> Self {
        let vectorizer = TfIdfVectorizer::new(settings.max_features);
        let classifier = MultinomialNb::new(settings.alpha);
        Self::with_models(vectorizer, classifier, settings)
    }
}

impl Default for SpamClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, C> SpamClassifier<V, C>
where
    V: TextVectorizer + Clone + Serialize + DeserializeOwned,
    C: ProbabilisticClassifier + Clone + Serialize + DeserializeOwned,
{
    /// Untrained classifier fitting clones of the given vectorizer and model.
    #[must_use]
    pub fn with_models(vectorizer: V, classifier: C, settings: TrainingSettings) -> Self {
        Self {
            preprocessor: TextPreprocessor::new(),
            settings,
            blueprint: TrainedModel {
                vectorizer,
                classifier,
            },
            model: None,
            telemetry: None,
        }
    }

    /// Replaces the text preprocessor.
    #[must_use]
    pub fn with_preprocessor(mut self, preprocessor: TextPreprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Attaches structured telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Training settings in use.
    #[must_use]
    pub const fn settings(&self) -> &TrainingSettings {
        &self.settings
    }

    /// True once a model was trained or loaded.
    #[must_use]
    pub const fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Trains from the dataset at `path`; returns test accuracy.
    pub fn train(&mut self, path: impl AsRef<Path>) -> Result<f64, ClassifierError> {
        self.train_report(path).map(|report| report.accuracy)
    }

    /// Trains from the dataset at `path`; returns the full evaluation report.
    pub fn train_report(&mut self, path: impl AsRef<Path>) -> Result<TrainingReport, ClassifierError> {
        let dataset = Dataset::load(path.as_ref())?;
        self.train_dataset(&dataset)
    }

    /// Trains on an already loaded dataset.
    pub fn train_dataset(&mut self, dataset: &Dataset) -> Result<TrainingReport, ClassifierError> {
        let documents: Vec<String> = dataset
            .messages()
            .iter()
            .map(|message| self.preprocessor.preprocess(&message.text))
            .collect();
        let labels: Vec<Label> = dataset.messages().iter().map(|message| message.label).collect();
        let split = stratified_split(
            &labels,
            self.settings.test_ratio,
            self.settings.seed,
            self.settings.min_class_examples,
        )?;

        let pick_docs = |rows: &[usize]| rows.iter().map(|&i| documents[i].clone()).collect::<Vec<_>>();
        let pick_labels = |rows: &[usize]| rows.iter().map(|&i| labels[i]).collect::<Vec<_>>();
        let (train_docs, train_labels) = (pick_docs(&split.train), pick_labels(&split.train));
        let (test_docs, test_labels) = (pick_docs(&split.test), pick_labels(&split.test));

        let mut vectorizer = self.blueprint.vectorizer.clone();
        vectorizer.fit(&train_docs)?;
        let train_features = vectorizer.transform_all(&train_docs)?;
        let mut classifier = self.blueprint.classifier.clone();
        classifier.fit(&train_features, &train_labels)?;

        let predicted = vectorizer
            .transform_all(&test_docs)?
            .iter()
            .map(|features| classifier.predict(features))
            .collect::<Result<Vec<_>, _>>()?;
        let report = TrainingReport::evaluate(
            &test_labels,
            &predicted,
            train_docs.len(),
            vectorizer.vocabulary_size(),
        );

        self.model = Some(TrainedModel {
            vectorizer,
            classifier,
        });
        self.log(
            LogLevel::Info,
            "classifier.trained",
            json!({
                "accuracy": report.accuracy,
                "train_size": report.train_size,
                "test_size": report.test_size,
                "vocabulary_size": report.vocabulary_size,
            }),
        );
        Ok(report)
    }

    /// Classifies one raw message.
    pub fn predict(&self, message: &str) -> Result<PredictionResult, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;
        let processed = self.preprocessor.preprocess(message);
        let features = model.vectorizer.transform(&processed)?;
        let proba = model.classifier.predict_proba(&features)?;
        let prediction = proba.most_likely();
        Ok(PredictionResult {
            prediction,
            is_spam: prediction == Label::Spam,
            confidence: Confidence {
                spam: proba.spam,
                ham: proba.ham,
            },
        })
    }

    /// Persists the fitted pair under `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<(), ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;
        let store = ModelStore::new(dir.as_ref());
        store.save(&model.vectorizer, &model.classifier)?;
        self.log(
            LogLevel::Info,
            "classifier.saved",
            json!({ "dir": store.dir().display().to_string() }),
        );
        Ok(())
    }

    /// Loads a persisted pair from `dir`; `Ok(false)` when none is present.
    ///
    /// A vectorizer whose vocabulary does not match the classifier's
    /// feature count was not fitted with it and is rejected.
    pub fn load(&mut self, dir: impl AsRef<Path>) -> Result<bool, ClassifierError> {
        let store = ModelStore::new(dir.as_ref());
        let Some((vectorizer, classifier)) = store.load::<V, C>()? else {
            self.log(
                LogLevel::Debug,
                "classifier.load.missing",
                json!({ "dir": store.dir().display().to_string() }),
            );
            return Ok(false);
        };
        if vectorizer.vocabulary_size() != classifier.n_features() {
            let err = LearningError::DimensionMismatch {
                expected: classifier.n_features(),
                actual: vectorizer.vocabulary_size(),
            };
            self.log(
                LogLevel::Warn,
                "classifier.load.mismatched",
                json!({ "dir": store.dir().display().to_string(), "error": err.to_string() }),
            );
            return Err(err.into());
        }
        self.model = Some(TrainedModel {
            vectorizer,
            classifier,
        });
        self.log(
            LogLevel::Info,
            "classifier.loaded",
            json!({ "dir": store.dir().display().to_string() }),
        );
        Ok(true)
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}
