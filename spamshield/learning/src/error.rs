use std::path::PathBuf;

use spamshield_nlp::DatasetError;
use thiserror::Error;

/// Errors raised by vectorizers and classifiers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LearningError {
    /// Fitting was attempted on no samples.
    #[error("cannot fit on an empty corpus")]
    EmptyCorpus,
    /// Feature and label counts differ.
    #[error("{features} feature rows but {labels} labels")]
    LengthMismatch {
        /// Number of feature rows.
        features: usize,
        /// Number of labels.
        labels: usize,
    },
    /// A class had no training samples.
    #[error("class `{0}` has no training samples")]
    MissingClass(String),
    /// Model used before `fit`.
    #[error("model has not been fitted")]
    NotFitted,
    /// Vector dimensionality does not match the fitted model.
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch {
        /// Fitted dimensionality.
        expected: usize,
        /// Provided dimensionality.
        actual: usize,
    },
}

/// Errors raised by [`crate::SpamClassifier`].
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Operation requires a trained model.
    #[error("model needs to be trained first")]
    NotTrained,
    /// Dataset missing, unreadable, or malformed.
    #[error(transparent)]
    Data(#[from] DatasetError),
    /// Dataset cannot support a stratified split.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    /// Filesystem failure while persisting or loading artifacts.
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Artifact (de)serialization failed.
    #[error("artifact {} could not be (de)serialized: {source}", path.display())]
    Serialization {
        /// Artifact path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// Vectorizer or classifier failure.
    #[error("model error: {0}")]
    Model(#[from] LearningError),
}

impl ClassifierError {
    /// True for errors caused by the input dataset rather than the system.
    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(self, Self::Data(_) | Self::InsufficientData(_))
    }
}
