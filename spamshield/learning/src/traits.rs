use serde::{Deserialize, Serialize};
use spamshield_nlp::Label;

use crate::{error::LearningError, features::SparseVector};

/// Turns preprocessed text into fixed-width sparse features.
pub trait TextVectorizer: Send + Sync {
    /// Learns vocabulary and weights from the training corpus.
    fn fit(&mut self, documents: &[String]) -> Result<(), LearningError>;

    /// Transforms one document; unknown terms contribute nothing.
    fn transform(&self, document: &str) -> Result<SparseVector, LearningError>;

    /// Fitted vocabulary size (feature dimensionality).
    fn vocabulary_size(&self) -> usize;

    /// Transforms a batch of documents.
    fn transform_all(&self, documents: &[String]) -> Result<Vec<SparseVector>, LearningError> {
        documents.iter().map(|doc| self.transform(doc)).collect()
    }
}

/// Two-class probability distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    /// Probability of ham.
    pub ham: f64,
    /// Probability of spam.
    pub spam: f64,
}

impl ClassProbabilities {
    /// Probability for `label`.
    #[must_use]
    pub const fn of(&self, label: Label) -> f64 {
        match label {
            Label::Ham => self.ham,
            Label::Spam => self.spam,
        }
    }

    /// Most likely label; ties resolve to ham.
    #[must_use]
    pub fn most_likely(&self) -> Label {
        if self.spam > self.ham {
            Label::Spam
        } else {
            Label::Ham
        }
    }
}

/// Classifier producing a label and a class distribution.
pub trait ProbabilisticClassifier: Send + Sync {
    /// Fits on feature rows and their labels.
    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), LearningError>;

    /// Feature dimensionality seen at fit time; zero before fitting.
    fn n_features(&self) -> usize;

    /// Class distribution for one row.
    fn predict_proba(&self, features: &SparseVector) -> Result<ClassProbabilities, LearningError>;

    /// Predicted label for one row.
    fn predict(&self, features: &SparseVector) -> Result<Label, LearningError> {
        self.predict_proba(features).map(|proba| proba.most_likely())
    }
}
