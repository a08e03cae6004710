#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! SpamShield learning stack: TF-IDF vectorization, multinomial naive Bayes, and the spam classifier.

/// Spam classifier orchestrating preprocessing, training, prediction, and persistence.
pub mod classifier;
/// Error types for the learning stack.
pub mod error;
/// Sparse feature vectors.
pub mod features;
/// Multinomial naive Bayes model.
pub mod naive_bayes;
/// On-disk layout of the trained model pair.
pub mod persistence;
/// Evaluation metrics and training reports.
pub mod report;
/// Stratified train/test partitioning.
pub mod split;
/// TF-IDF vectorizer.
pub mod tfidf;
/// Capability traits for vectorizers and probabilistic classifiers.
pub mod traits;

pub use classifier::{Confidence, PredictionResult, SpamClassifier, TrainingSettings};
pub use error::{ClassifierError, LearningError};
pub use features::SparseVector;
pub use naive_bayes::MultinomialNb;
pub use persistence::ModelStore;
pub use report::{ClassMetrics, TrainingReport};
pub use split::{stratified_split, SplitIndices};
pub use tfidf::TfIdfVectorizer;
pub use traits::{ClassProbabilities, ProbabilisticClassifier, TextVectorizer};
