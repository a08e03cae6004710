#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! SpamShield NLP layer: message normalization, labeled datasets, and dataset reporting.

/// Labeled message datasets and their loader.
pub mod dataset;
/// Text normalization pipeline feeding the vectorizer.
pub mod preprocess;
/// Descriptive statistics, samples, and search over a dataset.
pub mod stats;
/// Stemming capability and its Snowball adapter.
pub mod stem;
/// Fixed English stop-word lists.
pub mod stopwords;

pub use dataset::{Dataset, DatasetError, Label, Message};
pub use preprocess::TextPreprocessor;
pub use stats::{DatasetStats, DatasetSummary, SampleMessages, SearchHit, TokenCount};
pub use stem::{SnowballStemmer, Stemmer};
pub use stopwords::StopWords;
