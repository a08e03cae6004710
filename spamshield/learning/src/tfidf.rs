use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use spamshield_nlp::stopwords::SKLEARN_ENGLISH;

use crate::{error::LearningError, features::SparseVector, traits::TextVectorizer};

/// TF-IDF vectorizer with a bounded vocabulary.
///
/// Terms are whitespace-separated tokens of at least two characters. The
/// vocabulary keeps the `max_features` most frequent terms of the corpus
/// (ties alphabetical) and indexes them alphabetically. Weights are
/// `count * (ln((1 + n) / (1 + df)) + 1)`, rows are L2-normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    max_features: usize,
    stop_words: BTreeSet<String>,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    fitted: bool,
}

impl TfIdfVectorizer {
    /// Creates an unfitted vectorizer using the scikit-learn English stop list.
    #[must_use]
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: max_features.max(1),
            stop_words: SKLEARN_ENGLISH.iter().map(|w| (*w).to_string()).collect(),
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            fitted: false,
        }
    }

    /// Replaces the stop list.
    #[must_use]
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Term to column index mapping.
    #[must_use]
    pub const fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Inverse document frequency per column.
    #[must_use]
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

fn terms<'d>(stop_words: &BTreeSet<String>, document: &'d str) -> Vec<&'d str> {
    document
        .split_whitespace()
        .filter(|term| term.chars().count() >= 2 && !stop_words.contains(*term))
        .collect()
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(5000)
    }
}

impl TextVectorizer for TfIdfVectorizer {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&mut self, documents: &[String]) -> Result<(), LearningError> {
        if documents.is_empty() {
            return Err(LearningError::EmptyCorpus);
        }
        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in documents {
            let mut seen = HashSet::new();
            for term in terms(&self.stop_words, doc) {
                *term_freq.entry(term).or_insert(0) += 1;
                if seen.insert(term) {
                    *doc_freq.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        let kept: BTreeSet<&str> = ranked.into_iter().map(|(term, _)| term).collect();

        let n_docs = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (idx, term) in kept.into_iter().enumerate() {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term.to_string(), idx);
        }
        self.vocabulary = vocabulary;
        self.idf = idf;
        self.fitted = true;
        Ok(())
    }

    fn transform(&self, document: &str) -> Result<SparseVector, LearningError> {
        if !self.fitted {
            return Err(LearningError::NotFitted);
        }
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in terms(&self.stop_words, document) {
            if let Some(&idx) = self.vocabulary.get(term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        let entries = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();
        let mut vector = SparseVector::new(self.idf.len(), entries);
        vector.normalize();
        Ok(vector)
    }

    fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "free cash prize".into(),
            "free entri win".into(),
            "hello friend".into(),
            "friend lunch".into(),
        ]
    }

    #[test]
    fn fit_builds_alphabetical_vocabulary() {
        let mut vectorizer = TfIdfVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();
        let terms: Vec<&String> = vectorizer.vocabulary().keys().collect();
        assert_eq!(
            terms,
            vec!["cash", "entri", "free", "friend", "hello", "lunch", "prize", "win"]
        );
        assert_eq!(vectorizer.vocabulary()["cash"], 0);
        // free appears in 2 of 4 documents
        let free = vectorizer.vocabulary()["free"];
        assert!((vectorizer.idf()[free] - ((5.0f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let mut vectorizer = TfIdfVectorizer::new(2);
        vectorizer.fit(&corpus()).unwrap();
        assert_eq!(vectorizer.vocabulary_size(), 2);
        assert!(vectorizer.vocabulary().contains_key("free"));
        assert!(vectorizer.vocabulary().contains_key("friend"));
    }

    #[test]
    fn stop_words_and_single_chars_are_ignored() {
        let mut vectorizer = TfIdfVectorizer::default();
        vectorizer.fit(&["call free x".to_string()]).unwrap();
        assert_eq!(vectorizer.vocabulary_size(), 1);
    }

    #[test]
    fn transform_is_unit_length_and_ignores_unknown_terms() {
        let mut vectorizer = TfIdfVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();
        let vector = vectorizer.transform("free free zebra").unwrap();
        assert_eq!(vector.nnz(), 1);
        assert!((vector.norm() - 1.0).abs() < 1e-12);
        let empty = vectorizer.transform("").unwrap();
        assert_eq!(empty.nnz(), 0);
        assert_eq!(empty.dim(), 8);
    }

    #[test]
    fn unfitted_transform_fails() {
        let vectorizer = TfIdfVectorizer::default();
        assert_eq!(
            vectorizer.transform("free"),
            Err(LearningError::NotFitted)
        );
        assert_eq!(
            TfIdfVectorizer::default().fit(&[]),
            Err(LearningError::EmptyCorpus)
        );
    }
}
