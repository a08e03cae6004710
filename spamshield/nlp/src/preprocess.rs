use std::{fmt, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    stem::{SnowballStemmer, Stemmer},
    stopwords::StopWords,
};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("url pattern"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").expect("email pattern"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{10,}\b").expect("phone pattern"));
static NON_ALPHA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z\s]").expect("non-alpha pattern"));

/// Normalizes raw message text into stemmed tokens for vectorization.
///
/// Every step is total: malformed input at worst yields an empty string.
#[derive(Clone)]
pub struct TextPreprocessor {
    stop_words: StopWords,
    stemmer: Arc<dyn Stemmer>,
    min_token_len: usize,
}

impl TextPreprocessor {
    /// Creates a preprocessor with the NLTK stop words and the Snowball stemmer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stop_words: StopWords::nltk_english(),
            stemmer: Arc::new(SnowballStemmer::english()),
            min_token_len: 3,
        }
    }

    /// Replaces the stemmer.
    #[must_use]
    pub fn with_stemmer(mut self, stemmer: Arc<dyn Stemmer>) -> Self {
        self.stemmer = stemmer;
        self
    }

    /// Replaces the stop-word set.
    #[must_use]
    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    /// Normalizes `text` and returns the stemmed tokens.
    #[must_use]
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let stripped = URL_RE.replace_all(&lowered, "");
        let stripped = EMAIL_RE.replace_all(&stripped, "");
        let stripped = PHONE_RE.replace_all(&stripped, "");
        let stripped = NON_ALPHA_RE.replace_all(&stripped, "");
        stripped
            .split_whitespace()
            .filter(|token| {
                token.chars().count() >= self.min_token_len && !self.stop_words.contains(token)
            })
            .map(|token| self.stemmer.stem(token))
            .collect()
    }

    /// Normalizes `text` into space-joined stemmed tokens.
    #[must_use]
    pub fn preprocess(&self, text: &str) -> String {
        self.tokens(text).join(" ")
    }
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TextPreprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPreprocessor")
            .field("stop_words", &self.stop_words.len())
            .field("min_token_len", &self.min_token_len)
            .finish_non_exhaustive()
    }
}
