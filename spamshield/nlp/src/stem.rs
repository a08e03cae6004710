use std::fmt;

use rust_stemmers::Algorithm;

/// Reduces a word to its root form.
pub trait Stemmer: Send + Sync {
    /// Stems a single lowercase token.
    fn stem(&self, word: &str) -> String;

    /// Stems every token in order.
    fn stem_all(&self, tokens: &[String]) -> Vec<String> {
        tokens.iter().map(|token| self.stem(token)).collect()
    }
}

/// English Snowball (Porter2) stemmer backed by `rust-stemmers`.
pub struct SnowballStemmer {
    inner: rust_stemmers::Stemmer,
}

impl SnowballStemmer {
    /// Creates the English stemmer.
    #[must_use]
    pub fn english() -> Self {
        Self {
            inner: rust_stemmers::Stemmer::create(Algorithm::English),
        }
    }
}

impl Default for SnowballStemmer {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Debug for SnowballStemmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowballStemmer")
            .field("algorithm", &"english")
            .finish()
    }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, word: &str) -> String {
        self.inner.stem(word).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_common_suffixes() {
        let stemmer = SnowballStemmer::english();
        assert_eq!(stemmer.stem("running"), "run");
        assert_eq!(stemmer.stem("calls"), "call");
        assert_eq!(stemmer.stem("prizes"), "prize");
    }

    #[test]
    fn stem_all_preserves_order() {
        let stemmer = SnowballStemmer::default();
        let tokens = vec!["winning".to_string(), "cash".to_string()];
        assert_eq!(stemmer.stem_all(&tokens), vec!["win", "cash"]);
    }
}
