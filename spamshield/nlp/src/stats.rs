use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Label, Message};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("word pattern"));

const TOP_WORDS: usize = 10;

/// Token and its raw frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    /// Lowercased token.
    pub token: String,
    /// Occurrences across the class.
    pub count: usize,
}

/// Descriptive summary of a labeled dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Total number of messages.
    pub total_messages: usize,
    /// Spam messages.
    pub spam_count: usize,
    /// Ham messages.
    pub ham_count: usize,
    /// Spam share in percent (2 decimals).
    pub spam_percentage: f64,
    /// Ham share in percent (2 decimals).
    pub ham_percentage: f64,
    /// Mean spam length in characters (2 decimals).
    pub avg_spam_length: f64,
    /// Mean ham length in characters (2 decimals).
    pub avg_ham_length: f64,
    /// Ten most frequent spam tokens.
    pub top_spam_words: Vec<TokenCount>,
    /// Ten most frequent ham tokens.
    pub top_ham_words: Vec<TokenCount>,
}

/// First messages of each class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleMessages {
    /// Spam texts in dataset order.
    pub spam_samples: Vec<String>,
    /// Ham texts in dataset order.
    pub ham_samples: Vec<String>,
}

/// Search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Label of the matching message.
    pub label: Label,
    /// Matching message text.
    pub message: String,
}

/// Reporting view over a loaded dataset.
///
/// `DatasetStats::default()` stands for "no dataset": every query returns empty values.
#[derive(Debug, Clone, Default)]
pub struct DatasetStats {
    dataset: Dataset,
    summary: DatasetSummary,
}

impl DatasetStats {
    /// Computes the summary once and keeps the dataset for sampling and search.
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        let summary = summarize(&dataset);
        Self { dataset, summary }
    }

    /// Underlying dataset.
    #[must_use]
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Precomputed summary.
    #[must_use]
    pub const fn summary(&self) -> &DatasetSummary {
        &self.summary
    }

    /// First `count` messages of each class.
    #[must_use]
    pub fn samples(&self, count: usize) -> SampleMessages {
        let take = |label| {
            self.dataset
                .with_label(label)
                .take(count)
                .map(|msg| msg.text.clone())
                .collect()
        };
        SampleMessages {
            spam_samples: take(Label::Spam),
            ham_samples: take(Label::Ham),
        }
    }

    /// Case-insensitive substring search, at most `limit` hits in dataset order.
    #[must_use]
    pub fn search(&self, keyword: &str, limit: usize) -> Vec<SearchHit> {
        let needle = keyword.to_lowercase();
        self.dataset
            .messages()
            .iter()
            .filter(|msg| msg.text.to_lowercase().contains(&needle))
            .take(limit)
            .map(|msg| SearchHit {
                label: msg.label,
                message: msg.text.clone(),
            })
            .collect()
    }
}

fn summarize(dataset: &Dataset) -> DatasetSummary {
    let total = dataset.len();
    let spam_count = dataset.count(Label::Spam);
    let ham_count = dataset.count(Label::Ham);
    DatasetSummary {
        total_messages: total,
        spam_count,
        ham_count,
        spam_percentage: percentage(spam_count, total),
        ham_percentage: percentage(ham_count, total),
        avg_spam_length: average_length(dataset.with_label(Label::Spam)),
        avg_ham_length: average_length(dataset.with_label(Label::Ham)),
        top_spam_words: top_words(dataset.with_label(Label::Spam), TOP_WORDS),
        top_ham_words: top_words(dataset.with_label(Label::Ham), TOP_WORDS),
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

#[allow(clippy::cast_precision_loss)]
fn average_length<'a>(messages: impl Iterator<Item = &'a Message>) -> f64 {
    let (count, chars) = messages.fold((0usize, 0usize), |(count, chars), msg| {
        (count + 1, chars + msg.text.chars().count())
    });
    if count == 0 {
        return 0.0;
    }
    round2(chars as f64 / count as f64)
}

fn top_words<'a>(messages: impl Iterator<Item = &'a Message>, limit: usize) -> Vec<TokenCount> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for msg in messages {
        let lowered = msg.text.to_lowercase();
        for token in WORD_RE.find_iter(&lowered) {
            *counts.entry(token.as_str().to_string()).or_insert(0) += 1;
        }
    }
    // stable sort keeps first-seen order among ties
    counts.sort_by(|_, a, _, b| b.cmp(a));
    counts
        .into_iter()
        .take(limit)
        .map(|(token, count)| TokenCount { token, count })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::from_messages(vec![
            Message::new(Label::Ham, "Hello friend"),
            Message::new(Label::Spam, "WIN free cash, free entry"),
            Message::new(Label::Ham, "See you, friend"),
            Message::new(Label::Spam, "Free prize"),
            Message::new(Label::Ham, "lunch?"),
        ])
    }

    #[test]
    fn summary_counts_and_rounds() {
        let stats = DatasetStats::new(dataset());
        let summary = stats.summary();
        assert_eq!(summary.total_messages, 5);
        assert_eq!(summary.spam_count, 2);
        assert!((summary.spam_percentage - 40.0).abs() < f64::EPSILON);
        assert!((summary.ham_percentage - 60.0).abs() < f64::EPSILON);
        // (12 + 15 + 6) / 3
        assert!((summary.avg_ham_length - 11.0).abs() < f64::EPSILON);
        assert!((summary.avg_spam_length - 17.5).abs() < f64::EPSILON);
    }

    #[test]
    fn top_words_are_raw_lowercase_frequencies() {
        let stats = DatasetStats::new(dataset());
        let spam = &stats.summary().top_spam_words;
        assert_eq!(spam[0], TokenCount { token: "free".into(), count: 3 });
        assert_eq!(spam[1].token, "win");
        let ham = &stats.summary().top_ham_words;
        assert_eq!(ham[0], TokenCount { token: "friend".into(), count: 2 });
        assert_eq!(ham[1].token, "hello");
    }

    #[test]
    fn samples_take_first_messages_per_class() {
        let stats = DatasetStats::new(dataset());
        let samples = stats.samples(1);
        assert_eq!(samples.spam_samples, vec!["WIN free cash, free entry"]);
        assert_eq!(samples.ham_samples, vec!["Hello friend"]);
        assert_eq!(stats.samples(10).ham_samples.len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_and_limited() {
        let stats = DatasetStats::new(dataset());
        let hits = stats.search("FRIEND", 10);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| hit.label == Label::Ham));
        assert_eq!(stats.search("free", 1).len(), 1);
        assert!(stats.search("absent", 10).is_empty());
    }

    #[test]
    fn empty_stats_degrade_gracefully() {
        let stats = DatasetStats::default();
        assert_eq!(stats.summary(), &DatasetSummary::default());
        assert!(stats.samples(5).spam_samples.is_empty());
        assert!(stats.search("x", 5).is_empty());
    }
}
