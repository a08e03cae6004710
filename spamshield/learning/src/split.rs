use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spamshield_nlp::Label;

use crate::error::ClassifierError;

/// Row indices of the train and test partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    /// Training rows, ascending.
    pub train: Vec<usize>,
    /// Test rows, ascending.
    pub test: Vec<usize>,
}

/// Splits `labels` into train/test partitions preserving class proportions.
///
/// Each class contributes `round(n_c * test_ratio)` test rows clamped to
/// `[1, n_c - 1]`, drawn by a seeded shuffle, so classes with fewer than
/// `min_per_class` rows (never fewer than 2) are rejected.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn stratified_split(
    labels: &[Label],
    test_ratio: f64,
    seed: u64,
    min_per_class: usize,
) -> Result<SplitIndices, ClassifierError> {
    let ratio = test_ratio.clamp(0.0, 1.0);
    let min_per_class = min_per_class.max(2);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for label in Label::ALL {
        let mut rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == label)
            .map(|(idx, _)| idx)
            .collect();
        if rows.len() < min_per_class {
            return Err(ClassifierError::InsufficientData(format!(
                "class `{label}` has {} example(s); at least {min_per_class} are required for a stratified split",
                rows.len()
            )));
        }
        let n_test = ((rows.len() as f64 * ratio).round() as usize).clamp(1, rows.len() - 1);
        rows.shuffle(&mut rng);
        let (test_rows, train_rows) = rows.split_at(n_test);
        test.extend_from_slice(test_rows);
        train.extend_from_slice(train_rows);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(spam: usize, ham: usize) -> Vec<Label> {
        let mut labels = vec![Label::Spam; spam];
        labels.extend(vec![Label::Ham; ham]);
        labels
    }

    #[test]
    fn preserves_class_proportions() {
        let labels = labels(20, 80);
        let split = stratified_split(&labels, 0.2, 42, 2).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        let spam_in_test = split.test.iter().filter(|&&i| labels[i] == Label::Spam).count();
        assert_eq!(spam_in_test, 4);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let labels = labels(7, 13);
        let split = stratified_split(&labels, 0.2, 42, 2).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_split() {
        let labels = labels(10, 30);
        assert_eq!(
            stratified_split(&labels, 0.2, 42, 2).unwrap(),
            stratified_split(&labels, 0.2, 42, 2).unwrap()
        );
    }

    #[test]
    fn tiny_classes_keep_one_row_each_side() {
        let split = stratified_split(&labels(2, 2), 0.2, 42, 2).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 2);
    }

    #[test]
    fn rejects_classes_below_minimum() {
        let err = stratified_split(&labels(1, 10), 0.2, 42, 2).unwrap_err();
        assert!(err.is_data_error());
    }
}
