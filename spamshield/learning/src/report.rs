use serde::{Deserialize, Serialize};
use spamshield_nlp::Label;

/// Precision/recall/F1 for one class on the test split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Class measured.
    pub label: Label,
    /// True positives over predicted positives.
    pub precision: f64,
    /// True positives over actual positives.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Test rows carrying this label.
    pub support: usize,
}

/// Report describing a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Fraction of exact label matches on the test split.
    pub accuracy: f64,
    /// Rows used for fitting.
    pub train_size: usize,
    /// Rows used for evaluation.
    pub test_size: usize,
    /// Fitted vocabulary size.
    pub vocabulary_size: usize,
    /// Per-class metrics (ham, spam).
    pub classes: Vec<ClassMetrics>,
}

impl TrainingReport {
    /// Evaluates predictions against ground truth.
    #[must_use]
    pub fn evaluate(
        truth: &[Label],
        predicted: &[Label],
        train_size: usize,
        vocabulary_size: usize,
    ) -> Self {
        let classes = Label::ALL
            .iter()
            .map(|&label| class_metrics(label, truth, predicted))
            .collect();
        Self {
            accuracy: accuracy(truth, predicted),
            train_size,
            test_size: truth.len(),
            vocabulary_size,
            classes,
        }
    }

    /// Renders a concise summary string.
    #[must_use]
    pub fn summary(&self) -> String {
        let per_class = self
            .classes
            .iter()
            .map(|m| {
                format!(
                    "{}: p={:.2} r={:.2} f1={:.2} n={}",
                    m.label, m.precision, m.recall, m.f1, m.support
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "[NB] accuracy={:.4} train={} test={} vocab={} ({per_class})",
            self.accuracy, self.train_size, self.test_size, self.vocabulary_size
        )
    }
}

/// Fraction of positions where `predicted` equals `truth`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn accuracy(truth: &[Label], predicted: &[Label]) -> f64 {
    if truth.is_empty() || truth.len() != predicted.len() {
        return 0.0;
    }
    let hits = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn class_metrics(label: Label, truth: &[Label], predicted: &[Label]) -> ClassMetrics {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (t, p) in truth.iter().zip(predicted) {
        match (*t == label, *p == label) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    ClassMetrics {
        label,
        precision,
        recall,
        f1,
        support: tp + fn_,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Label::{Ham, Spam};

    #[test]
    fn accuracy_counts_matches() {
        assert!((accuracy(&[Ham, Spam, Ham, Spam], &[Ham, Spam, Spam, Spam]) - 0.75).abs() < 1e-12);
        assert!(accuracy(&[], &[]).abs() < f64::EPSILON);
    }

    #[test]
    fn report_support_sums_to_test_size() {
        let truth = [Ham, Ham, Ham, Spam, Spam];
        let predicted = [Ham, Ham, Spam, Spam, Spam];
        let report = TrainingReport::evaluate(&truth, &predicted, 20, 100);
        let support: usize = report.classes.iter().map(|m| m.support).sum();
        assert_eq!(support, report.test_size);
        let spam = &report.classes[Spam.index()];
        assert!((spam.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((spam.recall - 1.0).abs() < 1e-12);
        assert!(report.summary().contains("accuracy=0.8000"));
    }
}
