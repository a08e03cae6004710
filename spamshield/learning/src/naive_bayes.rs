use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use spamshield_nlp::Label;

use crate::{
    error::LearningError,
    features::SparseVector,
    traits::{ClassProbabilities, ProbabilisticClassifier},
};

const N_CLASSES: usize = Label::ALL.len();

/// Multinomial naive Bayes with additive smoothing and fitted class priors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha: f64,
    class_count: Array1<f64>,
    class_log_prior: Array1<f64>,
    feature_log_prob: Array2<f64>,
    fitted: bool,
}

impl MultinomialNb {
    /// Creates an unfitted model with smoothing `alpha`.
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.max(1e-10),
            class_count: Array1::zeros(N_CLASSES),
            class_log_prior: Array1::zeros(N_CLASSES),
            feature_log_prob: Array2::zeros((N_CLASSES, 0)),
            fitted: false,
        }
    }

    /// Log prior per class (ham, spam).
    #[must_use]
    pub const fn class_log_prior(&self) -> &Array1<f64> {
        &self.class_log_prior
    }

    /// Smoothed log P(feature | class), one row per class.
    #[must_use]
    pub const fn feature_log_prob(&self) -> &Array2<f64> {
        &self.feature_log_prob
    }

    fn joint_log_likelihood(&self, features: &SparseVector) -> Result<[f64; N_CLASSES], LearningError> {
        if !self.fitted {
            return Err(LearningError::NotFitted);
        }
        if features.dim() != self.n_features() {
            return Err(LearningError::DimensionMismatch {
                expected: self.n_features(),
                actual: features.dim(),
            });
        }
        let mut jll = [0.0; N_CLASSES];
        for (class, slot) in jll.iter_mut().enumerate() {
            *slot = self.class_log_prior[class]
                + features
                    .entries()
                    .iter()
                    .map(|&(idx, value)| value * self.feature_log_prob[[class, idx]])
                    .sum::<f64>();
        }
        Ok(jll)
    }
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ProbabilisticClassifier for MultinomialNb {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), LearningError> {
        if features.is_empty() {
            return Err(LearningError::EmptyCorpus);
        }
        if features.len() != labels.len() {
            return Err(LearningError::LengthMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        let n_features = features[0].dim();
        let mut feature_count = Array2::<f64>::zeros((N_CLASSES, n_features));
        let mut class_count = Array1::<f64>::zeros(N_CLASSES);
        for (row, label) in features.iter().zip(labels) {
            if row.dim() != n_features {
                return Err(LearningError::DimensionMismatch {
                    expected: n_features,
                    actual: row.dim(),
                });
            }
            let class = label.index();
            class_count[class] += 1.0;
            for &(idx, value) in row.entries() {
                feature_count[[class, idx]] += value;
            }
        }
        for label in Label::ALL {
            if class_count[label.index()] == 0.0 {
                return Err(LearningError::MissingClass(label.to_string()));
            }
        }

        let mut feature_log_prob = feature_count.mapv(|count| count + self.alpha);
        for mut row in feature_log_prob.outer_iter_mut() {
            let log_total = row.sum().ln();
            row.mapv_inplace(|smoothed| smoothed.ln() - log_total);
        }
        let total = class_count.sum();
        self.class_log_prior = class_count.mapv(|count| (count / total).ln());
        self.class_count = class_count;
        self.feature_log_prob = feature_log_prob;
        self.fitted = true;
        Ok(())
    }

    fn n_features(&self) -> usize {
        self.feature_log_prob.ncols()
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<ClassProbabilities, LearningError> {
        let jll = self.joint_log_likelihood(features)?;
        let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = jll.iter().map(|value| (value - max).exp()).collect();
        let norm: f64 = exp.iter().sum();
        Ok(ClassProbabilities {
            ham: exp[Label::Ham.index()] / norm,
            spam: exp[Label::Spam.index()] / norm,
        })
    }
}
