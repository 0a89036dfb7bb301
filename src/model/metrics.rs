//! Classification diagnostics for the outcome model.
//!
//! None of these gate anything at runtime; they are reported after training and
//! validation.

use serde::{Deserialize, Serialize};
use std::fmt;

const DECISION_THRESHOLD: f64 = 0.5;
const PROBABILITY_EPSILON: f64 = 1e-15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub samples: usize,
    pub accuracy: f64,
    /// `None` when only one class is present.
    pub roc_auc: Option<f64>,
    pub log_loss: f64,
    pub brier_score: f64,
    pub confusion: ConfusionMatrix,
}

/// `labels` are 0.0 / 1.0; a probability strictly above 0.5 counts as a positive call.
pub fn evaluate(probabilities: &[f64], labels: &[f64]) -> ClassificationMetrics {
    let samples = probabilities.len().min(labels.len());
    let confusion = confusion_matrix(probabilities, labels);
    let correct = confusion.true_positives + confusion.true_negatives;

    ClassificationMetrics {
        samples,
        accuracy: ratio(correct, samples),
        roc_auc: roc_auc(probabilities, labels),
        log_loss: log_loss(probabilities, labels),
        brier_score: brier_score(probabilities, labels),
        confusion,
    }
}

pub fn confusion_matrix(probabilities: &[f64], labels: &[f64]) -> ConfusionMatrix {
    let mut matrix = ConfusionMatrix::default();
    for (&p, &label) in probabilities.iter().zip(labels) {
        let predicted = p > DECISION_THRESHOLD;
        let actual = label > 0.5;
        match (actual, predicted) {
            (false, false) => matrix.true_negatives += 1,
            (false, true) => matrix.false_positives += 1,
            (true, false) => matrix.false_negatives += 1,
            (true, true) => matrix.true_positives += 1,
        }
    }
    matrix
}

/// Rank-based (Mann-Whitney) area under the ROC curve; ties get averaged ranks.
pub fn roc_auc(probabilities: &[f64], labels: &[f64]) -> Option<f64> {
    let mut scored: Vec<(f64, bool)> = probabilities
        .iter()
        .zip(labels)
        .map(|(&p, &label)| (p, label > 0.5))
        .collect();

    let positives = scored.iter().filter(|(_, positive)| *positive).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < scored.len() {
        let mut end = start;
        while end + 1 < scored.len() && scored[end + 1].0 == scored[start].0 {
            end += 1;
        }
        // Ranks are 1-based; tied block shares the mean of its ranks.
        let mean_rank = (start + end) as f64 / 2.0 + 1.0;
        let tied_positives = scored[start..=end].iter().filter(|(_, p)| *p).count();
        positive_rank_sum += mean_rank * tied_positives as f64;
        start = end + 1;
    }

    let positives = positives as f64;
    let negatives = negatives as f64;
    Some((positive_rank_sum - positives * (positives + 1.0) / 2.0) / (positives * negatives))
}

pub fn log_loss(probabilities: &[f64], labels: &[f64]) -> f64 {
    let n = probabilities.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }

    let total: f64 = probabilities
        .iter()
        .zip(labels)
        .map(|(&p, &label)| {
            let p = p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
            -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
        })
        .sum();
    total / n as f64
}

pub fn brier_score(probabilities: &[f64], labels: &[f64]) -> f64 {
    let n = probabilities.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }

    let total: f64 = probabilities
        .iter()
        .zip(labels)
        .map(|(&p, &label)| (p - label).powi(2))
        .sum();
    total / n as f64
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl fmt::Display for ClassificationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples:     {}", self.samples)?;
        writeln!(f, "Accuracy:    {:.3}", self.accuracy)?;
        match self.roc_auc {
            Some(auc) => writeln!(f, "ROC-AUC:     {:.3}", auc)?,
            None => writeln!(f, "ROC-AUC:     n/a (single class)")?,
        }
        writeln!(f, "Log loss:    {:.4}", self.log_loss)?;
        writeln!(f, "Brier score: {:.4}", self.brier_score)?;
        writeln!(f, "Confusion matrix:")?;
        writeln!(
            f,
            "  TN {:>6}  FP {:>6}",
            self.confusion.true_negatives, self.confusion.false_positives
        )?;
        write!(
            f,
            "  FN {:>6}  TP {:>6}",
            self.confusion.false_negatives, self.confusion.true_positives
        )
    }
}
