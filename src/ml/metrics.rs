//! Evaluation metrics reported by the training CLI: per-class
//! precision/recall/F1, accuracy, and ROC AUC.

use std::fmt;

/// ROC AUC via the Wilcoxon-Mann-Whitney statistic. Degenerate inputs (one
/// class absent, empty slices) report 0.5.
pub fn roc_auc(scores: &[f64], labels: &[u8]) -> f64 {
    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut pairs: Vec<(f64, u8)> =
        scores.iter().copied().zip(labels.iter().copied()).collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut auc = 0.0;
    let mut seen_pos = 0usize;
    for (_, label) in pairs {
        if label == 1 {
            seen_pos += 1;
        } else {
            auc += seen_pos as f64;
        }
    }
    auc / (n_pos as f64 * n_neg as f64)
}

pub fn accuracy(predictions: &[u8], labels: &[u8]) -> f64 {
    if predictions.is_empty() {
        return 0.0;
    }
    let correct = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
    correct as f64 / predictions.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class breakdown plus overall accuracy, in the shape of sklearn's
/// classification report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationReport {
    pub negative: ClassMetrics,
    pub positive: ClassMetrics,
    pub accuracy: f64,
}

pub fn classification_report(predictions: &[u8], labels: &[u8]) -> ClassificationReport {
    ClassificationReport {
        negative: class_metrics(predictions, labels, 0),
        positive: class_metrics(predictions, labels, 1),
        accuracy: accuracy(predictions, labels),
    }
}

fn class_metrics(predictions: &[u8], labels: &[u8], class: u8) -> ClassMetrics {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    let mut support = 0usize;

    for (&pred, &label) in predictions.iter().zip(labels) {
        if label == class {
            support += 1;
        }
        match (pred == class, label == class) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
    }

    let precision = if tp + fp == 0 { 0.0 } else { tp as f64 / (tp + fp) as f64 };
    let recall = if tp + fn_ == 0 { 0.0 } else { tp as f64 / (tp + fn_) as f64 };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    ClassMetrics { precision, recall, f1, support }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1", "support")?;
        for (name, m) in [("0", &self.negative), ("1", &self.positive)] {
            writeln!(
                f,
                "{:>12} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        write!(f, "{:>12} {:>39.3}", "accuracy", self.accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auc_is_one_for_perfect_ranking() {
        let scores = vec![0.9, 0.8, 0.2, 0.1];
        let labels = vec![1, 1, 0, 0];
        assert!((roc_auc(&scores, &labels) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn auc_is_zero_for_inverted_ranking() {
        let scores = vec![0.1, 0.2, 0.8, 0.9];
        let labels = vec![1, 1, 0, 0];
        assert!(roc_auc(&scores, &labels).abs() < 1e-12);
    }

    #[test]
    fn auc_falls_back_for_single_class() {
        assert_eq!(roc_auc(&[0.4, 0.6], &[1, 1]), 0.5);
    }

    #[test]
    fn report_matches_hand_computed_values() {
        let predictions = vec![1, 1, 1, 0, 0];
        let labels = vec![1, 1, 0, 1, 0];
        let report = classification_report(&predictions, &labels);
        // Positive class: TP=2, FP=1, FN=1.
        assert!((report.positive.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.positive.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.positive.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.positive.support, 3);
        // Negative class: TP=1, FP=1, FN=1.
        assert!((report.negative.precision - 0.5).abs() < 1e-12);
        assert_eq!(report.negative.support, 2);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
    }

    #[test]
    fn display_renders_all_rows() {
        let report = classification_report(&[1, 0], &[1, 0]);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("accuracy"));
    }
}
