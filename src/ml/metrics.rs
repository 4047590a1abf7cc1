//! Binary classification metrics.
//!
//! Builds a confusion matrix from predicted and true labels and derives
//! per-class precision, recall and F1 together with macro and
//! support-weighted averages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Metrics for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Held-out evaluation of a binary classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// Indexed by class label (0, 1).
    pub classes: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_count: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

impl ClassificationReport {
    /// Compare `predictions` to `labels` (both 0/1, equal length).
    #[must_use]
    pub fn compute(predictions: &[u8], labels: &[u8]) -> Self {
        let mut tp: usize = 0;
        let mut fp: usize = 0;
        let mut tn: usize = 0;
        let mut fn_count: usize = 0;

        for (&pred, &label) in predictions.iter().zip(labels) {
            match (pred, label) {
                (1, 1) => tp += 1,
                (1, 0) => fp += 1,
                (0, 0) => tn += 1,
                (0, 1) => fn_count += 1,
                _ => {}
            }
        }

        let total = tp + fp + tn + fn_count;
        let accuracy = ratio(tp + tn, total);

        let negative = {
            let precision = ratio(tn, tn + fn_count);
            let recall = ratio(tn, tn + fp);
            ClassMetrics {
                precision,
                recall,
                f1: f1(precision, recall),
                support: tn + fp,
            }
        };
        let positive = {
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_count);
            ClassMetrics {
                precision,
                recall,
                f1: f1(precision, recall),
                support: tp + fn_count,
            }
        };

        let classes = [negative, positive];
        let macro_avg = ClassMetrics {
            precision: (negative.precision + positive.precision) / 2.0,
            recall: (negative.recall + positive.recall) / 2.0,
            f1: (negative.f1 + positive.f1) / 2.0,
            support: total,
        };
        let weight = |get: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| get(c) * c.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
            support: total,
        };

        Self {
            accuracy,
            classes,
            macro_avg,
            weighted_avg,
            tp,
            fp,
            tn,
            fn_count,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, m) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let labels = [0, 1, 1, 0];
        let m = ClassificationReport::compute(&labels, &labels);
        assert!((m.accuracy - 1.0).abs() < 1e-9);
        assert!((m.classes[1].precision - 1.0).abs() < 1e-9);
        assert!((m.classes[0].recall - 1.0).abs() < 1e-9);
        assert!((m.macro_avg.f1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_predictions() {
        // tp=3 fp=1 tn=4 fn=2
        let preds = [1, 1, 1, 1, 0, 0, 0, 0, 0, 0];
        let labels = [1, 1, 1, 0, 0, 0, 0, 0, 1, 1];
        let m = ClassificationReport::compute(&preds, &labels);

        assert_eq!((m.tp, m.fp, m.tn, m.fn_count), (3, 1, 4, 2));
        assert!((m.accuracy - 0.7).abs() < 1e-9);
        assert!((m.classes[1].precision - 0.75).abs() < 1e-9);
        assert!((m.classes[1].recall - 0.6).abs() < 1e-9);
        assert!((m.classes[0].precision - 4.0 / 6.0).abs() < 1e-9);
        assert!((m.classes[0].recall - 0.8).abs() < 1e-9);
        assert_eq!(m.classes[0].support, 5);
        assert_eq!(m.classes[1].support, 5);

        let expected_weighted = (m.classes[0].f1 * 5.0 + m.classes[1].f1 * 5.0) / 10.0;
        assert!((m.weighted_avg.f1 - expected_weighted).abs() < 1e-9);
    }

    #[test]
    fn test_no_positive_predictions() {
        let m = ClassificationReport::compute(&[0, 0, 0], &[0, 1, 0]);
        assert!(m.classes[1].precision.abs() < 1e-9);
        assert!(m.classes[1].f1.abs() < 1e-9);
    }

    #[test]
    fn test_display_layout() {
        let m = ClassificationReport::compute(&[0, 1], &[0, 1]);
        let text = m.to_string();
        assert!(text.starts_with("Accuracy: 1.0000"));
        assert!(text.contains("precision"));
        assert!(text.contains("macro avg"));
        assert!(text.contains("weighted avg"));
    }
}
