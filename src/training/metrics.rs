//! Classification quality metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// F1, precision, and recall over binary predictions, with the positive
/// class encoded as 1. Each value lies in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
    pub n_samples: usize,
}

impl ClassificationReport {
    /// Compute the report from true labels and thresholded predictions.
    pub fn from_predictions(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Self {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;

        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t, p) {
                (1, 1) => tp += 1,
                (0, 1) => fp += 1,
                (1, 0) => fn_ += 1,
                _ => {}
            }
        }

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            f1,
            precision,
            recall,
            n_samples: y_true.len(),
        }
    }
}

/// Binary log loss over positive-class probabilities, clamped away from
/// the singularities at 0 and 1.
pub fn binary_logloss(y_true: &Array1<f64>, probs: &Array1<f64>) -> f64 {
    const EPS: f64 = 1e-15;
    let n = y_true.len().max(1) as f64;
    y_true
        .iter()
        .zip(probs.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = Array1::from_vec(vec![0i64, 1, 1, 0]);
        let report = ClassificationReport::from_predictions(&y, &y.clone());
        assert_eq!(report.f1, 1.0);
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 1.0);
        assert_eq!(report.n_samples, 4);
    }

    #[test]
    fn test_known_confusion() {
        // tp=1, fp=1, fn=1: precision=recall=f1=0.5
        let y_true = Array1::from_vec(vec![1i64, 1, 0, 0]);
        let y_pred = Array1::from_vec(vec![1i64, 0, 1, 0]);
        let report = ClassificationReport::from_predictions(&y_true, &y_pred);
        assert!((report.precision - 0.5).abs() < 1e-12);
        assert!((report.recall - 0.5).abs() < 1e-12);
        assert!((report.f1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions() {
        let y_true = Array1::from_vec(vec![1i64, 0]);
        let y_pred = Array1::from_vec(vec![0i64, 0]);
        let report = ClassificationReport::from_predictions(&y_true, &y_pred);
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);
    }

    #[test]
    fn test_metrics_bounded() {
        let y_true = Array1::from_vec(vec![1i64, 0, 1, 0, 1]);
        let y_pred = Array1::from_vec(vec![1i64, 1, 0, 0, 1]);
        let report = ClassificationReport::from_predictions(&y_true, &y_pred);
        for v in [report.f1, report.precision, report.recall] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_logloss_confident_correct_is_small() {
        let y = Array1::from_vec(vec![1.0, 0.0]);
        let good = Array1::from_vec(vec![0.99, 0.01]);
        let bad = Array1::from_vec(vec![0.01, 0.99]);
        assert!(binary_logloss(&y, &good) < binary_logloss(&y, &bad));
    }

    #[test]
    fn test_logloss_handles_extreme_probs() {
        let y = Array1::from_vec(vec![1.0, 0.0]);
        let probs = Array1::from_vec(vec![1.0, 0.0]);
        assert!(binary_logloss(&y, &probs).is_finite());
    }
}
