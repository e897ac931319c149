//! Classification metrics on the held-out test set.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Evaluation of one model against one test partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Share of correct predictions
    pub accuracy: f64,
    /// TP / (TP + FP), 0 when nothing was predicted positive
    pub precision: f64,
    /// TP / (TP + FN), 0 when there are no positives
    pub recall: f64,
    /// Harmonic mean of precision and recall, 0 when both are 0
    pub f1: f64,
    /// Area under the ROC curve; `None` for single-class labels
    pub auc: Option<f64>,
    /// `[[tn, fp], [fn, tp]]`
    pub confusion: [[usize; 2]; 2],
    /// Rows evaluated
    pub n: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Score probabilities against true labels.
///
/// # Arguments
/// * `y_true` - Labels in {0, 1}
/// * `proba` - P(label = 1) per row
/// * `threshold` - Rows with `proba >= threshold` are predicted 1
pub fn evaluate(y_true: &[u8], proba: &[f64], threshold: f64) -> Result<Metrics> {
    if y_true.is_empty() {
        return Err(ModelError::EmptyEvaluationSet);
    }
    if y_true.len() != proba.len() {
        return Err(ModelError::DimensionMismatch {
            expected: y_true.len(),
            actual: proba.len(),
        });
    }

    let mut confusion = [[0usize; 2]; 2];
    for (y, p) in y_true.iter().zip(proba) {
        let predicted = usize::from(*p >= threshold);
        confusion[usize::from(*y == 1)][predicted] += 1;
    }
    let [[tn, fp], [fn_, tp]] = confusion;

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(Metrics {
        accuracy: ratio(tp + tn, y_true.len()),
        precision,
        recall,
        f1,
        auc: roc_auc(y_true, proba),
        confusion,
        n: y_true.len(),
    })
}

/// Mann-Whitney AUC with average ranks for ties.
pub fn roc_auc(y_true: &[u8], proba: &[f64]) -> Option<f64> {
    let n_pos = y_true.iter().filter(|y| **y == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..proba.len()).collect();
    order.sort_by(|&a, &b| proba[a].total_cmp(&proba[b]));

    let mut ranks = vec![0.0; proba.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && proba[order[end + 1]] == proba[order[start]] {
            end += 1;
        }
        // 1-based average rank of the tie block
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &i in &order[start..=end] {
            ranks[i] = rank;
        }
        start = end + 1;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(y, _)| **y == 1)
        .map(|(_, r)| r)
        .sum();
    let n_pos = n_pos as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_confusion_layout() {
        let y = [0, 0, 1, 1, 1];
        let p = [0.2, 0.7, 0.9, 0.4, 0.6];
        let m = evaluate(&y, &p, 0.5).unwrap();

        assert_eq!(m.confusion, [[1, 1], [1, 2]]);
        assert_relative_eq!(m.accuracy, 0.6);
        assert_relative_eq!(m.precision, 2.0 / 3.0);
        assert_relative_eq!(m.recall, 2.0 / 3.0);
        assert_relative_eq!(m.f1, 2.0 / 3.0);
        assert_eq!(m.n, 5);
    }

    #[test]
    fn test_zero_division() {
        let m = evaluate(&[0, 1], &[0.1, 0.2], 0.5).unwrap();
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[rstest]
    #[case(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9], Some(1.0))]
    #[case(&[0, 0, 1, 1], &[0.9, 0.8, 0.2, 0.1], Some(0.0))]
    #[case(&[0, 1], &[0.5, 0.5], Some(0.5))]
    #[case(&[0, 1, 0, 1], &[0.1, 0.4, 0.5, 0.8], Some(0.75))]
    #[case(&[1, 1], &[0.3, 0.6], None)]
    fn test_auc(#[case] y: &[u8], #[case] p: &[f64], #[case] expected: Option<f64>) {
        match (roc_auc(y, p), expected) {
            (Some(a), Some(e)) => assert_relative_eq!(a, e),
            (a, e) => assert_eq!(a, e),
        }
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(evaluate(&[], &[], 0.5), Err(ModelError::EmptyEvaluationSet)));
    }

    #[test]
    fn test_threshold_inclusive() {
        let m = evaluate(&[1], &[0.5], 0.5).unwrap();
        assert_eq!(m.confusion[1][1], 1);
    }
}
