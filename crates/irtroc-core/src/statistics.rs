//! Summary statistics over `(actual, predicted)` datapoints.
//!
//! AUC uses the rank-sum (Mann-Whitney U) formulation, with tied predictions
//! sharing their average rank.

use serde::{Deserialize, Serialize};

use crate::model::Datapoint;

/// Probabilities are clamped to `[EPS, 1 - EPS]` before taking logs.
const LOG_LOSS_EPS: f64 = 1e-15;

/// Aggregate accuracy of a set of predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub positives: usize,
    pub negatives: usize,
    /// Fraction of held-out responses that were correct.
    pub observed_rate: Option<f64>,
    pub mean_predicted: Option<f64>,
    /// Area under the ROC curve. `None` unless both classes are present.
    pub auc: Option<f64>,
    pub log_loss: Option<f64>,
    pub brier: Option<f64>,
    /// Fraction classified correctly at a 0.5 threshold.
    pub accuracy: Option<f64>,
}

impl Summary {
    pub fn compute(points: &[Datapoint]) -> Self {
        let count = points.len();
        let positives = points.iter().filter(|p| p.is_positive()).count();
        let negatives = count - positives;

        if count == 0 {
            return Self {
                count,
                positives,
                negatives,
                observed_rate: None,
                mean_predicted: None,
                auc: None,
                log_loss: None,
                brier: None,
                accuracy: None,
            };
        }

        let n = count as f64;
        let mean_predicted = points.iter().map(|p| p.predicted).sum::<f64>() / n;

        let log_loss = points
            .iter()
            .map(|p| {
                let q = p.predicted.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
                if p.is_positive() {
                    -q.ln()
                } else {
                    -(1.0 - q).ln()
                }
            })
            .sum::<f64>()
            / n;

        let brier = points
            .iter()
            .map(|p| (p.predicted - f64::from(p.actual)).powi(2))
            .sum::<f64>()
            / n;

        let hits = points
            .iter()
            .filter(|p| (p.predicted >= 0.5) == p.is_positive())
            .count();

        Self {
            count,
            positives,
            negatives,
            observed_rate: Some(positives as f64 / n),
            mean_predicted: Some(mean_predicted),
            auc: auc(points),
            log_loss: Some(log_loss),
            brier: Some(brier),
            accuracy: Some(hits as f64 / n),
        }
    }
}

/// Area under the ROC curve, or `None` when only one class is present.
pub fn auc(points: &[Datapoint]) -> Option<f64> {
    let positives = points.iter().filter(|p| p.is_positive()).count();
    let negatives = points.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<&Datapoint> = points.iter().collect();
    order.sort_by(|a, b| a.predicted.total_cmp(&b.predicted));

    // Sum of 1-based ranks of the positives, ties averaged.
    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && order[j + 1].predicted == order[i].predicted {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        let tied_positives = order[i..=j].iter().filter(|p| p.is_positive()).count();
        rank_sum += avg_rank * tied_positives as f64;
        i = j + 1;
    }

    let p = positives as f64;
    let q = negatives as f64;
    Some((rank_sum - p * (p + 1.0) / 2.0) / (p * q))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(pairs: &[(bool, f64)]) -> Vec<Datapoint> {
        pairs.iter().map(|&(c, p)| Datapoint::new(c, p)).collect()
    }

    #[test]
    fn perfect_ranking() {
        let points = pts(&[(false, 0.1), (false, 0.2), (true, 0.8), (true, 0.9)]);
        assert_eq!(auc(&points), Some(1.0));
    }

    #[test]
    fn inverted_ranking() {
        let points = pts(&[(true, 0.1), (false, 0.9)]);
        assert_eq!(auc(&points), Some(0.0));
    }

    #[test]
    fn constant_predictions_are_chance() {
        let points = pts(&[(true, 0.5), (false, 0.5), (true, 0.5), (false, 0.5)]);
        assert_eq!(auc(&points), Some(0.5));
    }

    #[test]
    fn partial_ranking() {
        // One of four positive/negative pairs is misordered.
        let points = pts(&[(false, 0.2), (true, 0.3), (false, 0.4), (true, 0.9)]);
        assert!((auc(&points).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn single_class_has_no_auc() {
        assert_eq!(auc(&pts(&[(true, 0.2), (true, 0.9)])), None);
        assert_eq!(auc(&[]), None);
    }

    #[test]
    fn summary_metrics() {
        let s = Summary::compute(&pts(&[(true, 1.0), (false, 0.0), (true, 0.5), (false, 0.5)]));
        assert_eq!(s.count, 4);
        assert_eq!(s.positives, 2);
        assert_eq!(s.negatives, 2);
        assert_eq!(s.observed_rate, Some(0.5));
        assert_eq!(s.mean_predicted, Some(0.5));
        assert!((s.brier.unwrap() - 0.125).abs() < 1e-12);
        // 0.5 counts as a positive call: three of four are right.
        assert_eq!(s.accuracy, Some(0.75));
        let expected_log_loss = 2.0 * 2f64.ln() / 4.0;
        assert!((s.log_loss.unwrap() - expected_log_loss).abs() < 1e-9);
    }

    #[test]
    fn log_loss_is_finite_for_confident_misses() {
        let s = Summary::compute(&pts(&[(true, 0.0), (false, 1.0)]));
        assert!(s.log_loss.unwrap().is_finite());
    }

    #[test]
    fn empty_summary() {
        let s = Summary::compute(&[]);
        assert_eq!(s.count, 0);
        assert!(s.auc.is_none());
        assert!(s.log_loss.is_none());
    }
}
