//! Classification scoring

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};
use crate::stats::{MetricValue, RunStatistics};

/// Quality metrics for one predicted label sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScores {
    /// Number of scored examples
    pub example_count: usize,

    /// Positions where prediction equals ground truth
    pub correct_count: usize,

    /// Ground truth 0, predicted 1
    pub false_positive_count: usize,

    /// Ground truth 1, predicted 0
    pub false_negative_count: usize,

    /// correct / total, None when there are no examples
    pub accuracy: Option<f64>,
}

impl ClassificationScores {
    /// Compare predicted labels against ground truth
    pub fn compute(predicted: &[i64], truth: &[i64]) -> BenchResult<Self> {
        if predicted.len() != truth.len() {
            return Err(BenchError::LabelLengthMismatch {
                predicted: predicted.len(),
                truth: truth.len(),
            });
        }

        let mut scores = Self {
            example_count: truth.len(),
            correct_count: 0,
            false_positive_count: 0,
            false_negative_count: 0,
            accuracy: None,
        };

        for (&p, &t) in predicted.iter().zip(truth) {
            match (t, p) {
                (t, p) if t == p => scores.correct_count += 1,
                (0, 1) => scores.false_positive_count += 1,
                (1, 0) => scores.false_negative_count += 1,
                _ => {}
            }
        }

        if scores.example_count > 0 {
            scores.accuracy = Some(scores.correct_count as f64 / scores.example_count as f64);
        }

        Ok(scores)
    }

    /// Write the scores into `target` under `key_prefix`
    pub fn record(&self, target: &mut RunStatistics, key_prefix: &str) -> BenchResult<()> {
        let key = |name: &str| format!("{}{}", key_prefix, name);

        target.insert(key("example-count"), self.example_count as i64)?;
        target.insert(key("correct-count"), self.correct_count as i64)?;
        target.insert(key("false-positive-count"), self.false_positive_count as i64)?;
        target.insert(key("false-negative-count"), self.false_negative_count as i64)?;
        target.insert(
            key("accuracy"),
            self.accuracy.map(MetricValue::Float).unwrap_or(MetricValue::Undefined),
        )?;

        Ok(())
    }
}

/// Score predicted labels and record the metrics under `key_prefix`
pub fn get_classification_scores(
    predicted: &[i64],
    truth: &[i64],
    target: &mut RunStatistics,
    key_prefix: &str,
) -> BenchResult<ClassificationScores> {
    let scores = ClassificationScores::compute(predicted, truth)?;
    scores.record(target, key_prefix)?;
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_false_positive() {
        let mut stats = RunStatistics::new();
        let scores =
            get_classification_scores(&[1, 1, 1, 0], &[1, 0, 1, 0], &mut stats, "test-").unwrap();

        assert_eq!(scores.false_positive_count, 1);
        assert_eq!(scores.false_negative_count, 0);
        assert_eq!(scores.accuracy, Some(0.75));
        assert_eq!(stats.get_f64("test-accuracy"), Some(0.75));
        assert_eq!(stats.get("test-false-positive-count"), Some(MetricValue::Integer(1)));
        assert_eq!(stats.get("test-false-negative-count"), Some(MetricValue::Integer(0)));
    }

    #[test]
    fn test_length_mismatch_never_truncates() {
        let mut stats = RunStatistics::new();
        let err = get_classification_scores(&[1, 0], &[1, 0, 1], &mut stats, "test-").unwrap_err();
        assert!(matches!(
            err,
            BenchError::LabelLengthMismatch {
                predicted: 2,
                truth: 3
            }
        ));
        assert!(stats.is_empty());
    }

    #[test]
    fn test_zero_examples_accuracy_is_undefined() {
        let mut stats = RunStatistics::new();
        let scores = get_classification_scores(&[], &[], &mut stats, "test-").unwrap();
        assert_eq!(scores.accuracy, None);
        assert_eq!(stats.get("test-accuracy"), Some(MetricValue::Undefined));
        assert_eq!(stats.get("test-example-count"), Some(MetricValue::Integer(0)));
    }

    #[test]
    fn test_binary_accuracy_identity() {
        // Deterministic pseudo-random binary sequences
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next_bit = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state & 1) as i64
        };

        for len in [1usize, 2, 7, 64, 255] {
            let truth: Vec<i64> = (0..len).map(|_| next_bit()).collect();
            let predicted: Vec<i64> = (0..len).map(|_| next_bit()).collect();
            let scores = ClassificationScores::compute(&predicted, &truth).unwrap();

            let accuracy = scores.accuracy.unwrap();
            let errors = (scores.false_positive_count + scores.false_negative_count) as f64;
            assert!((accuracy - (1.0 - errors / len as f64)).abs() < 1e-12);
            assert!((0.0..=1.0).contains(&accuracy));
        }
    }

    #[test]
    fn test_multiclass_labels_count_only_exact_matches() {
        let scores = ClassificationScores::compute(&[2, 1, 0], &[2, 2, 1]).unwrap();
        assert_eq!(scores.correct_count, 1);
        assert_eq!(scores.false_negative_count, 1);
        assert_eq!(scores.false_positive_count, 0);
    }
}
