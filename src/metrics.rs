//! Training and evaluation metrics.
//!
//! Metrics are summaries only; they do not participate in backprop.
//!
//! Accuracy:
//! - `output_dim == 1`: prediction and target thresholded at `0.5`.
//! - `output_dim > 1`: `argmax` of prediction vs `argmax` of target (first
//!   maximum wins ties).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `epoch` value reserved for evaluation-only summaries.
pub const EVALUATION_EPOCH: usize = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// 1-based epoch number, or [`EVALUATION_EPOCH`].
    pub epoch: usize,
    /// Sample-weighted mean loss.
    pub loss: f64,
    /// Sample-weighted accuracy in `[0, 1]`.
    pub accuracy: Option<f64>,
    pub sample_count: usize,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

impl TrainingMetrics {
    pub fn new(epoch: usize, loss: f64, accuracy: Option<f64>, sample_count: usize) -> Self {
        Self {
            epoch,
            loss,
            accuracy,
            sample_count,
            timestamp: Utc::now(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[inline]
    pub fn is_evaluation(&self) -> bool {
        self.epoch == EVALUATION_EPOCH
    }
}

impl fmt::Display for TrainingMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_evaluation() {
            write!(f, "eval")?;
        } else {
            write!(f, "epoch {}", self.epoch)?;
        }
        write!(f, ": loss={:.6}", self.loss)?;
        if let Some(acc) = self.accuracy {
            write!(f, " accuracy={acc:.4}")?;
        }
        write!(f, " samples={}", self.sample_count)?;
        if let Some(note) = &self.note {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}

/// Index of the first maximum.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Whether `prediction` counts as correct for `target`.
///
/// Shape contract: `prediction.len() == target.len() > 0`.
pub fn is_correct(prediction: &[f64], target: &[f64]) -> bool {
    debug_assert_eq!(prediction.len(), target.len());
    if prediction.len() == 1 {
        (prediction[0] >= 0.5) == (target[0] >= 0.5)
    } else {
        argmax(prediction) == argmax(target)
    }
}

/// Running sample-weighted loss and accuracy.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WeightedTally {
    loss: f64,
    correct: f64,
    weight: f64,
    count: usize,
}

impl WeightedTally {
    pub(crate) fn record(&mut self, loss: f64, correct: bool, weight: f64) {
        self.loss += loss * weight;
        if correct {
            self.correct += weight;
        }
        self.weight += weight;
        self.count += 1;
    }

    pub(crate) fn finish(self, epoch: usize) -> TrainingMetrics {
        let (loss, accuracy) = if self.weight > 0.0 {
            (self.loss / self.weight, Some(self.correct / self.weight))
        } else {
            (0.0, None)
        };
        TrainingMetrics::new(epoch, loss, accuracy, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.2, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[1.0]), 0);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), 1);
    }

    #[test]
    fn binary_and_multiclass_correctness() {
        assert!(is_correct(&[0.7], &[1.0]));
        assert!(is_correct(&[0.2], &[0.0]));
        assert!(!is_correct(&[0.49], &[1.0]));
        assert!(is_correct(&[0.5], &[1.0]));

        assert!(is_correct(&[0.1, 0.8, 0.1], &[0.0, 1.0, 0.0]));
        assert!(!is_correct(&[0.5, 0.5, 0.0], &[0.0, 1.0, 0.0]));
    }

    #[test]
    fn tally_weights_samples() {
        let mut tally = WeightedTally::default();
        tally.record(1.0, true, 3.0);
        tally.record(5.0, false, 1.0);
        let m = tally.finish(2);
        assert_eq!(m.epoch, 2);
        assert_eq!(m.sample_count, 2);
        assert_abs_diff_eq!(m.loss, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.accuracy.unwrap(), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn display_marks_evaluation() {
        let m = TrainingMetrics::new(EVALUATION_EPOCH, 0.5, Some(1.0), 4).with_note("evaluation");
        let s = m.to_string();
        assert!(s.starts_with("eval: loss=0.500000"));
        assert!(s.contains("(evaluation)"));
    }
}
