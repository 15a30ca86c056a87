//! Loss functions and the output-layer error signal.
//!
//! The loss is chosen by the output activation:
//!
//! - `softmax` output: cross-entropy `-sum(t * ln(max(p, eps)))`
//! - anything else: mean squared error `mean((p - t)^2)`

use crate::Activation;

/// Floor applied to predictions before taking the logarithm.
pub const CROSS_ENTROPY_EPS: f64 = 1e-12;

/// Mean squared error.
///
/// Shape contract: `pred.len() == target.len()`.
pub fn mse(pred: &[f64], target: &[f64]) -> f64 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );

    if pred.is_empty() {
        return 0.0;
    }

    let mut sum_sq = 0.0;
    for (&p, &t) in pred.iter().zip(target) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
    }
    sum_sq / pred.len() as f64
}

/// Categorical cross-entropy of probabilities `pred` against `target`.
pub fn cross_entropy(pred: &[f64], target: &[f64]) -> f64 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );

    -pred
        .iter()
        .zip(target)
        .map(|(&p, &t)| t * p.max(CROSS_ENTROPY_EPS).ln())
        .sum::<f64>()
}

/// Loss for one sample given the model's output activation.
pub fn sample_loss(output: Activation, pred: &[f64], target: &[f64]) -> f64 {
    match output {
        Activation::Softmax => cross_entropy(pred, target),
        _ => mse(pred, target),
    }
}

/// Error signal `dL/dz` of the output layer for one weighted sample.
///
/// - softmax: `(p - t) * weight`
/// - otherwise: `(p - t) * derivative * (2 / n) * weight`
///
/// `derivative` already carries the layer's dropout scale.
pub(crate) fn output_delta(
    output: Activation,
    pred: &[f64],
    target: &[f64],
    derivative: &[f64],
    weight: f64,
    delta: &mut [f64],
) {
    debug_assert_eq!(pred.len(), target.len());
    debug_assert_eq!(pred.len(), derivative.len());
    debug_assert_eq!(pred.len(), delta.len());

    match output {
        Activation::Softmax => {
            for ((d, &p), &t) in delta.iter_mut().zip(pred).zip(target) {
                *d = (p - t) * weight;
            }
        }
        _ => {
            let scale = 2.0 / pred.len() as f64 * weight;
            for (((d, &p), &t), &g) in delta.iter_mut().zip(pred).zip(target).zip(derivative) {
                *d = (p - t) * g * scale;
            }
        }
    }
}
