//! Batch gradients and the parameter update.
//!
//! Per batch:
//!
//! 1. per-sample `delta ⊗ input` outer products accumulate into [`Gradients`]
//! 2. [`Gradients::finalize`] divides by the batch's summed sample weight, adds
//!    `l2 * parameter` and clamps to `[-clip, clip]`
//! 3. [`OptimizerState::step`] applies `-lr * grad`, directly or through a
//!    momentum velocity: `v = momentum * v - lr * grad; param += v`

use crate::{Layer, Matrix};

/// Batch-level parameter gradients (accumulate semantics).
#[derive(Debug, Clone)]
pub struct Gradients {
    d_weights: Vec<Matrix>,
    d_biases: Vec<Vec<f64>>,
    weight_sum: f64,
}

impl Gradients {
    pub(crate) fn new(layers: &[Layer]) -> Self {
        let (d_weights, d_biases) = zeros_like_params(layers);
        Self {
            d_weights,
            d_biases,
            weight_sum: 0.0,
        }
    }

    pub(crate) fn clear(&mut self) {
        for w in &mut self.d_weights {
            w.fill(0.0);
        }
        for b in &mut self.d_biases {
            b.fill(0.0);
        }
        self.weight_sum = 0.0;
    }

    pub(crate) fn add_sample_weight(&mut self, weight: f64) {
        self.weight_sum += weight;
    }

    /// `grad_W[layer] += delta ⊗ input`, `grad_b[layer] += delta`.
    pub(crate) fn accumulate(&mut self, layer: usize, delta: &[f64], input: &[f64]) {
        self.d_weights[layer].add_outer(delta, input);
        for (g, &d) in self.d_biases[layer].iter_mut().zip(delta) {
            *g += d;
        }
    }

    /// Turn the accumulated sums into the gradient fed to the update.
    pub(crate) fn finalize(&mut self, layers: &[Layer], l2: f64, clip: Option<f64>) {
        debug_assert!(self.weight_sum > 0.0, "finalize called on an empty batch");
        let weight_sum = self.weight_sum;

        for (idx, layer) in layers.iter().enumerate() {
            finalize_slice(
                self.d_weights[idx].as_mut_slice(),
                layer.weights().as_slice(),
                weight_sum,
                l2,
                clip,
            );
            finalize_slice(&mut self.d_biases[idx], layer.biases(), weight_sum, l2, clip);
        }
    }

    #[inline]
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    #[inline]
    pub fn d_weights(&self, layer: usize) -> &Matrix {
        &self.d_weights[layer]
    }

    #[inline]
    pub fn d_biases(&self, layer: usize) -> &[f64] {
        &self.d_biases[layer]
    }
}

// `weight_sum` may be subnormal, so its reciprocal is not finite.
fn finalize_slice(grads: &mut [f64], params: &[f64], weight_sum: f64, l2: f64, clip: Option<f64>) {
    for (g, &p) in grads.iter_mut().zip(params) {
        let mut v = *g / weight_sum;
        if l2 > 0.0 {
            v = l2.mul_add(p, v);
        }
        if let Some(c) = clip {
            v = v.clamp(-c, c);
        }
        *g = v;
    }
}

/// Owned optimizer state, shaped like the model's parameters.
#[derive(Debug, Clone)]
pub enum OptimizerState {
    /// Plain gradient descent (no state).
    Sgd,
    /// Gradient descent with a momentum velocity per parameter.
    SgdMomentum {
        momentum: f64,
        v_weights: Vec<Matrix>,
        v_biases: Vec<Vec<f64>>,
    },
}

impl OptimizerState {
    /// Velocity buffers are only allocated when `momentum > 0`.
    pub(crate) fn for_layers(layers: &[Layer], momentum: f64) -> Self {
        if momentum > 0.0 {
            let (v_weights, v_biases) = zeros_like_params(layers);
            OptimizerState::SgdMomentum {
                momentum,
                v_weights,
                v_biases,
            }
        } else {
            OptimizerState::Sgd
        }
    }

    /// Zero every velocity.
    pub(crate) fn reset(&mut self) {
        if let OptimizerState::SgdMomentum {
            v_weights,
            v_biases,
            ..
        } = self
        {
            for v in v_weights {
                v.fill(0.0);
            }
            for v in v_biases {
                v.fill(0.0);
            }
        }
    }

    /// Apply one update from finalized `grads`.
    pub(crate) fn step(&mut self, layers: &mut [Layer], grads: &Gradients, lr: f64) {
        match self {
            OptimizerState::Sgd => {
                for (idx, layer) in layers.iter_mut().enumerate() {
                    descend(layer.weights_mut().as_mut_slice(), grads.d_weights(idx).as_slice(), lr);
                    descend(layer.biases_mut(), grads.d_biases(idx), lr);
                }
            }
            OptimizerState::SgdMomentum {
                momentum,
                v_weights,
                v_biases,
            } => {
                debug_assert_eq!(v_weights.len(), layers.len());
                debug_assert_eq!(v_biases.len(), layers.len());

                for (idx, layer) in layers.iter_mut().enumerate() {
                    descend_with_velocity(
                        layer.weights_mut().as_mut_slice(),
                        v_weights[idx].as_mut_slice(),
                        grads.d_weights(idx).as_slice(),
                        *momentum,
                        lr,
                    );
                    descend_with_velocity(
                        layer.biases_mut(),
                        &mut v_biases[idx],
                        grads.d_biases(idx),
                        *momentum,
                        lr,
                    );
                }
            }
        }
    }
}

#[inline]
fn descend(params: &mut [f64], grads: &[f64], lr: f64) {
    debug_assert_eq!(params.len(), grads.len());
    for (p, &g) in params.iter_mut().zip(grads) {
        *p -= lr * g;
    }
}

#[inline]
fn descend_with_velocity(params: &mut [f64], velocity: &mut [f64], grads: &[f64], momentum: f64, lr: f64) {
    debug_assert_eq!(params.len(), velocity.len());
    debug_assert_eq!(params.len(), grads.len());
    for ((p, v), &g) in params.iter_mut().zip(velocity.iter_mut()).zip(grads) {
        *v = momentum * *v - lr * g;
        *p += *v;
    }
}

fn zeros_like_params(layers: &[Layer]) -> (Vec<Matrix>, Vec<Vec<f64>>) {
    let mut ws = Vec::with_capacity(layers.len());
    let mut bs = Vec::with_capacity(layers.len());
    for layer in layers {
        ws.push(Matrix::zeros(layer.out_dim(), layer.in_dim()));
        bs.push(vec![0.0; layer.out_dim()]);
    }
    (ws, bs)
}
