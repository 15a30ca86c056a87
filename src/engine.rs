//! The training engine.
//!
//! [`DynamicDeepLearningEngine`] owns everything mutable about a model: layer
//! parameters, momentum velocities and the RNG used for initialisation and
//! shuffling. Nothing is shared between engines, so two engines built from
//! the same spec and seed follow identical trajectories.
//!
//! Forward pass per layer: `z = W x + b`, `a = activation(z)`,
//! `output = a * (1 - dropout)`. The dropout scale is a constant applied on
//! every pass; there is no stochastic masking.
//!
//! Backprop per sample, with `L` the last layer:
//!
//! - `delta_L` from [`loss`](crate::loss) (closed-form for softmax, MSE otherwise)
//! - `delta_l = (W_{l+1}^T delta_{l+1}) * activation_l'(z_l) * scale_l`
//! - `grad_W[l] += delta_l ⊗ input_l`, `grad_b[l] += delta_l`

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::loss;
use crate::{DeepLearningModelSpec, Gradients, Layer, OptimizerState, TrainingSample};

#[derive(Debug, Clone)]
pub struct DynamicDeepLearningEngine {
    pub(crate) spec: DeepLearningModelSpec,
    pub(crate) layers: Vec<Layer>,
    pub(crate) optimizer: OptimizerState,
    pub(crate) rng: StdRng,
}

/// Per-layer intermediates of one forward pass, reused across samples.
#[derive(Debug, Clone)]
pub(crate) struct Scratch {
    pre_activations: Vec<Vec<f64>>,
    activations: Vec<Vec<f64>>,
    outputs: Vec<Vec<f64>>,
    derivatives: Vec<Vec<f64>>,
    deltas: Vec<Vec<f64>>,
}

impl Scratch {
    pub(crate) fn new(layers: &[Layer]) -> Self {
        let buffers = || -> Vec<Vec<f64>> { layers.iter().map(|l| vec![0.0; l.out_dim()]).collect() };
        Self {
            pre_activations: buffers(),
            activations: buffers(),
            outputs: buffers(),
            derivatives: buffers(),
            deltas: buffers(),
        }
    }

    #[inline]
    pub(crate) fn output(&self) -> &[f64] {
        self.outputs
            .last()
            .expect("scratch must have at least one layer output")
    }
}

impl DynamicDeepLearningEngine {
    /// Build an engine and draw its initial parameters from `spec.seed()` (or `0`).
    pub fn new(spec: DeepLearningModelSpec) -> Self {
        let seed = spec.seed().unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(seed);

        let layers: Vec<Layer> = spec
            .layers()
            .iter()
            .map(|layer_spec| Layer::new_with_rng(layer_spec, &mut rng))
            .collect();
        let optimizer = OptimizerState::for_layers(&layers, spec.momentum());

        debug!(
            layers = layers.len(),
            parameters = spec.parameter_count(),
            seed,
            "engine initialised"
        );

        Self {
            spec,
            layers,
            optimizer,
            rng,
        }
    }

    /// Reseed and redraw every parameter, discarding training progress.
    ///
    /// Uses `seed` when given, otherwise the spec's seed, otherwise `0`.
    /// Momentum velocities are zeroed.
    pub fn reset_parameters(&mut self, seed: Option<u64>) {
        let seed = seed.or(self.spec.seed()).unwrap_or(0);
        self.rng = StdRng::seed_from_u64(seed);
        for layer in &mut self.layers {
            layer.init_with_rng(&mut self.rng);
        }
        self.optimizer.reset();

        debug!(seed, "parameters reset");
    }

    #[inline]
    pub fn spec(&self) -> &DeepLearningModelSpec {
        &self.spec
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.spec.input_dim()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.spec.output_dim()
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Human-readable architecture and hyperparameter description.
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// Forward pass returning only the final output.
    ///
    /// Shape contract: `input.len() == self.input_dim()`.
    pub(crate) fn forward(&self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.input_dim());

        let mut current = input.to_vec();
        for layer in &self.layers {
            let n = layer.out_dim();
            let (mut z, mut activated, mut output) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
            layer.forward(&current, &mut z, &mut activated, &mut output);
            current = output;
        }
        current
    }

    /// Forward pass keeping every intermediate in `scratch`.
    ///
    /// Returns the final output slice.
    pub(crate) fn forward_into<'a>(&self, input: &[f64], scratch: &'a mut Scratch) -> &'a [f64] {
        debug_assert_eq!(input.len(), self.input_dim());
        debug_assert_eq!(scratch.outputs.len(), self.layers.len());

        for (idx, layer) in self.layers.iter().enumerate() {
            // Borrow the previous output immutably and the current output mutably.
            let (prev, rest) = scratch.outputs.split_at_mut(idx);
            let layer_input: &[f64] = if idx == 0 { input } else { &prev[idx - 1] };
            layer.forward(
                layer_input,
                &mut scratch.pre_activations[idx],
                &mut scratch.activations[idx],
                &mut rest[0],
            );
        }

        scratch.output()
    }

    /// Accumulate one sample's parameter gradients into `grads`.
    ///
    /// `forward_into` must have been called with `sample.features()` and the
    /// same `scratch` first.
    pub(crate) fn backprop(&self, sample: &TrainingSample, scratch: &mut Scratch, grads: &mut Gradients) {
        let last = self.layers.len() - 1;

        for (idx, layer) in self.layers.iter().enumerate() {
            let derivative = &mut scratch.derivatives[idx];
            layer.activation().derivative(
                &scratch.pre_activations[idx],
                &scratch.activations[idx],
                derivative,
            );
            let scale = layer.dropout_scale();
            for d in derivative.iter_mut() {
                *d *= scale;
            }
        }

        loss::output_delta(
            self.spec.output_activation(),
            &scratch.outputs[last],
            sample.target(),
            &scratch.derivatives[last],
            sample.weight(),
            &mut scratch.deltas[last],
        );

        for idx in (0..last).rev() {
            let (left, right) = scratch.deltas.split_at_mut(idx + 1);
            let delta = &mut left[idx];
            self.layers[idx + 1].weights().transpose_mul(&right[0], delta);
            for (d, &g) in delta.iter_mut().zip(&scratch.derivatives[idx]) {
                *d *= g;
            }
        }

        for idx in 0..=last {
            let layer_input: &[f64] = if idx == 0 {
                sample.features()
            } else {
                &scratch.outputs[idx - 1]
            };
            grads.accumulate(idx, &scratch.deltas[idx], layer_input);
        }
    }

    /// Finalize the batch gradients and update parameters.
    pub(crate) fn apply_gradients(&mut self, grads: &mut Gradients) {
        grads.finalize(
            &self.layers,
            self.spec.l2_regularisation(),
            self.spec.gradient_clip(),
        );
        self.optimizer
            .step(&mut self.layers, grads, self.spec.learning_rate());
    }
}

impl fmt::Display for DynamicDeepLearningEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DynamicDeepLearningEngine ({} layers)", self.layers.len())?;
        for (idx, layer) in self.spec.layers().iter().enumerate() {
            writeln!(
                f,
                "  [{idx}] {}: {} -> {}, activation={}, dropout={}, params={}",
                layer.name(),
                layer.input_dim(),
                layer.output_dim(),
                layer.activation(),
                layer.dropout(),
                layer.parameter_count()
            )?;
        }
        writeln!(f, "  total parameters: {}", self.parameter_count())?;

        let opts = self.spec.options();
        let clip = opts
            .gradient_clip
            .map_or_else(|| "none".to_owned(), |c| c.to_string());
        let seed = opts
            .seed
            .map_or_else(|| "none".to_owned(), |s| s.to_string());
        write!(
            f,
            "  learning_rate={} momentum={} l2_regularisation={} gradient_clip={clip} seed={seed} shuffle_training={}",
            opts.learning_rate, opts.momentum, opts.l2_regularisation, opts.shuffle_training
        )
    }
}
