use rand::Rng;
use rand::distributions::{Distribution, Uniform};

use crate::{Activation, DeepLearningLayerSpec, Matrix};

/// Half-width of the uniform initialisation range: `sqrt(2 / (in + out))`.
#[inline]
pub fn glorot_bound(in_dim: usize, out_dim: usize) -> f64 {
    (2.0 / (in_dim + out_dim) as f64).sqrt()
}

/// Runtime parameters of one dense layer.
#[derive(Debug, Clone)]
pub struct Layer {
    activation: Activation,
    dropout_scale: f64,
    /// Shape (out_dim, in_dim).
    weights: Matrix,
    biases: Vec<f64>,
}

impl Layer {
    /// Allocate the layer described by `spec` and draw its parameters from `rng`.
    pub(crate) fn new_with_rng<R: Rng + ?Sized>(spec: &DeepLearningLayerSpec, rng: &mut R) -> Self {
        let mut layer = Self {
            activation: spec.activation(),
            dropout_scale: spec.dropout_scale(),
            weights: Matrix::zeros(spec.output_dim(), spec.input_dim()),
            biases: vec![0.0; spec.output_dim()],
        };
        layer.init_with_rng(rng);
        layer
    }

    /// Redraw weights (row-major) then biases i.i.d. from `U[-s, s]`.
    pub(crate) fn init_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let s = glorot_bound(self.in_dim(), self.out_dim());
        let dist = Uniform::new_inclusive(-s, s);
        for w in self.weights.as_mut_slice() {
            *w = dist.sample(rng);
        }
        for b in &mut self.biases {
            *b = dist.sample(rng);
        }
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.weights.cols()
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.weights.rows()
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn dropout_scale(&self) -> f64 {
        self.dropout_scale
    }

    #[inline]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[inline]
    pub(crate) fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    #[inline]
    pub(crate) fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Forward pass for a single sample.
    ///
    /// Computes:
    /// - `z = W * input + b`
    /// - `activated = activation(z)`
    /// - `output = activated * dropout_scale`
    ///
    /// Shape contract:
    /// - `input.len() == self.in_dim()`
    /// - `z`, `activated`, `output` have length `self.out_dim()`
    pub(crate) fn forward(
        &self,
        input: &[f64],
        z: &mut [f64],
        activated: &mut [f64],
        output: &mut [f64],
    ) {
        debug_assert_eq!(input.len(), self.in_dim());
        debug_assert_eq!(output.len(), self.out_dim());

        self.weights.affine(input, &self.biases, z);
        self.activation.forward(z, activated);
        for (o, &a) in output.iter_mut().zip(activated.iter()) {
            *o = a * self.dropout_scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn spec(in_dim: usize, out_dim: usize, activation: Activation, dropout: f64) -> DeepLearningLayerSpec {
        DeepLearningLayerSpec::new("t", in_dim, out_dim, activation, dropout).unwrap()
    }

    #[test]
    fn init_stays_within_glorot_bound() {
        let mut rng = StdRng::seed_from_u64(3);
        let layer = Layer::new_with_rng(&spec(30, 10, Activation::Relu, 0.0), &mut rng);
        let s = glorot_bound(30, 10);
        assert_eq!(s, 0.05_f64.sqrt());
        assert!(layer.weights().as_slice().iter().all(|w| w.abs() <= s));
        assert!(layer.biases().iter().all(|b| b.abs() <= s));
        assert!(layer.weights().as_slice().iter().any(|&w| w != 0.0));
        assert_eq!(layer.parameter_count(), 310);
    }

    #[test]
    fn forward_scales_by_dropout_constant() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut layer = Layer::new_with_rng(&spec(2, 2, Activation::Relu, 0.5), &mut rng);
        layer.weights_mut().as_mut_slice().copy_from_slice(&[1.0, 0.0, 0.0, -1.0]);
        layer.biases_mut().copy_from_slice(&[0.5, 0.0]);

        let (mut z, mut a, mut out) = ([0.0; 2], [0.0; 2], [0.0; 2]);
        layer.forward(&[2.0, 3.0], &mut z, &mut a, &mut out);
        assert_eq!(z, [2.5, -3.0]);
        assert_eq!(a, [2.5, 0.0]);
        assert_eq!(out, [1.25, 0.0]);
    }
}
