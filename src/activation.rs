//! Activation functions.
//!
//! A dense layer computes a pre-activation vector `z = W x + b` and then maps it
//! through an activation: `a = activation(z)`.
//!
//! Activations operate on whole vectors because `softmax` normalises across the
//! layer. Derivatives are expressed in whichever quantity is natural for the
//! kind:
//!
//! - `relu`: in terms of the pre-activation `z`
//! - `sigmoid` / `tanh`: in terms of the activated output `a`
//! - `linear`: constant `1`
//! - `softmax`: constant `1`; the engine handles a softmax output layer with the
//!   closed-form cross-entropy gradient instead of a Jacobian.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Activation applied by a layer.
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
    Softmax,
}

impl Activation {
    /// Every supported activation, in canonical order.
    pub const ALL: [Activation; 5] = [
        Activation::Relu,
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Linear,
        Activation::Softmax,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Linear => "linear",
            Activation::Softmax => "softmax",
        }
    }

    /// Apply the activation to `z`, writing into `out`.
    ///
    /// Shape contract: `z.len() == out.len()`.
    pub fn forward(self, z: &[f64], out: &mut [f64]) {
        debug_assert_eq!(z.len(), out.len());

        match self {
            Activation::Relu => {
                for (o, &x) in out.iter_mut().zip(z) {
                    *o = x.max(0.0);
                }
            }
            Activation::Sigmoid => {
                for (o, &x) in out.iter_mut().zip(z) {
                    *o = sigmoid(x);
                }
            }
            Activation::Tanh => {
                for (o, &x) in out.iter_mut().zip(z) {
                    *o = x.tanh();
                }
            }
            Activation::Linear => out.copy_from_slice(z),
            Activation::Softmax => softmax(z, out),
        }
    }

    /// Element-wise derivative of the activation.
    ///
    /// `z` is the pre-activation and `activated` the matching output of
    /// [`Activation::forward`] (before any dropout scaling).
    pub fn derivative(self, z: &[f64], activated: &[f64], out: &mut [f64]) {
        debug_assert_eq!(z.len(), out.len());
        debug_assert_eq!(activated.len(), out.len());

        match self {
            Activation::Relu => {
                for (o, &x) in out.iter_mut().zip(z) {
                    *o = if x > 0.0 { 1.0 } else { 0.0 };
                }
            }
            Activation::Sigmoid => {
                for (o, &a) in out.iter_mut().zip(activated) {
                    *o = a * (1.0 - a);
                }
            }
            Activation::Tanh => {
                for (o, &a) in out.iter_mut().zip(activated) {
                    *o = 1.0 - a * a;
                }
            }
            Activation::Linear | Activation::Softmax => out.fill(1.0),
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "linear" | "identity" => Ok(Activation::Linear),
            "softmax" => Ok(Activation::Softmax),
            other => Err(Error::InvalidConfig(format!(
                "unsupported activation `{other}`; expected one of relu, sigmoid, tanh, linear, softmax"
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

fn softmax(z: &[f64], out: &mut [f64]) {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for (o, &x) in out.iter_mut().zip(z) {
        *o = (x - max).exp();
        sum += *o;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
}
