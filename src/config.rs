//! Declarative layer and model configuration.
//!
//! - [`LayerBlueprint`]: a layer described without its input width.
//! - [`DeepLearningLayerSpec`]: a concrete layer with known input/output widths.
//! - [`DeepLearningModelSpec`]: an ordered, chain-validated stack of layer specs
//!   plus the training hyperparameters ([`TrainingOptions`]).

use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Result};

pub const MIN_LEARNING_RATE: f64 = 1e-5;
pub const MAX_MOMENTUM: f64 = 0.99;
pub const MIN_GRADIENT_CLIP: f64 = 0.01;
/// Upper bound on any layer width, keeping `output_dim * input_dim` weight
/// buffers addressable.
pub const MAX_LAYER_UNITS: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Optimisation hyperparameters carried by a [`DeepLearningModelSpec`].
///
/// Values are clamped into their valid ranges when a model spec is built:
///
/// - `learning_rate >= 1e-5`
/// - `momentum` in `[0, 0.99]`
/// - `l2_regularisation >= 0`
/// - `gradient_clip >= 0.01` when present
pub struct TrainingOptions {
    pub learning_rate: f64,
    pub momentum: f64,
    pub l2_regularisation: f64,
    pub gradient_clip: Option<f64>,
    pub seed: Option<u64>,
    pub shuffle_training: bool,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            momentum: 0.0,
            l2_regularisation: 0.0,
            gradient_clip: None,
            seed: None,
            shuffle_training: true,
        }
    }
}

impl TrainingOptions {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_l2_regularisation(mut self, l2: f64) -> Self {
        self.l2_regularisation = l2;
        self
    }

    pub fn with_gradient_clip(mut self, clip: Option<f64>) -> Self {
        self.gradient_clip = clip;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shuffle_training(mut self, shuffle: bool) -> Self {
        self.shuffle_training = shuffle;
        self
    }

    /// Reject non-finite values and clamp the rest into range.
    pub fn sanitized(self) -> Result<Self> {
        let finite = |field: &str, v: f64| {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(Error::InvalidConfig(format!("{field} must be finite, got {v}")))
            }
        };

        let learning_rate = finite("learning_rate", self.learning_rate)?.max(MIN_LEARNING_RATE);
        let momentum = finite("momentum", self.momentum)?.clamp(0.0, MAX_MOMENTUM);
        let l2_regularisation = finite("l2_regularisation", self.l2_regularisation)?.max(0.0);
        let gradient_clip = match self.gradient_clip {
            Some(clip) => Some(finite("gradient_clip", clip)?.max(MIN_GRADIENT_CLIP)),
            None => None,
        };

        Ok(Self {
            learning_rate,
            momentum,
            l2_regularisation,
            gradient_clip,
            seed: self.seed,
            shuffle_training: self.shuffle_training,
        })
    }
}

fn validate_dropout(name: &str, dropout: f64) -> Result<()> {
    if !(dropout.is_finite() && (0.0..1.0).contains(&dropout)) {
        return Err(Error::InvalidConfig(format!(
            "layer `{name}` dropout must be in [0, 1), got {dropout}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlueprintRecord")]
/// A layer described by its output width only.
///
/// Becomes a [`DeepLearningLayerSpec`] once chained after a predecessor via
/// [`LayerBlueprint::as_spec`].
pub struct LayerBlueprint {
    name: String,
    units: usize,
    activation: Activation,
    dropout: f64,
}

impl LayerBlueprint {
    pub fn new(
        name: impl Into<String>,
        units: usize,
        activation: Activation,
        dropout: f64,
    ) -> Result<Self> {
        let name = name.into();
        if units == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer `{name}` units must be > 0"
            )));
        }
        if units > MAX_LAYER_UNITS {
            return Err(Error::InvalidConfig(format!(
                "layer `{name}` units must be <= {MAX_LAYER_UNITS}, got {units}"
            )));
        }
        validate_dropout(&name, dropout)?;
        Ok(Self {
            name,
            units,
            activation,
            dropout,
        })
    }

    /// Parse a mapping-form blueprint:
    /// `{"name": .., "units": .., "activation": .., "dropout": ..}`.
    ///
    /// `units` is required; `activation` defaults to `relu`, `dropout` to `0.0`
    /// and `name` to `dense`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let record = BlueprintRecord::deserialize(value)
            .map_err(|e| Error::InvalidConfig(format!("malformed layer blueprint: {e}")))?;
        Self::try_from(record)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn units(&self) -> usize {
        self.units
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn dropout(&self) -> f64 {
        self.dropout
    }

    /// Concrete layer spec taking `input_dim` inputs.
    pub fn as_spec(&self, input_dim: usize) -> Result<DeepLearningLayerSpec> {
        DeepLearningLayerSpec::new(
            self.name.clone(),
            input_dim,
            self.units,
            self.activation,
            self.dropout,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlueprintRecord {
    #[serde(default = "default_layer_name")]
    name: String,
    units: i64,
    #[serde(default = "default_activation_name")]
    activation: String,
    #[serde(default)]
    dropout: f64,
}

fn default_layer_name() -> String {
    "dense".to_owned()
}

fn default_activation_name() -> String {
    Activation::Relu.name().to_owned()
}

impl TryFrom<BlueprintRecord> for LayerBlueprint {
    type Error = Error;

    fn try_from(record: BlueprintRecord) -> Result<Self> {
        if record.units <= 0 {
            return Err(Error::InvalidConfig(format!(
                "layer `{}` units must be > 0, got {}",
                record.name, record.units
            )));
        }
        let activation = record.activation.parse()?;
        Self::new(record.name, record.units as usize, activation, record.dropout)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A concrete dense layer: `output_dim x input_dim` weights plus biases.
pub struct DeepLearningLayerSpec {
    name: String,
    input_dim: usize,
    output_dim: usize,
    activation: Activation,
    dropout: f64,
}

impl DeepLearningLayerSpec {
    pub fn new(
        name: impl Into<String>,
        input_dim: usize,
        output_dim: usize,
        activation: Activation,
        dropout: f64,
    ) -> Result<Self> {
        let name = name.into();
        if input_dim == 0 || output_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer `{name}` dims must be > 0, got input_dim={input_dim} output_dim={output_dim}"
            )));
        }
        if input_dim > MAX_LAYER_UNITS || output_dim > MAX_LAYER_UNITS {
            return Err(Error::InvalidConfig(format!(
                "layer `{name}` dims must be <= {MAX_LAYER_UNITS}, got input_dim={input_dim} output_dim={output_dim}"
            )));
        }
        validate_dropout(&name, dropout)?;
        Ok(Self {
            name,
            input_dim,
            output_dim,
            activation,
            dropout,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn dropout(&self) -> f64 {
        self.dropout
    }

    /// Constant multiplier applied to every activation of this layer.
    #[inline]
    pub fn dropout_scale(&self) -> f64 {
        1.0 - self.dropout
    }

    /// Number of weights plus biases.
    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.output_dim * self.input_dim + self.output_dim
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// An ordered stack of layers whose widths chain, plus hyperparameters.
pub struct DeepLearningModelSpec {
    layers: Vec<DeepLearningLayerSpec>,
    #[serde(flatten)]
    options: TrainingOptions,
}

impl DeepLearningModelSpec {
    /// Validate the layer chain and clamp `options`.
    ///
    /// Fails if `layers` is empty or if any `layers[i].output_dim()` differs from
    /// `layers[i + 1].input_dim()`.
    pub fn new(layers: Vec<DeepLearningLayerSpec>, options: TrainingOptions) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig(
                "model must have at least one layer".to_owned(),
            ));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_dim != pair[1].input_dim {
                return Err(Error::InvalidConfig(format!(
                    "layer {} (`{}`) input_dim {} does not match previous output_dim {}",
                    i + 1,
                    pair[1].name,
                    pair[1].input_dim,
                    pair[0].output_dim
                )));
            }
        }

        Ok(Self {
            layers,
            options: options.sanitized()?,
        })
    }

    #[inline]
    pub fn layers(&self) -> &[DeepLearningLayerSpec] {
        &self.layers
    }

    #[inline]
    pub fn options(&self) -> &TrainingOptions {
        &self.options
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].output_dim
    }

    /// Activation of the final layer.
    pub fn output_activation(&self) -> Activation {
        self.layers[self.layers.len() - 1].activation
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.options.learning_rate
    }

    #[inline]
    pub fn momentum(&self) -> f64 {
        self.options.momentum
    }

    #[inline]
    pub fn l2_regularisation(&self) -> f64 {
        self.options.l2_regularisation
    }

    #[inline]
    pub fn gradient_clip(&self) -> Option<f64> {
        self.options.gradient_clip
    }

    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.options.seed
    }

    #[inline]
    pub fn shuffle_training(&self) -> bool {
        self.options.shuffle_training
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(DeepLearningLayerSpec::parameter_count).sum()
    }
}
