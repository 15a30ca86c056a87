//! Layer-stack builder.
//!
//! [`DynamicLayerEngineConfig`] composes three ordered blueprint groups
//! (input, hidden, output) into one stack and threads widths through it to
//! produce a chain-valid [`DeepLearningModelSpec`].
//!
//! [`generate_input_layers`] produces ready-made blueprint stacks by
//! geometric expansion of an input width.
//!
//! ```rust
//! use dynamic_deep_learning::{Activation, DynamicLayerEngineConfig, LayerBlueprint};
//!
//! # fn main() -> dynamic_deep_learning::Result<()> {
//! let spec = DynamicLayerEngineConfig::new(4)
//!     .with_hidden_layers(vec![LayerBlueprint::new("hidden", 8, Activation::Relu, 0.0)?])
//!     .with_output_layers(vec![LayerBlueprint::new("out", 3, Activation::Softmax, 0.0)?])
//!     .build_model_spec()?;
//! assert_eq!(spec.input_dim(), 4);
//! assert_eq!(spec.output_dim(), 3);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::MAX_LAYER_UNITS;
use crate::{Activation, DeepLearningModelSpec, Error, LayerBlueprint, Result, TrainingOptions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Builder configuration: input width, three blueprint groups, hyperparameters.
///
/// Deserialises from a document such as:
///
/// ```json
/// {
///   "input_dim": 6,
///   "input_layers": [{"name": "in", "units": 12, "activation": "relu"}],
///   "hidden_layers": [],
///   "output_layers": [{"name": "out", "units": 1, "activation": "sigmoid"}],
///   "learning_rate": 0.01,
///   "seed": 7
/// }
/// ```
pub struct DynamicLayerEngineConfig {
    pub input_dim: usize,
    #[serde(default)]
    pub input_layers: Vec<LayerBlueprint>,
    #[serde(default)]
    pub hidden_layers: Vec<LayerBlueprint>,
    #[serde(default)]
    pub output_layers: Vec<LayerBlueprint>,
    #[serde(flatten)]
    pub options: TrainingOptions,
}

impl DynamicLayerEngineConfig {
    /// Empty configuration for inputs of width `input_dim`.
    pub fn new(input_dim: usize) -> Self {
        Self {
            input_dim,
            input_layers: Vec::new(),
            hidden_layers: Vec::new(),
            output_layers: Vec::new(),
            options: TrainingOptions::default(),
        }
    }

    /// Parse a configuration document.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse engine config: {e}")))
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse engine config: {e}")))
    }

    pub fn with_input_layers(mut self, layers: Vec<LayerBlueprint>) -> Self {
        self.input_layers = layers;
        self
    }

    pub fn with_hidden_layers(mut self, layers: Vec<LayerBlueprint>) -> Self {
        self.hidden_layers = layers;
        self
    }

    pub fn with_output_layers(mut self, layers: Vec<LayerBlueprint>) -> Self {
        self.output_layers = layers;
        self
    }

    pub fn with_options(mut self, options: TrainingOptions) -> Self {
        self.options = options;
        self
    }

    /// The full stack in order: input, hidden, output.
    pub fn stack(&self) -> impl Iterator<Item = &LayerBlueprint> {
        self.input_layers
            .iter()
            .chain(&self.hidden_layers)
            .chain(&self.output_layers)
    }

    /// Chain the stack into a [`DeepLearningModelSpec`].
    pub fn build_model_spec(&self) -> Result<DeepLearningModelSpec> {
        if self.input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
        }
        if self.stack().next().is_none() {
            return Err(Error::InvalidConfig(
                "layer stack must contain at least one layer".to_owned(),
            ));
        }
        if self.output_layers.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one output layer is required".to_owned(),
            ));
        }

        let mut layers = Vec::with_capacity(self.stack().count());
        let mut in_dim = self.input_dim;
        for blueprint in self.stack() {
            let spec = blueprint.as_spec(in_dim)?;
            in_dim = spec.output_dim();
            layers.push(spec);
        }

        DeepLearningModelSpec::new(layers, self.options)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// One step of a progressive expansion: how the previous width grows and what
/// the resulting layer looks like.
pub struct ExpansionStage {
    pub expansion: f64,
    pub activation: Activation,
    pub dropout: f64,
    pub max_units: Option<usize>,
}

/// Produce `depth` blueprints whose widths grow geometrically from `input_dim`.
///
/// Layer `k` has `round(width[k - 1] * expansion_factor)` units (half away from
/// zero, at least 1, at most `max_units` when given), where `width[0]` is
/// `input_dim`. Layers are named `{prefix}_1 .. {prefix}_depth`.
pub fn generate_input_layers(
    input_dim: usize,
    depth: usize,
    expansion_factor: f64,
    activation: Activation,
    dropout: f64,
    prefix: &str,
    max_units: Option<usize>,
) -> Result<Vec<LayerBlueprint>> {
    if depth == 0 {
        return Err(Error::InvalidConfig("depth must be > 0".to_owned()));
    }
    let stage = ExpansionStage {
        expansion: expansion_factor,
        activation,
        dropout,
        max_units,
    };
    progressive_expansion(input_dim, prefix, std::iter::repeat_n(stage, depth))
}

pub(crate) fn progressive_expansion(
    input_dim: usize,
    prefix: &str,
    stages: impl IntoIterator<Item = ExpansionStage>,
) -> Result<Vec<LayerBlueprint>> {
    if input_dim == 0 {
        return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
    }

    let mut layers = Vec::new();
    let mut width = input_dim;
    for (idx, stage) in stages.into_iter().enumerate() {
        if !(stage.expansion.is_finite() && stage.expansion > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "expansion_factor must be finite and > 0, got {}",
                stage.expansion
            )));
        }
        if stage.max_units == Some(0) {
            return Err(Error::InvalidConfig("max_units must be > 0".to_owned()));
        }

        let mut scaled = ((width as f64) * stage.expansion).round().max(1.0);
        if let Some(cap) = stage.max_units {
            scaled = scaled.min(cap as f64);
        }
        if scaled > MAX_LAYER_UNITS as f64 {
            return Err(Error::InvalidConfig(format!(
                "layer `{prefix}_{}` would have {scaled} units, above the limit of {MAX_LAYER_UNITS}",
                idx + 1
            )));
        }
        let units = scaled as usize;

        layers.push(LayerBlueprint::new(
            format!("{prefix}_{}", idx + 1),
            units,
            stage.activation,
            stage.dropout,
        )?);
        width = units;
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn bp(name: &str, units: usize, activation: Activation) -> LayerBlueprint {
        LayerBlueprint::new(name, units, activation, 0.0).unwrap()
    }

    #[test]
    fn expansion_rounds_half_away_from_zero() {
        let layers =
            generate_input_layers(10, 3, 1.5, Activation::Relu, 0.0, "input", None).unwrap();
        let units: Vec<_> = layers.iter().map(LayerBlueprint::units).collect();
        assert_eq!(units, vec![15, 23, 35]);
        assert_eq!(layers[0].name(), "input_1");
        assert_eq!(layers[2].name(), "input_3");
    }

    #[test]
    fn expansion_respects_cap_and_floor() {
        let layers =
            generate_input_layers(10, 3, 2.0, Activation::Tanh, 0.1, "x", Some(30)).unwrap();
        let units: Vec<_> = layers.iter().map(LayerBlueprint::units).collect();
        assert_eq!(units, vec![20, 30, 30]);

        let layers =
            generate_input_layers(2, 4, 0.1, Activation::Relu, 0.0, "shrink", None).unwrap();
        assert!(layers.iter().all(|l| l.units() == 1));
    }

    #[test]
    fn expansion_rejects_bad_arguments() {
        let gen_with = |input_dim, depth, factor, cap| {
            generate_input_layers(input_dim, depth, factor, Activation::Relu, 0.0, "p", cap)
        };
        assert!(gen_with(0, 2, 1.5, None).unwrap_err().is_config());
        assert!(gen_with(4, 0, 1.5, None).unwrap_err().is_config());
        assert!(gen_with(4, 2, 0.0, None).unwrap_err().is_config());
        assert!(gen_with(4, 2, -1.0, None).unwrap_err().is_config());
        assert!(gen_with(4, 2, 1.5, Some(0)).unwrap_err().is_config());
    }

    #[test]
    fn expansion_rejects_widths_beyond_the_layer_limit() {
        let err = generate_input_layers(10, 2, 1e30, Activation::Relu, 0.0, "wide", None)
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("wide_1"));

        // A cap below the limit still wins.
        let layers =
            generate_input_layers(10, 2, 1e30, Activation::Relu, 0.0, "wide", Some(64)).unwrap();
        assert!(layers.iter().all(|l| l.units() == 64));
    }

    #[test]
    fn build_threads_dims_through_groups() {
        let cfg = DynamicLayerEngineConfig::new(5)
            .with_input_layers(vec![bp("in", 7, Activation::Relu)])
            .with_hidden_layers(vec![bp("h1", 6, Activation::Tanh), bp("h2", 4, Activation::Tanh)])
            .with_output_layers(vec![bp("out", 2, Activation::Softmax)]);
        let spec = cfg.build_model_spec().unwrap();

        let dims: Vec<_> = spec
            .layers()
            .iter()
            .map(|l| (l.input_dim(), l.output_dim()))
            .collect();
        assert_eq!(dims, vec![(5, 7), (7, 6), (6, 4), (4, 2)]);
        assert_eq!(spec.input_dim(), 5);
        assert_eq!(spec.output_dim(), 2);
    }

    #[test]
    fn build_requires_output_layers() {
        let empty = DynamicLayerEngineConfig::new(3);
        assert!(empty.build_model_spec().unwrap_err().is_config());

        let no_output =
            DynamicLayerEngineConfig::new(3).with_hidden_layers(vec![bp("h", 4, Activation::Relu)]);
        let err = no_output.build_model_spec().unwrap_err();
        assert!(err.to_string().contains("output layer"));

        let zero_input =
            DynamicLayerEngineConfig::new(0).with_output_layers(vec![bp("o", 1, Activation::Linear)]);
        assert!(zero_input.build_model_spec().is_err());
    }

    #[test]
    fn parses_mapping_form_document() {
        let cfg = DynamicLayerEngineConfig::from_value(&json!({
            "input_dim": 3,
            "hidden_layers": [{ "name": "h", "units": 4, "activation": "tanh", "dropout": 0.2 }],
            "output_layers": [{ "units": 1, "activation": "sigmoid" }],
            "learning_rate": 0.05,
            "momentum": 0.5,
            "seed": 11
        }))
        .unwrap();
        assert_eq!(cfg.options.seed, Some(11));
        assert!(cfg.options.shuffle_training);

        let spec = cfg.build_model_spec().unwrap();
        assert_eq!(spec.layers()[0].dropout(), 0.2);
        assert_eq!(spec.output_activation(), Activation::Sigmoid);
        assert_eq!(spec.learning_rate(), 0.05);
        assert_eq!(spec.momentum(), 0.5);

        let bad = DynamicLayerEngineConfig::from_json_str(
            r#"{"input_dim": 3, "output_layers": [{"units": 0}]}"#,
        );
        assert!(bad.unwrap_err().is_config());
    }
}
