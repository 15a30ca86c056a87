//! A deterministic, from-scratch dense neural network trainer.
//!
//! `dynamic-deep-learning` trains fully-connected feed-forward networks described
//! declaratively, with no tensor library underneath: every forward pass, error
//! signal and parameter update is plain row-major arithmetic over `f64`.
//!
//! # Pieces
//!
//! - [`Activation`]: `relu`, `sigmoid`, `tanh`, `linear`, `softmax`.
//! - [`LayerBlueprint`] / [`DeepLearningLayerSpec`] / [`DeepLearningModelSpec`]:
//!   declarative layers and a chain-validated model.
//! - [`DynamicLayerEngineConfig`], [`generate_input_layers`],
//!   [`generate_domain_input_layers`]: assemble layer stacks.
//! - [`TrainingSample`] / [`TrainingMetrics`]: data in, summaries out.
//! - [`DynamicDeepLearningEngine`]: parameters, forward/backward, mini-batch
//!   gradient descent with momentum, L2 regularisation and gradient clipping.
//!
//! # Determinism
//!
//! An engine owns its RNG (seeded from the spec, default `0`). The same spec,
//! seed, dataset order, epochs and batch size reproduce the same parameters
//! and metrics. `predict` and `evaluate` never mutate the engine.
//!
//! # Dropout
//!
//! A layer's dropout is applied as a constant `(1 - dropout)` scale on its
//! activations on every forward pass, training and inference alike.
//!
//! # Quick start
//!
//! ```rust
//! use dynamic_deep_learning::{
//!     Activation, DynamicDeepLearningEngine, DynamicLayerEngineConfig, LayerBlueprint,
//!     TrainingOptions, TrainingSample,
//! };
//!
//! # fn main() -> dynamic_deep_learning::Result<()> {
//! let spec = DynamicLayerEngineConfig::new(2)
//!     .with_hidden_layers(vec![LayerBlueprint::new("hidden", 8, Activation::Tanh, 0.0)?])
//!     .with_output_layers(vec![LayerBlueprint::new("out", 1, Activation::Sigmoid, 0.0)?])
//!     .with_options(TrainingOptions::default().with_learning_rate(0.5).with_seed(Some(0)))
//!     .build_model_spec()?;
//!
//! let data = vec![
//!     TrainingSample::new(vec![0.0, 0.0], vec![0.0])?,
//!     TrainingSample::new(vec![0.0, 1.0], vec![1.0])?,
//!     TrainingSample::new(vec![1.0, 0.0], vec![1.0])?,
//!     TrainingSample::new(vec![1.0, 1.0], vec![0.0])?,
//! ];
//!
//! let mut engine = DynamicDeepLearningEngine::new(spec);
//! let history = engine.train(&data, 50, 4)?;
//! assert_eq!(history.len(), 50);
//!
//! let y = engine.predict(&[1.0, 0.0])?;
//! assert_eq!(y.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod layer;
pub mod loss;
pub mod matrix;
pub mod metrics;
pub mod optim;
pub mod presets;
mod train;

pub use activation::Activation;
pub use builder::{DynamicLayerEngineConfig, ExpansionStage, generate_input_layers};
pub use config::{DeepLearningLayerSpec, DeepLearningModelSpec, LayerBlueprint, TrainingOptions};
pub use data::{Metadata, TrainingSample, coerce_samples};
pub use engine::DynamicDeepLearningEngine;
pub use error::{Error, Result};
pub use layer::Layer;
pub use matrix::Matrix;
pub use metrics::TrainingMetrics;
pub use optim::{Gradients, OptimizerState};
pub use presets::{available_domains, generate_domain_input_layers, normalize_domain};
