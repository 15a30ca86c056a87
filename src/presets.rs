//! Domain presets for input stacks.
//!
//! Each preset is a list of [`ExpansionStage`]s applied progressively to the
//! caller's input width (see [`generate_input_layers`](crate::generate_input_layers)).
//! Domain names are normalised (trimmed, lowercased, `-`/space folded to `_`)
//! and resolved through an alias table.

use crate::builder::{ExpansionStage, progressive_expansion};
use crate::{Activation, Error, LayerBlueprint, Result};

struct DomainPreset {
    name: &'static str,
    aliases: &'static [&'static str],
    stages: &'static [ExpansionStage],
}

const fn stage(
    expansion: f64,
    activation: Activation,
    dropout: f64,
    max_units: usize,
) -> ExpansionStage {
    ExpansionStage {
        expansion,
        activation,
        dropout,
        max_units: Some(max_units),
    }
}

const PRESETS: &[DomainPreset] = &[
    DomainPreset {
        name: "market",
        aliases: &["markets", "trading", "trade", "price", "prices", "ohlcv"],
        stages: &[
            stage(2.0, Activation::Relu, 0.1, 256),
            stage(1.5, Activation::Relu, 0.1, 256),
            stage(0.75, Activation::Tanh, 0.05, 128),
        ],
    },
    DomainPreset {
        name: "risk",
        aliases: &["risk_management", "risk_scoring", "exposure"],
        stages: &[
            stage(1.5, Activation::Tanh, 0.05, 128),
            stage(1.25, Activation::Tanh, 0.05, 128),
            stage(0.5, Activation::Sigmoid, 0.0, 64),
        ],
    },
    DomainPreset {
        name: "sentiment",
        aliases: &["nlp", "text", "narrative", "news"],
        stages: &[
            stage(3.0, Activation::Relu, 0.2, 512),
            stage(0.5, Activation::Relu, 0.1, 256),
        ],
    },
    DomainPreset {
        name: "order_flow",
        aliases: &["orderflow", "flow", "microstructure"],
        stages: &[
            stage(2.0, Activation::Relu, 0.05, 192),
            stage(2.0, Activation::Relu, 0.05, 192),
            stage(0.5, Activation::Linear, 0.0, 96),
        ],
    },
    DomainPreset {
        name: "generic",
        aliases: &["general", "default"],
        stages: &[
            stage(1.5, Activation::Relu, 0.0, 128),
            stage(1.0, Activation::Relu, 0.0, 128),
        ],
    },
];

/// Canonical key for a domain name: trimmed, lowercased, `-` and spaces as `_`.
pub fn normalize_domain(domain: &str) -> String {
    domain
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Canonical names of every preset.
pub fn available_domains() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

fn find_preset(domain: &str) -> Option<&'static DomainPreset> {
    let key = normalize_domain(domain);
    PRESETS
        .iter()
        .find(|p| p.name == key || p.aliases.contains(&key.as_str()))
}

/// Blueprint stack for a named domain preset, expanded from `input_dim`.
///
/// Layers are named `{domain}_input_1 ..` using the canonical domain name.
pub fn generate_domain_input_layers(domain: &str, input_dim: usize) -> Result<Vec<LayerBlueprint>> {
    let preset = find_preset(domain).ok_or_else(|| {
        Error::InvalidConfig(format!(
            "unknown domain preset `{domain}`; expected one of {}",
            available_domains().join(", ")
        ))
    })?;

    progressive_expansion(
        input_dim,
        &format!("{}_input", preset.name),
        preset.stages.iter().copied(),
    )
}
