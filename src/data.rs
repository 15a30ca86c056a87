//! Training samples.
//!
//! A [`TrainingSample`] is a feature vector, a target vector, a positive sample
//! weight and optional free-form metadata. Samples can be built directly or
//! parsed from a mapping (`serde_json::Value`) with the keys `features`,
//! `target`, `weight` (default `1.0`) and `metadata`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SampleRecord")]
pub struct TrainingSample {
    features: Vec<f64>,
    target: Vec<f64>,
    weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
}

impl TrainingSample {
    /// Build a sample with weight `1.0` and no metadata.
    pub fn new(features: Vec<f64>, target: Vec<f64>) -> Result<Self> {
        Self::weighted(features, target, 1.0)
    }

    /// Build a sample with an explicit weight.
    pub fn weighted(features: Vec<f64>, target: Vec<f64>, weight: f64) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::InvalidData("features must not be empty".to_owned()));
        }
        if target.is_empty() {
            return Err(Error::InvalidData("target must not be empty".to_owned()));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(Error::InvalidData(format!(
                "sample weight must be finite and > 0, got {weight}"
            )));
        }
        Ok(Self {
            features,
            target,
            weight,
            metadata: None,
        })
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Parse a mapping-form sample.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidData(format!(
                "sample must be a mapping, got {}",
                value_kind(value)
            )));
        }
        let record = SampleRecord::deserialize(value)
            .map_err(|e| Error::InvalidData(format!("malformed sample: {e}")))?;
        Self::try_from(record)
    }

    #[inline]
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    #[inline]
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }
}

#[derive(Debug, Deserialize)]
struct SampleRecord {
    features: Vec<f64>,
    target: Vec<f64>,
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default)]
    metadata: Option<Metadata>,
}

fn default_weight() -> f64 {
    1.0
}

impl TryFrom<SampleRecord> for TrainingSample {
    type Error = Error;

    fn try_from(record: SampleRecord) -> Result<Self> {
        let sample = Self::weighted(record.features, record.target, record.weight)?;
        Ok(match record.metadata {
            Some(metadata) => sample.with_metadata(metadata),
            None => sample,
        })
    }
}

/// Parse a mapping-form dataset, reporting the index of the first bad record.
pub fn coerce_samples(records: &[Value]) -> Result<Vec<TrainingSample>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            TrainingSample::from_value(record).map_err(|e| match e {
                Error::InvalidData(msg) => Error::InvalidData(format!("sample {i}: {msg}")),
                other => other,
            })
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}
