//! Core data models for the diagnosis assistant

use crate::domain::Domain;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A single user-supplied measurement, numeric or still in text form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    /// Any other JSON value (null, bool, array, object); never coercible
    Other(serde_json::Value),
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<i32> for FeatureValue {
    fn from(value: i32) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

/// Named inputs for one prediction request; extra keys are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet {
    values: HashMap<String, FeatureValue>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FeatureSet
where
    K: Into<String>,
    V: Into<FeatureValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Output of one classifier call before normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    pub label: i64,
    pub positive_probability: Option<f64>,
}

/// Normalized prediction handed to display and persistence layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub domain: Domain,
    /// 0 = negative, 1 = positive
    pub label: u8,
    /// Confidence in the positive class, rounded to a fixed precision
    pub probability: f64,
    /// False when the probability was synthesized from the label
    pub calibrated: bool,
}

impl PredictionResult {
    pub fn is_positive(&self) -> bool {
        self.label == 1
    }
}

/// Metadata about a loaded model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub domain: Domain,
    pub family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub n_features: usize,
    pub supports_probability: bool,
    pub loaded_at: i64,
}
