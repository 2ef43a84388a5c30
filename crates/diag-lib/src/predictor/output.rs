//! Prediction output normalization
//!
//! Converts a scored inference into a PredictionResult: the label must be
//! binary, the probability must sit in [0, 1], and it is rounded to a
//! fixed number of decimal digits for storage and display stability.

use super::error::PredictionError;
use super::fallback::Scored;
use crate::domain::Domain;
use crate::models::PredictionResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Decimal digits kept in returned probabilities
pub const PROBABILITY_PRECISION: u32 = 4;

/// What to do with a probability outside [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbabilityPolicy {
    /// Fail the request with ProbabilityRange
    #[default]
    Reject,
    /// Clamp into range; NaN is still rejected
    Clamp,
}

impl FromStr for ProbabilityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ProbabilityPolicy::Reject),
            "clamp" => Ok(ProbabilityPolicy::Clamp),
            other => Err(format!("unknown probability policy: {}", other)),
        }
    }
}

/// Configuration for output formatting
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub policy: ProbabilityPolicy,
    pub precision_digits: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            policy: ProbabilityPolicy::Reject,
            precision_digits: PROBABILITY_PRECISION,
        }
    }
}

/// Formats scored inferences into PredictionResults
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    config: OutputConfig,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub fn format(&self, domain: Domain, scored: Scored) -> Result<PredictionResult, PredictionError> {
        let label = match scored.label {
            0 => 0u8,
            1 => 1u8,
            other => return Err(PredictionError::UnexpectedLabel { domain, label: other }),
        };

        let probability = self.validate_probability(domain, scored.probability)?;

        Ok(PredictionResult {
            domain,
            label,
            probability: self.round(probability),
            calibrated: scored.calibrated,
        })
    }

    fn validate_probability(&self, domain: Domain, value: f64) -> Result<f64, PredictionError> {
        if value.is_nan() {
            return Err(PredictionError::ProbabilityRange { domain, value });
        }
        if (0.0..=1.0).contains(&value) {
            return Ok(value);
        }
        match self.config.policy {
            ProbabilityPolicy::Reject => Err(PredictionError::ProbabilityRange { domain, value }),
            ProbabilityPolicy::Clamp => Ok(value.clamp(0.0, 1.0)),
        }
    }

    fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.config.precision_digits as i32);
        (value * factor).round() / factor
    }
}
