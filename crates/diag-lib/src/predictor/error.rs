//! Error taxonomy for model loading and per-request prediction

use crate::domain::Domain;
use std::path::PathBuf;
use thiserror::Error;

/// Per-request failures; all recoverable at the call boundary
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("missing required features for {domain}: {}", fields.join(", "))]
    MissingFeature { domain: Domain, fields: Vec<String> },

    #[error("invalid value {value:?} for feature '{field}' in {domain}: {reason}")]
    InvalidFeatureValue {
        domain: Domain,
        field: String,
        value: String,
        reason: String,
    },

    #[error("model for {domain} returned probability {value}, outside [0, 1]")]
    ProbabilityRange { domain: Domain, value: f64 },

    #[error("model for {domain} returned label {label}, expected 0 or 1")]
    UnexpectedLabel { domain: Domain, label: i64 },

    #[error("no model loaded for {domain}")]
    DomainUnavailable { domain: Domain },

    #[error("inference failed for {domain}: {reason}")]
    Inference { domain: Domain, reason: String },
}

impl PredictionError {
    pub fn domain(&self) -> Domain {
        match self {
            PredictionError::MissingFeature { domain, .. }
            | PredictionError::InvalidFeatureValue { domain, .. }
            | PredictionError::ProbabilityRange { domain, .. }
            | PredictionError::UnexpectedLabel { domain, .. }
            | PredictionError::DomainUnavailable { domain }
            | PredictionError::Inference { domain, .. } => *domain,
        }
    }

    /// Short machine-readable kind, used for metric labels and API codes
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::MissingFeature { .. } => "missing_feature",
            PredictionError::InvalidFeatureValue { .. } => "invalid_feature_value",
            PredictionError::ProbabilityRange { .. } => "probability_range",
            PredictionError::UnexpectedLabel { .. } => "unexpected_label",
            PredictionError::DomainUnavailable { .. } => "domain_unavailable",
            PredictionError::Inference { .. } => "inference_failed",
        }
    }

    /// Feature names the error refers to, in feature order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            PredictionError::MissingFeature { fields, .. } => {
                fields.iter().map(String::as_str).collect()
            }
            PredictionError::InvalidFeatureValue { field, .. } => vec![field.as_str()],
            _ => Vec::new(),
        }
    }

    /// Description without any submitted value, safe to log.
    ///
    /// Model outputs (probability, label) carry no patient data and are kept.
    pub fn redacted(&self) -> String {
        match self {
            PredictionError::InvalidFeatureValue {
                domain,
                field,
                reason,
                ..
            } => format!("invalid value for feature '{}' in {}: {}", field, domain, reason),
            other => other.to_string(),
        }
    }

    /// True when the caller supplied bad input and may resubmit
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PredictionError::MissingFeature { .. } | PredictionError::InvalidFeatureValue { .. }
        )
    }
}

/// Startup-time failures; the affected domain stays disabled
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("no model artifact for {domain} in {dir:?} (looked for {candidates:?})")]
    NotFound {
        domain: Domain,
        dir: PathBuf,
        candidates: Vec<String>,
    },

    #[error("failed to read model artifact for {domain} at {path:?}: {source}")]
    Io {
        domain: Domain,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to deserialize model artifact for {domain} at {path:?}: {reason}")]
    Parse {
        domain: Domain,
        path: PathBuf,
        reason: String,
    },

    #[error("model for {domain} is malformed: {reason}")]
    Invalid { domain: Domain, reason: String },

    #[error("model for {domain} expects {actual} features, domain defines {expected}")]
    ShapeMismatch {
        domain: Domain,
        expected: usize,
        actual: usize,
    },
}

impl ModelLoadError {
    pub fn domain(&self) -> Domain {
        match self {
            ModelLoadError::NotFound { domain, .. }
            | ModelLoadError::Io { domain, .. }
            | ModelLoadError::Parse { domain, .. }
            | ModelLoadError::Invalid { domain, .. }
            | ModelLoadError::ShapeMismatch { domain, .. } => *domain,
        }
    }
}
