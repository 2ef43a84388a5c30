//! Diagnosis library for multi-disease prediction
//!
//! This crate provides the core functionality for:
//! - Binding named medical measurements to fixed feature orders
//! - Loading pre-trained binary classifiers per diagnostic domain
//! - Normalized (label, probability) predictions
//! - Localized result messages
//! - Optional persistence of patients and diagnoses
//! - Health checks and observability

pub mod domain;
pub mod health;
pub mod messages;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod records;

pub use domain::{Domain, UnknownDomain};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use messages::Language;
pub use models::*;
pub use observability::{DiagMetrics, StructuredLogger};
pub use predictor::{
    Classifier, ModelConfig, ModelLoadError, OutputConfig, PredictionAdapter, PredictionError,
    ProbabilityPolicy,
};
pub use records::{DatabaseError, DiagnosisStore};
