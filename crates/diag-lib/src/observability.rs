//! Observability infrastructure for the diagnosis service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes, errors, loaded models)
//! - Structured JSON logging with tracing
//!
//! Feature values are patient data and are never logged.

use crate::domain::Domain;
use crate::predictor::PredictionError;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DiagMetricsInner> = OnceLock::new();

struct DiagMetricsInner {
    prediction_latency_seconds: HistogramVec,
    predictions_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    models_loaded: IntGauge,
    diagnoses_recorded_total: IntCounter,
}

impl DiagMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram_vec!(
                "meddiag_prediction_latency_seconds",
                "Time spent binding features and running inference",
                &["domain"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "meddiag_predictions_total",
                "Predictions served, by domain and label",
                &["domain", "label"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "meddiag_prediction_errors_total",
                "Rejected or failed predictions, by domain and error kind",
                &["domain", "kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            models_loaded: register_int_gauge!(
                "meddiag_models_loaded",
                "Number of domain models loaded and ready"
            )
            .expect("Failed to register models_loaded"),

            diagnoses_recorded_total: register_int_counter!(
                "meddiag_diagnoses_recorded_total",
                "Diagnoses persisted to the record store"
            )
            .expect("Failed to register diagnoses_recorded_total"),
        }
    }
}

/// Lightweight handle to the global metrics instance.
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct DiagMetrics {
    _private: (),
}

impl Default for DiagMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DiagMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DiagMetricsInner {
        GLOBAL_METRICS.get_or_init(DiagMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, domain: Domain, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .with_label_values(&[domain.as_str()])
            .observe(duration_secs);
    }

    pub fn inc_predictions(&self, domain: Domain, label: u8) {
        let label = if label == 1 { "positive" } else { "negative" };
        self.inner()
            .predictions_total
            .with_label_values(&[domain.as_str(), label])
            .inc();
    }

    pub fn inc_prediction_errors(&self, domain: Domain, kind: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[domain.as_str(), kind])
            .inc();
    }

    pub fn set_models_loaded(&self, count: i64) {
        self.inner().models_loaded.set(count);
    }

    pub fn inc_diagnoses_recorded(&self) {
        self.inner().diagnoses_recorded_total.inc();
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_prediction(&self, domain: Domain, label: u8, probability: f64, calibrated: bool) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            domain = %domain,
            label = label,
            probability = probability,
            calibrated = calibrated,
            "Generated diagnosis prediction"
        );
    }

    /// Logs the error kind and field names only; submitted values stay out
    pub fn log_prediction_rejected(&self, error: &PredictionError) {
        warn!(
            event = "prediction_rejected",
            instance = %self.instance,
            domain = %error.domain(),
            kind = %error.kind(),
            fields = ?error.fields(),
            details = %error.redacted(),
            "Prediction request rejected"
        );
    }

    pub fn log_model_loaded(&self, domain: Domain, family: &str, checksum: Option<&str>) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            domain = %domain,
            family = %family,
            checksum = checksum.unwrap_or("-"),
            "Domain model ready"
        );
    }

    pub fn log_model_load_failed(&self, domain: Domain, error: &str) {
        warn!(
            event = "model_load_failed",
            instance = %self.instance,
            domain = %domain,
            error = %error,
            "Domain model failed to load, domain disabled"
        );
    }

    pub fn log_diagnosis_recorded(&self, diagnosis_id: i64, patient_id: i64, domain: Domain) {
        info!(
            event = "diagnosis_recorded",
            instance = %self.instance,
            diagnosis_id = diagnosis_id,
            patient_id = patient_id,
            disease_code = %domain.disease_code(),
            "Diagnosis persisted"
        );
    }

    pub fn log_startup(&self, version: &str, available_domains: &[Domain]) {
        let domains: Vec<&str> = available_domains.iter().map(Domain::as_str).collect();
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            domains = ?domains,
            "Diagnosis service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Diagnosis service shutting down"
        );
    }
}
