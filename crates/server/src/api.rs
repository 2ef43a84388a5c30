//! HTTP API for predictions, patient history, health checks and Prometheus metrics

use diag_lib::{
    health::{ComponentStatus, HealthRegistry},
    messages::{diagnosis_message, domain_title, feature_labels},
    observability::{DiagMetrics, StructuredLogger},
    records::{DiagnosisRecord, NewPatient, Patient},
    DatabaseError, DiagnosisStore, Domain, FeatureSet, Language, ModelInfo, PredictionAdapter,
    PredictionError, UnknownDomain,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<PredictionAdapter>,
    pub store: Option<Arc<DiagnosisStore>>,
    pub health_registry: HealthRegistry,
    pub metrics: DiagMetrics,
    pub logger: StructuredLogger,
    pub default_language: Language,
}

impl AppState {
    pub fn new(
        adapter: Arc<PredictionAdapter>,
        health_registry: HealthRegistry,
        metrics: DiagMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            adapter,
            store: None,
            health_registry,
            metrics,
            logger,
            default_language: Language::default(),
        }
    }

    pub fn with_store(mut self, store: Arc<DiagnosisStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }
}

/// Failures surfaced to API clients as `{error, code, details?}`
#[derive(Debug)]
pub enum ApiError {
    UnknownDomain(UnknownDomain),
    Prediction(PredictionError),
    Database(DatabaseError),
    PersistenceDisabled,
}

impl From<UnknownDomain> for ApiError {
    fn from(e: UnknownDomain) -> Self {
        ApiError::UnknownDomain(e)
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        ApiError::Prediction(e)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        ApiError::Database(e)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::UnknownDomain(_) => StatusCode::NOT_FOUND,
            ApiError::Prediction(e) if e.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Prediction(PredictionError::DomainUnavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Database(DatabaseError::InvalidValue { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PersistenceDisabled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::UnknownDomain(_) => "unknown_domain",
            ApiError::Prediction(e) => e.kind(),
            ApiError::Database(DatabaseError::NotFound { .. }) => "not_found",
            ApiError::Database(DatabaseError::InvalidValue { .. }) => "invalid_patient",
            ApiError::Database(_) => "database_error",
            ApiError::PersistenceDisabled => "persistence_disabled",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Prediction(PredictionError::MissingFeature { fields, .. }) => {
                Some(json!({ "fields": fields }))
            }
            ApiError::Prediction(PredictionError::InvalidFeatureValue { field, value, .. }) => {
                Some(json!({ "field": field, "value": value }))
            }
            ApiError::Database(DatabaseError::InvalidValue { field, .. }) => {
                Some(json!({ "field": field }))
            }
            _ => None,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::UnknownDomain(e) => e.to_string(),
            ApiError::Prediction(e) => e.to_string(),
            ApiError::Database(e @ DatabaseError::NotFound { .. })
            | ApiError::Database(e @ DatabaseError::InvalidValue { .. }) => e.to_string(),
            // Storage internals stay in the logs
            ApiError::Database(_) => "record store failure".to_string(),
            ApiError::PersistenceDisabled => "persistence is disabled".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.code(), error = ?self, "Request failed");
        }
        let body = ErrorBody {
            error: self.message(),
            code: self.code(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        // Remaining domains still serve
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DomainSummary {
    pub domain: Domain,
    pub display_name: String,
    /// Localized form title
    pub title: String,
    pub disease_code: String,
    pub features: Vec<String>,
    /// Localized field labels, parallel to `features`
    pub labels: Vec<String>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    #[serde(default)]
    pub lang: Option<Language>,
}

async fn list_domains(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LanguageQuery>,
) -> Json<Vec<DomainSummary>> {
    let language = query.lang.unwrap_or(state.default_language);
    let summaries = Domain::ALL
        .iter()
        .map(|&domain| DomainSummary {
            domain,
            display_name: domain.display_name().to_string(),
            title: domain_title(domain, language).to_string(),
            disease_code: domain.disease_code().to_string(),
            features: domain.feature_order().iter().map(|f| f.to_string()).collect(),
            labels: feature_labels(domain, language)
                .into_iter()
                .map(str::to_string)
                .collect(),
            available: state.adapter.is_available(domain),
            model: state.adapter.model_info(domain).cloned(),
        })
        .collect();
    Json(summaries)
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: FeatureSet,
    #[serde(default)]
    pub lang: Option<Language>,
    #[serde(default)]
    pub patient: Option<NewPatient>,
    #[serde(default)]
    pub recorded_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub domain: Domain,
    pub label: u8,
    pub probability: f64,
    pub calibrated: bool,
    pub positive: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis_id: Option<i64>,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let domain: Domain = domain.parse()?;

    let start = Instant::now();
    let result = match state.adapter.predict(domain, &request.features) {
        Ok(result) => result,
        Err(e) => {
            state.metrics.inc_prediction_errors(domain, e.kind());
            state.logger.log_prediction_rejected(&e);
            return Err(e.into());
        }
    };
    state
        .metrics
        .observe_prediction_latency(domain, start.elapsed().as_secs_f64());
    state.metrics.inc_predictions(domain, result.label);
    state
        .logger
        .log_prediction(domain, result.label, result.probability, result.calibrated);

    let language = request.lang.unwrap_or(state.default_language);
    let mut response = PredictResponse {
        domain,
        label: result.label,
        probability: result.probability,
        calibrated: result.calibrated,
        positive: result.is_positive(),
        message: diagnosis_message(domain, result.is_positive(), language).to_string(),
        patient_id: None,
        diagnosis_id: None,
    };

    if let (Some(patient), Some(store)) = (&request.patient, &state.store) {
        let patient = store.upsert_patient(patient)?;
        let family = state.adapter.model_info(domain).map(|info| info.family.as_str());
        let record =
            store.record_diagnosis(patient.id, &result, family, request.recorded_by.as_deref())?;

        state.metrics.inc_diagnoses_recorded();
        state
            .logger
            .log_diagnosis_recorded(record.id, patient.id, domain);
        response.patient_id = Some(patient.id);
        response.diagnosis_id = Some(record.id);
    }

    Ok(Json(response))
}

fn require_store(state: &AppState) -> Result<&DiagnosisStore, ApiError> {
    state.store.as_deref().ok_or(ApiError::PersistenceDisabled)
}

async fn list_patients(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Patient>>, ApiError> {
    let store = require_store(&state)?;
    Ok(Json(store.list_patients()?))
}

async fn patient_diagnoses(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<DiagnosisRecord>>, ApiError> {
    let store = require_store(&state)?;
    Ok(Json(store.diagnoses_for_patient(patient_id)?))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/domains", get(list_domains))
        .route("/api/v1/predict/:domain", post(predict))
        .route("/api/v1/patients", get(list_patients))
        .route("/api/v1/patients/:id/diagnoses", get(patient_diagnoses))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
