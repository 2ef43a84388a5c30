//! Integration tests for the prediction service API endpoints

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use diag_lib::{
    health::HealthRegistry,
    observability::{DiagMetrics, StructuredLogger},
    predictor::NativeModel,
    DiagnosisStore, Domain, OutputConfig, PredictionAdapter,
};
use meddiag_server::api::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Diabetes driven by glucose alone, heart by chest pain type with no
/// probability output, Parkinson's left unloaded
fn test_adapter() -> PredictionAdapter {
    let diabetes = NativeModel::from_json(
        json!({
            "family": "logistic_regression",
            "coefficients": [0.0, 0.05, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "intercept": -6.0
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap();
    let heart = NativeModel::from_json(
        json!({
            "family": "linear_svm",
            "coefficients": [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "intercept": -0.5
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap();

    PredictionAdapter::empty(OutputConfig::default())
        .with_classifier(Domain::Diabetes, Box::new(diabetes))
        .unwrap()
        .with_classifier(Domain::Heart, Box::new(heart))
        .unwrap()
}

async fn setup_test_app(store: Option<DiagnosisStore>) -> (Router, HealthRegistry) {
    let health_registry = HealthRegistry::new();
    health_registry.model_loaded(Domain::Diabetes).await;
    health_registry.model_loaded(Domain::Heart).await;
    health_registry
        .model_unavailable(Domain::Parkinsons, "no model loaded")
        .await;

    let mut state = AppState::new(
        Arc::new(test_adapter()),
        health_registry.clone(),
        DiagMetrics::new(),
        StructuredLogger::new("test"),
    );
    if let Some(store) = store {
        state = state.with_store(Arc::new(store));
    }

    (create_router(Arc::new(state)), health_registry)
}

fn diabetes_features(glucose: f64) -> Value {
    json!({
        "Pregnancies": 6,
        "Glucose": glucose,
        "BloodPressure": 72,
        "SkinThickness": 35,
        "Insulin": 0,
        "BMI": 33.6,
        "DiabetesPedigreeFunction": 0.627,
        "Age": 50
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post_json(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_healthz_reports_degraded_domain_but_stays_up() {
    let (app, _) = setup_test_app(None).await;

    let (status, body) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["parkinsons_model"]["status"], "degraded");
}

#[tokio::test]
async fn test_readyz_follows_initialization() {
    let (app, health_registry) = setup_test_app(None).await;

    let (status, body) = get(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    health_registry.mark_initialized().await;
    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_domains_lists_feature_orders_and_availability() {
    let (app, _) = setup_test_app(None).await;

    let (status, body) = get(app, "/api/v1/domains").await;

    assert_eq!(status, StatusCode::OK);
    let domains = body.as_array().unwrap();
    assert_eq!(domains.len(), 3);
    assert_eq!(domains[0]["domain"], "diabetes");
    assert_eq!(domains[0]["features"].as_array().unwrap().len(), 8);
    assert_eq!(domains[0]["features"][1], "Glucose");
    assert_eq!(domains[0]["available"], true);
    assert_eq!(domains[0]["model"]["family"], "logistic_regression");
    assert_eq!(domains[1]["domain"], "heart");
    assert_eq!(domains[1]["features"].as_array().unwrap().len(), 13);
    assert_eq!(domains[2]["domain"], "parkinsons");
    assert_eq!(domains[2]["features"].as_array().unwrap().len(), 22);
    assert_eq!(domains[2]["available"], false);
    assert!(domains[2].get("model").is_none());
}

#[tokio::test]
async fn test_list_domains_localizes_labels() {
    let (app, _) = setup_test_app(None).await;

    let (_, english) = get(app.clone(), "/api/v1/domains").await;
    assert_eq!(english[0]["title"], "Diabetes Prediction using ML");
    assert_eq!(english[0]["labels"][1], "Glucose Level");

    let (status, spanish) = get(app, "/api/v1/domains?lang=es").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spanish[0]["title"], "Predicción de Diabetes con ML");
    assert_eq!(spanish[0]["labels"][1], "Nivel de glucosa");
    for domain in spanish.as_array().unwrap() {
        assert_eq!(
            domain["labels"].as_array().unwrap().len(),
            domain["features"].as_array().unwrap().len()
        );
    }
}

#[tokio::test]
async fn test_predict_positive_diabetes() {
    let (app, _) = setup_test_app(None).await;

    let (status, body) = post_json(
        app,
        "/api/v1/predict/diabetes",
        json!({ "features": diabetes_features(148.0) }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["domain"], "diabetes");
    assert_eq!(body["label"], 1);
    assert_eq!(body["positive"], true);
    assert_eq!(body["calibrated"], true);
    // sigmoid(0.05 * 148 - 6) = sigmoid(1.4)
    assert_eq!(body["probability"], 0.8022);
    assert_eq!(
        body["message"],
        "The person may be diabetic, consult your doctor."
    );
    assert!(body.get("diagnosis_id").is_none());
}

#[tokio::test]
async fn test_predict_accepts_numeric_strings_and_language() {
    let (app, _) = setup_test_app(None).await;
    let mut features = diabetes_features(85.0);
    features["Glucose"] = json!(" 85 ");

    let (status, body) = post_json(
        app,
        "/api/v1/predict/diabetes",
        json!({ "features": features, "lang": "es" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], 0);
    assert_eq!(body["message"], "La persona no es diabética.");
}

#[tokio::test]
async fn test_predict_fallback_probability_without_probability_output() {
    let (app, _) = setup_test_app(None).await;
    let features = json!({
        "age": 63, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233, "fbs": 1,
        "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0,
        "ca": 0, "thal": 1
    });

    let (status, body) = post_json(
        app,
        "/api/v1/predict/heart",
        json!({ "features": features }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], 1);
    assert_eq!(body["probability"], 1.0);
    assert_eq!(body["calibrated"], false);
}

#[tokio::test]
async fn test_predict_unknown_domain_is_not_found() {
    let (app, _) = setup_test_app(None).await;

    let (status, body) = post_json(
        app,
        "/api/v1/predict/thyroid",
        json!({ "features": {} }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "unknown_domain");
}

#[tokio::test]
async fn test_predict_missing_features_lists_fields() {
    let (app, _) = setup_test_app(None).await;
    let mut features = diabetes_features(120.0);
    features.as_object_mut().unwrap().remove("BMI");
    features.as_object_mut().unwrap().remove("Age");

    let (status, body) = post_json(
        app,
        "/api/v1/predict/diabetes",
        json!({ "features": features }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "missing_feature");
    assert_eq!(body["details"]["fields"], json!(["BMI", "Age"]));
}

#[tokio::test]
async fn test_predict_non_numeric_value_names_the_field() {
    let (app, _) = setup_test_app(None).await;
    let mut features = diabetes_features(120.0);
    features["Insulin"] = json!("abc");

    let (status, body) = post_json(
        app,
        "/api/v1/predict/diabetes",
        json!({ "features": features }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_feature_value");
    assert_eq!(body["details"]["field"], "Insulin");
    assert_eq!(body["details"]["value"], "abc");
}

#[tokio::test]
async fn test_predict_null_value_names_the_field() {
    let (app, _) = setup_test_app(None).await;
    let mut features = diabetes_features(120.0);
    features["BMI"] = Value::Null;
    features["Age"] = json!(true);

    let (status, body) = post_json(
        app,
        "/api/v1/predict/diabetes",
        json!({ "features": features }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_feature_value");
    assert_eq!(body["details"]["field"], "BMI");
    assert!(body["error"].as_str().unwrap().contains("BMI"));
}

#[tokio::test]
async fn test_predict_unloaded_domain_is_unavailable() {
    let (app, _) = setup_test_app(None).await;

    let (status, body) = post_json(
        app,
        "/api/v1/predict/parkinsons",
        json!({ "features": {} }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "domain_unavailable");
}

#[tokio::test]
async fn test_predict_with_patient_records_diagnosis() {
    let (app, _) = setup_test_app(Some(DiagnosisStore::open_in_memory().unwrap())).await;
    let patient = json!({
        "full_name": "Carlos Ruiz",
        "document_number": "1098765432",
        "age": 50,
        "gender": "M"
    });

    let (status, body) = post_json(
        app.clone(),
        "/api/v1/predict/diabetes",
        json!({
            "features": diabetes_features(148.0),
            "patient": patient,
            "recorded_by": "dr-lopez"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let patient_id = body["patient_id"].as_i64().unwrap();
    assert!(body["diagnosis_id"].as_i64().is_some());

    let (status, body) = get(app.clone(), "/api/v1/patients").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["full_name"], "Carlos Ruiz");
    assert_eq!(body[0]["document_type"], "CC");

    let (status, body) = get(
        app,
        &format!("/api/v1/patients/{}/diagnoses", patient_id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["disease_code"], "DIABETES");
    assert_eq!(history[0]["probability"], 0.8022);
    assert_eq!(history[0]["model_family"], "logistic_regression");
    assert_eq!(history[0]["recorded_by"], "dr-lopez");
}

#[tokio::test]
async fn test_predict_with_invalid_patient_is_rejected() {
    let (app, _) = setup_test_app(Some(DiagnosisStore::open_in_memory().unwrap())).await;

    let (status, body) = post_json(
        app,
        "/api/v1/predict/diabetes",
        json!({
            "features": diabetes_features(148.0),
            "patient": { "full_name": "X", "document_number": "1", "gender": "Z" }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["field"], "gender");
}

#[tokio::test]
async fn test_history_for_unknown_patient_is_not_found() {
    let (app, _) = setup_test_app(Some(DiagnosisStore::open_in_memory().unwrap())).await;

    let (status, body) = get(app, "/api/v1/patients/404/diagnoses").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_patients_without_store_is_unavailable() {
    let (app, _) = setup_test_app(None).await;

    let (status, body) = get(app, "/api/v1/patients").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "persistence_disabled");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prediction_counters() {
    let (app, _) = setup_test_app(None).await;
    let (status, _) = post_json(
        app.clone(),
        "/api/v1/predict/diabetes",
        json!({ "features": diabetes_features(148.0) }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("meddiag_predictions_total"));
    assert!(text.contains("meddiag_prediction_latency_seconds"));
}
