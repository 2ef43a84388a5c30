//! API client for communicating with the prediction service

use anyhow::{Context, Result};
use diag_lib::{Domain, FeatureSet, Language, ModelInfo};
use diag_lib::records::NewPatient;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// A non-success answer from the service
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API error ({status}) [{code}]: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Option<Value>,
    },

    #[error("API error ({status}): {body}")]
    Unstructured { status: u16, body: String },
}

/// API client for the prediction service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => ClientError::Api {
                    status: status.as_u16(),
                    code: parsed.code,
                    message: parsed.error,
                    details: parsed.details,
                },
                Err(_) => ClientError::Unstructured {
                    status: status.as_u16(),
                    body,
                },
            };
            return Err(error.into());
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn domains(&self, language: Language) -> Result<Vec<DomainSummary>> {
        self.get(&format!("api/v1/domains?lang={}", language.as_str()))
            .await
    }

    pub async fn predict(&self, domain: Domain, request: &PredictRequest) -> Result<PredictResponse> {
        self.post(&format!("api/v1/predict/{}", domain), request).await
    }
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSummary {
    pub domain: Domain,
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    pub disease_code: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: FeatureSet,
    pub lang: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<NewPatient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub domain: Domain,
    pub label: u8,
    pub probability: f64,
    pub calibrated: bool,
    pub positive: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
