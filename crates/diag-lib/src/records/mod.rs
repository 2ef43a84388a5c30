//! Optional persistence of patients and their diagnoses
//!
//! A diagnosis row links a patient to a disease code and stores the
//! prediction probability as its confidence.

mod schema;
mod store;

pub use schema::SCHEMA_VERSION;
pub use store::DiagnosisStore;

use crate::domain::Domain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Patient details supplied alongside a prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub full_name: String,
    #[serde(default = "default_document_type")]
    pub document_type: String,
    pub document_number: String,
    #[serde(default)]
    pub age: Option<u32>,
    /// `M` or `F`
    #[serde(default)]
    pub gender: Option<String>,
}

fn default_document_type() -> String {
    "CC".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub full_name: String,
    pub document_type: String,
    pub document_number: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub id: i64,
    pub patient_id: i64,
    pub domain: Domain,
    pub disease_code: String,
    pub label: u8,
    pub probability: f64,
    pub calibrated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
