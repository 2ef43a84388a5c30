//! Diagnostic domains and their fixed feature orders
//!
//! Each domain binds named inputs to the exact column positions its
//! classifier was trained on. The orders below are part of the model
//! contract and must never be reordered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Diabetes feature order (8 columns)
pub const DIABETES_FEATURE_ORDER: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Heart disease feature order (13 columns)
pub const HEART_FEATURE_ORDER: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Parkinson's feature order (22 voice measurements)
pub const PARKINSONS_FEATURE_ORDER: [&str; 22] = [
    "fo",
    "fhi",
    "flo",
    "jitter_percent",
    "jitter_abs",
    "RAP",
    "PPQ",
    "DDP",
    "shimmer",
    "shimmer_dB",
    "APQ3",
    "APQ5",
    "APQ",
    "DDA",
    "NHR",
    "HNR",
    "RPDE",
    "DFA",
    "spread1",
    "spread2",
    "D2",
    "PPE",
];

/// One of the three diagnostic tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Diabetes,
    Heart,
    Parkinsons,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown diagnostic domain: {0}")]
pub struct UnknownDomain(pub String);

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Diabetes, Domain::Heart, Domain::Parkinsons];

    /// Stable identifier used in URLs, logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Diabetes => "diabetes",
            Domain::Heart => "heart",
            Domain::Parkinsons => "parkinsons",
        }
    }

    /// Positional schema the domain's model consumes
    pub fn feature_order(&self) -> &'static [&'static str] {
        match self {
            Domain::Diabetes => &DIABETES_FEATURE_ORDER,
            Domain::Heart => &HEART_FEATURE_ORDER,
            Domain::Parkinsons => &PARKINSONS_FEATURE_ORDER,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.feature_order().len()
    }

    /// File stem of the serialized model inside the model directory
    pub fn artifact_stem(&self) -> &'static str {
        match self {
            Domain::Diabetes => "diabetes_model",
            Domain::Heart => "heart_disease_model",
            Domain::Parkinsons => "parkinsons_model",
        }
    }

    /// Disease code stored alongside recorded diagnoses
    pub fn disease_code(&self) -> &'static str {
        match self {
            Domain::Diabetes => "DIABETES",
            Domain::Heart => "HEART_DISEASE",
            Domain::Parkinsons => "PARKINSONS",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Diabetes => "Diabetes",
            Domain::Heart => "Heart Disease",
            Domain::Parkinsons => "Parkinson's Disease",
        }
    }

    pub fn from_disease_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.disease_code() == code)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diabetes" => Ok(Domain::Diabetes),
            "heart" | "heart_disease" | "heart-disease" => Ok(Domain::Heart),
            "parkinsons" | "parkinson" | "parkinsons_disease" => Ok(Domain::Parkinsons),
            _ => Err(UnknownDomain(s.to_string())),
        }
    }
}
