//! Localized result messages for the display layer

use crate::domain::Domain;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported display languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "es" | "spanish" | "español" => Ok(Language::Es),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Sentence shown to the user for a positive or negative outcome
pub fn diagnosis_message(domain: Domain, positive: bool, language: Language) -> &'static str {
    match (language, domain, positive) {
        (Language::En, Domain::Diabetes, true) => {
            "The person may be diabetic, consult your doctor."
        }
        (Language::En, Domain::Diabetes, false) => "The person is not diabetic.",
        (Language::En, Domain::Heart, true) => {
            "The person may have heart disease, consult your doctor."
        }
        (Language::En, Domain::Heart, false) => "The person does not have any heart disease.",
        (Language::En, Domain::Parkinsons, true) => {
            "The person may have Parkinson's disease, consult your doctor."
        }
        (Language::En, Domain::Parkinsons, false) => {
            "The person does not have Parkinson's disease."
        }
        (Language::Es, Domain::Diabetes, true) => {
            "La persona puede ser diabética, consulte a su médico."
        }
        (Language::Es, Domain::Diabetes, false) => "La persona no es diabética.",
        (Language::Es, Domain::Heart, true) => {
            "La persona puede tener una enfermedad cardíaca, consulte a su médico."
        }
        (Language::Es, Domain::Heart, false) => "La persona no tiene enfermedad cardíaca.",
        (Language::Es, Domain::Parkinsons, true) => {
            "La persona puede tener la enfermedad de Parkinson, consulte a su médico."
        }
        (Language::Es, Domain::Parkinsons, false) => {
            "La persona no tiene la enfermedad de Parkinson."
        }
    }
}

/// Page title for a domain's prediction form
pub fn domain_title(domain: Domain, language: Language) -> &'static str {
    match (language, domain) {
        (Language::En, Domain::Diabetes) => "Diabetes Prediction using ML",
        (Language::En, Domain::Heart) => "Heart Disease Prediction using ML",
        (Language::En, Domain::Parkinsons) => "Parkinson's Disease Prediction using ML",
        (Language::Es, Domain::Diabetes) => "Predicción de Diabetes con ML",
        (Language::Es, Domain::Heart) => "Predicción de Enfermedad Cardíaca con ML",
        (Language::Es, Domain::Parkinsons) => "Predicción de la Enfermedad de Parkinson con ML",
    }
}

/// `(name, English, Spanish)` labels for each input field
const DIABETES_LABELS: [(&str, &str, &str); 8] = [
    ("Pregnancies", "Number of Pregnancies", "Número de embarazos"),
    ("Glucose", "Glucose Level", "Nivel de glucosa"),
    ("BloodPressure", "Blood Pressure", "Presión arterial"),
    ("SkinThickness", "Skin Thickness", "Espesor de la piel"),
    ("Insulin", "Insulin Level", "Nivel de insulina"),
    ("BMI", "Body Mass Index", "Índice de masa corporal"),
    (
        "DiabetesPedigreeFunction",
        "Diabetes Pedigree Function",
        "Función de herencia de la diabetes",
    ),
    ("Age", "Age of the Person", "Edad de la persona"),
];

const HEART_LABELS: [(&str, &str, &str); 13] = [
    ("age", "Age", "Edad"),
    ("sex", "Sex", "Sexo"),
    ("cp", "Chest Pain Type", "Tipo de dolor torácico"),
    ("trestbps", "Resting Blood Pressure", "Presión arterial en reposo"),
    ("chol", "Serum Cholesterol (mg/dl)", "Colesterol sérico (mg/dl)"),
    ("fbs", "Fasting Blood Sugar > 120 mg/dl", "Glucemia en ayunas > 120 mg/dl"),
    ("restecg", "Resting ECG Results", "Resultados del ECG en reposo"),
    ("thalach", "Maximum Heart Rate Achieved", "Frecuencia cardíaca máxima alcanzada"),
    ("exang", "Exercise Induced Angina", "Angina inducida por ejercicio"),
    ("oldpeak", "ST Depression Induced by Exercise", "Depresión del ST inducida por ejercicio"),
    ("slope", "Slope of the Peak Exercise ST Segment", "Pendiente del segmento ST en ejercicio"),
    ("ca", "Major Vessels Colored by Fluoroscopy", "Vasos principales coloreados por fluoroscopia"),
    (
        "thal",
        "Thalassemia (0 normal, 1 fixed, 2 reversible)",
        "Talasemia (0 normal, 1 fijo, 2 reversible)",
    ),
];

const PARKINSONS_LABELS: [(&str, &str, &str); 22] = [
    ("fo", "MDVP:Fo(Hz)", "MDVP:Fo(Hz) frecuencia fundamental media"),
    ("fhi", "MDVP:Fhi(Hz)", "MDVP:Fhi(Hz) frecuencia fundamental máxima"),
    ("flo", "MDVP:Flo(Hz)", "MDVP:Flo(Hz) frecuencia fundamental mínima"),
    ("jitter_percent", "MDVP:Jitter(%)", "MDVP:Jitter(%)"),
    ("jitter_abs", "MDVP:Jitter(Abs)", "MDVP:Jitter(Abs)"),
    ("RAP", "MDVP:RAP", "MDVP:RAP"),
    ("PPQ", "MDVP:PPQ", "MDVP:PPQ"),
    ("DDP", "Jitter:DDP", "Jitter:DDP"),
    ("shimmer", "MDVP:Shimmer", "MDVP:Shimmer"),
    ("shimmer_dB", "MDVP:Shimmer(dB)", "MDVP:Shimmer(dB)"),
    ("APQ3", "Shimmer:APQ3", "Shimmer:APQ3"),
    ("APQ5", "Shimmer:APQ5", "Shimmer:APQ5"),
    ("APQ", "MDVP:APQ", "MDVP:APQ"),
    ("DDA", "Shimmer:DDA", "Shimmer:DDA"),
    ("NHR", "Noise-to-Harmonics Ratio (NHR)", "Relación ruido-armónicos (NHR)"),
    ("HNR", "Harmonics-to-Noise Ratio (HNR)", "Relación armónicos-ruido (HNR)"),
    (
        "RPDE",
        "Recurrence Period Density Entropy (RPDE)",
        "Entropía de densidad del período de recurrencia (RPDE)",
    ),
    (
        "DFA",
        "Detrended Fluctuation Analysis (DFA)",
        "Análisis de fluctuación sin tendencia (DFA)",
    ),
    ("spread1", "Fundamental Frequency Spread 1", "Dispersión de frecuencia fundamental 1"),
    ("spread2", "Fundamental Frequency Spread 2", "Dispersión de frecuencia fundamental 2"),
    ("D2", "Correlation Dimension (D2)", "Dimensión de correlación (D2)"),
    ("PPE", "Pitch Period Entropy (PPE)", "Entropía del período de tono (PPE)"),
];

fn labels(domain: Domain) -> &'static [(&'static str, &'static str, &'static str)] {
    match domain {
        Domain::Diabetes => &DIABETES_LABELS,
        Domain::Heart => &HEART_LABELS,
        Domain::Parkinsons => &PARKINSONS_LABELS,
    }
}

/// Human-readable label for an input field; `None` if the domain has no such field
pub fn feature_label(domain: Domain, name: &str, language: Language) -> Option<&'static str> {
    labels(domain)
        .iter()
        .find(|(field, _, _)| *field == name)
        .map(|(_, en, es)| match language {
            Language::En => *en,
            Language::Es => *es,
        })
}

/// Labels for every field of `domain`, in feature order
pub fn feature_labels(domain: Domain, language: Language) -> Vec<&'static str> {
    domain
        .feature_order()
        .iter()
        .map(|&name| feature_label(domain, name, language).unwrap_or(name))
        .collect()
}
