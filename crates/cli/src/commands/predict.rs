//! Prediction commands, remote or in-process

use anyhow::{bail, Context, Result};
use colored::Colorize;
use diag_lib::messages::{diagnosis_message, domain_title};
use diag_lib::predictor::load_domain;
use diag_lib::records::NewPatient;
use diag_lib::{FeatureSet, FeatureValue, Language, ModelConfig, PredictionAdapter};
use std::path::Path;

use crate::client::{ApiClient, PredictRequest, PredictResponse};
use crate::output::{
    color_outcome, format_probability, print_info, print_json, print_success, print_warning,
    OutputFormat,
};
use crate::PredictArgs;

/// Parse a `NAME=VALUE` assignment.
///
/// Finite numeric values are sent as numbers; anything else, including
/// `NaN` and `inf` (which JSON cannot carry), is passed through as text
/// so the adapter can report which field is invalid.
pub fn parse_assignment(raw: &str) -> Result<(String, FeatureValue)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Feature name missing in '{}'", raw);
    }

    let value = match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => FeatureValue::Number(number),
        _ => FeatureValue::Text(value.to_string()),
    };
    Ok((name.to_string(), value))
}

fn read_feature_file(path: &Path) -> Result<FeatureSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feature file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Feature file {} must be a JSON object", path.display()))
}

/// Merge `--file` and `--set` inputs; later `--set` entries win
pub fn collect_features(file: Option<&Path>, assignments: &[String]) -> Result<FeatureSet> {
    let mut features = match file {
        Some(path) => read_feature_file(path)?,
        None => FeatureSet::new(),
    };
    for raw in assignments {
        let (name, value) = parse_assignment(raw)?;
        features.insert(name, value);
    }
    Ok(features)
}

/// Patient details, when both name and document number were given
pub fn patient_from_args(args: &PredictArgs) -> Result<Option<NewPatient>> {
    match (&args.patient_name, &args.document_number) {
        (Some(full_name), Some(document_number)) => Ok(Some(NewPatient {
            full_name: full_name.clone(),
            document_type: args.document_type.clone(),
            document_number: document_number.clone(),
            age: args.age,
            gender: args.gender.as_ref().map(|g| g.trim().to_ascii_uppercase()),
        })),
        (None, None) => Ok(None),
        _ => bail!("--patient-name and --document-number must be given together"),
    }
}

/// Predict through the service; records a diagnosis when a patient is given
pub async fn predict_remote(
    client: &ApiClient,
    args: &PredictArgs,
    default_language: Language,
    format: OutputFormat,
) -> Result<()> {
    let request = PredictRequest {
        features: collect_features(args.file.as_deref(), &args.set)?,
        lang: args.lang.unwrap_or(default_language),
        patient: patient_from_args(args)?,
        recorded_by: args.recorded_by.clone(),
    };

    let response = client.predict(args.domain, &request).await?;
    print_outcome(&response, request.lang, format)
}

/// Predict in-process from the model directory; nothing is recorded
pub fn predict_local(args: &PredictArgs, default_language: Language, format: OutputFormat) -> Result<()> {
    if patient_from_args(args)?.is_some() {
        print_warning("Patient details are ignored with --local; nothing will be recorded");
    }

    let features = collect_features(args.file.as_deref(), &args.set)?;
    let config = ModelConfig::new(&args.model_dir);
    let model = load_domain(args.domain, &config)
        .with_context(|| format!("Failed to load the {} model", args.domain))?;

    let mut adapter = PredictionAdapter::empty(config.output);
    adapter.insert(args.domain, model);
    let result = adapter.predict(args.domain, &features)?;

    let language = args.lang.unwrap_or(default_language);
    let response = PredictResponse {
        domain: result.domain,
        label: result.label,
        probability: result.probability,
        calibrated: result.calibrated,
        positive: result.is_positive(),
        message: diagnosis_message(result.domain, result.is_positive(), language).to_string(),
        patient_id: None,
        diagnosis_id: None,
    };
    print_outcome(&response, language, format)
}

fn print_outcome(response: &PredictResponse, language: Language, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(response)?,
        OutputFormat::Table => {
            println!("{}", domain_title(response.domain, language).bold());
            println!("{}", "=".repeat(50));
            println!("Result:       {}", color_outcome(response.positive));
            println!("Probability:  {}", format_probability(response.probability));
            if !response.calibrated {
                print_info("Model has no probability output; probability reflects the label");
            }
            println!();
            println!("{}", response.message);

            if let (Some(patient_id), Some(diagnosis_id)) =
                (response.patient_id, response.diagnosis_id)
            {
                println!();
                print_success(&format!(
                    "Diagnosis {} recorded for patient {}",
                    diagnosis_id, patient_id
                ));
            }
        }
    }
    Ok(())
}
