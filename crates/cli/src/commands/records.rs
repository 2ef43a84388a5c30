//! Patient and diagnosis history commands

use anyhow::Result;
use colored::Colorize;
use diag_lib::records::{DiagnosisRecord, Patient};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_outcome, format_probability, format_timestamp, print_json, print_table, print_warning,
    OutputFormat,
};

/// Row for patients table
#[derive(Tabled)]
struct PatientRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Document")]
    document: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Gender")]
    gender: String,
    #[tabled(rename = "Registered")]
    registered: String,
}

/// Row for diagnosis history table
#[derive(Tabled)]
struct DiagnosisRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Disease")]
    disease: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Probability")]
    probability: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Recorded By")]
    recorded_by: String,
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

/// List registered patients
pub async fn list_patients(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let patients: Vec<Patient> = client.get("api/v1/patients").await?;

    match format {
        OutputFormat::Json => print_json(&patients)?,
        OutputFormat::Table => {
            let rows: Vec<PatientRow> = patients
                .iter()
                .map(|p| PatientRow {
                    id: p.id,
                    name: p.full_name.clone(),
                    document: format!("{} {}", p.document_type, p.document_number),
                    age: or_dash(p.age.map(|a| a.to_string())),
                    gender: or_dash(p.gender.clone()),
                    registered: format_timestamp(&p.created_at),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

/// Show diagnoses recorded for a patient
pub async fn show_history(client: &ApiClient, patient_id: i64, format: OutputFormat) -> Result<()> {
    let history: Vec<DiagnosisRecord> = client
        .get(&format!("api/v1/patients/{}/diagnoses", patient_id))
        .await?;

    match format {
        OutputFormat::Json => print_json(&history)?,
        OutputFormat::Table => {
            println!("{} {}", "Diagnosis history for patient".bold(), patient_id);
            if history.is_empty() {
                print_warning("No diagnoses recorded for this patient");
                return Ok(());
            }

            let rows: Vec<DiagnosisRow> = history
                .iter()
                .map(|d| DiagnosisRow {
                    id: d.id,
                    date: format_timestamp(&d.created_at),
                    disease: d.domain.display_name().to_string(),
                    result: color_outcome(d.label == 1),
                    probability: format_probability(d.probability),
                    model: or_dash(d.model_family.clone()),
                    recorded_by: or_dash(d.recorded_by.clone()),
                })
                .collect();
            print_table(&rows);
            println!("\nTotal: {} diagnoses", history.len());
        }
    }

    Ok(())
}
