//! Patient and diagnosis repository

use super::schema;
use super::{DatabaseError, DiagnosisRecord, NewPatient, Patient};
use crate::domain::Domain;
use crate::models::PredictionResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const PATIENT_COLUMNS: &str =
    "id, full_name, document_type, document_number, age, gender, created_at";

const DIAGNOSIS_COLUMNS: &str = "id, patient_id, disease_code, label, probability, calibrated, \
     model_family, recorded_by, created_at";

/// Serialized access to one SQLite connection
pub struct DiagnosisStore {
    conn: Mutex<Connection>,
}

impl DiagnosisStore {
    /// Open (or create) the database at `path` and bring its schema up to date
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(mut conn: Connection) -> Result<Self, DatabaseError> {
        schema::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Find a patient by document number, or register a new one
    pub fn upsert_patient(&self, patient: &NewPatient) -> Result<Patient, DatabaseError> {
        validate_patient(patient)?;
        let conn = self.conn()?;

        let existing = conn
            .query_row(
                &format!(
                    "SELECT {} FROM patients WHERE document_number = ?1",
                    PATIENT_COLUMNS
                ),
                params![patient.document_number.trim()],
                patient_from_row,
            )
            .optional()?;
        if let Some(found) = existing {
            return Ok(found);
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO patients (full_name, document_type, document_number, age, gender, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                patient.full_name.trim(),
                patient.document_type.trim(),
                patient.document_number.trim(),
                patient.age,
                patient.gender,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(patient_id = id, "Registered patient");

        Ok(Patient {
            id,
            full_name: patient.full_name.trim().to_string(),
            document_type: patient.document_type.trim().to_string(),
            document_number: patient.document_number.trim().to_string(),
            age: patient.age,
            gender: patient.gender.clone(),
            created_at,
        })
    }

    pub fn get_patient(&self, id: i64) -> Result<Patient, DatabaseError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM patients WHERE id = ?1", PATIENT_COLUMNS),
            params![id],
            patient_from_row,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "patient".to_string(),
            id: id.to_string(),
        })
    }

    pub fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM patients ORDER BY id",
            PATIENT_COLUMNS
        ))?;
        let rows = stmt.query_map([], patient_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Persist a prediction as a diagnosis of `patient_id`
    pub fn record_diagnosis(
        &self,
        patient_id: i64,
        result: &PredictionResult,
        model_family: Option<&str>,
        recorded_by: Option<&str>,
    ) -> Result<DiagnosisRecord, DatabaseError> {
        self.get_patient(patient_id)?;

        let conn = self.conn()?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO diagnoses (patient_id, disease_code, label, probability, calibrated, model_family, recorded_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                patient_id,
                result.domain.disease_code(),
                result.label,
                result.probability,
                result.calibrated,
                model_family,
                recorded_by,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();

        Ok(DiagnosisRecord {
            id,
            patient_id,
            domain: result.domain,
            disease_code: result.domain.disease_code().to_string(),
            label: result.label,
            probability: result.probability,
            calibrated: result.calibrated,
            model_family: model_family.map(str::to_string),
            recorded_by: recorded_by.map(str::to_string),
            created_at,
        })
    }

    /// Diagnoses recorded for a patient, oldest first
    pub fn diagnoses_for_patient(&self, patient_id: i64) -> Result<Vec<DiagnosisRecord>, DatabaseError> {
        self.get_patient(patient_id)?;

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM diagnoses WHERE patient_id = ?1 ORDER BY created_at, id",
            DIAGNOSIS_COLUMNS
        ))?;
        let rows = stmt.query_map(params![patient_id], diagnosis_row)?;

        let records: Result<Vec<_>, _> = rows.map(|row| -> Result<DiagnosisRecord, DatabaseError> {
            let row = row?;
            let domain = Domain::from_disease_code(&row.disease_code).ok_or_else(|| {
                DatabaseError::InvalidValue {
                    field: "disease_code".to_string(),
                    value: row.disease_code.clone(),
                }
            })?;
            Ok(DiagnosisRecord {
                id: row.id,
                patient_id: row.patient_id,
                domain,
                disease_code: row.disease_code,
                label: row.label,
                probability: row.probability,
                calibrated: row.calibrated,
                model_family: row.model_family,
                recorded_by: row.recorded_by,
                created_at: row.created_at,
            })
        })
        .collect();
        records
    }
}

fn validate_patient(patient: &NewPatient) -> Result<(), DatabaseError> {
    if patient.full_name.trim().is_empty() {
        return Err(DatabaseError::InvalidValue {
            field: "full_name".to_string(),
            value: patient.full_name.clone(),
        });
    }
    if patient.document_number.trim().is_empty() {
        return Err(DatabaseError::InvalidValue {
            field: "document_number".to_string(),
            value: patient.document_number.clone(),
        });
    }
    if let Some(gender) = &patient.gender {
        if gender != "M" && gender != "F" {
            return Err(DatabaseError::InvalidValue {
                field: "gender".to_string(),
                value: gender.clone(),
            });
        }
    }
    Ok(())
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        full_name: row.get(1)?,
        document_type: row.get(2)?,
        document_number: row.get(3)?,
        age: row.get(4)?,
        gender: row.get(5)?,
        created_at: row.get(6)?,
    })
}

struct DiagnosisRow {
    id: i64,
    patient_id: i64,
    disease_code: String,
    label: u8,
    probability: f64,
    calibrated: bool,
    model_family: Option<String>,
    recorded_by: Option<String>,
    created_at: DateTime<Utc>,
}

fn diagnosis_row(row: &Row<'_>) -> rusqlite::Result<DiagnosisRow> {
    Ok(DiagnosisRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        disease_code: row.get(2)?,
        label: row.get(3)?,
        probability: row.get(4)?,
        calibrated: row.get(5)?,
        model_family: row.get(6)?,
        recorded_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}
