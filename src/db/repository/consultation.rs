use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{ConsultationStatus, Priority};
use crate::models::Consultation;

const CONSULTATION_COLUMNS: &str = "id, patient_id, doctor_id, chief_complaint, symptoms, duration, \
     medical_history, medications, allergies, vital_signs, video_url, priority, status, \
     diagnosis, prescription, recommendations, follow_up_required, follow_up_date, \
     completed_at, created_at, updated_at";

pub fn insert_consultation(conn: &Connection, c: &Consultation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO consultations (id, patient_id, doctor_id, chief_complaint, symptoms, duration,
         medical_history, medications, allergies, vital_signs, video_url, priority, status,
         diagnosis, prescription, recommendations, follow_up_required, follow_up_date,
         completed_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            c.id.to_string(),
            c.patient_id.to_string(),
            c.doctor_id.map(|id| id.to_string()),
            c.chief_complaint,
            serde_json::to_string(&c.symptoms).unwrap_or_else(|_| "[]".into()),
            c.duration,
            serde_json::to_string(&c.medical_history).unwrap_or_else(|_| "{}".into()),
            serde_json::to_string(&c.medications).unwrap_or_else(|_| "[]".into()),
            serde_json::to_string(&c.allergies).unwrap_or_else(|_| "[]".into()),
            serde_json::to_string(&c.vital_signs).unwrap_or_else(|_| "{}".into()),
            c.video_url,
            c.priority.as_str(),
            c.status.as_str(),
            c.diagnosis,
            c.prescription
                .as_ref()
                .map(|p| serde_json::to_string(p).unwrap_or_else(|_| "[]".into())),
            c.recommendations,
            c.follow_up_required as i32,
            c.follow_up_date,
            c.completed_at,
            c.created_at,
            c.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_consultation(conn: &Connection, id: &Uuid) -> Result<Option<Consultation>, DatabaseError> {
    let sql = format!("SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt
        .query_row(params![id.to_string()], |row| {
            Ok(consultation_row_from_rusqlite(row))
        })
        .optional()?;
    match row {
        Some(row) => Ok(Some(consultation_from_row(row?)?)),
        None => Ok(None),
    }
}

/// Write back the mutable portion of a consultation row.
pub fn update_consultation(conn: &Connection, c: &Consultation) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE consultations SET doctor_id = ?1, status = ?2, diagnosis = ?3, prescription = ?4,
         recommendations = ?5, follow_up_required = ?6, follow_up_date = ?7, completed_at = ?8,
         updated_at = ?9
         WHERE id = ?10",
        params![
            c.doctor_id.map(|id| id.to_string()),
            c.status.as_str(),
            c.diagnosis,
            c.prescription
                .as_ref()
                .map(|p| serde_json::to_string(p).unwrap_or_else(|_| "[]".into())),
            c.recommendations,
            c.follow_up_required as i32,
            c.follow_up_date,
            c.completed_at,
            c.updated_at,
            c.id.to_string(),
        ],
    )?;
    Ok(updated)
}

pub fn list_consultations_by_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Consultation>, DatabaseError> {
    let sql = format!(
        "SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE patient_id = ?1 ORDER BY created_at DESC"
    );
    collect_consultations(conn, &sql, params![patient_id.to_string()])
}

pub fn list_consultations_by_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<Consultation>, DatabaseError> {
    let sql = format!(
        "SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE doctor_id = ?1 ORDER BY created_at DESC"
    );
    collect_consultations(conn, &sql, params![doctor_id.to_string()])
}

pub fn list_all_consultations(conn: &Connection) -> Result<Vec<Consultation>, DatabaseError> {
    let sql = format!("SELECT {CONSULTATION_COLUMNS} FROM consultations ORDER BY created_at DESC");
    collect_consultations(conn, &sql, params![])
}

fn collect_consultations(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<Consultation>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(consultation_row_from_rusqlite(row)))?;

    let mut consultations = Vec::new();
    for row in rows {
        consultations.push(consultation_from_row(row??)?);
    }
    Ok(consultations)
}

// Internal row type for Consultation mapping
struct ConsultationRow {
    id: String,
    patient_id: String,
    doctor_id: Option<String>,
    chief_complaint: String,
    symptoms: String,
    duration: String,
    medical_history: String,
    medications: String,
    allergies: String,
    vital_signs: String,
    video_url: Option<String>,
    priority: String,
    status: String,
    diagnosis: Option<String>,
    prescription: Option<String>,
    recommendations: Option<String>,
    follow_up_required: i32,
    follow_up_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn consultation_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ConsultationRow, rusqlite::Error> {
    Ok(ConsultationRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        chief_complaint: row.get(3)?,
        symptoms: row.get(4)?,
        duration: row.get(5)?,
        medical_history: row.get(6)?,
        medications: row.get(7)?,
        allergies: row.get(8)?,
        vital_signs: row.get(9)?,
        video_url: row.get(10)?,
        priority: row.get(11)?,
        status: row.get(12)?,
        diagnosis: row.get(13)?,
        prescription: row.get(14)?,
        recommendations: row.get(15)?,
        follow_up_required: row.get(16)?,
        follow_up_date: row.get(17)?,
        completed_at: row.get(18)?,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,
    })
}

fn consultation_from_row(row: ConsultationRow) -> Result<Consultation, DatabaseError> {
    Ok(Consultation {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        doctor_id: row.doctor_id.and_then(|s| Uuid::parse_str(&s).ok()),
        chief_complaint: row.chief_complaint,
        symptoms: serde_json::from_str(&row.symptoms).unwrap_or_default(),
        duration: row.duration,
        medical_history: serde_json::from_str(&row.medical_history).unwrap_or_default(),
        medications: serde_json::from_str(&row.medications).unwrap_or_default(),
        allergies: serde_json::from_str(&row.allergies).unwrap_or_default(),
        vital_signs: serde_json::from_str(&row.vital_signs).unwrap_or_default(),
        video_url: row.video_url,
        priority: Priority::from_str(&row.priority)?,
        status: ConsultationStatus::from_str(&row.status)?,
        diagnosis: row.diagnosis,
        prescription: row.prescription.and_then(|p| serde_json::from_str(&p).ok()),
        recommendations: row.recommendations,
        follow_up_required: row.follow_up_required != 0,
        follow_up_date: row.follow_up_date,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
