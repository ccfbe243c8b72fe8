use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::FollowUp;

pub fn insert_follow_up(conn: &Connection, f: &FollowUp) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO follow_ups (id, consultation_id, scheduled_date, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            f.id.to_string(),
            f.consultation_id.to_string(),
            f.scheduled_date,
            f.notes,
            f.created_at,
        ],
    )?;
    Ok(())
}

/// Soonest-first follow-ups for a consultation.
pub fn list_follow_ups_for_consultation(
    conn: &Connection,
    consultation_id: &Uuid,
) -> Result<Vec<FollowUp>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, consultation_id, scheduled_date, notes, created_at
         FROM follow_ups WHERE consultation_id = ?1 ORDER BY scheduled_date ASC",
    )?;
    let rows = stmt.query_map(params![consultation_id.to_string()], |row| {
        let id: String = row.get(0)?;
        let consultation_id: String = row.get(1)?;
        let scheduled_date: DateTime<Utc> = row.get(2)?;
        let created_at: DateTime<Utc> = row.get(4)?;
        Ok(FollowUp {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            consultation_id: Uuid::parse_str(&consultation_id).unwrap_or_default(),
            scheduled_date,
            notes: row.get(3)?,
            created_at,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
