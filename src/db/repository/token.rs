use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;

pub fn insert_auth_token(
    conn: &Connection,
    token_hash: &str,
    user_id: &Uuid,
    issued_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO auth_tokens (token_hash, user_id, issued_at) VALUES (?1, ?2, ?3)",
        params![token_hash, user_id.to_string(), issued_at],
    )?;
    Ok(())
}

/// Resolve a token hash to the owning user's id and role string.
pub fn find_user_by_token_hash(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<(Uuid, String)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.role FROM auth_tokens t
         JOIN users u ON t.user_id = u.id
         WHERE t.token_hash = ?1",
    )?;
    let row: Option<(String, String)> = stmt
        .query_row(params![token_hash], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()?;
    match row {
        Some((id, role)) => {
            let id = Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
            Ok(Some((id, role)))
        }
        None => Ok(None),
    }
}
