use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Photo;

const PHOTO_COLUMNS: &str =
    "id, user_id, consultation_id, url, caption, body_part, angle, metadata, created_at";

pub fn insert_photo(conn: &Connection, p: &Photo) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO photos (id, user_id, consultation_id, url, caption, body_part, angle, metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            p.id.to_string(),
            p.user_id.to_string(),
            p.consultation_id.map(|id| id.to_string()),
            p.url,
            p.caption,
            p.body_part,
            p.angle,
            serde_json::to_string(&p.metadata).unwrap_or_else(|_| "{}".into()),
            p.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_photo(conn: &Connection, id: &Uuid) -> Result<Option<Photo>, DatabaseError> {
    let sql = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    Ok(stmt
        .query_row(params![id.to_string()], photo_from_row)
        .optional()?)
}

pub fn delete_photo(conn: &Connection, id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute("DELETE FROM photos WHERE id = ?1", params![id.to_string()])?;
    Ok(deleted)
}

/// Newest-first photos owned by a user.
pub fn list_photos_by_user(conn: &Connection, user_id: &Uuid) -> Result<Vec<Photo>, DatabaseError> {
    let sql = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE user_id = ?1 ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string()], photo_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Newest-first photos attached to a consultation.
pub fn list_photos_by_consultation(
    conn: &Connection,
    consultation_id: &Uuid,
) -> Result<Vec<Photo>, DatabaseError> {
    let sql = format!(
        "SELECT {PHOTO_COLUMNS} FROM photos WHERE consultation_id = ?1 ORDER BY created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![consultation_id.to_string()], photo_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn count_photos_for_consultation(
    conn: &Connection,
    consultation_id: &Uuid,
) -> Result<u32, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM photos WHERE consultation_id = ?1",
        params![consultation_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

pub(crate) fn photo_from_row(row: &rusqlite::Row<'_>) -> Result<Photo, rusqlite::Error> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let consultation_id: Option<String> = row.get(2)?;
    let metadata: String = row.get(7)?;
    let created_at: DateTime<Utc> = row.get(8)?;
    Ok(Photo {
        id: Uuid::parse_str(&id).unwrap_or_default(),
        user_id: Uuid::parse_str(&user_id).unwrap_or_default(),
        consultation_id: consultation_id.and_then(|s| Uuid::parse_str(&s).ok()),
        url: row.get(3)?,
        caption: row.get(4)?,
        body_part: row.get(5)?,
        angle: row.get(6)?,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
        created_at,
    })
}
