use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::MessageType;
use crate::models::Message;

const MESSAGE_COLUMNS: &str =
    "id, consultation_id, sender_id, type, content, attachments, is_read, read_at, created_at";

pub fn insert_message(conn: &Connection, m: &Message) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO messages (id, consultation_id, sender_id, type, content, attachments, is_read, read_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            m.id.to_string(),
            m.consultation_id.to_string(),
            m.sender_id.to_string(),
            m.message_type.as_str(),
            m.content,
            serde_json::to_string(&m.attachments).unwrap_or_else(|_| "[]".into()),
            m.is_read as i32,
            m.read_at,
            m.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_message(conn: &Connection, id: &Uuid) -> Result<Option<Message>, DatabaseError> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt
        .query_row(params![id.to_string()], |row| Ok(message_row_from_rusqlite(row)))
        .optional()?;
    match row {
        Some(row) => Ok(Some(message_from_row(row?)?)),
        None => Ok(None),
    }
}

/// Oldest-first thread for a consultation.
pub fn list_messages_for_consultation(
    conn: &Connection,
    consultation_id: &Uuid,
) -> Result<Vec<Message>, DatabaseError> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE consultation_id = ?1 ORDER BY created_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![consultation_id.to_string()], |row| {
        Ok(message_row_from_rusqlite(row))
    })?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(message_from_row(row??)?);
    }
    Ok(messages)
}

/// Flip a message to read. Re-marking refreshes the read timestamp.
pub fn set_message_read(
    conn: &Connection,
    id: &Uuid,
    read_at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE messages SET is_read = 1, read_at = ?1 WHERE id = ?2",
        params![read_at, id.to_string()],
    )?;
    Ok(updated)
}

pub fn count_messages_for_consultation(
    conn: &Connection,
    consultation_id: &Uuid,
) -> Result<u32, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE consultation_id = ?1",
        params![consultation_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

/// Unread messages addressed to a user: messages in consultations where the
/// user is patient or doctor, authored by someone else, still unread.
pub fn count_unread_for_user(conn: &Connection, user_id: &Uuid) -> Result<i64, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages m
         JOIN consultations c ON m.consultation_id = c.id
         WHERE (c.patient_id = ?1 OR c.doctor_id = ?1)
           AND m.sender_id != ?1
           AND m.is_read = 0",
        params![user_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

// Internal row type for Message mapping
struct MessageRow {
    id: String,
    consultation_id: String,
    sender_id: String,
    message_type: String,
    content: String,
    attachments: String,
    is_read: i32,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

fn message_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        consultation_id: row.get(1)?,
        sender_id: row.get(2)?,
        message_type: row.get(3)?,
        content: row.get(4)?,
        attachments: row.get(5)?,
        is_read: row.get(6)?,
        read_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn message_from_row(row: MessageRow) -> Result<Message, DatabaseError> {
    Ok(Message {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        consultation_id: Uuid::parse_str(&row.consultation_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        sender_id: Uuid::parse_str(&row.sender_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        message_type: MessageType::from_str(&row.message_type)?,
        content: row.content,
        attachments: serde_json::from_str(&row.attachments).unwrap_or_default(),
        is_read: row.is_read != 0,
        read_at: row.read_at,
        created_at: row.created_at,
    })
}
