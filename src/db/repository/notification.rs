use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::NotificationChannel;
use crate::models::Notification;

pub fn insert_notification(conn: &Connection, n: &Notification) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, type, recipient, message, sent, sent_at, metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            n.id.to_string(),
            n.user_id.to_string(),
            n.channel.as_str(),
            n.recipient,
            n.message,
            n.sent as i32,
            n.sent_at,
            n.metadata.as_ref().map(|m| m.to_string()),
            n.created_at,
        ],
    )?;
    Ok(())
}

/// Newest-first notification history for a user, capped by `limit`.
pub fn list_recent_notifications(
    conn: &Connection,
    user_id: &Uuid,
    limit: u32,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, type, recipient, message, sent, sent_at, metadata, created_at
         FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id.to_string(), limit], |row| {
        Ok(notification_row_from_rusqlite(row))
    })?;

    let mut notifications = Vec::new();
    for row in rows {
        notifications.push(notification_from_row(row??)?);
    }
    Ok(notifications)
}

// Internal row type for Notification mapping
struct NotificationRow {
    id: String,
    user_id: String,
    channel: String,
    recipient: String,
    message: String,
    sent: i32,
    sent_at: Option<DateTime<Utc>>,
    metadata: Option<String>,
    created_at: DateTime<Utc>,
}

fn notification_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<NotificationRow, rusqlite::Error> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        channel: row.get(2)?,
        recipient: row.get(3)?,
        message: row.get(4)?,
        sent: row.get(5)?,
        sent_at: row.get(6)?,
        metadata: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn notification_from_row(row: NotificationRow) -> Result<Notification, DatabaseError> {
    Ok(Notification {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        user_id: Uuid::parse_str(&row.user_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        channel: NotificationChannel::from_str(&row.channel)?,
        recipient: row.recipient,
        message: row.message,
        sent: row.sent != 0,
        sent_at: row.sent_at,
        metadata: row.metadata.and_then(|m| serde_json::from_str(&m).ok()),
        created_at: row.created_at,
    })
}
