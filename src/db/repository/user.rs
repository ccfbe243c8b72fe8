use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::User;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, first_name, last_name, role, phone, avatar, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id.to_string(),
            user.email,
            user.password_hash,
            user.first_name,
            user.last_name,
            user.role.as_str(),
            user.phone,
            user.avatar,
            user.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password_hash, first_name, last_name, role, phone, avatar, created_at
         FROM users WHERE id = ?1",
    )?;
    let row = stmt
        .query_row(params![id.to_string()], |row| Ok(user_row_from_rusqlite(row)))
        .optional()?;
    match row {
        Some(row) => Ok(Some(user_from_row(row?)?)),
        None => Ok(None),
    }
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password_hash, first_name, last_name, role, phone, avatar, created_at
         FROM users WHERE email = ?1",
    )?;
    let row = stmt
        .query_row(params![email], |row| Ok(user_row_from_rusqlite(row)))
        .optional()?;
    match row {
        Some(row) => Ok(Some(user_from_row(row?)?)),
        None => Ok(None),
    }
}

// Internal row type for User mapping
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    phone: Option<String>,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
}

fn user_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        role: row.get(5)?,
        phone: row.get(6)?,
        avatar: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        email: row.email,
        password_hash: row.password_hash,
        first_name: row.first_name,
        last_name: row.last_name,
        role: Role::from_str(&row.role)?,
        phone: row.phone,
        avatar: row.avatar,
        created_at: row.created_at,
    })
}
