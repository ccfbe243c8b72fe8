//! Photo ledger.
//!
//! Progress photos grouped by body part / angle / calendar date for
//! before-after comparison, plus per-body-part aggregates. Upload trusts
//! the owner (no consultation membership check); deletion is owner-only,
//! and a non-owner gets the same NotFound as a missing photo so existence
//! never leaks.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{
    delete_photo, get_photo, insert_photo, list_photos_by_consultation, list_photos_by_user,
    photo_from_row,
};
use crate::db::DatabaseError;
use crate::models::enums::ConsultationStatus;
use crate::models::{Photo, PhotoMetadata};
use crate::storage::StoredUpload;

#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    #[error("Photo not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ═══════════════════════════════════════════
// View types
// ═══════════════════════════════════════════

/// Optional fields accompanying an upload.
#[derive(Debug, Clone, Default)]
pub struct PhotoUploadOptions {
    pub consultation_id: Option<Uuid>,
    pub caption: Option<String>,
    pub body_part: Option<String>,
    pub angle: Option<String>,
}

/// Minimal consultation context joined onto comparison listings.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationContext {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: ConsultationStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonPhoto {
    #[serde(flatten)]
    pub photo: Photo,
    pub consultation: Option<ConsultationContext>,
}

/// Comparison photos bucketed by calendar date.
#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    pub body_part: String,
    pub angle: Option<String>,
    pub total_photos: usize,
    pub photos_by_date: BTreeMap<NaiveDate, Vec<ComparisonPhoto>>,
    pub photos: Vec<ComparisonPhoto>,
}

/// Per-body-part aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct BodyPartStats {
    pub count: u32,
    pub angles: BTreeMap<String, u32>,
    pub first_photo: DateTime<Utc>,
    pub last_photo: DateTime<Utc>,
}

// ═══════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════

/// Record a stored upload as a photo owned by `owner_id`.
pub fn upload(
    conn: &Connection,
    owner_id: Uuid,
    stored: &StoredUpload,
    options: PhotoUploadOptions,
) -> Result<Photo, PhotoError> {
    let photo = Photo {
        id: Uuid::new_v4(),
        user_id: owner_id,
        consultation_id: options.consultation_id,
        url: stored.url.clone(),
        caption: options.caption,
        body_part: options.body_part,
        angle: options.angle,
        metadata: PhotoMetadata {
            original_name: stored.original_name.clone(),
            content_type: stored.content_type.clone(),
            size_bytes: stored.size_bytes,
        },
        created_at: Utc::now(),
    };
    insert_photo(conn, &photo)?;
    Ok(photo)
}

/// Newest-first photos owned by a user.
pub fn list_by_user(conn: &Connection, owner_id: &Uuid) -> Result<Vec<Photo>, PhotoError> {
    Ok(list_photos_by_user(conn, owner_id)?)
}

/// Newest-first photos attached to a consultation.
pub fn list_by_consultation(
    conn: &Connection,
    consultation_id: &Uuid,
) -> Result<Vec<Photo>, PhotoError> {
    Ok(list_photos_by_consultation(conn, consultation_id)?)
}

/// The owner's photos filtered by optional body part and angle, newest
/// first, each joined with minimal consultation context.
pub fn list_for_comparison(
    conn: &Connection,
    owner_id: &Uuid,
    body_part: Option<&str>,
    angle: Option<&str>,
) -> Result<Vec<ComparisonPhoto>, PhotoError> {
    let mut sql = String::from(
        "SELECT p.id, p.user_id, p.consultation_id, p.url, p.caption, p.body_part, p.angle,
                p.metadata, p.created_at,
                c.id, c.created_at, c.status
         FROM photos p
         LEFT JOIN consultations c ON p.consultation_id = c.id
         WHERE p.user_id = ?1",
    );

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    params_vec.push(Box::new(owner_id.to_string()));
    let mut param_idx = 2u32;

    if let Some(part) = body_part {
        sql.push_str(&format!(" AND p.body_part = ?{param_idx}"));
        params_vec.push(Box::new(part.to_string()));
        param_idx += 1;
    }
    if let Some(angle) = angle {
        sql.push_str(&format!(" AND p.angle = ?{param_idx}"));
        params_vec.push(Box::new(angle.to_string()));
        param_idx += 1;
    }
    let _ = param_idx;

    sql.push_str(" ORDER BY p.created_at DESC");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql).map_err(DatabaseError::from)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let photo = photo_from_row(row)?;
            let consultation_id: Option<String> = row.get(9)?;
            let consultation = match consultation_id {
                Some(id) => {
                    let created_at: DateTime<Utc> = row.get(10)?;
                    let status: String = row.get(11)?;
                    Some((id, created_at, status))
                }
                None => None,
            };
            Ok((photo, consultation))
        })
        .map_err(DatabaseError::from)?;

    let mut photos = Vec::new();
    for row in rows {
        let (photo, raw_context) = row.map_err(DatabaseError::from)?;
        let consultation = match raw_context {
            Some((id, created_at, status)) => Some(ConsultationContext {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                created_at,
                status: status.parse()?,
            }),
            None => None,
        };
        photos.push(ComparisonPhoto { photo, consultation });
    }
    Ok(photos)
}

/// Calendar-date bucket key for a capture timestamp (UTC date portion).
pub fn date_key(timestamp: &DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// Comparison listing bucketed by calendar date. Buckets preserve the
/// newest-first order of the flat listing.
pub fn comparison_pairs(
    conn: &Connection,
    owner_id: &Uuid,
    body_part: &str,
    angle: Option<&str>,
) -> Result<ComparisonReport, PhotoError> {
    let photos = list_for_comparison(conn, owner_id, Some(body_part), angle)?;

    let mut photos_by_date: BTreeMap<NaiveDate, Vec<ComparisonPhoto>> = BTreeMap::new();
    for photo in &photos {
        photos_by_date
            .entry(date_key(&photo.photo.created_at))
            .or_default()
            .push(photo.clone());
    }

    Ok(ComparisonReport {
        body_part: body_part.to_string(),
        angle: angle.map(|a| a.to_string()),
        total_photos: photos.len(),
        photos_by_date,
        photos,
    })
}

/// Remove a photo owned by `owner_id`. A photo that does not exist and a
/// photo owned by someone else produce the same NotFound. Removal of the
/// stored file itself is a collaborator concern.
pub fn delete(conn: &Connection, photo_id: &Uuid, owner_id: &Uuid) -> Result<(), PhotoError> {
    let photo = get_photo(conn, photo_id)?.ok_or(PhotoError::NotFound)?;
    if photo.user_id != *owner_id {
        return Err(PhotoError::NotFound);
    }
    delete_photo(conn, photo_id)?;
    Ok(())
}

/// Aggregate the owner's photos with a non-empty body part: count,
/// per-angle counts, first and last capture timestamps.
pub fn body_part_stats(
    conn: &Connection,
    owner_id: &Uuid,
) -> Result<BTreeMap<String, BodyPartStats>, PhotoError> {
    let mut stmt = conn
        .prepare(
            "SELECT body_part, angle, created_at FROM photos
             WHERE user_id = ?1 AND body_part IS NOT NULL AND body_part != ''",
        )
        .map_err(DatabaseError::from)?;
    let rows = stmt
        .query_map(params![owner_id.to_string()], |row| {
            let body_part: String = row.get(0)?;
            let angle: Option<String> = row.get(1)?;
            let created_at: DateTime<Utc> = row.get(2)?;
            Ok((body_part, angle, created_at))
        })
        .map_err(DatabaseError::from)?;

    let mut stats: BTreeMap<String, BodyPartStats> = BTreeMap::new();
    for row in rows {
        let (body_part, angle, created_at) = row.map_err(DatabaseError::from)?;
        let entry = stats.entry(body_part).or_insert_with(|| BodyPartStats {
            count: 0,
            angles: BTreeMap::new(),
            first_photo: created_at,
            last_photo: created_at,
        });
        entry.count += 1;
        if let Some(angle) = angle.filter(|a| !a.is_empty()) {
            *entry.angles.entry(angle).or_insert(0) += 1;
        }
        if created_at < entry.first_photo {
            entry.first_photo = created_at;
        }
        if created_at > entry.last_photo {
            entry.last_photo = created_at;
        }
    }
    Ok(stats)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
