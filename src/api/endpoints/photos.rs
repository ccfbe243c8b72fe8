//! Photo ledger endpoints. Upload is multipart: a `photo` file part plus
//! optional `consultation_id` / `caption` / `body_part` / `angle` fields.

use axum::extract::{Multipart, Path, Query, State};
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::consultations::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::db::repository::get_consultation;
use crate::models::Photo;
use crate::photos::{self, ComparisonPhoto, ComparisonReport, PhotoUploadOptions};
use crate::storage;

/// Maximum accepted photo size (10 MB).
const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// `POST /api/photos/upload`
pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Photo>, ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut options = PhotoUploadOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "photo" => {
                let original_name = field.file_name().unwrap_or("photo").to_string();
                let content_type = field
                    .content_type()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| storage::content_type_for(&original_name));
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid photo data: {e}")))?;
                if bytes.len() > MAX_PHOTO_BYTES {
                    return Err(ApiError::BadRequest("Photo exceeds 10 MB size limit".into()));
                }
                file = Some((original_name, content_type, bytes.to_vec()));
            }
            "consultation_id" => {
                let raw = read_text_field(field).await?;
                options.consultation_id = Some(parse_id(raw.trim())?);
            }
            "caption" => options.caption = Some(read_text_field(field).await?),
            "body_part" => options.body_part = Some(read_text_field(field).await?),
            "angle" => options.angle = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    let (original_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Photo file is required".into()))?;

    let conn = ctx.open_db()?;
    if let Some(consultation_id) = options.consultation_id {
        if get_consultation(&conn, &consultation_id)?.is_none() {
            return Err(ApiError::NotFound("Consultation not found".into()));
        }
    }

    let stored = storage::save_photo(&ctx.uploads_dir, &original_name, &content_type, &bytes)?;
    let photo = photos::upload(&conn, user.id, &stored, options)?;
    Ok(Json(photo))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))
}

#[derive(Serialize)]
pub struct PhotoListResponse {
    pub photos: Vec<Photo>,
}

/// `GET /api/photos` — the caller's photos, newest first.
pub async fn mine(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PhotoListResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let photos = photos::list_by_user(&conn, &user.id)?;
    Ok(Json(PhotoListResponse { photos }))
}

/// `GET /api/photos/consultation/:consultation_id`
pub async fn by_consultation(
    State(ctx): State<ApiContext>,
    Path(consultation_id): Path<String>,
) -> Result<Json<PhotoListResponse>, ApiError> {
    let consultation_id = parse_id(&consultation_id)?;
    let conn = ctx.open_db()?;
    let photos = photos::list_by_consultation(&conn, &consultation_id)?;
    Ok(Json(PhotoListResponse { photos }))
}

#[derive(Deserialize)]
pub struct ComparisonQuery {
    pub body_part: Option<String>,
    pub angle: Option<String>,
}

#[derive(Serialize)]
pub struct ComparisonListResponse {
    pub photos: Vec<ComparisonPhoto>,
}

/// `GET /api/photos/comparison?body_part=&angle=`
pub async fn comparison(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ComparisonQuery>,
) -> Result<Json<ComparisonListResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let photos = photos::list_for_comparison(
        &conn,
        &user.id,
        query.body_part.as_deref(),
        query.angle.as_deref(),
    )?;
    Ok(Json(ComparisonListResponse { photos }))
}

/// `GET /api/photos/comparison/pairs?body_part=&angle=` — date-bucketed
/// before/after groups. `body_part` is required here.
pub async fn comparison_pairs(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ComparisonQuery>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let body_part = query
        .body_part
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("body_part is required".into()))?;
    let conn = ctx.open_db()?;
    let report = photos::comparison_pairs(&conn, &user.id, body_part, query.angle.as_deref())?;
    Ok(Json(report))
}

/// `GET /api/photos/stats` — per-body-part aggregates.
pub async fn stats(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<std::collections::BTreeMap<String, photos::BodyPartStats>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(photos::body_part_stats(&conn, &user.id)?))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

/// `DELETE /api/photos/:id` — owner only; anyone else sees NotFound.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    photos::delete(&conn, &id, &user.id)?;
    Ok(Json(DeleteResponse {
        message: "Photo deleted successfully",
    }))
}
