//! Consultation endpoints. Request-shape validation happens here; the
//! lifecycle engine owns authorization and semantics.

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::consultations;
use crate::models::{ConsultationIntake, ConsultationPatch, FollowUp};

/// `POST /api/consultations` — submit a new case.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Json(intake): Json<ConsultationIntake>,
) -> Result<Json<consultations::ConsultationWithPatient>, ApiError> {
    if intake.chief_complaint.trim().len() < 10 {
        return Err(ApiError::BadRequest(
            "Please describe your concern in detail".into(),
        ));
    }
    if intake.symptoms.is_empty() {
        return Err(ApiError::BadRequest(
            "Please select at least one symptom".into(),
        ));
    }
    if intake.duration.trim().is_empty() {
        return Err(ApiError::BadRequest("Duration is required".into()));
    }

    let conn = ctx.open_db()?;
    let created = consultations::create(&conn, &ctx.notifier, user.id, intake)?;
    Ok(Json(created))
}

#[derive(Serialize)]
pub struct ConsultationListResponse {
    pub consultations: Vec<consultations::ConsultationSummary>,
}

/// `GET /api/consultations` — role-scoped listing.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ConsultationListResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let consultations = consultations::list(&conn, &user.id, user.role)?;
    Ok(Json(ConsultationListResponse { consultations }))
}

/// `GET /api/consultations/:id` — full detail.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<consultations::ConsultationDetail>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    Ok(Json(consultations::get(&conn, &id, &user.id, user.role)?))
}

/// `PUT /api/consultations/:id` — partial update.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(patch): Json<ConsultationPatch>,
) -> Result<Json<consultations::ConsultationWithPatient>, ApiError> {
    let id = parse_id(&id)?;
    let mut conn = ctx.open_db()?;
    let updated = consultations::update(&mut conn, &ctx.notifier, &id, &user.id, user.role, patch)?;
    Ok(Json(updated))
}

/// `PUT /api/consultations/:id/assign/:doctor_id` — doctor assignment.
/// Gating who may assign is an upstream concern; the route only requires
/// authentication.
pub async fn assign(
    State(ctx): State<ApiContext>,
    Path((id, doctor_id)): Path<(String, String)>,
) -> Result<Json<crate::models::Consultation>, ApiError> {
    let id = parse_id(&id)?;
    let doctor_id = parse_id(&doctor_id)?;
    let mut conn = ctx.open_db()?;
    let assigned = consultations::assign_doctor(&mut conn, &ctx.notifier, &id, &doctor_id)?;
    Ok(Json(assigned))
}

#[derive(Deserialize)]
pub struct FollowUpRequest {
    pub scheduled_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// `POST /api/consultations/:id/follow-up`
pub async fn follow_up(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(req): Json<FollowUpRequest>,
) -> Result<Json<FollowUp>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    let follow_up = consultations::create_follow_up(&conn, &id, req.scheduled_date, req.notes)?;
    Ok(Json(follow_up))
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}
