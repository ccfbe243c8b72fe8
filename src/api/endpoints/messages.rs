//! Message thread endpoints.

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use serde::Serialize;

use crate::api::endpoints::consultations::parse_id;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::messaging::{self, NewMessage};
use crate::models::{Message, MessageWithSender};

/// `POST /api/messages` — post into a consultation thread.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Json(new_message): Json<NewMessage>,
) -> Result<Json<MessageWithSender>, ApiError> {
    if new_message.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Message content is required".into()));
    }
    let conn = ctx.open_db()?;
    let posted = messaging::post(&conn, &ctx.notifier, user.id, new_message)?;
    Ok(Json(posted))
}

#[derive(Serialize)]
pub struct ThreadResponse {
    pub messages: Vec<MessageWithSender>,
}

/// `GET /api/messages/consultation/:consultation_id` — the whole thread.
pub async fn by_consultation(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(consultation_id): Path<String>,
) -> Result<Json<ThreadResponse>, ApiError> {
    let consultation_id = parse_id(&consultation_id)?;
    let conn = ctx.open_db()?;
    let messages = messaging::list_for_consultation(&conn, &consultation_id, &user.id)?;
    Ok(Json(ThreadResponse { messages }))
}

/// `PUT /api/messages/:id/read` — mark read (no-op for the sender).
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.open_db()?;
    Ok(Json(messaging::mark_read(&conn, &id, &user.id)?))
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// `GET /api/messages/unread/count`
pub async fn unread_count(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let count = messaging::unread_count(&conn, &user.id)?;
    Ok(Json(UnreadCountResponse { count }))
}
