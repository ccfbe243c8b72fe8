//! Notification history endpoint. The audit rows are written by the
//! dispatcher; this is read-only.

use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::db::repository::list_recent_notifications;
use crate::models::Notification;

/// History page size.
const HISTORY_LIMIT: u32 = 50;

#[derive(Serialize)]
pub struct NotificationHistoryResponse {
    pub notifications: Vec<Notification>,
}

/// `GET /api/notifications/history` — the caller's most recent
/// notifications, newest first.
pub async fn history(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<NotificationHistoryResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let notifications = list_recent_notifications(&conn, &user.id, HISTORY_LIMIT)?;
    Ok(Json(NotificationHistoryResponse { notifications }))
}
