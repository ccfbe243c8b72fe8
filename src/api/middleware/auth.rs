//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves the token hash to a
//! user, and injects `AuthUser { id, role }` into request extensions for
//! downstream handlers.

use std::str::FromStr;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{hash_token, ApiContext, AuthUser};
use crate::db::repository::find_user_by_token_hash;
use crate::models::enums::Role;

/// Require a valid bearer token.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let conn = ctx.open_db()?;
    let (user_id, role) =
        find_user_by_token_hash(&conn, &hash_token(&token))?.ok_or(ApiError::Unauthorized)?;
    let role =
        Role::from_str(&role).map_err(|e| ApiError::Internal(format!("stored role: {e}")))?;

    req.extensions_mut().insert(AuthUser { id: user_id, role });
    Ok(next.run(req).await)
}
