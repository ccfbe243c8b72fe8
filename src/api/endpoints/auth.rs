//! Account registration and login. Thin shell: issues bearer tokens and
//! hands `{id, role}` to everything behind the auth middleware.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{generate_token, hash_password, hash_token, verify_password, ApiContext};
use crate::db::repository::{find_user_by_email, insert_auth_token, insert_user};
use crate::models::enums::Role;
use crate::models::{User, UserSummary};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// `POST /api/auth/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Valid email is required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::BadRequest("First and last name are required".into()));
    }

    let conn = ctx.open_db()?;
    if find_user_by_email(&conn, &email)?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        password_hash: hash_password(&req.password),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        role: req.role.unwrap_or(Role::Patient),
        phone: req.phone,
        avatar: req.avatar,
        created_at: Utc::now(),
    };
    insert_user(&conn, &user)?;

    let token = issue_token(&conn, &user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let user = find_user_by_email(&conn, &req.email.trim().to_lowercase())?
        .ok_or(ApiError::Unauthorized)?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = issue_token(&conn, &user.id)?;
    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

fn issue_token(conn: &rusqlite::Connection, user_id: &Uuid) -> Result<String, ApiError> {
    let token = generate_token();
    insert_auth_token(conn, &hash_token(&token), user_id, Utc::now())?;
    Ok(token)
}
