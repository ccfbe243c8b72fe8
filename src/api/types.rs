//! Shared types for the API layer: request context, authenticated
//! identity, and the bearer-token / password helpers.

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db::sqlite::open_database;
use crate::models::enums::Role;
use crate::notify::Notifier;

/// PBKDF2 rounds for password hashes.
const PBKDF2_ITERATIONS: u32 = 120_000;

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    db_path: Arc<PathBuf>,
    pub uploads_dir: Arc<PathBuf>,
    pub notifier: Notifier,
}

impl ApiContext {
    pub fn new(db_path: PathBuf, uploads_dir: PathBuf, notifier: Notifier) -> Self {
        Self {
            db_path: Arc::new(db_path),
            uploads_dir: Arc::new(uploads_dir),
            notifier,
        }
    }

    /// One short-lived connection per request.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        open_database(&self.db_path).map_err(|e| ApiError::Internal(e.to_string()))
    }
}

/// Authenticated identity, injected into request extensions by the auth
/// middleware. The engines consume nothing else about the caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

// ═══════════════════════════════════════════════════════════
// Tokens
// ═══════════════════════════════════════════════════════════

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a bearer token; only hashes are stored.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    base64::engine::general_purpose::STANDARD_NO_PAD.encode(digest)
}

// ═══════════════════════════════════════════════════════════
// Passwords
// ═══════════════════════════════════════════════════════════

/// Hash a password with PBKDF2-SHA256 and a random salt.
/// Format: `pbkdf2-sha256$<iterations>$<salt>$<hash>` (base64, no padding).
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    let mut hash = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);
    let b64 = base64::engine::general_purpose::STANDARD_NO_PAD;
    format!(
        "pbkdf2-sha256${PBKDF2_ITERATIONS}${}${}",
        b64.encode(salt),
        b64.encode(hash)
    )
}

/// Verify a password against a stored hash string.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != "pbkdf2-sha256" {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let b64 = base64::engine::general_purpose::STANDARD_NO_PAD;
    let (Ok(salt), Ok(expected)) = (b64.decode(salt), b64.decode(expected)) else {
        return false;
    };

    let mut hash = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);
    hash == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert!(!t1.is_empty());
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("test"), hash_token("test"));
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn password_round_trip() {
        let stored = hash_password("correct horse battery staple");
        assert!(verify_password("correct horse battery staple", &stored));
        assert!(!verify_password("wrong password", &stored));
    }

    #[test]
    fn password_hashes_are_salted() {
        let a = hash_password("same password");
        let b = hash_password("same password");
        assert_ne!(a, b);
        assert!(verify_password("same password", &a));
        assert!(verify_password("same password", &b));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "pbkdf2-sha256$notanumber$AA$AA"));
        assert!(!verify_password("x", "md5$1000$AA$AA"));
    }
}
