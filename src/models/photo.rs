use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress photo owned by a user, optionally attached to a consultation.
/// Deletable only by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub consultation_id: Option<Uuid>,
    pub url: String,
    pub caption: Option<String>,
    pub body_part: Option<String>,
    pub angle: Option<String>,
    pub metadata: PhotoMetadata,
    pub created_at: DateTime<Utc>,
}

/// Capture metadata recorded at upload time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}
