use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MessageType;
use super::user::UserSummary;

/// A single entry in a consultation's message thread. Sender must be the
/// consultation's patient or assigned doctor at creation time. `is_read`
/// only ever moves unread -> read, and only by the non-sender party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub consultation_id: Uuid,
    pub sender_id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub attachments: Vec<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Message joined with its sender's display summary.
#[derive(Debug, Clone, Serialize)]
pub struct MessageWithSender {
    #[serde(flatten)]
    pub message: Message,
    pub sender: UserSummary,
}
