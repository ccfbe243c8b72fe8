use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::NotificationChannel;

/// Append-only delivery audit row. Written once by the dispatcher after a
/// delivery attempt (or a degraded local-only record) and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub channel: NotificationChannel,
    pub recipient: String,
    pub message: String,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_serializes_under_type_key() {
        let n = Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            channel: NotificationChannel::WhatsApp,
            recipient: "+221770000000".into(),
            message: "New message from Dr. Ndiaye".into(),
            sent: true,
            sent_at: Some(Utc::now()),
            metadata: Some(serde_json::json!({"message_sid": "SM123"})),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "WHATSAPP");
        assert_eq!(json["sent"], true);
    }
}
