//! Message thread manager.
//!
//! Membership in the consultation gates everything: only the patient and
//! the assigned doctor may post or read. Read state moves one way
//! (unread -> read), only by the non-sender; a sender marking their own
//! message is a no-op.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::access::is_participant;
use crate::db::repository::{
    count_unread_for_user, get_consultation, get_message, get_user, insert_message,
    list_messages_for_consultation, set_message_read,
};
use crate::db::DatabaseError;
use crate::models::enums::MessageType;
use crate::models::{Message, MessageWithSender, UserSummary};
use crate::notify::{NotificationEvent, Notifier};

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("Consultation not found")]
    ConsultationNotFound,
    #[error("Message not found")]
    MessageNotFound,
    #[error("You do not have access to this consultation")]
    Forbidden,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Payload for posting into a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub consultation_id: Uuid,
    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: MessageType,
    pub content: String,
    pub attachments: Option<Vec<String>>,
}

fn default_message_type() -> MessageType {
    MessageType::Text
}

/// Post a message into a consultation thread. The *other* party — doctor
/// when the patient writes, patient otherwise — gets a "new message"
/// notification if they have a phone number.
pub fn post(
    conn: &Connection,
    notifier: &Notifier,
    sender_id: Uuid,
    new_message: NewMessage,
) -> Result<MessageWithSender, MessagingError> {
    let consultation = get_consultation(conn, &new_message.consultation_id)?
        .ok_or(MessagingError::ConsultationNotFound)?;
    if !is_participant(&consultation, &sender_id) {
        return Err(MessagingError::Forbidden);
    }

    let sender = get_user(conn, &sender_id)?.ok_or(MessagingError::Forbidden)?;
    let message = Message {
        id: Uuid::new_v4(),
        consultation_id: consultation.id,
        sender_id,
        message_type: new_message.message_type,
        content: new_message.content,
        attachments: new_message.attachments.unwrap_or_default(),
        is_read: false,
        read_at: None,
        created_at: Utc::now(),
    };
    insert_message(conn, &message)?;

    let recipient_id = if consultation.patient_id == sender_id {
        consultation.doctor_id
    } else {
        Some(consultation.patient_id)
    };
    if let Some(recipient_id) = recipient_id {
        if let Some(recipient) = get_user(conn, &recipient_id)? {
            if let Some(phone) = recipient.phone {
                notifier.notify(NotificationEvent::NewMessage {
                    recipient_id,
                    phone,
                    consultation_id: consultation.id,
                    sender_name: sender.display_name(),
                });
            }
        }
    }

    Ok(MessageWithSender {
        message,
        sender: UserSummary::from(&sender),
    })
}

/// The whole thread, oldest first, with sender summaries. Same
/// existence/membership check as `post`.
pub fn list_for_consultation(
    conn: &Connection,
    consultation_id: &Uuid,
    actor_id: &Uuid,
) -> Result<Vec<MessageWithSender>, MessagingError> {
    let consultation =
        get_consultation(conn, consultation_id)?.ok_or(MessagingError::ConsultationNotFound)?;
    if !is_participant(&consultation, actor_id) {
        return Err(MessagingError::Forbidden);
    }
    Ok(attach_senders(
        conn,
        list_messages_for_consultation(conn, consultation_id)?,
    )?)
}

/// Mark a message read on behalf of `actor_id`.
///
/// The sender marking their own message is a no-op returning the message
/// unchanged. Anyone outside the parent consultation is rejected. For the
/// proper counterpart, re-marking an already-read message just refreshes
/// the timestamp.
pub fn mark_read(
    conn: &Connection,
    message_id: &Uuid,
    actor_id: &Uuid,
) -> Result<Message, MessagingError> {
    let message = get_message(conn, message_id)?.ok_or(MessagingError::MessageNotFound)?;
    if message.sender_id == *actor_id {
        return Ok(message);
    }

    let consultation = get_consultation(conn, &message.consultation_id)?
        .ok_or(MessagingError::ConsultationNotFound)?;
    if !is_participant(&consultation, actor_id) {
        return Err(MessagingError::Forbidden);
    }

    set_message_read(conn, message_id, Utc::now())?;
    get_message(conn, message_id)?.ok_or(MessagingError::MessageNotFound)
}

/// Unread messages addressed to `actor_id` across all their consultations.
pub fn unread_count(conn: &Connection, actor_id: &Uuid) -> Result<i64, MessagingError> {
    Ok(count_unread_for_user(conn, actor_id)?)
}

/// Join sender summaries onto a batch of messages. Threads only ever have
/// two senders, so summaries are fetched once per distinct sender.
pub(crate) fn attach_senders(
    conn: &Connection,
    messages: Vec<Message>,
) -> Result<Vec<MessageWithSender>, DatabaseError> {
    let mut summaries: HashMap<Uuid, UserSummary> = HashMap::new();
    let mut result = Vec::with_capacity(messages.len());
    for message in messages {
        let sender = match summaries.get(&message.sender_id) {
            Some(summary) => summary.clone(),
            None => {
                let summary = get_user(conn, &message.sender_id)?
                    .map(|u| UserSummary::from(&u))
                    .ok_or_else(|| DatabaseError::NotFound {
                        entity_type: "User".into(),
                        id: message.sender_id.to_string(),
                    })?;
                summaries.insert(message.sender_id, summary.clone());
                summary
            }
        };
        result.push(MessageWithSender { message, sender });
    }
    Ok(result)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
