//! Background worker consuming the notification queue.
//!
//! One event at a time: render, attempt delivery, append the audit row.
//! Failures are logged and recorded; nothing propagates back to the
//! operation that emitted the event.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::repository::insert_notification;
use crate::db::sqlite::open_database;
use crate::models::Notification;

use super::transport::TwilioClient;
use super::NotificationEvent;

pub fn spawn(
    db_path: PathBuf,
    transport: Option<TwilioClient>,
    rx: UnboundedReceiver<NotificationEvent>,
) -> JoinHandle<()> {
    if transport.is_none() {
        tracing::warn!("notification transport not configured; deliveries will be recorded only");
    }
    tokio::spawn(run(db_path, transport, rx))
}

async fn run(
    db_path: PathBuf,
    transport: Option<TwilioClient>,
    mut rx: UnboundedReceiver<NotificationEvent>,
) {
    while let Some(event) = rx.recv().await {
        handle_event(&db_path, transport.as_ref(), event).await;
    }
    tracing::debug!("notification queue closed; dispatcher stopping");
}

async fn handle_event(db_path: &Path, transport: Option<&TwilioClient>, event: NotificationEvent) {
    let channel = event.channel();
    let recipient = event.phone().to_string();
    let body = event.render();

    let (sent, sent_at, metadata) = match transport {
        None => (false, None, serde_json::json!({ "mock": true })),
        Some(client) => match client.send(channel, &recipient, &body).await {
            Ok(receipt) => {
                tracing::info!(channel = channel.as_str(), "notification delivered");
                (
                    true,
                    Some(Utc::now()),
                    serde_json::json!({
                        "message_sid": receipt.provider_id,
                        "status": receipt.provider_status,
                    }),
                )
            }
            Err(e) => {
                tracing::error!(channel = channel.as_str(), error = %e, "notification delivery failed");
                (false, None, serde_json::json!({ "error": e.to_string() }))
            }
        },
    };

    let record = Notification {
        id: Uuid::new_v4(),
        user_id: event.recipient_user(),
        channel,
        recipient,
        message: body,
        sent,
        sent_at,
        metadata: Some(metadata),
        created_at: Utc::now(),
    };

    match open_database(db_path) {
        Ok(conn) => {
            if let Err(e) = insert_notification(&conn, &record) {
                tracing::error!(error = %e, "failed to record notification");
            }
        }
        Err(e) => tracing::error!(error = %e, "failed to open database for notification record"),
    }
}
