//! Outbound patient notifications.
//!
//! Engines never talk to the SMS/WhatsApp provider directly. A mutation
//! that warrants a notification emits a `NotificationEvent` through the
//! `Notifier` after the write has committed; the background dispatcher
//! consumes the queue, renders the message, attempts delivery, and appends
//! an audit row. Delivery failure never reaches the caller that triggered
//! the event.

pub mod dispatcher;
pub mod templates;
pub mod transport;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::enums::{ConsultationStatus, NotificationChannel};

/// A state change worth telling a user about, with everything the
/// dispatcher needs to deliver and record it.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    ConsultationSubmitted {
        patient_id: Uuid,
        phone: String,
        consultation_id: Uuid,
    },
    DoctorAssigned {
        patient_id: Uuid,
        phone: String,
        consultation_id: Uuid,
        doctor_name: String,
    },
    StatusChanged {
        patient_id: Uuid,
        phone: String,
        consultation_id: Uuid,
        status: ConsultationStatus,
    },
    NewMessage {
        recipient_id: Uuid,
        phone: String,
        consultation_id: Uuid,
        sender_name: String,
    },
}

impl NotificationEvent {
    /// Channel routing: confirmations and status changes go out as SMS,
    /// person-to-person moments (assignment, new message) as WhatsApp.
    pub fn channel(&self) -> NotificationChannel {
        match self {
            Self::ConsultationSubmitted { .. } | Self::StatusChanged { .. } => {
                NotificationChannel::Sms
            }
            Self::DoctorAssigned { .. } | Self::NewMessage { .. } => NotificationChannel::WhatsApp,
        }
    }

    /// The user this notification targets (always the receiving party).
    pub fn recipient_user(&self) -> Uuid {
        match self {
            Self::ConsultationSubmitted { patient_id, .. }
            | Self::DoctorAssigned { patient_id, .. }
            | Self::StatusChanged { patient_id, .. } => *patient_id,
            Self::NewMessage { recipient_id, .. } => *recipient_id,
        }
    }

    pub fn phone(&self) -> &str {
        match self {
            Self::ConsultationSubmitted { phone, .. }
            | Self::DoctorAssigned { phone, .. }
            | Self::StatusChanged { phone, .. }
            | Self::NewMessage { phone, .. } => phone,
        }
    }

    /// Render the message body for this event.
    pub fn render(&self) -> String {
        match self {
            Self::ConsultationSubmitted {
                consultation_id, ..
            } => templates::consultation_submitted(consultation_id),
            Self::DoctorAssigned {
                consultation_id,
                doctor_name,
                ..
            } => templates::doctor_assigned(consultation_id, doctor_name),
            Self::StatusChanged {
                consultation_id,
                status,
                ..
            } => templates::status_update(consultation_id, *status),
            Self::NewMessage {
                consultation_id,
                sender_name,
                ..
            } => templates::new_message(consultation_id, sender_name),
        }
    }
}

/// Cheap clonable handle engines use to enqueue events. Sending never
/// blocks and never fails the caller; a closed queue only logs.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, event: NotificationEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("notification queue closed; event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_routing_matches_event_kind() {
        let id = Uuid::new_v4();
        let submitted = NotificationEvent::ConsultationSubmitted {
            patient_id: id,
            phone: "+15550100".into(),
            consultation_id: Uuid::new_v4(),
        };
        assert_eq!(submitted.channel(), NotificationChannel::Sms);

        let assigned = NotificationEvent::DoctorAssigned {
            patient_id: id,
            phone: "+15550100".into(),
            consultation_id: Uuid::new_v4(),
            doctor_name: "Dr. Sy".into(),
        };
        assert_eq!(assigned.channel(), NotificationChannel::WhatsApp);
    }

    #[test]
    fn rendered_body_names_the_consultation() {
        let consultation_id = Uuid::new_v4();
        let event = NotificationEvent::StatusChanged {
            patient_id: Uuid::new_v4(),
            phone: "+15550100".into(),
            consultation_id,
            status: ConsultationStatus::Completed,
        };
        assert!(event.render().contains(&consultation_id.to_string()));
    }

    #[test]
    fn notify_after_receiver_dropped_does_not_panic() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.notify(NotificationEvent::ConsultationSubmitted {
            patient_id: Uuid::new_v4(),
            phone: "+15550100".into(),
            consultation_id: Uuid::new_v4(),
        });
    }

    #[test]
    fn events_arrive_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        notifier.notify(NotificationEvent::ConsultationSubmitted {
            patient_id: Uuid::new_v4(),
            phone: "+15550100".into(),
            consultation_id: first,
        });
        notifier.notify(NotificationEvent::ConsultationSubmitted {
            patient_id: Uuid::new_v4(),
            phone: "+15550100".into(),
            consultation_id: second,
        });

        match rx.try_recv().unwrap() {
            NotificationEvent::ConsultationSubmitted {
                consultation_id, ..
            } => assert_eq!(consultation_id, first),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
