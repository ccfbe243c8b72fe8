//! Consultation lifecycle engine.
//!
//! Owns the status machine, the role-scoped authorization checks for
//! consultation fields, and the notification side effects of state
//! transitions. A consultation starts PENDING with no doctor; assignment
//! forces IN_PROGRESS; explicit updates may set any status (there is no
//! enforced transition table). `completed_at` tracks COMPLETED exactly:
//! stamped on entry, cleared when the status moves elsewhere.
//!
//! Read-check-write sequences run inside an immediate transaction so the
//! authorization check and the mutation observe the same row.

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use crate::access::can_access_consultation;
use crate::db::repository::{
    count_messages_for_consultation, count_photos_for_consultation, get_consultation, get_user,
    insert_consultation, insert_follow_up, list_all_consultations, list_consultations_by_doctor,
    list_consultations_by_patient, list_follow_ups_for_consultation, list_photos_by_consultation,
    update_consultation,
};
use crate::db::DatabaseError;
use crate::messaging::attach_senders;
use crate::models::enums::{ConsultationStatus, Role};
use crate::models::{
    Consultation, ConsultationIntake, ConsultationPatch, FollowUp, MessageWithSender, Photo,
    UserSummary,
};
use crate::notify::{NotificationEvent, Notifier};

// ═══════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error("Consultation not found")]
    NotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("You do not have access to this consultation")]
    Forbidden,
    #[error("Only doctors can update diagnosis and prescription")]
    ClinicalFieldsForbidden,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ═══════════════════════════════════════════
// View types
// ═══════════════════════════════════════════

/// Consultation plus the patient's display summary (create/update result).
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationWithPatient {
    #[serde(flatten)]
    pub consultation: Consultation,
    pub patient: UserSummary,
}

/// List entry: consultation enriched with party summaries and counts.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationSummary {
    #[serde(flatten)]
    pub consultation: Consultation,
    pub patient: UserSummary,
    pub doctor: Option<UserSummary>,
    pub message_count: u32,
    pub photo_count: u32,
}

/// Full detail: thread, photos and follow-ups included.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationDetail {
    #[serde(flatten)]
    pub consultation: Consultation,
    pub patient: UserSummary,
    pub doctor: Option<UserSummary>,
    pub messages: Vec<MessageWithSender>,
    pub photos: Vec<Photo>,
    pub follow_ups: Vec<FollowUp>,
}

// ═══════════════════════════════════════════
// Operations
// ═══════════════════════════════════════════

/// Create a consultation in PENDING for `patient_id`, defaulting absent
/// intake sub-documents to empty collections. Queues a "submitted"
/// notification when the patient has a phone number on file.
pub fn create(
    conn: &Connection,
    notifier: &Notifier,
    patient_id: Uuid,
    intake: ConsultationIntake,
) -> Result<ConsultationWithPatient, ConsultationError> {
    let patient = get_user(conn, &patient_id)?.ok_or(ConsultationError::UserNotFound)?;
    let now = Utc::now();
    let consultation = Consultation {
        id: Uuid::new_v4(),
        patient_id,
        doctor_id: None,
        chief_complaint: intake.chief_complaint,
        symptoms: intake.symptoms,
        duration: intake.duration,
        medical_history: intake.medical_history.unwrap_or_default(),
        medications: intake.medications.unwrap_or_default(),
        allergies: intake.allergies.unwrap_or_default(),
        vital_signs: intake.vital_signs.unwrap_or_default(),
        video_url: intake.video_url,
        priority: intake.priority.unwrap_or_default(),
        status: ConsultationStatus::Pending,
        diagnosis: None,
        prescription: None,
        recommendations: None,
        follow_up_required: false,
        follow_up_date: None,
        completed_at: None,
        created_at: now,
        updated_at: now,
    };
    insert_consultation(conn, &consultation)?;

    if let Some(phone) = patient.phone.clone() {
        notifier.notify(NotificationEvent::ConsultationSubmitted {
            patient_id,
            phone,
            consultation_id: consultation.id,
        });
    }

    Ok(ConsultationWithPatient {
        consultation,
        patient: UserSummary::from(&patient),
    })
}

/// Role-scoped listing, newest-created first: PATIENT sees own, DOCTOR
/// sees assigned, ADMIN sees all. Each entry carries party summaries and
/// message/photo counts.
pub fn list(
    conn: &Connection,
    actor_id: &Uuid,
    role: Role,
) -> Result<Vec<ConsultationSummary>, ConsultationError> {
    let consultations = match role {
        Role::Patient => list_consultations_by_patient(conn, actor_id)?,
        Role::Doctor => list_consultations_by_doctor(conn, actor_id)?,
        Role::Admin => list_all_consultations(conn)?,
    };

    let mut summaries = Vec::with_capacity(consultations.len());
    for consultation in consultations {
        let patient = get_user(conn, &consultation.patient_id)?
            .map(|u| UserSummary::from(&u))
            .ok_or(ConsultationError::UserNotFound)?;
        let doctor = match consultation.doctor_id {
            Some(id) => get_user(conn, &id)?.map(|u| UserSummary::from(&u)),
            None => None,
        };
        let message_count = count_messages_for_consultation(conn, &consultation.id)?;
        let photo_count = count_photos_for_consultation(conn, &consultation.id)?;
        summaries.push(ConsultationSummary {
            consultation,
            patient,
            doctor,
            message_count,
            photo_count,
        });
    }
    Ok(summaries)
}

/// Full detail with access check: messages oldest-first, photos
/// newest-first, follow-ups soonest-first.
pub fn get(
    conn: &Connection,
    id: &Uuid,
    actor_id: &Uuid,
    role: Role,
) -> Result<ConsultationDetail, ConsultationError> {
    let consultation = get_consultation(conn, id)?.ok_or(ConsultationError::NotFound)?;
    if !can_access_consultation(&consultation, actor_id, role) {
        return Err(ConsultationError::Forbidden);
    }

    let patient = get_user(conn, &consultation.patient_id)?
        .map(|u| UserSummary::from(&u))
        .ok_or(ConsultationError::UserNotFound)?;
    let doctor = match consultation.doctor_id {
        Some(doctor_id) => get_user(conn, &doctor_id)?.map(|u| UserSummary::from(&u)),
        None => None,
    };
    let messages = attach_senders(conn, crate::db::repository::list_messages_for_consultation(conn, id)?)?;
    let photos = list_photos_by_consultation(conn, id)?;
    let follow_ups = list_follow_ups_for_consultation(conn, id)?;

    Ok(ConsultationDetail {
        consultation,
        patient,
        doctor,
        messages,
        photos,
        follow_ups,
    })
}

/// Apply a partial update after the same access check as `get`, with the
/// doctor-only gate on diagnosis/prescription. Stamps or clears
/// `completed_at` as the status enters or leaves COMPLETED. Queues a
/// status-specific notification when the patch carried a status and the
/// patient has a phone number.
pub fn update(
    conn: &mut Connection,
    notifier: &Notifier,
    id: &Uuid,
    actor_id: &Uuid,
    role: Role,
    patch: ConsultationPatch,
) -> Result<ConsultationWithPatient, ConsultationError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate).map_err(DatabaseError::from)?;

    let mut consultation = get_consultation(&tx, id)?.ok_or(ConsultationError::NotFound)?;
    if !can_access_consultation(&consultation, actor_id, role) {
        return Err(ConsultationError::Forbidden);
    }
    if patch.touches_clinical_fields() && role != Role::Doctor {
        return Err(ConsultationError::ClinicalFieldsForbidden);
    }

    let new_status = patch.status;
    if let Some(status) = patch.status {
        consultation.status = status;
        consultation.completed_at = if status == ConsultationStatus::Completed {
            Some(Utc::now())
        } else {
            None
        };
    }
    if let Some(diagnosis) = patch.diagnosis {
        consultation.diagnosis = Some(diagnosis);
    }
    if let Some(prescription) = patch.prescription {
        consultation.prescription = Some(prescription);
    }
    if let Some(recommendations) = patch.recommendations {
        consultation.recommendations = Some(recommendations);
    }
    if let Some(required) = patch.follow_up_required {
        consultation.follow_up_required = required;
    }
    if let Some(date) = patch.follow_up_date {
        consultation.follow_up_date = Some(date);
    }
    consultation.updated_at = Utc::now();

    update_consultation(&tx, &consultation)?;
    let patient =
        get_user(&tx, &consultation.patient_id)?.ok_or(ConsultationError::UserNotFound)?;
    tx.commit().map_err(DatabaseError::from)?;

    if let (Some(status), Some(phone)) = (new_status, patient.phone.clone()) {
        notifier.notify(NotificationEvent::StatusChanged {
            patient_id: consultation.patient_id,
            phone,
            consultation_id: consultation.id,
            status,
        });
    }

    Ok(ConsultationWithPatient {
        consultation,
        patient: UserSummary::from(&patient),
    })
}

/// Assign a doctor and force the status to IN_PROGRESS regardless of the
/// prior state. Authorization is assumed to be gated upstream. Queues a
/// "doctor assigned" notification naming the doctor.
pub fn assign_doctor(
    conn: &mut Connection,
    notifier: &Notifier,
    consultation_id: &Uuid,
    doctor_id: &Uuid,
) -> Result<Consultation, ConsultationError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate).map_err(DatabaseError::from)?;

    let mut consultation =
        get_consultation(&tx, consultation_id)?.ok_or(ConsultationError::NotFound)?;
    let doctor = get_user(&tx, doctor_id)?.ok_or(ConsultationError::UserNotFound)?;
    let patient =
        get_user(&tx, &consultation.patient_id)?.ok_or(ConsultationError::UserNotFound)?;

    consultation.doctor_id = Some(*doctor_id);
    consultation.status = ConsultationStatus::InProgress;
    consultation.completed_at = None;
    consultation.updated_at = Utc::now();
    update_consultation(&tx, &consultation)?;
    tx.commit().map_err(DatabaseError::from)?;

    if let Some(phone) = patient.phone {
        notifier.notify(NotificationEvent::DoctorAssigned {
            patient_id: consultation.patient_id,
            phone,
            consultation_id: consultation.id,
            doctor_name: format!("Dr. {}", doctor.display_name()),
        });
    }

    Ok(consultation)
}

/// Append a follow-up row. Does not schedule a reminder; reminder delivery
/// is an external concern.
pub fn create_follow_up(
    conn: &Connection,
    consultation_id: &Uuid,
    scheduled_date: chrono::DateTime<Utc>,
    notes: Option<String>,
) -> Result<FollowUp, ConsultationError> {
    if get_consultation(conn, consultation_id)?.is_none() {
        return Err(ConsultationError::NotFound);
    }
    let follow_up = FollowUp {
        id: Uuid::new_v4(),
        consultation_id: *consultation_id,
        scheduled_date,
        notes,
        created_at: Utc::now(),
    };
    insert_follow_up(conn, &follow_up)?;
    Ok(follow_up)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_message, insert_photo, insert_user};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::MessageType;
    use crate::models::{Message, Photo, PhotoMetadata, PrescriptionItem, User};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn seed_user(conn: &Connection, role: Role, phone: Option<&str>) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "hash".into(),
            first_name: match role {
                Role::Doctor => "Mariama".into(),
                _ => "Awa".into(),
            },
            last_name: match role {
                Role::Doctor => "Sy".into(),
                _ => "Ba".into(),
            },
            role,
            phone: phone.map(|p| p.to_string()),
            avatar: None,
            created_at: Utc::now(),
        };
        insert_user(conn, &user).unwrap();
        user.id
    }

    fn intake(symptoms: &[&str], duration: &str) -> ConsultationIntake {
        ConsultationIntake {
            chief_complaint: "Fever and chills since the weekend".into(),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            duration: duration.into(),
            medical_history: None,
            medications: None,
            allergies: None,
            vital_signs: None,
            video_url: None,
            priority: None,
        }
    }

    fn drain(rx: &mut UnboundedReceiver<NotificationEvent>) -> Vec<NotificationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // ── create ───────────────────────────────────────────

    #[test]
    fn create_starts_pending_with_defaults_and_notifies() {
        let conn = test_db();
        let (notifier, mut rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, Some("+15550100"));

        let created = create(&conn, &notifier, patient, intake(&["fever"], "2 days")).unwrap();
        let c = &created.consultation;
        assert_eq!(c.status, ConsultationStatus::Pending);
        assert!(c.doctor_id.is_none());
        assert!(c.completed_at.is_none());
        assert_eq!(c.symptoms, vec!["fever"]);
        assert_eq!(c.duration, "2 days");
        assert!(c.medical_history.conditions.is_empty());
        assert!(c.medications.is_empty());
        assert_eq!(created.patient.id, patient);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            NotificationEvent::ConsultationSubmitted { consultation_id, .. }
                if *consultation_id == c.id
        ));
    }

    #[test]
    fn create_without_phone_queues_nothing() {
        let conn = test_db();
        let (notifier, mut rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);

        create(&conn, &notifier, patient, intake(&["cough"], "1 day")).unwrap();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn create_for_unknown_patient_fails() {
        let conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let result = create(&conn, &notifier, Uuid::new_v4(), intake(&["rash"], "1 week"));
        assert!(matches!(result, Err(ConsultationError::UserNotFound)));
    }

    // ── get ──────────────────────────────────────────────

    #[test]
    fn get_enforces_role_scoped_access() {
        let conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let other_patient = seed_user(&conn, Role::Patient, None);
        let doctor = seed_user(&conn, Role::Doctor, None);
        let admin = seed_user(&conn, Role::Admin, None);
        let id = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;

        assert!(get(&conn, &id, &patient, Role::Patient).is_ok());
        assert!(matches!(
            get(&conn, &id, &other_patient, Role::Patient),
            Err(ConsultationError::Forbidden)
        ));
        // Unassigned consultation: every doctor is denied.
        assert!(matches!(
            get(&conn, &id, &doctor, Role::Doctor),
            Err(ConsultationError::Forbidden)
        ));
        assert!(get(&conn, &id, &admin, Role::Admin).is_ok());
        assert!(matches!(
            get(&conn, &Uuid::new_v4(), &patient, Role::Patient),
            Err(ConsultationError::NotFound)
        ));
    }

    #[test]
    fn previously_assigned_doctor_is_denied_elsewhere() {
        let mut conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let doctor = seed_user(&conn, Role::Doctor, None);

        let mine = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;
        let other = create(&conn, &notifier, patient, intake(&["cough"], "3 days"))
            .unwrap()
            .consultation
            .id;
        assign_doctor(&mut conn, &notifier, &mine, &doctor).unwrap();

        assert!(get(&conn, &mine, &doctor, Role::Doctor).is_ok());
        assert!(matches!(
            get(&conn, &other, &doctor, Role::Doctor),
            Err(ConsultationError::Forbidden)
        ));
    }

    #[test]
    fn get_orders_thread_photos_and_follow_ups() {
        let conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let id = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;

        for (offset, content) in [(10, "first"), (5, "second"), (1, "third")] {
            insert_message(
                &conn,
                &Message {
                    id: Uuid::new_v4(),
                    consultation_id: id,
                    sender_id: patient,
                    message_type: MessageType::Text,
                    content: content.into(),
                    attachments: vec![],
                    is_read: false,
                    read_at: None,
                    created_at: Utc::now() - chrono::Duration::minutes(offset),
                },
            )
            .unwrap();
        }
        for (offset, url) in [(3, "old.jpg"), (1, "new.jpg")] {
            insert_photo(
                &conn,
                &Photo {
                    id: Uuid::new_v4(),
                    user_id: patient,
                    consultation_id: Some(id),
                    url: format!("/uploads/photos/{url}"),
                    caption: None,
                    body_part: None,
                    angle: None,
                    metadata: PhotoMetadata::default(),
                    created_at: Utc::now() - chrono::Duration::days(offset),
                },
            )
            .unwrap();
        }
        create_follow_up(
            &conn,
            &id,
            Utc::now() + chrono::Duration::days(30),
            Some("late".into()),
        )
        .unwrap();
        create_follow_up(&conn, &id, Utc::now() + chrono::Duration::days(7), None).unwrap();

        let detail = get(&conn, &id, &patient, Role::Patient).unwrap();
        let contents: Vec<_> = detail
            .messages
            .iter()
            .map(|m| m.message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(detail.photos[0].url.ends_with("new.jpg"));
        assert!(detail.follow_ups[0].notes.is_none(), "soonest follow-up first");
        assert_eq!(detail.patient.id, patient);
    }

    // ── update ───────────────────────────────────────────

    #[test]
    fn clinical_fields_are_doctor_only_even_for_the_patient() {
        let mut conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let id = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;

        let patch = ConsultationPatch {
            diagnosis: Some("self-diagnosis".into()),
            ..Default::default()
        };
        let result = update(&mut conn, &notifier, &id, &patient, Role::Patient, patch);
        assert!(matches!(result, Err(ConsultationError::ClinicalFieldsForbidden)));

        let prescription_patch = ConsultationPatch {
            prescription: Some(vec![PrescriptionItem {
                medication: "Paracetamol".into(),
                dosage: "500mg".into(),
                frequency: "3x daily".into(),
                duration: "5 days".into(),
                instructions: None,
            }]),
            ..Default::default()
        };
        let admin = seed_user(&conn, Role::Admin, None);
        let result = update(
            &mut conn,
            &notifier,
            &id,
            &admin,
            Role::Admin,
            prescription_patch,
        );
        assert!(matches!(result, Err(ConsultationError::ClinicalFieldsForbidden)));
    }

    #[test]
    fn update_requires_access() {
        let mut conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let other_patient = seed_user(&conn, Role::Patient, None);
        let id = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;

        let patch = ConsultationPatch {
            status: Some(ConsultationStatus::Cancelled),
            ..Default::default()
        };
        let result = update(
            &mut conn,
            &notifier,
            &id,
            &other_patient,
            Role::Patient,
            patch,
        );
        assert!(matches!(result, Err(ConsultationError::Forbidden)));
    }

    #[test]
    fn completed_at_tracks_completed_status_exactly() {
        let mut conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let doctor = seed_user(&conn, Role::Doctor, None);
        let id = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;
        assign_doctor(&mut conn, &notifier, &id, &doctor).unwrap();

        let completed = update(
            &mut conn,
            &notifier,
            &id,
            &doctor,
            Role::Doctor,
            ConsultationPatch {
                status: Some(ConsultationStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(completed.consultation.completed_at.is_some());

        // The status machine permits leaving COMPLETED; the stamp must go.
        let reopened = update(
            &mut conn,
            &notifier,
            &id,
            &doctor,
            Role::Doctor,
            ConsultationPatch {
                status: Some(ConsultationStatus::AwaitingResponse),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(reopened.consultation.completed_at.is_none());
    }

    #[test]
    fn update_without_status_keeps_completion_and_stays_silent() {
        let mut conn = test_db();
        let (notifier, mut rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, Some("+15550100"));
        let doctor = seed_user(&conn, Role::Doctor, None);
        let id = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;
        assign_doctor(&mut conn, &notifier, &id, &doctor).unwrap();
        drain(&mut rx);

        let updated = update(
            &mut conn,
            &notifier,
            &id,
            &doctor,
            Role::Doctor,
            ConsultationPatch {
                recommendations: Some("Plenty of fluids, re-photograph in 3 days".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            updated.consultation.recommendations.as_deref(),
            Some("Plenty of fluids, re-photograph in 3 days")
        );
        assert_eq!(updated.consultation.status, ConsultationStatus::InProgress);
        assert!(drain(&mut rx).is_empty(), "no status in patch, no event");
    }

    #[test]
    fn status_update_queues_status_specific_event() {
        let mut conn = test_db();
        let (notifier, mut rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, Some("+15550100"));
        let doctor = seed_user(&conn, Role::Doctor, None);
        let id = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;
        assign_doctor(&mut conn, &notifier, &id, &doctor).unwrap();
        drain(&mut rx);

        update(
            &mut conn,
            &notifier,
            &id,
            &doctor,
            Role::Doctor,
            ConsultationPatch {
                status: Some(ConsultationStatus::AwaitingResponse),
                ..Default::default()
            },
        )
        .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            NotificationEvent::StatusChanged { status, .. }
                if *status == ConsultationStatus::AwaitingResponse
        ));
    }

    // ── assign ───────────────────────────────────────────

    #[test]
    fn assign_forces_in_progress_and_names_doctor() {
        let mut conn = test_db();
        let (notifier, mut rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, Some("+15550100"));
        let doctor = seed_user(&conn, Role::Doctor, None);
        let id = create(&conn, &notifier, patient, intake(&["fever"], "2 days"))
            .unwrap()
            .consultation
            .id;
        drain(&mut rx);

        let assigned = assign_doctor(&mut conn, &notifier, &id, &doctor).unwrap();
        assert_eq!(assigned.status, ConsultationStatus::InProgress);
        assert_eq!(assigned.doctor_id, Some(doctor));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            NotificationEvent::DoctorAssigned { doctor_name, .. } => {
                assert_eq!(doctor_name, "Dr. Mariama Sy");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn assign_overrides_any_prior_status() {
        let mut conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let doctor = seed_user(&conn, Role::Doctor, None);
        let replacement = seed_user(&conn, Role::Doctor, None);
        let id = create(&conn, &notifier, patient, intake(&["fever"], "2 days"))
            .unwrap()
            .consultation
            .id;

        assign_doctor(&mut conn, &notifier, &id, &doctor).unwrap();
        update(
            &mut conn,
            &notifier,
            &id,
            &doctor,
            Role::Doctor,
            ConsultationPatch {
                status: Some(ConsultationStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();

        let reassigned = assign_doctor(&mut conn, &notifier, &id, &replacement).unwrap();
        assert_eq!(reassigned.status, ConsultationStatus::InProgress);
        assert_eq!(reassigned.doctor_id, Some(replacement));
        assert!(reassigned.completed_at.is_none());
    }

    #[test]
    fn assign_missing_consultation_or_doctor_fails() {
        let mut conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let doctor = seed_user(&conn, Role::Doctor, None);
        let id = create(&conn, &notifier, patient, intake(&["fever"], "2 days"))
            .unwrap()
            .consultation
            .id;

        assert!(matches!(
            assign_doctor(&mut conn, &notifier, &Uuid::new_v4(), &doctor),
            Err(ConsultationError::NotFound)
        ));
        assert!(matches!(
            assign_doctor(&mut conn, &notifier, &id, &Uuid::new_v4()),
            Err(ConsultationError::UserNotFound)
        ));
    }

    // ── list ─────────────────────────────────────────────

    #[test]
    fn list_is_role_scoped_with_counts() {
        let mut conn = test_db();
        let (notifier, _rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, None);
        let other_patient = seed_user(&conn, Role::Patient, None);
        let doctor = seed_user(&conn, Role::Doctor, None);
        let admin = seed_user(&conn, Role::Admin, None);

        let mine = create(&conn, &notifier, patient, intake(&["rash"], "1 week"))
            .unwrap()
            .consultation
            .id;
        create(&conn, &notifier, other_patient, intake(&["cough"], "3 days")).unwrap();
        assign_doctor(&mut conn, &notifier, &mine, &doctor).unwrap();

        insert_message(
            &conn,
            &Message {
                id: Uuid::new_v4(),
                consultation_id: mine,
                sender_id: patient,
                message_type: MessageType::Text,
                content: "photo attached".into(),
                attachments: vec![],
                is_read: false,
                read_at: None,
                created_at: Utc::now(),
            },
        )
        .unwrap();
        insert_photo(
            &conn,
            &Photo {
                id: Uuid::new_v4(),
                user_id: patient,
                consultation_id: Some(mine),
                url: "/uploads/photos/a.jpg".into(),
                caption: None,
                body_part: None,
                angle: None,
                metadata: PhotoMetadata::default(),
                created_at: Utc::now(),
            },
        )
        .unwrap();

        let patient_view = list(&conn, &patient, Role::Patient).unwrap();
        assert_eq!(patient_view.len(), 1);
        assert_eq!(patient_view[0].message_count, 1);
        assert_eq!(patient_view[0].photo_count, 1);
        assert_eq!(patient_view[0].doctor.as_ref().unwrap().id, doctor);

        let doctor_view = list(&conn, &doctor, Role::Doctor).unwrap();
        assert_eq!(doctor_view.len(), 1);
        assert_eq!(doctor_view[0].consultation.id, mine);

        let admin_view = list(&conn, &admin, Role::Admin).unwrap();
        assert_eq!(admin_view.len(), 2);
    }

    // ── follow-ups ───────────────────────────────────────

    #[test]
    fn follow_up_requires_existing_consultation() {
        let conn = test_db();
        let result = create_follow_up(&conn, &Uuid::new_v4(), Utc::now(), None);
        assert!(matches!(result, Err(ConsultationError::NotFound)));
    }

    // ── end-to-end lifecycle scenario ────────────────────

    #[test]
    fn full_lifecycle_scenario() {
        let mut conn = test_db();
        let (notifier, mut rx) = Notifier::channel();
        let patient = seed_user(&conn, Role::Patient, Some("+15550100"));
        let doctor = seed_user(&conn, Role::Doctor, None);

        let created = create(&conn, &notifier, patient, intake(&["fever"], "2 days")).unwrap();
        assert_eq!(created.consultation.status, ConsultationStatus::Pending);
        assert!(created.consultation.doctor_id.is_none());

        let id = created.consultation.id;
        let assigned = assign_doctor(&mut conn, &notifier, &id, &doctor).unwrap();
        assert_eq!(assigned.status, ConsultationStatus::InProgress);
        assert_eq!(assigned.doctor_id, Some(doctor));

        let completed = update(
            &mut conn,
            &notifier,
            &id,
            &doctor,
            Role::Doctor,
            ConsultationPatch {
                status: Some(ConsultationStatus::Completed),
                diagnosis: Some("Viral infection".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(completed.consultation.completed_at.is_some());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], NotificationEvent::ConsultationSubmitted { .. }));
        assert!(matches!(events[1], NotificationEvent::DoctorAssigned { .. }));
        assert!(matches!(
            &events[2],
            NotificationEvent::StatusChanged { status, phone, .. }
                if *status == ConsultationStatus::Completed && phone == "+15550100"
        ));
    }
}
