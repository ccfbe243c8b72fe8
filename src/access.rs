//! Consultation access policy.
//!
//! Two stateless predicates, checked everywhere a consultation or one of its
//! sub-resources is touched:
//! 1. Role-scoped visibility: PATIENT sees own, DOCTOR sees assigned,
//!    ADMIN sees all.
//! 2. Thread membership: only the patient and the assigned doctor take part
//!    in the message thread.
//!
//! Default-deny. A doctor assigned to one consultation gains nothing on any
//! other consultation.

use uuid::Uuid;

use crate::models::enums::Role;
use crate::models::Consultation;

/// Can `actor_id` acting as `role` read or mutate this consultation?
pub fn can_access_consultation(consultation: &Consultation, actor_id: &Uuid, role: Role) -> bool {
    match role {
        Role::Patient => consultation.patient_id == *actor_id,
        Role::Doctor => consultation.doctor_id == Some(*actor_id),
        Role::Admin => true,
    }
}

/// Is `actor_id` a member of the consultation's thread (its patient or its
/// assigned doctor)? Role-independent; used for message posting and reads.
pub fn is_participant(consultation: &Consultation, actor_id: &Uuid) -> bool {
    consultation.patient_id == *actor_id || consultation.doctor_id == Some(*actor_id)
}
