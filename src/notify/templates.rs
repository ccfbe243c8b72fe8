//! Message templates. Every body ends with the consultation id so support
//! staff can correlate a delivery report with a case.

use uuid::Uuid;

use crate::models::enums::ConsultationStatus;

pub fn consultation_submitted(consultation_id: &Uuid) -> String {
    format!(
        "Your consultation has been submitted successfully. A doctor will review your case shortly; \
         you'll receive updates by SMS and in the app. Consultation ID: {consultation_id}"
    )
}

pub fn doctor_assigned(consultation_id: &Uuid, doctor_name: &str) -> String {
    format!(
        "Good news! {doctor_name} has been assigned to your consultation. \
         They will review your case and respond soon. Consultation ID: {consultation_id}"
    )
}

pub fn status_update(consultation_id: &Uuid, status: ConsultationStatus) -> String {
    let line = match status {
        ConsultationStatus::InProgress => "Your consultation is now being reviewed by your doctor.",
        ConsultationStatus::AwaitingResponse => {
            "Your doctor has responded. Check the app for their recommendations."
        }
        ConsultationStatus::Completed => {
            "Your consultation has been completed. You can view the summary in the app."
        }
        ConsultationStatus::Cancelled => {
            "Your consultation has been cancelled. If you need help, please create a new consultation."
        }
        _ => "Your consultation status has been updated.",
    };
    format!("{line} Consultation ID: {consultation_id}")
}

pub fn new_message(consultation_id: &Uuid, sender_name: &str) -> String {
    format!(
        "New message from {sender_name}. Open the app to read and reply. \
         Consultation ID: {consultation_id}"
    )
}

/// Reminder body for a scheduled follow-up. Delivery scheduling lives
/// outside this service; the template is kept here with the others.
pub fn follow_up_reminder(consultation_id: &Uuid, follow_up_date: &str) -> String {
    format!(
        "Reminder: you have a follow-up scheduled for {follow_up_date}. \
         Please check the app for details. Consultation ID: {consultation_id}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_carries_the_consultation_id() {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        assert!(consultation_submitted(&id).contains(&id_str));
        assert!(doctor_assigned(&id, "Dr. Fall").contains(&id_str));
        assert!(status_update(&id, ConsultationStatus::Completed).contains(&id_str));
        assert!(new_message(&id, "Awa Ba").contains(&id_str));
        assert!(follow_up_reminder(&id, "2026-09-01").contains(&id_str));
    }

    #[test]
    fn status_lines_are_status_specific() {
        let id = Uuid::new_v4();
        assert!(status_update(&id, ConsultationStatus::InProgress).contains("being reviewed"));
        assert!(status_update(&id, ConsultationStatus::AwaitingResponse).contains("has responded"));
        assert!(status_update(&id, ConsultationStatus::Completed).contains("completed"));
        assert!(status_update(&id, ConsultationStatus::Cancelled).contains("cancelled"));
    }

    #[test]
    fn unexpected_status_falls_back_to_generic_line() {
        let id = Uuid::new_v4();
        let body = status_update(&id, ConsultationStatus::Pending);
        assert!(body.contains("status has been updated"));
    }

    #[test]
    fn doctor_assignment_names_the_doctor() {
        let id = Uuid::new_v4();
        assert!(doctor_assigned(&id, "Dr. Mariama Sy").contains("Dr. Mariama Sy"));
    }
}
