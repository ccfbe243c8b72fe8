//! Consultation aggregate root and its structured sub-documents.
//!
//! A consultation starts in PENDING with no doctor. Assignment moves it to
//! IN_PROGRESS; an explicit update may move it to any other status.
//! `completed_at` is set exactly while status is COMPLETED.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ConsultationStatus, Priority};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub chief_complaint: String,
    pub symptoms: Vec<String>,
    pub duration: String,
    pub medical_history: MedicalHistory,
    pub medications: Vec<MedicationEntry>,
    pub allergies: Vec<AllergyEntry>,
    pub vital_signs: VitalSigns,
    pub video_url: Option<String>,
    pub priority: Priority,
    pub status: ConsultationStatus,
    pub diagnosis: Option<String>,
    pub prescription: Option<Vec<PrescriptionItem>>,
    pub recommendations: Option<String>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalHistory {
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub surgeries: Vec<String>,
    #[serde(default)]
    pub family_history: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllergyEntry {
    pub allergen: String,
    pub reaction: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitalSigns {
    pub temperature: Option<f64>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<u32>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionItem {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: Option<String>,
}

/// Patient-supplied intake. Optional sub-documents default to empty
/// collections when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsultationIntake {
    pub chief_complaint: String,
    pub symptoms: Vec<String>,
    pub duration: String,
    pub medical_history: Option<MedicalHistory>,
    pub medications: Option<Vec<MedicationEntry>>,
    pub allergies: Option<Vec<AllergyEntry>>,
    pub vital_signs: Option<VitalSigns>,
    pub video_url: Option<String>,
    pub priority: Option<Priority>,
}

/// Partial update. Absent fields are left unchanged; `diagnosis` and
/// `prescription` are doctor-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationPatch {
    pub status: Option<ConsultationStatus>,
    pub diagnosis: Option<String>,
    pub prescription: Option<Vec<PrescriptionItem>>,
    pub recommendations: Option<String>,
    pub follow_up_required: Option<bool>,
    pub follow_up_date: Option<DateTime<Utc>>,
}

impl ConsultationPatch {
    /// Does this patch touch the doctor-only clinical fields?
    pub fn touches_clinical_fields(&self) -> bool {
        self.diagnosis.is_some() || self.prescription.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_deserializes_with_defaults_absent() {
        let json = r#"{
            "chief_complaint": "Persistent rash on both forearms",
            "symptoms": ["rash", "itching"],
            "duration": "2 weeks"
        }"#;
        let intake: ConsultationIntake = serde_json::from_str(json).unwrap();
        assert!(intake.medical_history.is_none());
        assert!(intake.medications.is_none());
        assert!(intake.priority.is_none());
    }

    #[test]
    fn patch_clinical_field_detection() {
        let empty = ConsultationPatch::default();
        assert!(!empty.touches_clinical_fields());

        let diagnosis = ConsultationPatch {
            diagnosis: Some("Contact dermatitis".into()),
            ..Default::default()
        };
        assert!(diagnosis.touches_clinical_fields());

        let prescription = ConsultationPatch {
            prescription: Some(vec![PrescriptionItem {
                medication: "Hydrocortisone".into(),
                dosage: "1%".into(),
                frequency: "twice daily".into(),
                duration: "7 days".into(),
                instructions: None,
            }]),
            ..Default::default()
        };
        assert!(prescription.touches_clinical_fields());

        let status_only = ConsultationPatch {
            status: Some(ConsultationStatus::Completed),
            ..Default::default()
        };
        assert!(!status_only.touches_clinical_fields());
    }

    #[test]
    fn medical_history_partial_json() {
        let history: MedicalHistory =
            serde_json::from_str(r#"{"conditions":["asthma"]}"#).unwrap();
        assert_eq!(history.conditions, vec!["asthma"]);
        assert!(history.surgeries.is_empty());
    }
}
