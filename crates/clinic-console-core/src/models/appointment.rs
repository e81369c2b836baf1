//! Appointment (rendez-vous) models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::wire;
use crate::entity::{
    parse_timestamp, Draft, Entity, PatientDirectory, RecordId, SortField, SortKey, UNKNOWN_PATIENT,
};
use crate::render::display_datetime;
use crate::screen::{FieldErrors, FormError};

/// An appointment between a patient and the clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    #[serde(deserialize_with = "wire::id")]
    pub id: RecordId,
    #[serde(deserialize_with = "wire::id")]
    pub patient_id: RecordId,
    /// Scheduled date and time
    #[serde(default, deserialize_with = "wire::text")]
    pub date_heure: String,
    /// Reason for the visit
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub motif: Option<String>,
    /// Patient summary embedded by the agenda endpoint
    #[serde(default)]
    pub patient: Option<EmbeddedPatient>,
}

/// Patient summary the API embeds in appointment listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EmbeddedPatient {
    #[serde(default, deserialize_with = "wire::text")]
    pub nom: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub prenom: String,
    #[serde(default, deserialize_with = "wire::opt_count")]
    pub age: Option<u32>,
    /// Medical history
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub antecedents: Option<String>,
    /// Current treatments
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub traitements: Option<String>,
}

impl Appointment {
    /// (nom, prenom) from the directory, else from the embedded summary.
    pub fn patient_names(&self, patients: &PatientDirectory) -> Option<(String, String)> {
        patients
            .get(self.patient_id)
            .map(|p| (p.nom.clone(), p.prenom.clone()))
            .or_else(|| {
                self.patient
                    .as_ref()
                    .map(|p| (p.nom.clone(), p.prenom.clone()))
            })
    }

    pub fn patient_display(&self, patients: &PatientDirectory) -> String {
        match self.patient_names(patients) {
            Some((nom, prenom)) => format!("{} {}", prenom, nom).trim().to_string(),
            None => UNKNOWN_PATIENT.to_string(),
        }
    }

    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.date_heure)
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc())
    }

    /// Whether the appointment is still ahead of `now`.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.scheduled_at().map_or(false, |at| at > now)
    }
}

/// Sortable appointment columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentField {
    Id,
    Patient,
    DateHeure,
    Motif,
}

impl SortField for AppointmentField {
    const ALL: &'static [Self] = &[
        AppointmentField::Id,
        AppointmentField::Patient,
        AppointmentField::DateHeure,
        AppointmentField::Motif,
    ];

    fn name(self) -> &'static str {
        match self {
            AppointmentField::Id => "id",
            AppointmentField::Patient => "patient",
            AppointmentField::DateHeure => "date_heure",
            AppointmentField::Motif => "motif",
        }
    }
}

/// Appointment form state.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AppointmentDraft {
    #[serde(skip_serializing)]
    pub id: Option<RecordId>,
    pub patient_id: String,
    pub date_heure: String,
    pub motif: String,
}

impl Draft for AppointmentDraft {
    const FIELDS: &'static [&'static str] = &["patient_id", "date_heure", "motif"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn get(&self, field: &str) -> Option<String> {
        match field {
            "patient_id" => Some(self.patient_id.clone()),
            "date_heure" => Some(self.date_heure.clone()),
            "motif" => Some(self.motif.clone()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        match field {
            "patient_id" => self.patient_id = value.trim().to_string(),
            "date_heure" => self.date_heure = value.trim().to_string(),
            "motif" => self.motif = value.to_string(),
            _ => return Err(FormError::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_id("patient_id", &self.patient_id, "Patient is required");
        errors.require("date_heure", &self.date_heure, "Date and time are required");
        if !self.date_heure.trim().is_empty() && parse_timestamp(&self.date_heure).is_none() {
            errors.insert("date_heure", "Expected YYYY-MM-DDTHH:MM");
        }
        errors
    }
}

impl Entity for Appointment {
    type Draft = AppointmentDraft;
    type Field = AppointmentField;

    const COLLECTION: &'static str = "rendezvous";
    const LABEL: &'static str = "appointment";
    const COLUMNS: &'static [&'static str] = &["ID", "Patient", "Date/time", "Reason"];
    const NEEDS_PATIENTS: bool = true;

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self, patients: &PatientDirectory) -> Vec<String> {
        let (nom, prenom) = self.patient_names(patients).unwrap_or_default();
        vec![
            nom,
            prenom,
            self.date_heure.clone(),
            self.motif.clone().unwrap_or_default(),
        ]
    }

    fn sort_key(&self, field: AppointmentField, patients: &PatientDirectory) -> SortKey {
        match field {
            AppointmentField::Id => SortKey::Number(self.id as f64),
            AppointmentField::Patient => {
                let name = self
                    .patient_names(patients)
                    .map(|(nom, prenom)| format!("{} {}", nom, prenom).to_lowercase())
                    .unwrap_or_default();
                SortKey::Text(name)
            }
            AppointmentField::DateHeure => SortKey::date(&self.date_heure),
            AppointmentField::Motif => SortKey::text(self.motif.as_deref().unwrap_or_default()),
        }
    }

    fn to_draft(&self) -> AppointmentDraft {
        AppointmentDraft {
            id: Some(self.id),
            patient_id: self.patient_id.to_string(),
            date_heure: wire::minutes_precision(&self.date_heure),
            motif: self.motif.clone().unwrap_or_default(),
        }
    }

    fn cells(&self, patients: &PatientDirectory) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.patient_display(patients),
            display_datetime(&self.date_heure),
            self.motif.clone().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn appointment(date_heure: &str) -> Appointment {
        Appointment {
            id: 1,
            patient_id: 7,
            date_heure: date_heure.into(),
            motif: Some("Contrôle".into()),
            patient: None,
        }
    }

    #[test]
    fn test_embedded_patient_fallback() {
        let appt: Appointment = serde_json::from_str(
            r#"{"id": 1, "patient_id": "7", "date_heure": "2024-03-05 14:30:00",
                "motif": "Fièvre", "patient": {"nom": "Martin", "prenom": "Alice", "age": 34}}"#,
        )
        .unwrap();

        let empty = PatientDirectory::default();
        assert_eq!(appt.patient_display(&empty), "Alice Martin");
        assert_eq!(appt.patient.as_ref().and_then(|p| p.age), Some(34));
    }

    #[test]
    fn test_unknown_patient() {
        let appt = appointment("2024-03-05T14:30");
        assert_eq!(
            appt.patient_display(&PatientDirectory::default()),
            UNKNOWN_PATIENT
        );
    }

    #[test]
    fn test_upcoming() {
        let appt = appointment("2024-03-05T14:30");
        let before = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        assert!(appt.is_upcoming(before));
        assert!(!appt.is_upcoming(after));
    }

    #[test]
    fn test_draft_validation() {
        let mut draft = AppointmentDraft::default();
        let errors = draft.validate();
        assert!(errors.get("patient_id").is_some());
        assert!(errors.get("date_heure").is_some());

        draft.set("patient_id", "7").unwrap();
        draft.set("date_heure", "tomorrow").unwrap();
        assert_eq!(
            draft.validate().get("date_heure"),
            Some("Expected YYYY-MM-DDTHH:MM")
        );

        draft.set("date_heure", "2024-03-05T14:30").unwrap();
        assert!(draft.validate().is_empty());
    }

    #[test]
    fn test_edit_draft_keeps_minutes() {
        let draft = appointment("2024-03-05 14:30:00").to_draft();
        assert_eq!(draft.date_heure, "2024-03-05T14:30");
        assert_eq!(draft.patient_id, "7");
    }
}
