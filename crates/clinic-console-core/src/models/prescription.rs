//! Prescription (ordonnance) models.

use serde::{Deserialize, Serialize};

use super::wire;
use crate::entity::{Draft, Entity, PatientDirectory, RecordId, SortField, SortKey};
use crate::render::display_date;
use crate::screen::{FieldErrors, FormError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    #[serde(deserialize_with = "wire::id")]
    pub id: RecordId,
    #[serde(deserialize_with = "wire::id")]
    pub patient_id: RecordId,
    #[serde(default, deserialize_with = "wire::text")]
    pub date: String,
    /// Prescribed treatment
    #[serde(default, deserialize_with = "wire::text")]
    pub traitement: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub dosage: String,
    /// Duration, free text ("7 jours")
    #[serde(default, deserialize_with = "wire::text")]
    pub duree: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub note: Option<String>,
}

/// Sortable prescription columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrescriptionField {
    Id,
    Patient,
    Date,
    Traitement,
}

impl SortField for PrescriptionField {
    const ALL: &'static [Self] = &[
        PrescriptionField::Id,
        PrescriptionField::Patient,
        PrescriptionField::Date,
        PrescriptionField::Traitement,
    ];

    fn name(self) -> &'static str {
        match self {
            PrescriptionField::Id => "id",
            PrescriptionField::Patient => "patient",
            PrescriptionField::Date => "date",
            PrescriptionField::Traitement => "traitement",
        }
    }
}

/// Prescription form state. A fresh draft is dated today.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PrescriptionDraft {
    #[serde(skip_serializing)]
    pub id: Option<RecordId>,
    pub patient_id: String,
    pub date: String,
    pub traitement: String,
    pub dosage: String,
    pub duree: String,
    pub note: String,
}

impl Default for PrescriptionDraft {
    fn default() -> Self {
        Self {
            id: None,
            patient_id: String::new(),
            date: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
            traitement: String::new(),
            dosage: String::new(),
            duree: String::new(),
            note: String::new(),
        }
    }
}

impl PrescriptionDraft {
    fn slot(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "patient_id" => Some(&mut self.patient_id),
            "date" => Some(&mut self.date),
            "traitement" => Some(&mut self.traitement),
            "dosage" => Some(&mut self.dosage),
            "duree" => Some(&mut self.duree),
            "note" => Some(&mut self.note),
            _ => None,
        }
    }
}

impl Draft for PrescriptionDraft {
    const FIELDS: &'static [&'static str] =
        &["patient_id", "date", "traitement", "dosage", "duree", "note"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn get(&self, field: &str) -> Option<String> {
        let value = match field {
            "patient_id" => &self.patient_id,
            "date" => &self.date,
            "traitement" => &self.traitement,
            "dosage" => &self.dosage,
            "duree" => &self.duree,
            "note" => &self.note,
            _ => return None,
        };
        Some(value.clone())
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        let slot = self
            .slot(field)
            .ok_or_else(|| FormError::UnknownField(field.to_string()))?;
        *slot = value.to_string();
        Ok(())
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_id("patient_id", &self.patient_id, "Patient is required");
        errors.require("date", &self.date, "Date is required");
        errors.require("traitement", &self.traitement, "Treatment is required");
        errors.require("dosage", &self.dosage, "Dosage is required");
        errors.require("duree", &self.duree, "Duration is required");
        errors
    }
}

impl Entity for Prescription {
    type Draft = PrescriptionDraft;
    type Field = PrescriptionField;

    const COLLECTION: &'static str = "ordonnances";
    const LABEL: &'static str = "prescription";
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Patient",
        "Date",
        "Treatment",
        "Dosage",
        "Duration",
        "Note",
    ];
    const NEEDS_PATIENTS: bool = true;

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self, patients: &PatientDirectory) -> Vec<String> {
        let patient = patients
            .get(self.patient_id)
            .map(|p| format!("{} {}", p.prenom, p.nom))
            .unwrap_or_default();
        vec![
            patient,
            self.date.clone(),
            self.traitement.clone(),
            self.dosage.clone(),
            self.duree.clone(),
        ]
    }

    fn sort_key(&self, field: PrescriptionField, patients: &PatientDirectory) -> SortKey {
        match field {
            PrescriptionField::Id => SortKey::Number(self.id as f64),
            PrescriptionField::Patient => SortKey::Text(patients.sort_name(self.patient_id)),
            PrescriptionField::Date => SortKey::date(&self.date),
            PrescriptionField::Traitement => SortKey::text(&self.traitement),
        }
    }

    fn to_draft(&self) -> PrescriptionDraft {
        PrescriptionDraft {
            id: Some(self.id),
            patient_id: self.patient_id.to_string(),
            date: wire::date_only(&self.date),
            traitement: self.traitement.clone(),
            dosage: self.dosage.clone(),
            duree: self.duree.clone(),
            note: self.note.clone().unwrap_or_default(),
        }
    }

    fn cells(&self, patients: &PatientDirectory) -> Vec<String> {
        vec![
            self.id.to_string(),
            patients.display_name(self.patient_id),
            display_date(&self.date),
            self.traitement.clone(),
            self.dosage.clone(),
            self.duree.clone(),
            self.note.clone().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    fn directory() -> PatientDirectory {
        PatientDirectory::new(&[Patient {
            id: 3,
            nom: "Martin".into(),
            prenom: "Alice".into(),
            email: None,
            telephone: None,
            date_naissance: None,
            adresse: None,
        }])
    }

    fn prescription(patient_id: RecordId) -> Prescription {
        Prescription {
            id: 12,
            patient_id,
            date: "2024-02-01T00:00:00.000000Z".into(),
            traitement: "Amoxicilline".into(),
            dosage: "500mg".into(),
            duree: "7 jours".into(),
            note: None,
        }
    }

    #[test]
    fn test_new_draft_dated_today() {
        let draft = PrescriptionDraft::default();
        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(draft.date, today);
        assert!(draft.is_new());
    }

    #[test]
    fn test_required_fields() {
        let draft = PrescriptionDraft::default();
        let errors = draft.validate();
        for field in ["patient_id", "traitement", "dosage", "duree"] {
            assert!(errors.get(field).is_some(), "{} should be required", field);
        }
        assert!(errors.get("date").is_none());
        assert!(errors.get("note").is_none());
    }

    #[test]
    fn test_search_uses_patient_name() {
        let fields = prescription(3).search_fields(&directory());
        assert_eq!(fields[0], "Alice Martin");
    }

    #[test]
    fn test_unknown_patient_cell() {
        let cells = prescription(99).cells(&directory());
        assert_eq!(cells[1], crate::entity::UNKNOWN_PATIENT);
        assert_eq!(cells[2], "01/02/2024");
    }

    #[test]
    fn test_get_roundtrips_set() {
        let mut draft = PrescriptionDraft::default();
        draft.set("note", "à jeun").unwrap();
        assert_eq!(draft.get("note").as_deref(), Some("à jeun"));
        assert_eq!(draft.get("bogus"), None);
    }
}
