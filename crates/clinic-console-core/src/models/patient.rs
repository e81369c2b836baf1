//! Patient models.

use serde::{Deserialize, Serialize};

use super::wire;
use crate::entity::{Draft, Entity, PatientDirectory, RecordId, SortField, SortKey};
use crate::render::display_date;
use crate::screen::{FieldErrors, FormError};

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    #[serde(deserialize_with = "wire::id")]
    pub id: RecordId,
    /// Last name
    #[serde(default, deserialize_with = "wire::text")]
    pub nom: String,
    /// First name
    #[serde(default, deserialize_with = "wire::text")]
    pub prenom: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub telephone: Option<String>,
    /// Date of birth
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub date_naissance: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub adresse: Option<String>,
}

impl Patient {
    /// "prenom nom", as shown in tables and pickers.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }

    /// Lowercase "nom prenom", used when sorting by patient.
    pub fn sort_name(&self) -> String {
        format!("{} {}", self.nom, self.prenom).to_lowercase()
    }
}

/// Sortable patient columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientField {
    Id,
    Nom,
    Prenom,
    Email,
    DateNaissance,
}

impl SortField for PatientField {
    const ALL: &'static [Self] = &[
        PatientField::Id,
        PatientField::Nom,
        PatientField::Prenom,
        PatientField::Email,
        PatientField::DateNaissance,
    ];

    fn name(self) -> &'static str {
        match self {
            PatientField::Id => "id",
            PatientField::Nom => "nom",
            PatientField::Prenom => "prenom",
            PatientField::Email => "email",
            PatientField::DateNaissance => "date_naissance",
        }
    }
}

/// Patient form state.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PatientDraft {
    #[serde(skip_serializing)]
    pub id: Option<RecordId>,
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub date_naissance: String,
    pub adresse: String,
}

impl PatientDraft {
    fn slot(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "nom" => Some(&mut self.nom),
            "prenom" => Some(&mut self.prenom),
            "email" => Some(&mut self.email),
            "telephone" => Some(&mut self.telephone),
            "date_naissance" => Some(&mut self.date_naissance),
            "adresse" => Some(&mut self.adresse),
            _ => None,
        }
    }
}

impl Draft for PatientDraft {
    const FIELDS: &'static [&'static str] = &[
        "nom",
        "prenom",
        "email",
        "telephone",
        "date_naissance",
        "adresse",
    ];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn get(&self, field: &str) -> Option<String> {
        let value = match field {
            "nom" => &self.nom,
            "prenom" => &self.prenom,
            "email" => &self.email,
            "telephone" => &self.telephone,
            "date_naissance" => &self.date_naissance,
            "adresse" => &self.adresse,
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
        errors.require("nom", &self.nom, "Last name is required");
        errors.require("prenom", &self.prenom, "First name is required");
        errors
    }
}

impl Entity for Patient {
    type Draft = PatientDraft;
    type Field = PatientField;

    const COLLECTION: &'static str = "patients";
    const LABEL: &'static str = "patient";
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Last name",
        "First name",
        "Email",
        "Phone",
        "Birth date",
        "Address",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self, _patients: &PatientDirectory) -> Vec<String> {
        vec![
            format!("{} {}", self.nom, self.prenom),
            self.email.clone().unwrap_or_default(),
            self.telephone.clone().unwrap_or_default(),
        ]
    }

    fn sort_key(&self, field: PatientField, _patients: &PatientDirectory) -> SortKey {
        match field {
            PatientField::Id => SortKey::Number(self.id as f64),
            PatientField::Nom => SortKey::text(&self.nom),
            PatientField::Prenom => SortKey::text(&self.prenom),
            PatientField::Email => SortKey::text(self.email.as_deref().unwrap_or_default()),
            PatientField::DateNaissance => {
                SortKey::date(self.date_naissance.as_deref().unwrap_or_default())
            }
        }
    }

    fn to_draft(&self) -> PatientDraft {
        PatientDraft {
            id: Some(self.id),
            nom: self.nom.clone(),
            prenom: self.prenom.clone(),
            email: self.email.clone().unwrap_or_default(),
            telephone: self.telephone.clone().unwrap_or_default(),
            date_naissance: self
                .date_naissance
                .as_deref()
                .map(wire::date_only)
                .unwrap_or_default(),
            adresse: self.adresse.clone().unwrap_or_default(),
        }
    }

    fn cells(&self, _patients: &PatientDirectory) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.nom.clone(),
            self.prenom.clone(),
            self.email.clone().unwrap_or_default(),
            self.telephone.clone().unwrap_or_default(),
            self.date_naissance
                .as_deref()
                .map(display_date)
                .unwrap_or_default(),
            self.adresse.clone().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_nulls() {
        let patient: Patient = serde_json::from_str(
            r#"{"id": 4, "nom": "Martin", "prenom": "Alice", "email": null, "telephone": "0601020304"}"#,
        )
        .unwrap();

        assert_eq!(patient.id, 4);
        assert_eq!(patient.full_name(), "Alice Martin");
        assert_eq!(patient.email, None);
        assert_eq!(patient.telephone.as_deref(), Some("0601020304"));
    }

    #[test]
    fn test_draft_requires_names() {
        let mut draft = PatientDraft::default();
        let errors = draft.validate();
        assert!(errors.get("nom").is_some());
        assert!(errors.get("prenom").is_some());

        draft.set("nom", "Martin").unwrap();
        draft.set("prenom", "Alice").unwrap();
        assert!(draft.validate().is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut draft = PatientDraft::default();
        assert!(matches!(
            draft.set("shoe_size", "42"),
            Err(FormError::UnknownField(_))
        ));
    }

    #[test]
    fn test_edit_draft_strips_time_of_birth_date() {
        let patient = Patient {
            id: 9,
            nom: "Durand".into(),
            prenom: "Bob".into(),
            email: None,
            telephone: None,
            date_naissance: Some("1990-05-17T00:00:00.000000Z".into()),
            adresse: None,
        };

        let draft = patient.to_draft();
        assert_eq!(draft.id, Some(9));
        assert_eq!(draft.date_naissance, "1990-05-17");
        assert_eq!(draft.email, "");
    }

    #[test]
    fn test_payload_omits_id() {
        let mut draft = PatientDraft::default();
        draft.id = Some(3);
        draft.nom = "Martin".into();

        let payload = serde_json::to_value(&draft).unwrap();
        assert!(payload.get("id").is_none());
        assert_eq!(payload["nom"], "Martin");
    }
}
