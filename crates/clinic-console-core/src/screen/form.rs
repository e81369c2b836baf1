//! Form modal: a draft bound to create/edit, with field-level errors.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::api::ApiError;
use crate::entity::Draft;

/// Generic message shown when client-side validation fails.
pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

/// Generic message shown alongside server-side field errors.
pub const CORRECT_ERRORS_MESSAGE: &str = "Please correct the errors in the form";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid value '{value}' for field {field}")]
    InvalidValue { field: String, value: String },
}

/// Per-field error messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    /// Record `message` when `value` is blank. Returns whether the value was present.
    pub fn require(&mut self, field: &str, value: &str, message: &str) -> bool {
        if value.trim().is_empty() {
            self.insert(field, message);
            false
        } else {
            true
        }
    }

    /// Like [`FieldErrors::require`], and the value must be a record id.
    pub fn require_id(&mut self, field: &str, value: &str, message: &str) -> bool {
        if !self.require(field, value, message) {
            return false;
        }
        if value.trim().parse::<u64>().is_err() {
            self.insert(field, "Must be a numeric identifier");
            return false;
        }
        true
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<BTreeMap<String, String>> for FieldErrors {
    fn from(errors: BTreeMap<String, String>) -> Self {
        Self(errors)
    }
}

/// Create/edit modal state for one entity type.
#[derive(Debug, Clone, Default)]
pub struct FormModal<D> {
    draft: D,
    errors: FieldErrors,
    message: Option<String>,
    open: bool,
}

impl<D: Draft> FormModal<D> {
    pub fn new() -> Self {
        Self {
            draft: D::default(),
            errors: FieldErrors::new(),
            message: None,
            open: false,
        }
    }

    /// Open with an empty draft.
    pub fn open_create(&mut self) {
        self.close();
        self.open = true;
    }

    /// Open with a draft copied from an existing record.
    pub fn open_edit(&mut self, draft: D) {
        self.close();
        self.draft = draft;
        self.open = true;
    }

    /// Update one field and clear its pending error. Only names in
    /// [`Draft::FIELDS`] are editable.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        if !D::FIELDS.contains(&field) {
            return Err(FormError::UnknownField(field.to_string()));
        }
        self.draft.set(field, value)?;
        self.errors.remove(field);
        Ok(())
    }

    /// Current value of every editable field, in form order.
    pub fn values(&self) -> Vec<(&'static str, String)> {
        D::FIELDS
            .iter()
            .map(|&field| (field, self.draft.get(field).unwrap_or_default()))
            .collect()
    }

    /// Run client-side checks. Returns whether the draft may be submitted.
    pub fn validate(&mut self) -> bool {
        let errors = self.draft.validate();
        if errors.is_empty() {
            self.errors.clear();
            self.message = None;
            true
        } else {
            tracing::debug!(fields = errors.len(), "Form validation failed");
            self.errors = errors;
            self.message = Some(REQUIRED_FIELDS_MESSAGE.to_string());
            false
        }
    }

    /// Surface a failed submission on the form.
    pub fn reject(&mut self, error: &ApiError) {
        match error {
            ApiError::Validation { errors, .. } if !errors.is_empty() => {
                self.errors = FieldErrors::from(errors.clone());
                self.message = Some(CORRECT_ERRORS_MESSAGE.to_string());
            }
            other => {
                self.errors.clear();
                self.message = Some(other.user_message());
            }
        }
    }

    /// Close and reset to the empty create-mode draft.
    pub fn close(&mut self) {
        self.draft = D::default();
        self.errors.clear();
        self.message = None;
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_edit(&self) -> bool {
        !self.draft.is_new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientDraft;

    #[test]
    fn test_validate_sets_generic_message() {
        let mut form = FormModal::<PatientDraft>::new();
        form.open_create();

        assert!(!form.validate());
        assert_eq!(form.message(), Some(REQUIRED_FIELDS_MESSAGE));
        assert!(form.errors().get("nom").is_some());
    }

    #[test]
    fn test_set_clears_field_error() {
        let mut form = FormModal::<PatientDraft>::new();
        form.open_create();
        form.validate();

        form.set("nom", "Martin").unwrap();
        assert!(form.errors().get("nom").is_none());
        assert!(form.errors().get("prenom").is_some());
    }

    #[test]
    fn test_set_rejects_fields_outside_the_form() {
        let mut form = FormModal::<PatientDraft>::new();
        form.open_create();

        assert_eq!(
            form.set("id", "9"),
            Err(FormError::UnknownField("id".into()))
        );
        assert_eq!(form.draft().id, None);
    }

    #[test]
    fn test_values_follow_field_order() {
        let mut form = FormModal::<PatientDraft>::new();
        form.open_edit(PatientDraft {
            id: Some(2),
            nom: "Durand".into(),
            prenom: "Bob".into(),
            ..Default::default()
        });

        let values = form.values();
        assert_eq!(values.len(), PatientDraft::FIELDS.len());
        assert_eq!(values[0], ("nom", "Durand".to_string()));
        assert_eq!(values[1], ("prenom", "Bob".to_string()));
        assert_eq!(values[2], ("email", String::new()));
    }

    #[test]
    fn test_close_resets_draft() {
        let mut form = FormModal::<PatientDraft>::new();
        form.open_edit(PatientDraft {
            id: Some(2),
            nom: "Durand".into(),
            ..Default::default()
        });
        assert!(form.is_edit());

        form.close();
        assert!(!form.is_open());
        assert_eq!(form.draft(), &PatientDraft::default());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_reject_with_field_errors() {
        let mut form = FormModal::<PatientDraft>::new();
        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), "The email has already been taken.".to_string());

        form.reject(&ApiError::Validation {
            message: "The given data was invalid.".into(),
            errors,
        });

        assert_eq!(form.message(), Some(CORRECT_ERRORS_MESSAGE));
        assert_eq!(
            form.errors().get("email"),
            Some("The email has already been taken.")
        );
    }

    #[test]
    fn test_reject_server_error_uses_message() {
        let mut form = FormModal::<PatientDraft>::new();
        form.reject(&ApiError::Server {
            status: 500,
            message: "Server Error".into(),
        });
        assert_eq!(form.message(), Some("Server Error"));
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_require_id() {
        let mut errors = FieldErrors::new();
        assert!(!errors.require_id("patient_id", "abc", "Patient is required"));
        assert_eq!(errors.get("patient_id"), Some("Must be a numeric identifier"));
        assert!(errors.require_id("other", " 3 ", "required"));
    }
}
