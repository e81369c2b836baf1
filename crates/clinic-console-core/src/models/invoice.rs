//! Invoice (facture) models.

use serde::{Deserialize, Serialize};

use super::wire;
use crate::entity::{AfterSave, Draft, Entity, PatientDirectory, RecordId, SortField, SortKey};
use crate::projection::{SortDirection, SortState};
use crate::render::{capitalize, display_amount, display_date};
use crate::screen::{FieldErrors, FormError};

/// Payment status of an invoice.
///
/// Serialized with the French values the API stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[serde(rename = "payée")]
    Paid,
    #[default]
    #[serde(rename = "impayée")]
    Unpaid,
    #[serde(rename = "en attente")]
    Pending,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [
        InvoiceStatus::Paid,
        InvoiceStatus::Unpaid,
        InvoiceStatus::Pending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "payée",
            InvoiceStatus::Unpaid => "impayée",
            InvoiceStatus::Pending => "en attente",
        }
    }

    /// Accepts the wire value or its English name.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        match raw.as_str() {
            "payée" | "payee" | "paid" => Some(InvoiceStatus::Paid),
            "impayée" | "impayee" | "unpaid" => Some(InvoiceStatus::Unpaid),
            "en attente" | "pending" => Some(InvoiceStatus::Pending),
            _ => None,
        }
    }

    pub fn label(self) -> String {
        capitalize(self.as_str())
    }
}

/// An invoice issued to a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    #[serde(deserialize_with = "wire::id")]
    pub id: RecordId,
    #[serde(deserialize_with = "wire::id")]
    pub patient_id: RecordId,
    #[serde(default, deserialize_with = "wire::text")]
    pub date_facture: String,
    /// Amount in euros
    #[serde(deserialize_with = "wire::amount")]
    pub montant: f64,
    /// Raw wire value; unknown statuses are kept as sent
    #[serde(default, deserialize_with = "wire::text")]
    pub status: String,
}

impl Invoice {
    pub fn parsed_status(&self) -> Option<InvoiceStatus> {
        InvoiceStatus::parse(&self.status)
    }
}

/// Sortable invoice columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceField {
    Id,
    Patient,
    DateFacture,
    Montant,
    Status,
}

impl SortField for InvoiceField {
    const ALL: &'static [Self] = &[
        InvoiceField::Id,
        InvoiceField::Patient,
        InvoiceField::DateFacture,
        InvoiceField::Montant,
        InvoiceField::Status,
    ];

    fn name(self) -> &'static str {
        match self {
            InvoiceField::Id => "id",
            InvoiceField::Patient => "patient",
            InvoiceField::DateFacture => "date_facture",
            InvoiceField::Montant => "montant",
            InvoiceField::Status => "status",
        }
    }
}

/// Invoice form state. `status` is the wire value, kept as sent on edit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvoiceDraft {
    #[serde(skip_serializing)]
    pub id: Option<RecordId>,
    pub patient_id: String,
    pub date_facture: String,
    pub montant: String,
    pub status: String,
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        Self {
            id: None,
            patient_id: String::new(),
            date_facture: String::new(),
            montant: String::new(),
            status: InvoiceStatus::default().as_str().to_string(),
        }
    }
}

impl Draft for InvoiceDraft {
    const FIELDS: &'static [&'static str] = &["patient_id", "date_facture", "montant", "status"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn get(&self, field: &str) -> Option<String> {
        match field {
            "patient_id" => Some(self.patient_id.clone()),
            "date_facture" => Some(self.date_facture.clone()),
            "montant" => Some(self.montant.clone()),
            "status" => Some(self.status.clone()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError> {
        match field {
            "patient_id" => self.patient_id = value.trim().to_string(),
            "date_facture" => self.date_facture = value.trim().to_string(),
            "montant" => self.montant = value.trim().to_string(),
            "status" => {
                let status =
                    InvoiceStatus::parse(value).ok_or_else(|| FormError::InvalidValue {
                        field: field.to_string(),
                        value: value.to_string(),
                    })?;
                self.status = status.as_str().to_string();
            }
            _ => return Err(FormError::UnknownField(field.to_string())),
        }
        Ok(())
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_id("patient_id", &self.patient_id, "Patient is required");
        errors.require("date_facture", &self.date_facture, "Invoice date is required");
        if errors.require("montant", &self.montant, "Amount is required") {
            match wire::parse_amount(&self.montant) {
                Some(amount) if amount >= 0.0 => {}
                _ => errors.insert("montant", "Amount must be a positive number"),
            }
        }
        errors
    }
}

impl Entity for Invoice {
    type Draft = InvoiceDraft;
    type Field = InvoiceField;

    const COLLECTION: &'static str = "factures";
    const LABEL: &'static str = "invoice";
    const COLUMNS: &'static [&'static str] = &["ID", "Patient", "Date", "Amount", "Status"];
    const NEEDS_PATIENTS: bool = true;
    const AFTER_SAVE: AfterSave = AfterSave::MergeInPlace;
    const STATUSES: &'static [&'static str] = &["payée", "impayée", "en attente"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self, patients: &PatientDirectory) -> Vec<String> {
        let (nom, prenom) = patients
            .get(self.patient_id)
            .map(|p| (p.nom.clone(), p.prenom.clone()))
            .unwrap_or_default();
        vec![
            self.date_facture.clone(),
            format!("{:.2}", self.montant),
            self.status.clone(),
            nom,
            prenom,
        ]
    }

    fn sort_key(&self, field: InvoiceField, patients: &PatientDirectory) -> SortKey {
        match field {
            InvoiceField::Id => SortKey::Number(self.id as f64),
            InvoiceField::Patient => SortKey::Text(patients.sort_name(self.patient_id)),
            InvoiceField::DateFacture => SortKey::date(&self.date_facture),
            InvoiceField::Montant => SortKey::Number(self.montant),
            InvoiceField::Status => SortKey::text(&self.status),
        }
    }

    fn default_sort() -> SortState<InvoiceField> {
        SortState::by(InvoiceField::DateFacture, SortDirection::Descending)
    }

    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn to_draft(&self) -> InvoiceDraft {
        InvoiceDraft {
            id: Some(self.id),
            patient_id: self.patient_id.to_string(),
            date_facture: wire::date_only(&self.date_facture),
            montant: format!("{:.2}", self.montant),
            status: self.status.clone(),
        }
    }

    fn cells(&self, patients: &PatientDirectory) -> Vec<String> {
        let status = match self.parsed_status() {
            Some(status) => status.label(),
            None => capitalize(&self.status),
        };
        vec![
            self.id.to_string(),
            patients.display_name(self.patient_id),
            display_date(&self.date_facture),
            display_amount(self.montant),
            status,
        ]
    }
}
