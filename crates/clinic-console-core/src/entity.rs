//! Entity abstraction shared by every CRUD screen.
//!
//! Each record type (patient, appointment, prescription, invoice, user)
//! describes its collection path, searchable fields, sortable fields and
//! form draft. The generic [`EntityScreen`](crate::screen::EntityScreen)
//! and [`Projection`](crate::projection::Projection) do the rest.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::Patient;
use crate::projection::SortState;
use crate::screen::{FieldErrors, FormError};

/// Server-assigned record identifier.
pub type RecordId = u64;

/// Rendered in place of a patient name when the look-up misses.
pub const UNKNOWN_PATIENT: &str = "unknown patient";

/// What a screen does with its collection after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSave {
    /// Replace the edited record by id, prepend created records.
    MergeInPlace,
    /// Reload the whole collection from the API.
    Refetch,
}

/// A sortable column of an entity.
pub trait SortField: Copy + Eq + fmt::Debug + 'static {
    /// Every sortable field, in display order.
    const ALL: &'static [Self];

    /// Wire/CLI name of the field.
    fn name(self) -> &'static str;

    fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }
}

/// A record type managed through the API.
pub trait Entity: Clone + fmt::Debug + DeserializeOwned {
    type Draft: Draft;
    type Field: SortField;

    /// Collection path, relative to the API base URL.
    const COLLECTION: &'static str;
    /// Singular human label ("invoice").
    const LABEL: &'static str;
    /// Table column headers, matching [`Entity::cells`].
    const COLUMNS: &'static [&'static str];
    /// Whether rows reference patients that must be resolved by look-up.
    const NEEDS_PATIENTS: bool = false;
    const AFTER_SAVE: AfterSave = AfterSave::Refetch;
    /// Accepted status filter values; empty when the entity has no status.
    const STATUSES: &'static [&'static str] = &[];

    fn id(&self) -> RecordId;

    /// Stringified fields the free-text search matches against.
    fn search_fields(&self, patients: &PatientDirectory) -> Vec<String>;

    fn sort_key(&self, field: Self::Field, patients: &PatientDirectory) -> SortKey;

    /// Sort applied when a screen first renders.
    fn default_sort() -> SortState<Self::Field> {
        SortState::unsorted()
    }

    fn status(&self) -> Option<&str> {
        None
    }

    /// Form draft pre-filled from this record (edit mode).
    fn to_draft(&self) -> Self::Draft;

    /// Display cells for one table row.
    fn cells(&self, patients: &PatientDirectory) -> Vec<String>;
}

/// Client-held, in-progress copy of a record being created or edited.
///
/// The draft serializes to the request payload. `Default` is the empty
/// create-mode state.
pub trait Draft: Clone + Default + fmt::Debug + Serialize {
    /// Editable field names.
    const FIELDS: &'static [&'static str];

    /// Identifier of the record being edited; `None` means create.
    fn id(&self) -> Option<RecordId>;

    fn get(&self, field: &str) -> Option<String>;

    fn set(&mut self, field: &str, value: &str) -> Result<(), FormError>;

    /// Client-side checks run before submission.
    fn validate(&self) -> FieldErrors;

    fn is_new(&self) -> bool {
        self.id().is_none()
    }
}

/// Comparable value extracted from a record for one sort field.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// Empty or unparseable; sorts before everything else.
    Missing,
    Number(f64),
    /// Milliseconds since the epoch.
    Date(i64),
    Text(String),
}

impl SortKey {
    pub fn number(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or(SortKey::Missing, SortKey::Number)
    }

    pub fn date(raw: &str) -> Self {
        parse_timestamp(raw).map_or(SortKey::Missing, SortKey::Date)
    }

    pub fn text(raw: &str) -> Self {
        SortKey::Text(raw.to_string())
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Number(_) => 1,
            SortKey::Date(_) => 2,
            SortKey::Text(_) => 3,
        }
    }

    /// Total order: numbers numerically, dates by timestamp, text by collation.
    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => collate(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Parse the date and datetime shapes the API produces into epoch millis.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Case- and accent-insensitive comparison, falling back to code points.
pub fn collate(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ä' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' | 'ì' => 'i',
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            'ÿ' => 'y',
            other => other,
        })
        .collect()
}

/// Patients indexed by id, for resolving `patient_id` references.
#[derive(Debug, Clone, Default)]
pub struct PatientDirectory {
    by_id: HashMap<RecordId, Patient>,
}

impl PatientDirectory {
    pub fn new(patients: &[Patient]) -> Self {
        Self {
            by_id: patients.iter().map(|p| (p.id, p.clone())).collect(),
        }
    }

    pub fn get(&self, id: RecordId) -> Option<&Patient> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// "prenom nom", or [`UNKNOWN_PATIENT`] on a miss.
    pub fn display_name(&self, id: RecordId) -> String {
        self.get(id)
            .map(Patient::full_name)
            .unwrap_or_else(|| UNKNOWN_PATIENT.to_string())
    }

    /// "nom prenom" in lowercase, empty on a miss.
    pub fn sort_name(&self, id: RecordId) -> String {
        self.get(id).map(Patient::sort_name).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: RecordId, nom: &str, prenom: &str) -> Patient {
        Patient {
            id,
            nom: nom.into(),
            prenom: prenom.into(),
            email: None,
            telephone: None,
            date_naissance: None,
            adresse: None,
        }
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let nine = SortKey::number("9");
        let ten = SortKey::number("10");
        assert_eq!(nine.compare(&ten), Ordering::Less);
    }

    #[test]
    fn test_dates_compare_as_timestamps() {
        let early = SortKey::date("2024-01-10");
        let late = SortKey::date("2024-01-10T08:00:00Z");
        let later = SortKey::date("2024-02-01 00:00:00");
        assert_eq!(early.compare(&late), Ordering::Less);
        assert_eq!(late.compare(&later), Ordering::Less);
    }

    #[test]
    fn test_missing_sorts_first() {
        assert_eq!(SortKey::date("not a date"), SortKey::Missing);
        assert_eq!(
            SortKey::Missing.compare(&SortKey::number("0")),
            Ordering::Less
        );
    }

    #[test]
    fn test_collation_ignores_case_and_accents() {
        assert_eq!(collate("élodie", "Emma"), Ordering::Less);
        assert_eq!(collate("Zoé", "zoe"), "Zoé".cmp("zoe"));
        assert_eq!(collate("abc", "ABD"), Ordering::Less);
    }

    #[test]
    fn test_directory_lookup() {
        let dir = PatientDirectory::new(&[
            patient(1, "Martin", "Alice"),
            patient(2, "Durand", "Bob"),
        ]);

        assert_eq!(dir.display_name(1), "Alice Martin");
        assert_eq!(dir.display_name(99), UNKNOWN_PATIENT);
        assert_eq!(dir.sort_name(2), "durand bob");
        assert_eq!(dir.sort_name(99), "");
        assert_eq!(dir.len(), 2);
    }
}
