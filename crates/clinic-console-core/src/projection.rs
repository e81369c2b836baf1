//! Derived, filtered and sorted views of an in-memory collection.

use std::cmp::Ordering;

use crate::entity::{Entity, PatientDirectory, SortField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Current sort selection of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<F> {
    field: Option<F>,
    direction: SortDirection,
}

impl<F> Default for SortState<F> {
    fn default() -> Self {
        Self {
            field: None,
            direction: SortDirection::Ascending,
        }
    }
}

impl<F: SortField> SortState<F> {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(field: F, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }

    pub fn field(&self) -> Option<F> {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Header click: the same field flips direction, a new field starts ascending.
    pub fn toggle(&mut self, field: F) {
        if self.field == Some(field) {
            self.direction = self.direction.flipped();
        } else {
            self.field = Some(field);
            self.direction = SortDirection::Ascending;
        }
    }
}

/// Search, sort and status inputs of a list screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection<F> {
    query: String,
    sort: SortState<F>,
    status: Option<String>,
}

impl<F: SortField> Projection<F> {
    pub fn new(sort: SortState<F>) -> Self {
        Self {
            query: String::new(),
            sort,
            status: None,
        }
    }

    /// Set the free-text query. Matching is case-insensitive; surrounding
    /// whitespace is part of the query.
    pub fn search(mut self, query: &str) -> Self {
        self.query = query.to_lowercase();
        self
    }

    /// Keep only records whose status equals `status` exactly.
    pub fn status(mut self, status: Option<&str>) -> Self {
        self.status = status.map(str::to_string);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> &SortState<F> {
        &self.sort
    }

    pub fn sort_mut(&mut self) -> &mut SortState<F> {
        &mut self.sort
    }

    pub fn matches<E>(&self, record: &E, patients: &PatientDirectory) -> bool
    where
        E: Entity<Field = F>,
    {
        if let Some(wanted) = &self.status {
            if record.status() != Some(wanted.as_str()) {
                return false;
            }
        }
        self.query.is_empty()
            || record
                .search_fields(patients)
                .iter()
                .any(|field| field.to_lowercase().contains(&self.query))
    }

    /// Derive the visible rows. The source slice is never reordered.
    pub fn apply<'a, E>(&self, records: &'a [E], patients: &PatientDirectory) -> Vec<&'a E>
    where
        E: Entity<Field = F>,
    {
        let mut rows: Vec<&E> = records
            .iter()
            .filter(|record| self.matches(*record, patients))
            .collect();

        if let Some(field) = self.sort.field() {
            let mut keyed: Vec<_> = rows
                .into_iter()
                .map(|record| (record.sort_key(field, patients), record))
                .collect();
            keyed.sort_by(|(a, ra), (b, rb)| {
                a.compare(b).then_with(|| ra.id().cmp(&rb.id()))
            });
            if self.sort.direction() == SortDirection::Descending {
                keyed.reverse();
            }
            rows = keyed.into_iter().map(|(_, record)| record).collect();
        }

        rows
    }
}

impl<F: SortField> Default for Projection<F> {
    fn default() -> Self {
        Self::new(SortState::unsorted())
    }
}

/// Ordering used by [`Projection::apply`], exposed for callers that sort
/// their own slices.
pub fn compare_records<E: Entity>(
    a: &E,
    b: &E,
    field: E::Field,
    patients: &PatientDirectory,
) -> Ordering {
    a.sort_key(field, patients)
        .compare(&b.sort_key(field, patients))
        .then_with(|| a.id().cmp(&b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, PatientField};

    fn patient(id: u64, nom: &str, prenom: &str, email: Option<&str>) -> Patient {
        Patient {
            id,
            nom: nom.into(),
            prenom: prenom.into(),
            email: email.map(Into::into),
            telephone: None,
            date_naissance: None,
            adresse: None,
        }
    }

    fn sample() -> Vec<Patient> {
        vec![
            patient(1, "Martin", "Alice", Some("alice@mail.test")),
            patient(2, "Durand", "Bob", None),
            patient(3, "Émery", "Chloé", Some("chloe@mail.test")),
            patient(4, "martin", "Zoé", None),
        ]
    }

    fn ids(rows: &[&Patient]) -> Vec<u64> {
        rows.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_toggle_flips_then_resets() {
        let mut sort = SortState::unsorted();
        sort.toggle(PatientField::Nom);
        assert_eq!(sort.direction(), SortDirection::Ascending);

        sort.toggle(PatientField::Nom);
        assert_eq!(sort.direction(), SortDirection::Descending);

        sort.toggle(PatientField::Email);
        assert_eq!(sort.field(), Some(PatientField::Email));
        assert_eq!(sort.direction(), SortDirection::Ascending);
    }

    #[test]
    fn test_search_case_insensitive() {
        let records = sample();
        let dir = PatientDirectory::default();
        let rows = Projection::<PatientField>::default()
            .search("MARTIN")
            .apply(&records, &dir);
        assert_eq!(ids(&rows), vec![1, 4]);
    }

    #[test]
    fn test_search_keeps_whitespace() {
        let records = sample();
        let dir = PatientDirectory::default();
        let rows = Projection::<PatientField>::default()
            .search(" martin")
            .apply(&records, &dir);
        assert!(rows.is_empty());

        // Matches inside "Martin Alice" and "martin Zoé"
        let rows = Projection::<PatientField>::default()
            .search("MARTIN ")
            .apply(&records, &dir);
        assert_eq!(ids(&rows), vec![1, 4]);
    }

    #[test]
    fn test_empty_query_keeps_source_order() {
        let records = sample();
        let rows =
            Projection::<PatientField>::default().apply(&records, &PatientDirectory::default());
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sort_by_name_ties_by_id() {
        let records = sample();
        let dir = PatientDirectory::default();
        let asc = Projection::new(SortState::by(PatientField::Nom, SortDirection::Ascending))
            .apply(&records, &dir);
        assert_eq!(ids(&asc), vec![2, 3, 1, 4]);

        let desc = Projection::new(SortState::by(PatientField::Nom, SortDirection::Descending))
            .apply(&records, &dir);
        assert_eq!(ids(&desc), vec![4, 1, 3, 2]);
    }

    #[test]
    fn test_missing_values_sort_first() {
        let records = sample();
        let rows = Projection::new(SortState::by(PatientField::Email, SortDirection::Ascending))
            .apply(&records, &PatientDirectory::default());
        // Missing emails are empty text, which collates first
        assert_eq!(ids(&rows), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_compare_records_matches_apply() {
        let records = sample();
        let dir = PatientDirectory::default();
        let mut manual: Vec<&Patient> = records.iter().collect();
        manual.sort_by(|a, b| compare_records(*a, *b, PatientField::Prenom, &dir));

        let rows = Projection::new(SortState::by(PatientField::Prenom, SortDirection::Ascending))
            .apply(&records, &dir);
        assert_eq!(ids(&manual), ids(&rows));
    }
}
