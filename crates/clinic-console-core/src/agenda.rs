//! Read-only appointment agenda for physicians.

use chrono::NaiveDateTime;

use crate::entity::{PatientDirectory, RecordId};
use crate::models::Appointment;
use crate::render::{display_datetime, Table};

pub const NO_ANTECEDENTS: &str = "Not provided";
pub const NO_TREATMENT: &str = "No current treatment";

/// Everything the detail view shows for one appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDetails {
    pub id: RecordId,
    /// "nom prenom", or `None` when the API sent no patient
    pub patient_name: Option<String>,
    /// Uppercase initials of nom and prenom, `?` without a patient
    pub initials: String,
    pub age: Option<u32>,
    pub scheduled: String,
    pub motif: String,
    pub antecedents: String,
    pub traitements: String,
    pub upcoming: bool,
}

impl AppointmentDetails {
    pub fn new(appointment: &Appointment, patients: &PatientDirectory, now: NaiveDateTime) -> Self {
        let names = appointment.patient_names(patients);
        let embedded = appointment.patient.as_ref();

        let initials = match &names {
            Some((nom, prenom)) => initials(nom, prenom),
            None => "?".to_string(),
        };

        Self {
            id: appointment.id,
            patient_name: names
                .map(|(nom, prenom)| format!("{} {}", nom, prenom).trim().to_string()),
            initials,
            age: embedded.and_then(|p| p.age),
            scheduled: display_datetime(&appointment.date_heure),
            motif: appointment.motif.clone().unwrap_or_default(),
            antecedents: non_blank(embedded.and_then(|p| p.antecedents.clone()))
                .unwrap_or_else(|| NO_ANTECEDENTS.to_string()),
            traitements: non_blank(embedded.and_then(|p| p.traitements.clone()))
                .unwrap_or_else(|| NO_TREATMENT.to_string()),
            upcoming: appointment.is_upcoming(now),
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.upcoming {
            "Upcoming"
        } else {
            "Past"
        }
    }

    pub fn age_label(&self) -> String {
        self.age.map(|a| format!("{} years", a)).unwrap_or_default()
    }

    /// Multi-line detail card.
    pub fn render(&self) -> String {
        let name = self
            .patient_name
            .clone()
            .unwrap_or_else(|| crate::entity::UNKNOWN_PATIENT.to_string());
        let mut out = format!("[{}] {}", self.initials, name);
        if self.age.is_some() {
            out.push_str(&format!(" ({})", self.age_label()));
        }
        out.push('\n');
        out.push_str(&format!("Date/time:    {} ({})\n", self.scheduled, self.status_label()));
        out.push_str(&format!("Reason:       {}\n", self.motif));
        out.push_str(&format!("Antecedents:  {}\n", self.antecedents));
        out.push_str(&format!("Treatments:   {}\n", self.traitements));
        out
    }
}

fn initials(nom: &str, prenom: &str) -> String {
    let letters: String = nom
        .trim()
        .chars()
        .take(1)
        .chain(prenom.trim().chars().take(1))
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Agenda rows: patient, age, date/time, reason, status.
pub fn agenda_table(
    rows: &[&Appointment],
    patients: &PatientDirectory,
    now: NaiveDateTime,
) -> Table {
    let mut table = Table::new(
        &["ID", "Patient", "Age", "Date/time", "Reason", "Status"],
        "No appointments found",
    );
    for appointment in rows {
        let details = AppointmentDetails::new(appointment, patients, now);
        table.push(vec![
            details.id.to_string(),
            details
                .patient_name
                .clone()
                .unwrap_or_else(|| crate::entity::UNKNOWN_PATIENT.to_string()),
            details.age_label(),
            details.scheduled.clone(),
            details.motif.clone(),
            details.status_label().to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmbeddedPatient;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn appointment(patient: Option<EmbeddedPatient>, date_heure: &str) -> Appointment {
        Appointment {
            id: 5,
            patient_id: 9,
            date_heure: date_heure.into(),
            motif: Some("Suivi".into()),
            patient,
        }
    }

    #[test]
    fn test_details_with_embedded_patient() {
        let patient = EmbeddedPatient {
            nom: "martin".into(),
            prenom: "alice".into(),
            age: Some(34),
            antecedents: Some("Asthme".into()),
            traitements: None,
        };
        let details = AppointmentDetails::new(
            &appointment(Some(patient), "2024-03-05T09:00"),
            &PatientDirectory::default(),
            now(),
        );

        assert_eq!(details.initials, "MA");
        assert_eq!(details.patient_name.as_deref(), Some("martin alice"));
        assert_eq!(details.antecedents, "Asthme");
        assert_eq!(details.traitements, NO_TREATMENT);
        assert!(details.upcoming);
        assert_eq!(details.age_label(), "34 years");
    }

    #[test]
    fn test_details_without_patient() {
        let details = AppointmentDetails::new(
            &appointment(None, "2024-02-01T09:00"),
            &PatientDirectory::default(),
            now(),
        );

        assert_eq!(details.initials, "?");
        assert_eq!(details.patient_name, None);
        assert_eq!(details.antecedents, NO_ANTECEDENTS);
        assert_eq!(details.status_label(), "Past");
        assert!(details.render().contains("unknown patient"));
    }

    #[test]
    fn test_agenda_table_rows() {
        let appts = vec![appointment(None, "2024-03-05T09:00")];
        let rows: Vec<&Appointment> = appts.iter().collect();
        let table = agenda_table(&rows, &PatientDirectory::default(), now());

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][3], "05/03/2024 09:00");
        assert_eq!(table.rows[0][5], "Upcoming");
    }
}
