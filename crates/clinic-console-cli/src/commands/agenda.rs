use std::io::Write;

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;
use clinic_console_core::agenda::{agenda_table, AppointmentDetails};
use clinic_console_core::{ApiClient, Appointment, EntityScreen, Screen, Transport};

use super::{authorize, print_table};
use crate::cli::AgendaAction;

pub fn run<T: Transport>(
    api: &ApiClient<T>,
    action: AgendaAction,
    out: &mut dyn Write,
) -> Result<()> {
    show_agenda(api, action, chrono::Local::now().naive_local(), out)
}

fn show_agenda<T: Transport>(
    api: &ApiClient<T>,
    action: AgendaAction,
    now: NaiveDateTime,
    out: &mut dyn Write,
) -> Result<()> {
    authorize(api, Screen::Agenda)?;
    let mut agenda = EntityScreen::<Appointment>::without_patient_directory();
    agenda.activate(api)?;

    match action {
        AgendaAction::List { search, format } => {
            let projection = agenda
                .projection()
                .clone()
                .search(search.as_deref().unwrap_or_default());
            agenda.set_projection(projection);
            let table = agenda_table(&agenda.visible(), agenda.patients(), now);
            print_table(&table, format, out)
        }
        AgendaAction::Show { id } => {
            let appointment = agenda
                .find(id)
                .ok_or_else(|| anyhow!("No appointment with id {}", id))?;
            let details = AppointmentDetails::new(appointment, agenda.patients(), now);
            write!(out, "{}", details.render())?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::commands::test_support::{client, output};
    use clinic_console_core::MockApi;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-06-01 09:00", "%Y-%m-%d %H:%M").unwrap()
    }

    fn clinic() -> MockApi {
        MockApi::new().with_records(
            "rendezvous",
            vec![
                json!({
                    "id": 4,
                    "patient_id": 9,
                    "date_heure": "2024-06-03T14:30:00",
                    "motif": "Contrôle",
                    "patient": {"nom": "Durand", "prenom": "Léa", "age": 34, "antecedents": "Asthme"}
                }),
                json!({
                    "id": 5,
                    "patient_id": 10,
                    "date_heure": "2024-05-20T08:00:00",
                    "motif": "Vaccin"
                }),
            ],
        )
    }

    #[test]
    fn test_agenda_list_marks_past_and_upcoming() {
        let api = client("medcin", clinic());
        let mut out = Vec::new();
        show_agenda(
            &api,
            AgendaAction::List {
                search: None,
                format: Format::Table,
            },
            now(),
            &mut out,
        )
        .unwrap();

        let text = output(out);
        assert!(text.contains("Durand Léa"));
        assert!(text.contains("34 years"));
        assert!(text.contains("Upcoming"));
        assert!(text.contains("Past"));
    }

    #[test]
    fn test_agenda_show_details() {
        let api = client("medcin", clinic());
        let mut out = Vec::new();
        show_agenda(&api, AgendaAction::Show { id: 4 }, now(), &mut out).unwrap();

        let text = output(out);
        assert!(text.contains("Asthme"));
        assert!(text.contains("No current treatment"));
    }

    #[test]
    fn test_agenda_show_missing_id() {
        let api = client("medcin", clinic());
        let err = show_agenda(&api, AgendaAction::Show { id: 99 }, now(), &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "No appointment with id 99");
    }

    #[test]
    fn test_agenda_refused_for_secretary() {
        let api = client("secretaire", clinic());
        assert!(show_agenda(&api, AgendaAction::Show { id: 4 }, now(), &mut Vec::new()).is_err());
    }
}
