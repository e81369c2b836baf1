//! Command handlers. Each one writes its report to `out`.

mod agenda;
mod auth;
mod dashboard;
mod records;

use std::io::{BufRead, Write};

use anyhow::Result;
use clinic_console_core::render::Table;
use clinic_console_core::{
    ApiClient, Appointment, Invoice, Patient, Prescription, RoleDispatcher, Screen, Transport,
    User,
};

use crate::cli::{Command, Format};

pub fn run<T: Transport>(
    api: &ApiClient<T>,
    command: Command,
    out: &mut dyn Write,
    input: &mut dyn BufRead,
) -> Result<()> {
    match command {
        Command::Login { email, password } => auth::login(api, email, &password, out),
        Command::Logout => auth::logout(api, out),
        Command::Whoami => auth::whoami(api, out),
        Command::Dashboard => dashboard::show(api, out),
        Command::Stats => dashboard::stats(api, out),
        Command::Patients { action } => {
            records::run::<Patient, T>(api, Screen::Patients, action, out, input)
        }
        Command::Appointments { action } => {
            records::run::<Appointment, T>(api, Screen::Appointments, action, out, input)
        }
        Command::Prescriptions { action } => {
            records::run::<Prescription, T>(api, Screen::Prescriptions, action, out, input)
        }
        Command::Invoices { action } => {
            records::run::<Invoice, T>(api, Screen::Invoices, action, out, input)
        }
        Command::Users { action } => {
            records::run::<User, T>(api, Screen::Users, action, out, input)
        }
        Command::Agenda { action } => agenda::run(api, action, out),
    }
}

/// Resolve the user's dashboard and refuse screens outside it.
fn authorize<T: Transport>(api: &ApiClient<T>, screen: Screen) -> Result<()> {
    let mut dispatcher = RoleDispatcher::new();
    dispatcher.resolve(api)?.require(screen)?;
    Ok(())
}

fn print_table(table: &Table, format: Format, out: &mut dyn Write) -> Result<()> {
    match format {
        Format::Table => write!(out, "{}", table.render_text())?,
        Format::Csv => write!(out, "{}", table.to_csv())?,
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use clinic_console_core::{ApiClient, MockApi, SessionStore};
    use serde_json::json;

    pub const TOKEN: &str = "tok";

    /// Logged-in client for a user with `role`.
    pub fn client(role: &str, api: MockApi) -> ApiClient<MockApi> {
        let session = SessionStore::open_in_memory().unwrap();
        session.set_token(TOKEN).unwrap();
        let user = json!({"id": 1, "name": "Test", "email": "test@clinic.test", "role": role});
        ApiClient::new(api.with_session_user(TOKEN, user), session)
    }

    pub fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }
}
