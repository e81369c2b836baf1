use std::io::Write;

use anyhow::Result;
use clinic_console_core::dashboard::NO_DASHBOARD_MESSAGE;
use clinic_console_core::render::statistics_table;
use clinic_console_core::{ApiClient, RoleDispatcher, Screen, Transport};

use super::{authorize, print_table};
use crate::cli::Format;

/// Print the dashboard for the logged-in user's role.
pub fn show<T: Transport>(api: &ApiClient<T>, out: &mut dyn Write) -> Result<()> {
    let mut dispatcher = RoleDispatcher::new();
    let dashboard = dispatcher.resolve(api)?;

    if dashboard.screens().is_empty() {
        writeln!(out, "{}", NO_DASHBOARD_MESSAGE)?;
        return Ok(());
    }

    writeln!(out, "{}", dashboard.title())?;
    for screen in dashboard.screens() {
        writeln!(out, "  {:<14} {}", screen.name(), screen.title())?;
    }
    Ok(())
}

pub fn stats<T: Transport>(api: &ApiClient<T>, out: &mut dyn Write) -> Result<()> {
    authorize(api, Screen::Statistics)?;
    let stats = api.statistics()?;
    print_table(&statistics_table(&stats), Format::Table, out)?;
    writeln!(out, "Staff total: {}", stats.total_staff())?;
    Ok(())
}
