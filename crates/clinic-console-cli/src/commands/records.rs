//! List/create/edit/delete for any record collection.

use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Result};
use clinic_console_core::render::table_for;
use clinic_console_core::screen::LoadState;
use clinic_console_core::{
    ApiClient, Entity, EntityScreen, Projection, Screen, SortField, SubmitOutcome, Transport,
};

use super::{authorize, print_table};
use crate::cli::{ListArgs, RecordAction};

pub fn run<E: Entity, T: Transport>(
    api: &ApiClient<T>,
    screen: Screen,
    action: RecordAction,
    out: &mut dyn Write,
    input: &mut dyn BufRead,
) -> Result<()> {
    authorize(api, screen)?;
    let mut records = EntityScreen::<E>::new();
    records.activate(api)?;

    match action {
        RecordAction::List(args) => list(&mut records, &args, out),
        RecordAction::Create { set } => {
            records.open_create();
            save(api, &mut records, &set, out)
        }
        RecordAction::Edit { id, set } => {
            records.open_edit(id)?;
            if set.is_empty() {
                return show_form(&records, out);
            }
            save(api, &mut records, &set, out)
        }
        RecordAction::Delete { id, yes } => delete(api, &mut records, id, yes, out, input),
    }
}

fn list<E: Entity>(
    records: &mut EntityScreen<E>,
    args: &ListArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let status = match &args.status {
        Some(raw) => Some(resolve_status::<E>(raw)?),
        None => None,
    };

    records.set_projection(
        Projection::new(E::default_sort())
            .search(args.search.as_deref().unwrap_or_default())
            .status(status),
    );
    for name in &args.sort {
        let field = E::Field::parse(name).ok_or_else(|| {
            let available: Vec<_> = E::Field::ALL.iter().map(|f| f.name()).collect();
            anyhow!(
                "Unknown sort field '{}'. Available: {}",
                name,
                available.join(", ")
            )
        })?;
        records.toggle_sort(field);
    }

    let table = table_for(&records.visible(), records.patients());
    print_table(&table, args.format, out)
}

fn resolve_status<E: Entity>(raw: &str) -> Result<&'static str> {
    if E::STATUSES.is_empty() {
        bail!("{} records have no status", E::LABEL);
    }
    let wanted = raw.trim().to_lowercase();
    E::STATUSES
        .iter()
        .copied()
        .find(|s| s.to_lowercase() == wanted)
        .ok_or_else(|| {
            anyhow!(
                "Unknown status '{}'. Available: {}",
                raw,
                E::STATUSES.join(", ")
            )
        })
}

/// Print the edit form's current values, one `field: value` per line.
fn show_form<E: Entity>(records: &EntityScreen<E>, out: &mut dyn Write) -> Result<()> {
    for (field, value) in records.form().values() {
        writeln!(out, "{}: {}", field, value)?;
    }
    Ok(())
}

fn save<E: Entity, T: Transport>(
    api: &ApiClient<T>,
    records: &mut EntityScreen<E>,
    assignments: &[(String, String)],
    out: &mut dyn Write,
) -> Result<()> {
    for (field, value) in assignments {
        records.set_field(field, value)?;
    }

    match records.submit(api)? {
        SubmitOutcome::Rejected => {
            let form = records.form();
            let mut report = form.message().unwrap_or("Save failed").to_string();
            for (field, message) in form.errors().iter() {
                report.push_str(&format!("\n  {}: {}", field, message));
            }
            bail!(report)
        }
        outcome => {
            if let Some(banner) = records.banner() {
                writeln!(out, "{}", banner.message)?;
            }
            if let SubmitOutcome::Created(Some(id)) = outcome {
                writeln!(out, "id: {}", id)?;
            }
            if let LoadState::Failed(message) = records.state() {
                writeln!(out, "warning: list not reloaded: {}", message)?;
            }
            Ok(())
        }
    }
}

fn delete<E: Entity, T: Transport>(
    api: &ApiClient<T>,
    records: &mut EntityScreen<E>,
    id: u64,
    yes: bool,
    out: &mut dyn Write,
    input: &mut dyn BufRead,
) -> Result<()> {
    records.request_delete(id)?;

    if !yes {
        write!(out, "Delete {} {}? [y/N] ", E::LABEL, id)?;
        out.flush()?;
        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            records.cancel_delete();
            writeln!(out, "Cancelled")?;
            return Ok(());
        }
    }

    match records.confirm_delete(api)? {
        Some(_) => {
            if let Some(banner) = records.banner() {
                writeln!(out, "{}", banner.message)?;
            }
            Ok(())
        }
        None => {
            let message = records
                .banner()
                .map(|b| b.message.clone())
                .unwrap_or_else(|| format!("Failed to delete {} {}", E::LABEL, id));
            bail!(message)
        }
    }
}
