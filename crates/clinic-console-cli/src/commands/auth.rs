use std::io::Write;

use anyhow::{anyhow, Context, Result};
use clinic_console_core::db::LAST_EMAIL_KEY;
use clinic_console_core::{ApiClient, Dashboard, Transport};

pub fn login<T: Transport>(
    api: &ApiClient<T>,
    email: Option<String>,
    password: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => api
            .session()
            .get(LAST_EMAIL_KEY)?
            .ok_or_else(|| anyhow!("--email is required for the first login"))?,
    };

    api.login(&email, password)?;
    writeln!(out, "Logged in as {}", email)?;
    Ok(())
}

pub fn logout<T: Transport>(api: &ApiClient<T>, out: &mut dyn Write) -> Result<()> {
    if api.logout()? {
        writeln!(out, "Logged out")?;
    } else {
        writeln!(out, "No active session")?;
    }
    Ok(())
}

pub fn whoami<T: Transport>(api: &ApiClient<T>, out: &mut dyn Write) -> Result<()> {
    let user = api.current_user().context("Failed to fetch the current user")?;
    writeln!(out, "{} <{}>", user.name, user.email)?;
    writeln!(out, "Role: {}", user.role_label())?;
    writeln!(out, "Dashboard: {}", Dashboard::for_role(&user.role).title())?;
    Ok(())
}
