//! Clinic console command-line front end.

mod cli;
mod commands;
mod config;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clinic_console_core::{ApiClient, ApiError, ConsoleError, HttpTransport, SessionStore};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{ConsoleConfig, Overrides};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if needs_login(&e) {
                eprintln!("Your session has ended. Run `clinic-console login` to sign in again.");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        api_url: cli.api_url,
        session_path: cli.session,
    };
    let config = ConsoleConfig::load(cli.config.as_deref(), &overrides)?;

    let session = SessionStore::open(&config.session_path).with_context(|| {
        format!(
            "Failed to open session store at {}",
            config.session_path.display()
        )
    })?;
    let transport = HttpTransport::new(&config.api_url, config.timeout())
        .with_context(|| format!("Invalid API URL '{}'", config.api_url))?;
    let api = ApiClient::new(transport, session);

    tracing::info!(api_url = %config.api_url, "Starting");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    commands::run(&api, cli.command, &mut stdout, &mut stdin.lock())
}

fn needs_login(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<ConsoleError>()
            .map_or(false, ConsoleError::is_auth)
            || cause.downcast_ref::<ApiError>().map_or(false, ApiError::is_auth)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_login_sees_through_context() {
        let err = anyhow::Error::new(ConsoleError::Api(ApiError::MissingToken))
            .context("Failed to fetch the current user");
        assert!(needs_login(&err));

        let err = anyhow::Error::new(ApiError::Unauthorized { status: 401 });
        assert!(needs_login(&err));

        let err = anyhow::anyhow!("Unknown status 'x'");
        assert!(!needs_login(&err));
    }
}
