//! Command-line definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "clinic-console",
    version,
    about = "Administrative console for the clinic management API"
)]
pub struct Cli {
    /// API base URL (overrides config and CLINIC_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session database path
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,

    /// Config file (defaults to ~/.clinic-console/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session token
    Login {
        /// Defaults to the last email used
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show the dashboard for your role
    Dashboard,
    /// Clinic-wide counters
    Stats,
    Patients {
        #[command(subcommand)]
        action: RecordAction,
    },
    Appointments {
        #[command(subcommand)]
        action: RecordAction,
    },
    Prescriptions {
        #[command(subcommand)]
        action: RecordAction,
    },
    Invoices {
        #[command(subcommand)]
        action: RecordAction,
    },
    Users {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Your appointments (physicians)
    Agenda {
        #[command(subcommand)]
        action: AgendaAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecordAction {
    /// List records
    List(ListArgs),
    /// Create a record from field=value pairs
    Create {
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    /// Change fields of an existing record, or show its form without `--set`
    Edit {
        id: u64,
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    /// Delete a record after confirmation
    Delete {
        id: u64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Case-insensitive text search
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by a column; repeat the same column to flip direction
    #[arg(long = "sort", value_name = "FIELD")]
    pub sort: Vec<String>,

    /// Exact status filter (invoices)
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,
}

#[derive(Subcommand, Debug)]
pub enum AgendaAction {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Patient details for one appointment
    Show { id: u64 },
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Csv,
}

/// Parse `field=value`. The value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{}'", raw)),
    }
}
