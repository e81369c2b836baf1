//! Clinic Console Core Library
//!
//! Client side of a small clinic's administrative console: role-specific
//! dashboards over a remote REST API managing patients, appointments,
//! prescriptions, invoices and staff accounts.
//!
//! # Architecture
//!
//! ```text
//!                 login ──► SessionStore (token)
//!                                  │
//!                          RoleDispatcher (GET user)
//!                                  │
//!            ┌─────────────────────┼─────────────────────┐
//!            ▼                     ▼                     ▼
//!     Administrative           Physician             Secretary
//!    stats · users        agenda · prescriptions   stats · patients
//!                                                appointments · invoices
//!                                  │
//!                                  ▼
//!                         EntityScreen<E>
//!        activate (GET) ─► Projection (search/sort) ─► Table
//!                 ▲                                     │
//!                 └──── FormModal / DeleteConfirmation ◄┘
//!                        (POST · PUT · DELETE)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite key/value session store holding the bearer token
//! - [`api`]: REST client over a pluggable transport (HTTP or in-memory mock)
//! - [`models`]: Record types (Patient, Appointment, Prescription, Invoice, User)
//! - [`entity`]: The `Entity`/`Draft` traits each record type implements
//! - [`projection`]: Search, sort and status filtering
//! - [`screen`]: Generic list/form/delete screen
//! - [`dashboard`]: Role dispatch
//! - [`agenda`]: Physician appointment agenda
//! - [`render`]: Text and CSV tables

pub mod agenda;
pub mod api;
pub mod dashboard;
pub mod db;
pub mod entity;
pub mod models;
pub mod projection;
pub mod render;
pub mod screen;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, HttpTransport, Transport};
#[cfg(any(test, feature = "test-util"))]
pub use api::MockApi;
pub use dashboard::{Dashboard, RoleDispatcher, Screen};
pub use db::SessionStore;
pub use entity::{Draft, Entity, PatientDirectory, RecordId, SortField};
pub use models::{
    Appointment, Invoice, InvoiceStatus, Patient, Prescription, Role, Statistics, User,
};
pub use projection::{Projection, SortDirection, SortState};
pub use screen::{EntityScreen, SubmitOutcome};

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Session error: {0}")]
    Session(#[from] db::SessionError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Form(#[from] screen::FormError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Loading failed: {0}")]
    LoadFailed(String),

    #[error("The {screen} screen is not available for role '{role}'")]
    Forbidden { screen: String, role: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ConsoleError {
    /// Whether the user must log in again.
    pub fn is_auth(&self) -> bool {
        matches!(self, ConsoleError::Api(e) if e.is_auth())
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        ConsoleError::Serialization(e.to_string())
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
