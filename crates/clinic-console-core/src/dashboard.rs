//! Role dispatch: which screens a logged-in user gets.

use std::fmt;

use crate::api::{ApiClient, Transport};
use crate::models::{Role, User};
use crate::{ConsoleError, ConsoleResult};

/// Shown to users whose role has no dashboard.
pub const NO_DASHBOARD_MESSAGE: &str = "No dashboard available for your role";

/// A screen reachable from some dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Statistics,
    Users,
    Patients,
    Appointments,
    /// Read-only appointment list with embedded patient details
    Agenda,
    Prescriptions,
    Invoices,
}

impl Screen {
    pub fn name(self) -> &'static str {
        match self {
            Screen::Statistics => "stats",
            Screen::Users => "users",
            Screen::Patients => "patients",
            Screen::Appointments => "appointments",
            Screen::Agenda => "agenda",
            Screen::Prescriptions => "prescriptions",
            Screen::Invoices => "invoices",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Statistics => "Statistics",
            Screen::Users => "User management",
            Screen::Patients => "Patients",
            Screen::Appointments => "Appointments",
            Screen::Agenda => "My appointments",
            Screen::Prescriptions => "Prescriptions",
            Screen::Invoices => "Invoices",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role-specific dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dashboard {
    Administrative,
    Physician,
    Secretary,
    /// Any other role string, including nurse and technician.
    Unrecognized { role: String },
}

impl Dashboard {
    /// Select the dashboard for a raw role string. Only exact wire values match.
    pub fn for_role(role: &str) -> Self {
        match role {
            r if r == Role::Administrative.as_str() => Dashboard::Administrative,
            r if r == Role::Physician.as_str() => Dashboard::Physician,
            r if r == Role::Secretary.as_str() => Dashboard::Secretary,
            other => Dashboard::Unrecognized {
                role: other.to_string(),
            },
        }
    }

    pub fn screens(&self) -> &'static [Screen] {
        match self {
            Dashboard::Administrative => &[Screen::Statistics, Screen::Users],
            Dashboard::Physician => &[Screen::Agenda, Screen::Prescriptions],
            Dashboard::Secretary => &[
                Screen::Statistics,
                Screen::Patients,
                Screen::Appointments,
                Screen::Invoices,
            ],
            Dashboard::Unrecognized { .. } => &[],
        }
    }

    /// First screen shown after dispatch.
    pub fn landing(&self) -> Option<Screen> {
        self.screens().first().copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Dashboard::Administrative => "Administration",
            Dashboard::Physician => "Physician dashboard",
            Dashboard::Secretary => "Secretariat",
            Dashboard::Unrecognized { .. } => NO_DASHBOARD_MESSAGE,
        }
    }

    fn role(&self) -> &str {
        match self {
            Dashboard::Administrative => Role::Administrative.as_str(),
            Dashboard::Physician => Role::Physician.as_str(),
            Dashboard::Secretary => Role::Secretary.as_str(),
            Dashboard::Unrecognized { role } => role,
        }
    }

    pub fn permits(&self, screen: Screen) -> bool {
        self.screens().contains(&screen)
    }

    /// Refuse screens outside this dashboard.
    pub fn require(&self, screen: Screen) -> ConsoleResult<()> {
        if self.permits(screen) {
            Ok(())
        } else {
            Err(ConsoleError::Forbidden {
                screen: screen.name().to_string(),
                role: self.role().to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Loading,
    Resolved { user: User, dashboard: Dashboard },
}

/// Fetches the current user once and pins the matching dashboard.
#[derive(Debug, Default)]
pub struct RoleDispatcher {
    state: DispatchState,
}

impl RoleDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Resolve the dashboard. Once resolved, later calls issue no request.
    pub fn resolve<T: Transport>(&mut self, api: &ApiClient<T>) -> ConsoleResult<&Dashboard> {
        if matches!(self.state, DispatchState::Loading) {
            let user = api.current_user()?;
            let dashboard = Dashboard::for_role(&user.role);
            tracing::info!(user = %user.email, role = %user.role, ?dashboard, "Resolved dashboard");
            self.state = DispatchState::Resolved { user, dashboard };
        }
        match &self.state {
            DispatchState::Resolved { dashboard, .. } => Ok(dashboard),
            DispatchState::Loading => Err(ConsoleError::InvalidInput(
                "current user could not be resolved".into(),
            )),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            DispatchState::Resolved { user, .. } => Some(user),
            DispatchState::Loading => None,
        }
    }
}
