//! View models handed to a render surface.
//!
//! View models carry raw text. Turning them into markup, including escaping,
//! is the surface's job.

use strum::Display;

use crate::users::User;

/// Placeholder shown when the server has no users.
pub const NO_USERS_PLACEHOLDER: &str = "Aucun utilisateur pour le moment";
/// Placeholder shown when the last fetch failed.
pub const LOAD_ERROR_PLACEHOLDER: &str = "Erreur lors du chargement des utilisateurs";
/// Indicator label while a health check is in flight.
pub const CHECKING_LABEL: &str = "Vérification...";
/// Indicator label after a failed health check.
pub const UNHEALTHY_LABEL: &str = "Statut: unhealthy";
/// Message used when a failed creation carries no server message.
pub const GENERIC_CREATE_ERROR: &str = "Failed to create user";

/// One row of the users list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    /// Server id.
    pub id: i64,
    /// Raw name.
    pub name: String,
    /// Raw email.
    pub email: String,
}

impl UserRow {
    /// Badge text, e.g. `#3`.
    pub fn badge(&self) -> String {
        format!("#{}", self.id)
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// What the users list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsersView {
    /// Snapshot is empty.
    Empty,
    /// One row per user, in snapshot order.
    Rows(Vec<UserRow>),
    /// The most recent fetch failed.
    Failed,
}

impl UsersView {
    /// Build the view for a snapshot.
    pub fn from_snapshot(users: &[User]) -> Self {
        if users.is_empty() {
            UsersView::Empty
        } else {
            UsersView::Rows(users.iter().map(UserRow::from).collect())
        }
    }

    /// Number of user rows shown.
    pub fn row_count(&self) -> usize {
        match self {
            UsersView::Rows(rows) => rows.len(),
            UsersView::Empty | UsersView::Failed => 0,
        }
    }

    /// Placeholder text, if the view shows one instead of rows.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            UsersView::Empty => Some(NO_USERS_PLACEHOLDER),
            UsersView::Failed => Some(LOAD_ERROR_PLACEHOLDER),
            UsersView::Rows(_) => None,
        }
    }
}

/// Health indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum HealthState {
    /// A check is in flight.
    Checking,
    /// Last check succeeded.
    Healthy,
    /// Last check failed.
    Unhealthy,
}

/// Health indicator contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthView {
    /// Visual state.
    pub state: HealthState,
    /// Text next to the indicator.
    pub label: String,
}

impl HealthView {
    /// Indicator while a check is running.
    pub fn checking() -> Self {
        Self {
            state: HealthState::Checking,
            label: CHECKING_LABEL.to_string(),
        }
    }

    /// Indicator after a successful check.
    pub fn healthy(status: &str) -> Self {
        Self {
            state: HealthState::Healthy,
            label: format!("Statut: {}", status),
        }
    }

    /// Indicator after a failed check.
    pub fn unhealthy() -> Self {
        Self {
            state: HealthState::Unhealthy,
            label: UNHEALTHY_LABEL.to_string(),
        }
    }
}

/// Notice category, also used as its CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NoticeKind {
    /// Action succeeded.
    Success,
    /// Action failed.
    Error,
}

/// Identifier of a displayed notice.
pub type NoticeId = u64;

/// Transient message in the form section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Category.
    pub kind: NoticeKind,
    /// Raw text.
    pub text: String,
}

impl Notice {
    /// Notice for a created user.
    pub fn created(name: &str) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: format!("Utilisateur \"{}\" ajouté avec succès!", name),
        }
    }

    /// Notice for a failed action.
    pub fn failed(message: &str) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: format!("Erreur: {}", message),
        }
    }
}
