//! Users API types.

use serde::{Deserialize, Serialize};

/// A user as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Values currently typed into the creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    /// Name field.
    pub name: String,
    /// Email field.
    pub email: String,
}

impl FormInput {
    /// Create form input from raw field values.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Payload to submit: both fields trimmed, nothing else checked.
    pub fn to_new_user(&self) -> NewUser {
        NewUser {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }

    /// Check if both fields are empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty()
    }

    /// Empty both fields.
    pub fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
    }
}

/// Body of `GET /api/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    /// Listed users; absent or null means none.
    #[serde(default)]
    pub users: Option<Vec<User>>,
}

impl UsersResponse {
    /// Users in server order.
    pub fn into_users(self) -> Vec<User> {
        self.users.unwrap_or_default()
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Server-reported status.
    #[serde(default)]
    pub status: Option<String>,
}

impl HealthResponse {
    /// Status reported by the server; "healthy" when missing or blank.
    pub fn status_or_default(self) -> String {
        self.status
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "healthy".to_string())
    }
}

/// Error body the server sends with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    #[serde(default)]
    pub error: Option<String>,
}
