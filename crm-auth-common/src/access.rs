//! Role and access-check types.

use serde::{Deserialize, Serialize};

/// Coarse role derived from the signed-in sale.
///
/// Fine-grained permissions are decided by an access-control function keyed
/// by this role; the role itself only distinguishes administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sale with the `administrator` flag set
    Admin,
    /// Any other sale
    User,
}

impl Role {
    /// All role variants for iteration.
    pub const ALL: [Role; 2] = [Role::Admin, Role::User];

    pub fn from_administrator(administrator: bool) -> Self {
        if administrator {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a single access check: can the current user perform
/// `action` on `resource` (optionally on a specific `record`)?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessParams {
    pub action: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<serde_json::Value>,
}

impl AccessParams {
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
            record: None,
        }
    }

    pub fn with_record(mut self, record: serde_json::Value) -> Self {
        self.record = Some(record);
        self
    }
}
