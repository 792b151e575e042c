//! Sale records and the identity derived from them.

use serde::{Deserialize, Serialize};

use crate::access::Role;

/// Snapshot of the signed-in sale, cached locally after login.
///
/// A sale is a CRM operator account (as opposed to a customer contact).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    pub administrator: bool,
}

impl Sale {
    /// Columns selected from the `sales` table.
    pub const COLUMNS: [&'static str; 5] =
        ["id", "first_name", "last_name", "avatar", "administrator"];

    pub fn role(&self) -> Role {
        Role::from_administrator(self.administrator)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: Identifier::Number(self.id),
            full_name: self.full_name(),
            avatar: self.avatar.as_ref().and_then(|a| a.src.clone()),
        }
    }
}

/// Uploaded image reference. Unknown keys are kept so the record is stored
/// exactly as the backend returned it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Avatar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Record identifier, numeric for sales and textual (uuid) for auth users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

/// Display identity of the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Identifier,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}
