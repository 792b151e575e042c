//! Supabase backend abstraction.
//!
//! This module defines the two seams the adapter talks to: `AuthClient`
//! (sign-in, session, sign-out) and `Database` (table queries). The
//! reqwest-based `SupabaseClient` implements both.

mod client;

pub use client::SupabaseClient;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use crm_auth_common::Credentials;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;

/// Authenticated session issued by Supabase auth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds at issue time
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Expiry as a unix timestamp (seconds)
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: SessionUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }

    /// Sessions without a known expiry never expire locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expiry| expiry <= now)
    }
}

/// The auth user attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Table query: column selection plus equality filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    filters: Vec<(String, String)>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((column.into(), value.to_string()));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    /// PostgREST query string pairs.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };

        let mut params = vec![("select".to_string(), select)];
        params.extend(
            self.filters
                .iter()
                .map(|(column, value)| (column.clone(), format!("eq.{}", value))),
        );
        params
    }
}

/// Client side of the platform's authentication service.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Sign in with email and password, storing the resulting session.
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session>;

    /// Current stored session, if any and not expired.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Drop the stored session and revoke it remotely.
    async fn sign_out(&self) -> Result<()>;

    /// Send a password recovery email.
    async fn reset_password_for_email(&self, email: &str) -> Result<()>;

    /// Change the password of the user owning `access_token`.
    async fn update_password(&self, access_token: &str, password: &str) -> Result<()>;
}

/// Table-style query interface.
#[async_trait]
pub trait Database: Send + Sync {
    /// Fetch every row matching the query.
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Fetch exactly one row; `None` when the query does not match exactly
    /// one row.
    async fn select_single(&self, query: &Query) -> Result<Option<Value>>;
}
