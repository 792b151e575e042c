//! Supabase REST client (auth + PostgREST).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crm_auth_common::Credentials;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use url::Url;

use super::{AuthClient, Database, Query, Session};
use crate::error::{Error, Result};
use crate::storage::KeyValueStore;

/// PostgREST media type asking for a single JSON object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// PostgREST error code for "JSON object requested, multiple (or no) rows returned".
const NOT_SINGLE_ROW: &str = "PGRST116";

/// Supabase client.
///
/// The session is persisted in the given key-value store under
/// `sb-<project-ref>-auth-token`, next to whatever else the caller keeps
/// there.
pub struct SupabaseClient {
    http_client: Client,
    base_url: String,
    anon_key: String,
    store: Arc<dyn KeyValueStore>,
    session_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str, store: Arc<dyn KeyValueStore>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let session_key = session_storage_key(&base_url);
        Self {
            http_client: Client::new(),
            base_url,
            anon_key: anon_key.to_string(),
            store,
            session_key,
        }
    }

    /// Storage key holding the serialized session.
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn stored_session(&self) -> Result<Option<Session>> {
        let Some(raw) = self.store.get(&self.session_key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Ignoring malformed stored session: {}", e);
                Ok(None)
            }
        }
    }

    fn persist_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.store.set(&self.session_key, &json)
    }

    /// Access token of the current session, falling back to the anon key.
    async fn bearer_token(&self) -> Result<String> {
        Ok(self
            .get_session()
            .await?
            .map(|session| session.access_token)
            .unwrap_or_else(|| self.anon_key.clone()))
    }
}

fn session_storage_key(base_url: &str) -> String {
    let project_ref = Url::parse(base_url).ok().and_then(|url| {
        url.host_str()
            .and_then(|host| host.split('.').next())
            .map(str::to_string)
    });

    match project_ref {
        Some(project_ref) => format!("sb-{}-auth-token", project_ref),
        None => "sb-auth-token".to_string(),
    }
}

/// Best-effort extraction of the human readable message of an error body.
///
/// Auth errors use `msg` or `error_description`, PostgREST errors use
/// `message`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

async fn error_from_response(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::Backend {
        status,
        message: error_message(&body),
    }
}

fn communication_error(e: reqwest::Error) -> Error {
    Error::Communication(e.to_string())
}

// ============================================================================
// AuthClient implementation
// ============================================================================

#[async_trait]
impl AuthClient for SupabaseClient {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session> {
        let url = format!("{}?grant_type=password", self.auth_url("token"));

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(credentials)
            .send()
            .await
            .map_err(communication_error)?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidCredentials(error_message(&body)));
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let mut session: Session = response.json().await.map_err(communication_error)?;
        if session.expires_at.is_none() {
            session.expires_at = session
                .expires_in
                .map(|lifetime| Utc::now().timestamp() + lifetime);
        }

        self.persist_session(&session)?;
        tracing::info!(user_id = %session.user.id, "Signed in to Supabase");

        Ok(session)
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.stored_session()? else {
            return Ok(None);
        };

        if session.is_expired_at(Utc::now()) {
            tracing::debug!(user_id = %session.user.id, "Stored session has expired");
            return Ok(None);
        }

        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<()> {
        let session = self.stored_session()?;
        self.store.remove(&self.session_key)?;

        let Some(session) = session else {
            tracing::debug!("Sign-out without a stored session");
            return Ok(());
        };

        let response = self
            .http_client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(communication_error)?;

        match response.status() {
            status if status.is_success() => {}
            // Session already revoked or unknown remotely
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                tracing::debug!("Remote session was already gone");
            }
            _ => return Err(error_from_response(response).await),
        }

        tracing::info!(user_id = %session.user.id, "Signed out of Supabase");
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.auth_url("recover"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(communication_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        tracing::info!("Password recovery email requested");
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<()> {
        let response = self
            .http_client
            .put(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&json!({ "password": password }))
            .send()
            .await
            .map_err(communication_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        tracing::info!("Password updated");
        Ok(())
    }
}

// ============================================================================
// Database implementation
// ============================================================================

#[async_trait]
impl Database for SupabaseClient {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let token = self.bearer_token().await?;

        let response = self
            .http_client
            .get(self.rest_url(query.table_name()))
            .query(&query.to_params())
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(communication_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response.json().await.map_err(communication_error)
    }

    async fn select_single(&self, query: &Query) -> Result<Option<Value>> {
        let token = self.bearer_token().await?;

        let response = self
            .http_client
            .get(self.rest_url(query.table_name()))
            .query(&query.to_params())
            .header("apikey", &self.anon_key)
            .header(ACCEPT, SINGLE_OBJECT)
            .bearer_auth(token)
            .send()
            .await
            .map_err(communication_error)?;

        if response.status() == StatusCode::NOT_ACCEPTABLE {
            let body = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("code").and_then(Value::as_str).map(str::to_string));

            if code.as_deref() == Some(NOT_SINGLE_ROW) {
                tracing::debug!(table = query.table_name(), "Query did not match a single row");
                return Ok(None);
            }
            return Err(Error::Backend {
                status: StatusCode::NOT_ACCEPTABLE.as_u16(),
                message: error_message(&body),
            });
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let row = response.json().await.map_err(communication_error)?;
        Ok(Some(row))
    }
}
