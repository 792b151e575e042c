//! Base auth provider backed by Supabase auth.

use std::sync::Arc;

use async_trait::async_trait;
use crm_auth_common::{
    Credentials, Identifier, Identity, Location, RedirectSignal, SetPasswordParams,
};
use serde_json::Value;

use super::{AuthProvider, IdentitySource};
use crate::error::{Error, Result};
use crate::location::LocationSource;
use crate::supabase::{AuthClient, Session};

/// Page where recovery and invitation links set a new password.
pub const SET_PASSWORD_PAGE: &str = "/set-password";

pub const FORGOT_PASSWORD_PAGE: &str = "/forgot-password";

/// Link types that land the user on the set-password page.
const PASSWORD_LINK_TYPES: [&str; 2] = ["recovery", "invite"];

/// Auth provider delegating to a Supabase auth client.
pub struct SupabaseAuthProvider {
    client: Arc<dyn AuthClient>,
    location: Arc<dyn LocationSource>,
    identity_source: Option<Arc<dyn IdentitySource>>,
}

impl SupabaseAuthProvider {
    pub fn new(client: Arc<dyn AuthClient>, location: Arc<dyn LocationSource>) -> Self {
        Self {
            client,
            location,
            identity_source: None,
        }
    }

    /// Resolve identities from `source` instead of the session user.
    pub fn with_identity_source(mut self, source: Arc<dyn IdentitySource>) -> Self {
        self.identity_source = Some(source);
        self
    }
}

/// Redirect for recovery and invitation links, which carry the tokens the
/// set-password page needs. Links missing a token are left to the regular
/// session check.
fn password_link_redirect(location: &Location) -> Option<RedirectSignal> {
    let link_type = location
        .param("type")
        .filter(|t| PASSWORD_LINK_TYPES.contains(&t.as_str()))?;

    match (location.param("access_token"), location.param("refresh_token")) {
        (Some(access_token), Some(refresh_token)) => {
            let search = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("access_token", &access_token)
                .append_pair("refresh_token", &refresh_token)
                .append_pair("type", &link_type)
                .finish();
            Some(RedirectSignal::silent(format!(
                "{}?{}",
                SET_PASSWORD_PAGE, search
            )))
        }
        _ => {
            tracing::warn!(
                link_type = %link_type,
                "Password link without access or refresh token"
            );
            None
        }
    }
}

fn session_identity(session: &Session) -> Identity {
    Identity {
        id: Identifier::Text(session.user.id.to_string()),
        full_name: session
            .user
            .email
            .clone()
            .unwrap_or_else(|| session.user.id.to_string()),
        avatar: None,
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.client.sign_in_with_password(credentials).await
    }

    async fn logout(&self) -> Result<()> {
        self.client.sign_out().await
    }

    async fn check_auth(&self, _params: &Value) -> Result<()> {
        let location = self.location.current();
        if location.is_on_page(SET_PASSWORD_PAGE) || location.is_on_page(FORGOT_PASSWORD_PAGE) {
            return Ok(());
        }

        if let Some(redirect) = password_link_redirect(&location) {
            tracing::debug!("Password link detected, redirecting to set-password");
            return Err(Error::Redirect(redirect));
        }

        match self.client.get_session().await? {
            Some(_) => Ok(()),
            None => Err(Error::Unauthenticated),
        }
    }

    async fn check_error(&self, error: &Error) -> Result<()> {
        match error.status() {
            Some(401) | Some(403) => Err(Error::Unauthenticated),
            _ => Ok(()),
        }
    }

    async fn get_identity(&self) -> Result<Identity> {
        if let Some(source) = &self.identity_source {
            return source.identity().ok_or(Error::NoIdentity);
        }

        self.client
            .get_session()
            .await?
            .map(|session| session_identity(&session))
            .ok_or(Error::NoIdentity)
    }

    async fn get_permissions(&self) -> Result<Option<String>> {
        Ok(self
            .client
            .get_session()
            .await?
            .and_then(|session| session.user.role))
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        self.client.reset_password_for_email(email).await
    }

    async fn set_password(&self, params: &SetPasswordParams) -> Result<()> {
        self.client
            .update_password(&params.access_token, &params.password)
            .await
    }
}
