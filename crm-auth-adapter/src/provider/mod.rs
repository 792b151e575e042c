//! Auth provider abstraction layer.
//!
//! `AuthProvider` is the full contract of a base provider, including
//! permission listing. `DashboardAuthProvider` is the narrower contract
//! the dashboard consumes: permission listing is replaced by `can_access`.

mod adapter;
mod supabase;

pub use adapter::{CrmAuthProvider, PUBLIC_PAGES, SIGN_UP_PAGE};
pub use supabase::{SupabaseAuthProvider, FORGOT_PASSWORD_PAGE, SET_PASSWORD_PAGE};

use async_trait::async_trait;
use crm_auth_common::{AccessParams, Credentials, Identity, Role, SetPasswordParams};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::supabase::Session;

/// Base auth provider contract.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session>;

    async fn logout(&self) -> Result<()>;

    /// Succeeds when the current route may be shown.
    async fn check_auth(&self, params: &Value) -> Result<()>;

    /// Decide whether an error raised by a data call should log the user out.
    async fn check_error(&self, error: &Error) -> Result<()>;

    async fn get_identity(&self) -> Result<Identity>;

    async fn get_permissions(&self) -> Result<Option<String>>;

    async fn reset_password(&self, email: &str) -> Result<()>;

    async fn set_password(&self, params: &SetPasswordParams) -> Result<()>;
}

/// Contract exposed to the dashboard.
#[async_trait]
pub trait DashboardAuthProvider: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session>;

    async fn logout(&self) -> Result<()>;

    async fn check_auth(&self, params: &Value) -> Result<()>;

    async fn check_error(&self, error: &Error) -> Result<()>;

    async fn get_identity(&self) -> Result<Identity>;

    /// `Ok(false)` means access denied; errors are reserved for backend
    /// failures.
    async fn can_access(&self, params: &AccessParams) -> Result<bool>;

    async fn reset_password(&self, email: &str) -> Result<()>;

    async fn set_password(&self, params: &SetPasswordParams) -> Result<()>;
}

/// Fine-grained permission rules keyed by role.
pub trait AccessControl: Send + Sync {
    fn can_access(&self, role: Role, params: &AccessParams) -> bool;
}

impl<F> AccessControl for F
where
    F: Fn(Role, &AccessParams) -> bool + Send + Sync,
{
    fn can_access(&self, role: Role, params: &AccessParams) -> bool {
        self(role, params)
    }
}

/// Source of the display identity of the current user.
pub trait IdentitySource: Send + Sync {
    fn identity(&self) -> Option<Identity>;
}
