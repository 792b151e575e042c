//! CRM auth provider: initialization gate and sale-based access checks on
//! top of a base provider.

use std::sync::Arc;

use async_trait::async_trait;
use crm_auth_common::{AccessParams, Credentials, Identity, RedirectSignal, Sale, SetPasswordParams};
use serde_json::Value;

use super::supabase::{FORGOT_PASSWORD_PAGE, SET_PASSWORD_PAGE};
use super::{AccessControl, AuthProvider, DashboardAuthProvider, SupabaseAuthProvider};
use crate::error::{Error, Result};
use crate::init::InitializationGate;
use crate::location::LocationSource;
use crate::storage::{KeyValueStore, SaleStore};
use crate::supabase::{AuthClient, Database, Query, Session, SupabaseClient};

/// Page new deployments are sent to.
pub const SIGN_UP_PAGE: &str = "/sign-up";

/// Pages reachable without a session or an initialized deployment.
pub const PUBLIC_PAGES: [&str; 3] = [SET_PASSWORD_PAGE, FORGOT_PASSWORD_PAGE, SIGN_UP_PAGE];

/// The dashboard's auth provider.
///
/// Overrides `login`, `check_auth` and `can_access`; everything else is
/// handled by the base provider.
pub struct CrmAuthProvider<P = SupabaseAuthProvider> {
    base: P,
    auth_client: Arc<dyn AuthClient>,
    database: Arc<dyn Database>,
    sales: SaleStore,
    location: Arc<dyn LocationSource>,
    access_control: Arc<dyn AccessControl>,
    init_gate: Arc<InitializationGate>,
}

impl<P: AuthProvider> CrmAuthProvider<P> {
    pub fn new(
        base: P,
        auth_client: Arc<dyn AuthClient>,
        database: Arc<dyn Database>,
        sales: SaleStore,
        location: Arc<dyn LocationSource>,
        access_control: Arc<dyn AccessControl>,
        init_gate: Arc<InitializationGate>,
    ) -> Self {
        Self {
            base,
            auth_client,
            database,
            sales,
            location,
            access_control,
            init_gate,
        }
    }

    pub fn init_gate(&self) -> &Arc<InitializationGate> {
        &self.init_gate
    }
}

impl CrmAuthProvider<SupabaseAuthProvider> {
    /// Wire the provider on a Supabase client sharing `store` for the
    /// cached sale.
    pub fn supabase(
        client: Arc<SupabaseClient>,
        store: Arc<dyn KeyValueStore>,
        location: Arc<dyn LocationSource>,
        access_control: Arc<dyn AccessControl>,
    ) -> Self {
        let sales = SaleStore::new(store);
        let base = SupabaseAuthProvider::new(client.clone(), location.clone())
            .with_identity_source(Arc::new(sales.clone()));
        let init_gate = Arc::new(InitializationGate::new(client.clone()));

        Self::new(base, client.clone(), client, sales, location, access_control, init_gate)
    }
}

#[async_trait]
impl<P: AuthProvider> DashboardAuthProvider for CrmAuthProvider<P> {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let result = self.base.login(credentials).await?;

        let session = self
            .auth_client
            .get_session()
            .await?
            .ok_or(Error::InvalidSession)?;

        let query = Query::table("sales")
            .select(&Sale::COLUMNS)
            .eq("user_id", session.user.id);
        let row = self
            .database
            .select_single(&query)
            .await?
            .ok_or(Error::SaleNotFound)?;
        // Parsed for its schema only; the row itself is what gets cached.
        let sale: Sale = serde_json::from_value(row.clone())?;

        self.sales.save_row(&row)?;
        tracing::info!(sale_id = sale.id, role = %sale.role(), "Sale signed in");

        Ok(result)
    }

    async fn logout(&self) -> Result<()> {
        self.base.logout().await
    }

    async fn check_auth(&self, params: &Value) -> Result<()> {
        let location = self.location.current();
        if let Some(page) = PUBLIC_PAGES.iter().find(|page| location.is_on_page(page)) {
            tracing::debug!(page, "Public page, skipping auth check");
            return Ok(());
        }

        if !self.init_gate.is_initialized().await? {
            if let Err(e) = self.auth_client.sign_out().await {
                tracing::warn!("Sign-out before sign-up redirect failed: {}", e);
            }
            return Err(Error::Redirect(RedirectSignal::silent(SIGN_UP_PAGE)));
        }

        self.base.check_auth(params).await
    }

    async fn check_error(&self, error: &Error) -> Result<()> {
        self.base.check_error(error).await
    }

    async fn get_identity(&self) -> Result<Identity> {
        self.base.get_identity().await
    }

    async fn can_access(&self, params: &AccessParams) -> Result<bool> {
        if !self.init_gate.is_initialized().await? {
            return Ok(false);
        }

        let Some(sale) = self.sales.load() else {
            return Ok(false);
        };

        Ok(self.access_control.can_access(sale.role(), params))
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        self.base.reset_password(email).await
    }

    async fn set_password(&self, params: &SetPasswordParams) -> Result<()> {
        self.base.set_password(params).await
    }
}
