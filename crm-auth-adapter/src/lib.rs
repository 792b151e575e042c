//! Auth adapter for the CRM dashboard.
//!
//! Wraps a Supabase-backed auth provider and layers on top of it:
//! - a one-time "is this deployment initialized" gate that sends
//!   unconfigured installations to the sign-up page
//! - role-based access checks sourced from the sale cached at login

pub mod error;
pub mod init;
pub mod location;
pub mod provider;
pub mod storage;
pub mod supabase;
pub mod test_util;

pub use error::{Error, Result};
pub use init::InitializationGate;
pub use location::{LocationSource, SharedLocation};
pub use provider::{
    AccessControl, AuthProvider, CrmAuthProvider, DashboardAuthProvider, IdentitySource,
    SupabaseAuthProvider, FORGOT_PASSWORD_PAGE, PUBLIC_PAGES, SET_PASSWORD_PAGE, SIGN_UP_PAGE,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SaleStore, USER_STORAGE_KEY};
pub use supabase::{AuthClient, Database, Query, Session, SessionUser, SupabaseClient};
