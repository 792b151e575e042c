//! crm-auth: command-line front end for the CRM dashboard auth adapter.

pub mod access;
pub mod commands;
pub mod config;

pub use commands::{Command, Outcome};
pub use config::Config;

use std::sync::Arc;

use crm_auth_adapter::{CrmAuthProvider, FileStore, KeyValueStore, SharedLocation, SupabaseClient};

use crate::access::AdminOnlyResources;

/// Build the auth provider described by `config`, reading the current URL
/// from `location`.
pub fn build_provider(config: &Config, location: Arc<SharedLocation>) -> CrmAuthProvider {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage.path));
    let client = Arc::new(SupabaseClient::new(
        &config.supabase.url,
        &config.supabase.anon_key,
        store.clone(),
    ));
    let access = AdminOnlyResources::new(config.access.admin_only_resources.clone());

    CrmAuthProvider::supabase(client, store, location, Arc::new(access))
}
