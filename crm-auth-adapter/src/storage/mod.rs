//! Local key-value storage.
//!
//! Plays the role of the browser's local storage: a flat map of string
//! keys to string values, shared by the Supabase client (session) and the
//! adapter (cached sale).

mod file;
mod sale;

pub use file::FileStore;
pub use sale::{SaleStore, USER_STORAGE_KEY};

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
