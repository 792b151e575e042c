//! Cached sale of the signed-in user.

use std::sync::Arc;

use crm_auth_common::{Identity, Sale};
use serde_json::{Map, Value};

use super::KeyValueStore;
use crate::error::Result;
use crate::provider::IdentitySource;

/// Storage key of the cached sale.
pub const USER_STORAGE_KEY: &str = "user";

/// Typed view over the `user` slot of a [`KeyValueStore`].
#[derive(Clone)]
pub struct SaleStore {
    store: Arc<dyn KeyValueStore>,
}

impl SaleStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the cached sale.
    ///
    /// Missing, unreadable, unparseable and schema-invalid records all come
    /// back as `None`.
    pub fn load(&self) -> Option<Sale> {
        let raw = match self.store.get(USER_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read cached sale: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Sale>(&raw) {
            Ok(sale) => Some(sale),
            Err(e) => {
                tracing::warn!("Ignoring malformed cached sale: {}", e);
                None
            }
        }
    }

    /// Overwrite the cached sale with `row` as the backend returned it,
    /// keeping only the sale columns.
    pub fn save_row(&self, row: &Value) -> Result<()> {
        let projected: Map<String, Value> = match row {
            Value::Object(object) => object
                .iter()
                .filter(|(key, _)| Sale::COLUMNS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            _ => Map::new(),
        };
        let json = serde_json::to_string(&projected)?;
        self.store.set(USER_STORAGE_KEY, &json)
    }
}

impl IdentitySource for SaleStore {
    fn identity(&self) -> Option<Identity> {
        self.load().map(|sale| sale.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn sale_store() -> (Arc<MemoryStore>, SaleStore) {
        let store = Arc::new(MemoryStore::new());
        let sales = SaleStore::new(store.clone());
        (store, sales)
    }

    #[test]
    fn test_load_missing_record() {
        let (_, sales) = sale_store();
        assert!(sales.load().is_none());
    }

    #[test]
    fn test_load_unparseable_record() {
        let (store, sales) = sale_store();
        store.set(USER_STORAGE_KEY, "{not json").unwrap();
        assert!(sales.load().is_none());
    }

    #[test]
    fn test_load_record_failing_schema() {
        let (store, sales) = sale_store();
        store
            .set(USER_STORAGE_KEY, r#"{"id": "abc", "administrator": "yes"}"#)
            .unwrap();
        assert!(sales.load().is_none());
    }

    #[test]
    fn test_save_row_then_load() {
        let (store, sales) = sale_store();
        let row = json!({
            "id": 12,
            "user_id": "d0c1a4a8-3d0a-4bb3-a3a7-1f2a3b4c5d6e",
            "first_name": "Jane",
            "last_name": "Doe",
            "avatar": {"src": "jane.png", "title": null},
            "administrator": true
        });

        sales.save_row(&row).unwrap();

        let raw: Value =
            serde_json::from_str(&store.get(USER_STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({
                "id": 12,
                "first_name": "Jane",
                "last_name": "Doe",
                "avatar": {"src": "jane.png", "title": null},
                "administrator": true
            })
        );
        let sale = sales.load().unwrap();
        assert_eq!(sale.id, 12);
        assert!(sale.administrator);
    }

    #[test]
    fn test_save_row_without_avatar_key() {
        let (store, sales) = sale_store();
        let row = json!({"id": 3, "first_name": "Ann", "last_name": "Lee", "administrator": false});

        sales.save_row(&row).unwrap();

        let raw: Value =
            serde_json::from_str(&store.get(USER_STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw, row);
        assert!(sales.load().unwrap().avatar.is_none());
    }

    #[test]
    fn test_identity_from_cached_sale() {
        let (store, sales) = sale_store();
        assert!(sales.identity().is_none());

        store
            .set(
                USER_STORAGE_KEY,
                r#"{"id":4,"first_name":"Ann","last_name":"Lee","avatar":null,"administrator":false}"#,
            )
            .unwrap();

        let identity = sales.identity().unwrap();
        assert_eq!(identity.full_name, "Ann Lee");
        assert!(identity.avatar.is_none());
    }
}
