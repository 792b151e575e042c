//! Deployment initialization gate.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::supabase::{Database, Query};

/// Memoized answer to "has this deployment been set up?".
///
/// Lifecycle: starts unknown, is set once from the first successful
/// `init_state` query and is never re-queried afterwards, even if the
/// backend changes. Failed queries leave it unknown. Share one gate per
/// process.
pub struct InitializationGate {
    database: Arc<dyn Database>,
    state: Mutex<Option<bool>>,
}

impl InitializationGate {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self {
            database,
            state: Mutex::new(None),
        }
    }

    /// Whether the deployment is initialized, querying the backend on the
    /// first call only.
    pub async fn is_initialized(&self) -> Result<bool> {
        // Held across the query so concurrent first callers share one query.
        let mut state = self.state.lock().await;
        if let Some(initialized) = *state {
            tracing::debug!(initialized, "Using cached initialization state");
            return Ok(initialized);
        }

        let rows = self
            .database
            .select(&Query::table("init_state").select(&["is_initialized"]))
            .await?;
        let initialized = is_initialized_row(rows.first());

        *state = Some(initialized);
        tracing::info!(initialized, "Loaded deployment initialization state");
        Ok(initialized)
    }

    /// Cached value, without querying.
    pub async fn cached(&self) -> Option<bool> {
        *self.state.lock().await
    }

    /// Forget the cached value. Test isolation only.
    #[doc(hidden)]
    pub async fn reset(&self) {
        *self.state.lock().await = None;
    }
}

fn is_initialized_row(row: Option<&Value>) -> bool {
    row.and_then(|row| row.get("is_initialized"))
        .and_then(Value::as_f64)
        .is_some_and(|value| value > 0.0)
}
