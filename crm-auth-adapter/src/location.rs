//! Access to the dashboard's current location.

use std::sync::RwLock;

use crm_auth_common::Location;

/// Read-only view of where the dashboard currently is.
pub trait LocationSource: Send + Sync {
    fn current(&self) -> Location;
}

impl LocationSource for Location {
    fn current(&self) -> Location {
        self.clone()
    }
}

/// Location updated by the caller as the user navigates.
#[derive(Default)]
pub struct SharedLocation {
    inner: RwLock<Location>,
}

impl SharedLocation {
    pub fn new(location: Location) -> Self {
        Self {
            inner: RwLock::new(location),
        }
    }

    pub fn set(&self, location: Location) {
        match self.inner.write() {
            Ok(mut guard) => *guard = location,
            Err(poisoned) => *poisoned.into_inner() = location,
        }
    }
}

impl LocationSource for SharedLocation {
    fn current(&self) -> Location {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
