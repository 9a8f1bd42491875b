//! Shared handle to the activity registry.
//!
//! [`SignupService`] owns the registry for the lifetime of the server and is
//! handed to request handlers as state. Every operation takes the single
//! registry lock for its whole duration, so each signup or unregister is
//! applied atomically with respect to concurrent requests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::activity::Activity;
use crate::catalog;
use crate::registry::{ActivityRegistry, Confirmation, RegistryError};

/// Cloneable, thread-safe front for an [`ActivityRegistry`].
#[derive(Debug, Clone)]
pub struct SignupService {
    registry: Arc<Mutex<ActivityRegistry>>,
}

impl SignupService {
    /// Wrap an already-built registry.
    pub fn new(registry: ActivityRegistry) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    /// A service over the built-in seed catalog.
    pub fn seeded() -> Self {
        Self::new(catalog::seed_registry())
    }

    /// Snapshot of every activity and its roster.
    pub fn list(&self) -> BTreeMap<String, Activity> {
        let registry = self.lock();
        tracing::debug!(activities = registry.len(), "listing activities");
        registry.list().clone()
    }

    /// Snapshot of a single activity.
    pub fn get(&self, name: &str) -> Option<Activity> {
        self.lock().get(name).cloned()
    }

    pub fn sign_up(&self, activity: &str, email: &str) -> Result<Confirmation, RegistryError> {
        let result = self.lock().sign_up(activity, email);
        match &result {
            Ok(_) => tracing::info!(activity, email, "participant signed up"),
            Err(e) => tracing::warn!(activity, email, error = %e, "signup rejected"),
        }
        result
    }

    pub fn unregister(&self, activity: &str, email: &str) -> Result<Confirmation, RegistryError> {
        let result = self.lock().unregister(activity, email);
        match &result {
            Ok(_) => tracing::info!(activity, email, "participant unregistered"),
            Err(e) => tracing::warn!(activity, email, error = %e, "unregister rejected"),
        }
        result
    }

    // Registry mutations never leave partial state behind, so a lock
    // poisoned by a panicking holder still guards a consistent registry.
    fn lock(&self) -> MutexGuard<'_, ActivityRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SignupService {
    fn default() -> Self {
        Self::seeded()
    }
}
