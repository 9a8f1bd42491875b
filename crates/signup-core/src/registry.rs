//! In-memory activity registry.
//!
//! The registry maps activity names to [`Activity`] records. The set of
//! activities is fixed once the registry is built; only rosters change, and
//! only through [`ActivityRegistry::sign_up`] and
//! [`ActivityRegistry::unregister`]. A rejected operation leaves the registry
//! exactly as it was.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::activity::Activity;

/// Reasons a roster mutation is rejected.
///
/// The `Display` text of each variant is the human-readable detail returned
/// to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Activity not found")]
    NotFound { activity: String },

    #[error("{email} already signed up")]
    AlreadyRegistered { activity: String, email: String },

    #[error("{email} not registered")]
    NotRegistered { activity: String, email: String },
}

/// Which roster change a [`Confirmation`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SignedUp,
    Unregistered,
}

/// Receipt for a successful roster change.
///
/// Displays as the confirmation message shown to callers, e.g.
/// `Signed up new@mergington.edu for Drama Club`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub action: Action,
    pub activity: String,
    pub email: String,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (email, activity) = (&self.email, &self.activity);
        match self.action {
            Action::SignedUp => write!(f, "Signed up {email} for {activity}"),
            Action::Unregistered => write!(f, "Unregistered {email} from {activity}"),
        }
    }
}

/// All activities, keyed by exact name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityRegistry {
    activities: BTreeMap<String, Activity>,
}

impl ActivityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an activity under `name`.
    ///
    /// Used while building a catalog. If an activity with the same name is
    /// already present it is replaced and the old record is returned.
    pub fn insert(&mut self, name: impl Into<String>, activity: Activity) -> Option<Activity> {
        self.activities.insert(name.into(), activity)
    }

    /// Every activity with its current roster.
    pub fn list(&self) -> &BTreeMap<String, Activity> {
        &self.activities
    }

    /// Look up an activity by exact name.
    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.activities.get(name)
    }

    /// Activity names in key order.
    pub fn names(&self) -> Vec<&str> {
        self.activities.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Add `email` to the roster of `activity_name`.
    ///
    /// Capacity is not checked: a signup succeeds even when the roster is
    /// already at or above `max_participants`.
    pub fn sign_up(
        &mut self,
        activity_name: &str,
        email: &str,
    ) -> Result<Confirmation, RegistryError> {
        let activity = self.lookup_mut(activity_name)?;

        if activity.has_participant(email) {
            return Err(RegistryError::AlreadyRegistered {
                activity: activity_name.to_string(),
                email: email.to_string(),
            });
        }

        activity.participants.push(email.to_string());

        Ok(Confirmation {
            action: Action::SignedUp,
            activity: activity_name.to_string(),
            email: email.to_string(),
        })
    }

    /// Remove `email` from the roster of `activity_name`.
    pub fn unregister(
        &mut self,
        activity_name: &str,
        email: &str,
    ) -> Result<Confirmation, RegistryError> {
        let activity = self.lookup_mut(activity_name)?;

        let Some(pos) = activity.participants.iter().position(|p| p == email) else {
            return Err(RegistryError::NotRegistered {
                activity: activity_name.to_string(),
                email: email.to_string(),
            });
        };
        activity.participants.remove(pos);

        Ok(Confirmation {
            action: Action::Unregistered,
            activity: activity_name.to_string(),
            email: email.to_string(),
        })
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut Activity, RegistryError> {
        self.activities
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound {
                activity: name.to_string(),
            })
    }
}

impl FromIterator<(String, Activity)> for ActivityRegistry {
    fn from_iter<T: IntoIterator<Item = (String, Activity)>>(iter: T) -> Self {
        Self {
            activities: iter.into_iter().collect(),
        }
    }
}
