//! Activity catalogs: the built-in seed and TOML catalog files.
//!
//! A catalog file lists activities as `[[activities]]` tables:
//!
//! ```toml
//! [[activities]]
//! name = "Chess Club"
//! description = "Learn strategies and compete in chess tournaments"
//! schedule = "Fridays, 3:30 PM - 5:00 PM"
//! max_participants = 12
//! participants = ["michael@mergington.edu"]
//! ```
//!
//! Parsing validates:
//! - The catalog contains at least one activity.
//! - Names are non-empty and unique.
//! - `max_participants` is positive.
//! - No email is listed twice within one activity.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::Activity;
use crate::registry::ActivityRegistry;

/// Errors that can occur while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("catalog must contain at least one activity")]
    NoActivities,

    #[error("activity name must not be empty")]
    EmptyName,

    #[error("duplicate activity name: {0:?}")]
    DuplicateActivity(String),

    #[error("activity {0:?} must have max_participants greater than zero")]
    ZeroCapacity(String),

    #[error("activity {activity:?} lists participant {email:?} more than once")]
    DuplicateParticipant { activity: String, email: String },
}

/// Top-level structure of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogToml {
    #[serde(default)]
    pub activities: Vec<ActivityToml>,
}

/// A single `[[activities]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityToml {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// The catalog every server starts with unless a catalog file is given.
pub fn seed_registry() -> ActivityRegistry {
    [
        (
            "Basketball Team",
            Activity::new(
                "Join the school basketball team and compete in inter-school tournaments",
                "Mondays and Wednesdays, 4:00 PM - 6:00 PM",
                15,
            )
            .with_participants(["james@mergington.edu", "william@mergington.edu"]),
        ),
        (
            "Swimming Club",
            Activity::new(
                "Improve swimming techniques and participate in swimming competitions",
                "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
                20,
            )
            .with_participants(["ava@mergington.edu", "noah@mergington.edu"]),
        ),
        (
            "Drama Club",
            Activity::new(
                "Perform in school plays and develop acting skills",
                "Wednesdays, 3:30 PM - 5:30 PM",
                25,
            )
            .with_participants(["isabella@mergington.edu", "liam@mergington.edu"]),
        ),
    ]
    .into_iter()
    .map(|(name, activity)| (name.to_string(), activity))
    .collect()
}

/// Parse and validate a catalog TOML string into a registry.
pub fn parse_catalog_toml(content: &str) -> Result<ActivityRegistry, CatalogError> {
    let catalog: CatalogToml = toml::from_str(content)?;
    validate(&catalog)?;

    Ok(catalog
        .activities
        .into_iter()
        .map(|entry| {
            let activity = Activity {
                description: entry.description,
                schedule: entry.schedule,
                max_participants: entry.max_participants,
                participants: entry.participants,
            };
            (entry.name, activity)
        })
        .collect())
}

/// Read and parse a catalog file from disk.
pub fn load_catalog(path: &Path) -> Result<ActivityRegistry, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let registry = parse_catalog_toml(&content)?;
    tracing::info!(
        path = %path.display(),
        activities = registry.len(),
        "loaded activity catalog"
    );
    Ok(registry)
}

fn validate(catalog: &CatalogToml) -> Result<(), CatalogError> {
    if catalog.activities.is_empty() {
        return Err(CatalogError::NoActivities);
    }

    let mut seen = HashSet::new();
    for entry in &catalog.activities {
        if entry.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if !seen.insert(entry.name.as_str()) {
            return Err(CatalogError::DuplicateActivity(entry.name.clone()));
        }
        if entry.max_participants == 0 {
            return Err(CatalogError::ZeroCapacity(entry.name.clone()));
        }

        let mut emails = HashSet::new();
        for email in &entry.participants {
            if !emails.insert(email.as_str()) {
                return Err(CatalogError::DuplicateParticipant {
                    activity: entry.name.clone(),
                    email: email.clone(),
                });
            }
        }
    }

    Ok(())
}
