use serde::{Deserialize, Serialize};

/// A single extracurricular activity.
///
/// The activity's name is not stored here; it is the key under which the
/// record lives in an [`ActivityRegistry`](crate::registry::ActivityRegistry).
/// Field names match the JSON returned by `GET /activities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Free-text description of the activity.
    pub description: String,
    /// Free-text meeting times, e.g. "Wednesdays, 3:30 PM - 5:30 PM".
    pub schedule: String,
    /// Advertised capacity. Informational only: signups are not capped.
    pub max_participants: u32,
    /// Enrolled emails in signup order. Each email appears at most once.
    #[serde(default)]
    pub participants: Vec<String>,
}

impl Activity {
    /// Create an activity with an empty roster.
    pub fn new(
        description: impl Into<String>,
        schedule: impl Into<String>,
        max_participants: u32,
    ) -> Self {
        Self {
            description: description.into(),
            schedule: schedule.into(),
            max_participants,
            participants: Vec::new(),
        }
    }

    /// Builder-style helper to seed the roster.
    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants = participants.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `email` is on the roster (exact, case-sensitive match).
    pub fn has_participant(&self, email: &str) -> bool {
        self.participants.iter().any(|p| p == email)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Remaining capacity, saturating at zero once the roster is over capacity.
    pub fn spots_left(&self) -> usize {
        (self.max_participants as usize).saturating_sub(self.participants.len())
    }

    pub fn is_over_capacity(&self) -> bool {
        self.participants.len() > self.max_participants as usize
    }
}
