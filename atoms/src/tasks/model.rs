use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::users::Viewer;

/// Field holding the owner's identity; the live list filters on it.
pub const OWNER: &str = "owner";

/// Task domain model - a note owned by one user, optionally public
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub text: String,

    /// Identity of the creator; never rewritten after creation
    pub owner: String,

    pub is_public: bool,

    /// Persisted as epoch milliseconds so the store can order numerically
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Private tasks are only visible to their owner.
    pub fn is_visible_to(&self, viewer: Option<&Viewer>) -> bool {
        self.is_public || viewer.is_some_and(|v| v.id == self.owner)
    }
}

impl Record for Task {
    const COLLECTION: &'static str = "tasks";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskPayload {
    pub text: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTaskPayload {
    pub text: String,
    pub is_public: bool,
}

/// Outcome of opening a task by direct link.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAccess {
    Allowed(Task),
    /// Missing, or private and the viewer is not the owner.
    Denied,
}
