use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Field holding the referenced task id.
pub const TASK_ID: &str = "task_id";

/// Comment on a task. Author fields are copied at posting time and are not
/// kept in sync with later profile changes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub task_id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Record for Comment {
    const COLLECTION: &'static str = "comments";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentPayload {
    pub text: String,
}
