use serde_json::Value;

use super::model::{CreateTaskPayload, Task, TaskAccess, UpdateTaskPayload, OWNER};
use crate::error::{ServiceError, ValidationError};
use crate::record::{decode_all, timestamp_now, Record};
use crate::store::{Document, DocumentStore, Fields};
use crate::users::Viewer;

fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyTaskText);
    }
    Ok(())
}

/// Create a new task owned by `viewer` (pure domain logic, no view state)
///
/// Returns the task as stored, including the id the store assigned.
pub async fn create_task(
    store: &dyn DocumentStore,
    viewer: Option<&Viewer>,
    payload: CreateTaskPayload,
) -> Result<Task, ServiceError> {
    validate_text(&payload.text)?;
    let viewer = viewer.ok_or(ServiceError::Unauthenticated)?;

    let mut task = Task {
        id: String::new(),
        text: payload.text,
        owner: viewer.id.clone(),
        is_public: payload.is_public,
        created_at: timestamp_now(),
    };

    task.id = store
        .insert(Task::COLLECTION, task.to_fields())
        .await
        .map_err(ServiceError::RemoteWrite)?;

    tracing::info!("Created task {} for {}", task.id, task.owner);
    Ok(task)
}

/// Update the editable fields of a task
///
/// Only `text` and `is_public` are written; `owner` and `created_at` are
/// never touched.
pub async fn update_task(
    store: &dyn DocumentStore,
    task_id: &str,
    payload: UpdateTaskPayload,
) -> Result<(), ServiceError> {
    validate_text(&payload.text)?;

    let mut fields = Fields::new();
    fields.insert("text".to_string(), Value::String(payload.text));
    fields.insert("is_public".to_string(), Value::Bool(payload.is_public));

    store
        .update(Task::COLLECTION, task_id, fields)
        .await
        .map_err(ServiceError::RemoteWrite)
}

/// Delete a task. Comments pointing at it are left in place.
pub async fn delete_task(store: &dyn DocumentStore, task_id: &str) -> Result<(), ServiceError> {
    store
        .delete(Task::COLLECTION, task_id)
        .await
        .map_err(ServiceError::RemoteWrite)
}

/// Get a specific task
pub async fn get_task(
    store: &dyn DocumentStore,
    task_id: &str,
) -> Result<Option<Task>, ServiceError> {
    let doc = store
        .get_one(Task::COLLECTION, task_id)
        .await
        .map_err(ServiceError::RemoteRead)?;

    doc.map(|d| Task::from_document(&d))
        .transpose()
        .map_err(ServiceError::RemoteRead)
}

/// Resolve a direct link to a task for `viewer`
pub async fn load_task_access(
    store: &dyn DocumentStore,
    task_id: &str,
    viewer: Option<&Viewer>,
) -> Result<TaskAccess, ServiceError> {
    match get_task(store, task_id).await? {
        Some(task) if task.is_visible_to(viewer) => Ok(TaskAccess::Allowed(task)),
        Some(_) => {
            tracing::info!("Task {} is private; access denied", task_id);
            Ok(TaskAccess::Denied)
        }
        None => Ok(TaskAccess::Denied),
    }
}

/// Owner-scoped projection of a task snapshot, keeping server order.
///
/// An absent viewer matches nothing.
pub fn owned_by(snapshot: &[Document], viewer: Option<&Viewer>) -> Vec<Task> {
    let Some(viewer) = viewer else {
        return Vec::new();
    };
    let owned: Vec<Document> = snapshot
        .iter()
        .filter(|doc| doc.get_str(OWNER) == Some(viewer.id.as_str()))
        .cloned()
        .collect();
    decode_all(&owned)
}
