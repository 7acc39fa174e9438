use super::model::{Comment, CreateCommentPayload, TASK_ID};
use crate::error::{ServiceError, ValidationError};
use crate::record::{decode_all, timestamp_now, Record, CREATED_AT};
use crate::store::{DocumentStore, Filter, OrderBy};
use crate::users::Viewer;

/// Post a comment on a task
///
/// The task id is stored as given; nothing checks that the task exists.
pub async fn create_comment(
    store: &dyn DocumentStore,
    viewer: Option<&Viewer>,
    task_id: &str,
    payload: CreateCommentPayload,
) -> Result<Comment, ServiceError> {
    if payload.text.trim().is_empty() {
        return Err(ValidationError::EmptyCommentText.into());
    }
    let viewer = viewer.ok_or(ServiceError::Unauthenticated)?;

    let mut comment = Comment {
        id: String::new(),
        task_id: task_id.to_string(),
        text: payload.text,
        author_id: viewer.id.clone(),
        author_name: viewer.display_name.clone(),
        created_at: timestamp_now(),
    };

    comment.id = store
        .insert(Comment::COLLECTION, comment.to_fields())
        .await
        .map_err(ServiceError::RemoteWrite)?;

    Ok(comment)
}

/// Delete exactly one comment
pub async fn delete_comment(
    store: &dyn DocumentStore,
    comment_id: &str,
) -> Result<(), ServiceError> {
    store
        .delete(Comment::COLLECTION, comment_id)
        .await
        .map_err(ServiceError::RemoteWrite)
}

/// Load the thread of a task, newest first (one-shot, no subscription)
pub async fn load_comments_for_task(
    store: &dyn DocumentStore,
    task_id: &str,
) -> Result<Vec<Comment>, ServiceError> {
    let docs = store
        .query(
            Comment::COLLECTION,
            &[Filter::eq(TASK_ID, task_id)],
            Some(OrderBy::desc(CREATED_AT)),
        )
        .await
        .map_err(ServiceError::RemoteRead)?;

    Ok(decode_all(&docs))
}
