//! Remote writes plus the rule for folding their results into a local list.

use std::sync::Arc;

use tarefas_atoms::comments::{self, Comment, CreateCommentPayload};
use tarefas_atoms::record::Record;
use tarefas_atoms::store::DocumentStore;
use tarefas_atoms::tasks::{self, CreateTaskPayload, Task, UpdateTaskPayload};
use tarefas_atoms::users::Viewer;
use tarefas_atoms::ServiceError;

/// How a local list learns about a mutation it caused.
#[derive(Debug)]
pub enum ListReconciliationPolicy<'a, T> {
    /// A live subscription backs the list; its next snapshot carries the
    /// change, so the mutation result is ignored here.
    SubscriptionDriven,
    /// Nothing else will refresh the list; apply the result directly.
    LocalMerge(&'a mut Vec<T>),
}

impl<T: Record> ListReconciliationPolicy<'_, T> {
    fn created(self, item: &T) {
        match self {
            Self::SubscriptionDriven => {}
            Self::LocalMerge(list) => list.insert(0, item.clone()),
        }
    }

    fn deleted(self, id: &str) {
        match self {
            Self::SubscriptionDriven => {}
            Self::LocalMerge(list) => list.retain(|item| item.id() != id),
        }
    }
}

/// Issues writes against the shared store and reconciles the caller's list
/// according to the policy passed with each call.
#[derive(Clone)]
pub struct MutationGateway {
    store: Arc<dyn DocumentStore>,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create_task(
        &self,
        viewer: Option<&Viewer>,
        payload: CreateTaskPayload,
        policy: ListReconciliationPolicy<'_, Task>,
    ) -> Result<Task, ServiceError> {
        let task = tasks::create_task(self.store.as_ref(), viewer, payload).await?;
        policy.created(&task);
        Ok(task)
    }

    /// Edits never patch local state: only the subscribed dashboard edits,
    /// and its next snapshot reflects the change.
    pub async fn update_task(
        &self,
        task_id: &str,
        payload: UpdateTaskPayload,
    ) -> Result<(), ServiceError> {
        tasks::update_task(self.store.as_ref(), task_id, payload).await
    }

    pub async fn delete_task(
        &self,
        task_id: &str,
        policy: ListReconciliationPolicy<'_, Task>,
    ) -> Result<(), ServiceError> {
        tasks::delete_task(self.store.as_ref(), task_id).await?;
        policy.deleted(task_id);
        Ok(())
    }

    pub async fn create_comment(
        &self,
        viewer: Option<&Viewer>,
        task_id: &str,
        payload: CreateCommentPayload,
        policy: ListReconciliationPolicy<'_, Comment>,
    ) -> Result<Comment, ServiceError> {
        let comment =
            comments::create_comment(self.store.as_ref(), viewer, task_id, payload).await?;
        policy.created(&comment);
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        comment_id: &str,
        policy: ListReconciliationPolicy<'_, Comment>,
    ) -> Result<(), ServiceError> {
        comments::delete_comment(self.store.as_ref(), comment_id).await?;
        policy.deleted(comment_id);
        Ok(())
    }
}
