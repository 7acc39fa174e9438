//! Task detail: one task behind access control plus its comment thread.
//!
//! The thread starts from the comments rendered by the server and is never
//! subscribed; every comment write is merged into it locally.

use std::sync::Arc;

use tarefas_atoms::comments::{Comment, CreateCommentPayload};
use tarefas_atoms::store::DocumentStore;
use tarefas_atoms::tasks::{self, Task, TaskAccess};
use tarefas_atoms::users::SessionState;
use tarefas_atoms::{ServiceError, ValidationError};

use crate::confirm::DeleteConfirmation;
use crate::gateway::{ListReconciliationPolicy, MutationGateway};

#[derive(Debug, Clone, PartialEq)]
pub enum TaskView {
    Loading,
    /// Missing, or private and the viewer is not the owner.
    NotAllowed,
    Loaded(Task),
}

pub struct TaskDetail {
    task_id: String,
    session: SessionState,
    store: Arc<dyn DocumentStore>,
    gateway: MutationGateway,
    view: TaskView,
    comments: Vec<Comment>,
    input: String,
    sending: bool,
    pending_delete: DeleteConfirmation,
}

impl TaskDetail {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        task_id: impl Into<String>,
        session: SessionState,
        initial_comments: Vec<Comment>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            session,
            gateway: MutationGateway::new(store.clone()),
            store,
            view: TaskView::Loading,
            comments: initial_comments,
            input: String::new(),
            sending: false,
            pending_delete: DeleteConfirmation::Idle,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn view(&self) -> &TaskView {
        &self.view
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Fetches the task for the current session. Stays in
    /// [`TaskView::Loading`] while the session is unresolved or when the
    /// read fails; the error is handed to the caller.
    pub async fn load(&mut self) -> Result<&TaskView, ServiceError> {
        if !self.session.is_resolved() {
            return Ok(&self.view);
        }
        let access =
            tasks::load_task_access(self.store.as_ref(), &self.task_id, self.session.viewer())
                .await?;
        self.view = match access {
            TaskAccess::Allowed(task) => TaskView::Loaded(task),
            TaskAccess::Denied => TaskView::NotAllowed,
        };
        Ok(&self.view)
    }

    /// Session changes re-run the access check.
    pub async fn set_session(&mut self, session: SessionState) -> Result<&TaskView, ServiceError> {
        self.session = session;
        self.view = TaskView::Loading;
        self.load().await
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn can_comment(&self) -> bool {
        self.session.viewer().is_some() && !self.sending
    }

    /// Posts the typed comment and prepends it to the thread.
    ///
    /// Returns `Ok(None)` when commenting is disabled or the write failed;
    /// a failed write keeps the typed text.
    pub async fn submit_comment(&mut self) -> Result<Option<Comment>, ValidationError> {
        if self.input.trim().is_empty() {
            return Err(ValidationError::EmptyCommentText);
        }
        if !self.can_comment() {
            return Ok(None);
        }

        self.sending = true;
        let result = self
            .gateway
            .create_comment(
                self.session.viewer(),
                &self.task_id,
                CreateCommentPayload {
                    text: self.input.clone(),
                },
                ListReconciliationPolicy::LocalMerge(&mut self.comments),
            )
            .await;
        self.sending = false;

        match result {
            Ok(comment) => {
                self.input.clear();
                Ok(Some(comment))
            }
            Err(ServiceError::Validation(e)) => Err(e),
            Err(e) => {
                tracing::error!("Failed to post comment on {}: {}", self.task_id, e);
                Ok(None)
            }
        }
    }

    pub fn request_delete(&mut self, comment_id: &str) {
        self.pending_delete.request(comment_id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete.cancel();
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.pending()
    }

    /// Deletes the pending comment and drops it from the thread. The
    /// confirmation is cleared once the write returns.
    pub async fn confirm_delete(&mut self) -> Option<String> {
        let comment_id = self.pending_delete.pending()?.to_string();
        let result = self
            .gateway
            .delete_comment(
                &comment_id,
                ListReconciliationPolicy::LocalMerge(&mut self.comments),
            )
            .await;
        self.pending_delete.confirm();
        match result {
            Ok(()) => Some(comment_id),
            Err(e) => {
                tracing::error!("Failed to delete comment {}: {}", comment_id, e);
                None
            }
        }
    }
}
