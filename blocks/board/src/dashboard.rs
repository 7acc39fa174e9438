//! The owner's task board: live task list, create/edit form, two-step
//! delete and share links.

use std::sync::Arc;

use tarefas_atoms::store::{DocumentStore, StoreError};
use tarefas_atoms::tasks::{self, CreateTaskPayload, Task, UpdateTaskPayload};
use tarefas_atoms::users::SessionState;
use tarefas_atoms::{ServiceError, ValidationError};
use tokio::sync::watch;

use crate::confirm::DeleteConfirmation;
use crate::gateway::{ListReconciliationPolicy, MutationGateway};
use crate::live_list::{ListState, LiveListSynchronizer};
use crate::share::{Clipboard, ShareError, ShareLinks};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub input: String,
    pub is_public: bool,
    /// Set while the form edits an existing task instead of creating one.
    pub edit_task_id: Option<String>,
}

impl TaskForm {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created { id: String },
    Updated { id: String },
    /// The write failed after the form was already reset.
    WriteFailed(String),
}

pub struct Dashboard {
    session: SessionState,
    tasks: LiveListSynchronizer<Task>,
    gateway: MutationGateway,
    share: ShareLinks,
    pending_delete: DeleteConfirmation,
    pub form: TaskForm,
}

impl Dashboard {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clipboard: Arc<dyn Clipboard>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            session: SessionState::Loading,
            tasks: LiveListSynchronizer::new(store.clone(), tasks::owned_by),
            gateway: MutationGateway::new(store),
            share: ShareLinks::new(clipboard, base_url),
            pending_delete: DeleteConfirmation::Idle,
            form: TaskForm::default(),
        }
    }

    /// Follows the identity provider. The list subscribes once the session
    /// is resolved and resubscribes when the identity changes.
    pub async fn set_session(&mut self, session: SessionState) -> Result<(), StoreError> {
        self.session = session;
        if !self.session.is_resolved() {
            self.tasks.deactivate();
            return Ok(());
        }
        let viewer = self.session.viewer().cloned();
        self.tasks.activate(viewer.as_ref()).await
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn tasks(&self) -> ListState<Task> {
        self.tasks.current()
    }

    pub fn watch_tasks(&self) -> watch::Receiver<ListState<Task>> {
        self.tasks.watch()
    }

    fn find_task(&self, task_id: &str) -> Option<Task> {
        self.tasks
            .current()
            .items()
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
    }

    /// Loads a listed task into the form for editing.
    pub fn begin_edit(&mut self, task_id: &str) -> bool {
        let Some(task) = self.find_task(task_id) else {
            return false;
        };
        self.form = TaskForm {
            input: task.text,
            is_public: task.is_public,
            edit_task_id: Some(task.id),
        };
        true
    }

    /// Creates a task, or updates the one under edit.
    ///
    /// Blank text aborts with the form untouched. Any other outcome resets
    /// the form; a failed write is logged and reported, never rolled back.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ValidationError> {
        let form = self.form.clone();
        let result = match &form.edit_task_id {
            Some(id) => self
                .gateway
                .update_task(
                    id,
                    UpdateTaskPayload {
                        text: form.input,
                        is_public: form.is_public,
                    },
                )
                .await
                .map(|_| SubmitOutcome::Updated { id: id.clone() }),
            None => self
                .gateway
                .create_task(
                    self.session.viewer(),
                    CreateTaskPayload {
                        text: form.input,
                        is_public: form.is_public,
                    },
                    ListReconciliationPolicy::SubscriptionDriven,
                )
                .await
                .map(|task| SubmitOutcome::Created { id: task.id }),
        };

        match result {
            Err(ServiceError::Validation(e)) => Err(e),
            Ok(outcome) => {
                self.form.reset();
                Ok(outcome)
            }
            Err(e) => {
                if e.is_user_facing() {
                    tracing::warn!("Task not saved: {}", e);
                } else {
                    tracing::error!("Failed to save task: {}", e);
                }
                self.form.reset();
                Ok(SubmitOutcome::WriteFailed(e.to_string()))
            }
        }
    }

    pub fn request_delete(&mut self, task_id: &str) {
        self.pending_delete.request(task_id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete.cancel();
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.pending()
    }

    /// Deletes the pending task. Returns its id once the store accepted the
    /// delete. The confirmation stays pending until the write returns and is
    /// cleared either way; a failure is logged.
    pub async fn confirm_delete(&mut self) -> Option<String> {
        let task_id = self.pending_delete.pending()?.to_string();
        let result = self
            .gateway
            .delete_task(&task_id, ListReconciliationPolicy::SubscriptionDriven)
            .await;
        self.pending_delete.confirm();
        match result {
            Ok(()) => Some(task_id),
            Err(e) => {
                tracing::error!("Failed to delete task {}: {}", task_id, e);
                None
            }
        }
    }

    /// Copies the share link of a public task from the list.
    pub async fn copy_link(&mut self, task_id: &str) -> Result<String, ShareError> {
        match self.find_task(task_id) {
            Some(task) if task.is_public => self.share.copy(task_id).await,
            _ => Err(ShareError::NotShareable(task_id.to_string())),
        }
    }

    pub fn copied(&self) -> Option<String> {
        self.share.copied()
    }

    /// The view went away; release the subscription.
    pub fn close(&mut self) {
        self.tasks.deactivate();
    }
}
