//! Share-link copying with a self-clearing "copied" indicator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long the indicator stays up after the most recent copy.
pub const COPY_INDICATOR_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("Task {0} cannot be shared")]
    NotShareable(String),
    #[error("Clipboard write failed: {0}")]
    Clipboard(String),
}

/// System clipboard seam.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ShareError>;
}

pub fn task_link(base_url: &str, task_id: &str) -> String {
    format!("{}/task/{}", base_url.trim_end_matches('/'), task_id)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopiedState {
    /// Bumped by every successful copy.
    pub generation: u64,
    pub task_id: Option<String>,
}

pub struct ShareLinks {
    clipboard: Arc<dyn Clipboard>,
    base_url: String,
    state: watch::Sender<CopiedState>,
    clear: Option<JoinHandle<()>>,
}

impl ShareLinks {
    pub fn new(clipboard: Arc<dyn Clipboard>, base_url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(CopiedState::default());
        Self {
            clipboard,
            base_url: base_url.into(),
            state,
            clear: None,
        }
    }

    pub fn link_for(&self, task_id: &str) -> String {
        task_link(&self.base_url, task_id)
    }

    pub fn copied(&self) -> Option<String> {
        self.state.borrow().task_id.clone()
    }

    pub fn watch(&self) -> watch::Receiver<CopiedState> {
        self.state.subscribe()
    }

    /// Writes the task link to the clipboard and shows the indicator for
    /// `task_id` until [`COPY_INDICATOR_DELAY`] passes without another copy.
    pub async fn copy(&mut self, task_id: &str) -> Result<String, ShareError> {
        let link = self.link_for(task_id);
        if let Err(e) = self.clipboard.write_text(&link).await {
            tracing::error!("Failed to copy link for task {}: {}", task_id, e);
            return Err(e);
        }

        if let Some(previous) = self.clear.take() {
            previous.abort();
        }

        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.task_id = Some(task_id.to_string());
            generation = state.generation;
        });

        let deadline = Instant::now() + COPY_INDICATOR_DELAY;
        let state = self.state.clone();
        self.clear = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // A newer copy owns the indicator.
            state.send_if_modified(|state| {
                if state.generation != generation || state.task_id.is_none() {
                    return false;
                }
                state.task_id = None;
                true
            });
        }));

        Ok(link)
    }
}

impl Drop for ShareLinks {
    fn drop(&mut self) {
        if let Some(clear) = self.clear.take() {
            clear.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::FakeClipboard;
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    fn links(clipboard: &Arc<FakeClipboard>) -> ShareLinks {
        ShareLinks::new(clipboard.clone(), "https://tarefas.example.com")
    }

    #[test]
    fn link_is_built_from_the_base_url() {
        assert_eq!(
            task_link("http://localhost:3000/", "T1"),
            "http://localhost:3000/task/T1"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn indicator_clears_after_the_delay() {
        let clipboard = Arc::new(FakeClipboard::default());
        let mut share = links(&clipboard);

        let link = share.copy("T1").await.unwrap();
        assert_eq!(link, "https://tarefas.example.com/task/T1");
        assert_eq!(*clipboard.written.lock(), vec![link]);
        assert_eq!(share.copied().as_deref(), Some("T1"));

        sleep(COPY_INDICATOR_DELAY - Duration::from_millis(1)).await;
        assert_eq!(share.copied().as_deref(), Some("T1"));

        sleep(Duration::from_millis(2)).await;
        assert_eq!(share.copied(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn copying_again_restarts_the_timer() {
        let clipboard = Arc::new(FakeClipboard::default());
        let mut share = links(&clipboard);

        share.copy("T1").await.unwrap();
        sleep(Duration::from_millis(2000)).await;
        share.copy("T1").await.unwrap();

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(share.copied().as_deref(), Some("T1"));

        sleep(Duration::from_millis(1001)).await;
        assert_eq!(share.copied(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_copy_owns_the_indicator() {
        let clipboard = Arc::new(FakeClipboard::default());
        let mut share = links(&clipboard);

        share.copy("T1").await.unwrap();
        sleep(Duration::from_millis(1000)).await;
        share.copy("T2").await.unwrap();

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(share.copied().as_deref(), Some("T2"));

        sleep(Duration::from_millis(501)).await;
        assert_eq!(share.copied(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn clipboard_failure_leaves_the_indicator_alone() {
        let clipboard = Arc::new(FakeClipboard::default());
        *clipboard.broken.lock() = true;
        let mut share = links(&clipboard);

        let err = share.copy("T1").await.unwrap_err();
        assert!(matches!(err, ShareError::Clipboard(_)));
        assert_eq!(share.copied(), None);
        assert_eq!(share.watch().borrow().generation, 0);
    }
}
