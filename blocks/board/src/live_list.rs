//! Subscription-driven list state.
//!
//! Every pushed snapshot is total: the visible list is recomputed from it
//! and replaces the previous one wholesale. Nothing is patched in place.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tarefas_atoms::record::{Record, CREATED_AT};
use tarefas_atoms::store::{Document, DocumentStore, OrderBy, StoreError};
use tarefas_atoms::users::Viewer;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Turns one snapshot into the visible list for a viewer.
pub type Projection<T> = fn(&[Document], Option<&Viewer>) -> Vec<T>;

#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    /// No subscription is open.
    Idle,
    /// Subscribed, first snapshot not received yet.
    Loading,
    Ready(Vec<T>),
    /// The subscription failed; the hosting view renders an error state.
    Failed(String),
}

impl<T> ListState<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Self::Ready(items) => items,
            _ => &[],
        }
    }
}

#[derive(Debug)]
struct Active {
    viewer: Option<Viewer>,
    consumer: JoinHandle<()>,
}

impl Active {
    /// The consumer exits on a stream error or when the backend ends the
    /// stream; the subscription is dead from then on.
    fn is_live(&self) -> bool {
        !self.consumer.is_finished()
    }
}

/// Holds at most one standing subscription and publishes the projected
/// list through a watch channel.
pub struct LiveListSynchronizer<T: Record> {
    store: Arc<dyn DocumentStore>,
    project: Projection<T>,
    state: watch::Sender<ListState<T>>,
    // Bumped on every teardown; a consumer only publishes while its
    // generation is current.
    generation: Arc<Mutex<u64>>,
    active: Option<Active>,
}

impl<T: Record> LiveListSynchronizer<T> {
    pub fn new(store: Arc<dyn DocumentStore>, project: Projection<T>) -> Self {
        let (state, _) = watch::channel(ListState::Idle);
        Self {
            store,
            project,
            state,
            generation: Arc::new(Mutex::new(0)),
            active: None,
        }
    }

    pub fn watch(&self) -> watch::Receiver<ListState<T>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ListState<T> {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(Active::is_live)
    }

    /// Opens the subscription for `viewer`, replacing one opened for a
    /// different identity. Calling it again with the same identity keeps
    /// the running subscription, unless that one has failed or ended.
    pub async fn activate(&mut self, viewer: Option<&Viewer>) -> Result<(), StoreError> {
        if let Some(active) = &self.active {
            if active.viewer.as_ref() == viewer && active.is_live() {
                return Ok(());
            }
        }
        self.deactivate();

        let generation = *self.generation.lock();
        self.state.send_replace(ListState::Loading);

        let subscription = match self
            .store
            .subscribe(T::COLLECTION, OrderBy::desc(CREATED_AT))
            .await
        {
            Ok(subscription) => subscription,
            Err(e) => {
                self.state.send_replace(ListState::Failed(e.to_string()));
                return Err(e);
            }
        };
        tracing::info!(
            "Subscribed to {} for {}",
            T::COLLECTION,
            viewer.map_or("<anonymous>", |v| v.id.as_str())
        );

        let owner = viewer.cloned();
        let project = self.project;
        let state = self.state.clone();
        let current = Arc::clone(&self.generation);
        let consumer = tokio::spawn(async move {
            let mut subscription = subscription;
            while let Some(next) = subscription.next().await {
                let guard = current.lock();
                if *guard != generation {
                    break;
                }
                match next {
                    Ok(snapshot) => {
                        state.send_replace(ListState::Ready(project(&snapshot, owner.as_ref())));
                    }
                    Err(e) => {
                        tracing::error!("Subscription to {} failed: {}", T::COLLECTION, e);
                        state.send_replace(ListState::Failed(e.to_string()));
                        break;
                    }
                }
            }
        });

        self.active = Some(Active {
            viewer: viewer.cloned(),
            consumer,
        });
        Ok(())
    }

    /// Tears the subscription down. The list returns to [`ListState::Idle`]
    /// and no snapshot received afterwards is published.
    pub fn deactivate(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        {
            let mut generation = self.generation.lock();
            *generation += 1;
            self.state.send_replace(ListState::Idle);
        }
        active.consumer.abort();
        tracing::info!("Unsubscribed from {}", T::COLLECTION);
    }
}

impl<T: Record> Drop for LiveListSynchronizer<T> {
    fn drop(&mut self) {
        self.deactivate();
    }
}
