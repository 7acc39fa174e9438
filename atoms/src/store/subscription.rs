use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{Snapshot, StoreError};

/// Feeding side of a [`Subscription`]. Sends fail once the handle is gone.
pub type SnapshotSender = mpsc::UnboundedSender<Result<Snapshot, StoreError>>;

/// Standing query handle. Yields snapshots in delivery order until the
/// backend ends the stream or the handle is dropped.
///
/// Dropping the handle is the release: the receiver closes, so push-based
/// backends prune the subscriber on their next commit, and any polling
/// task owned by the handle is aborted.
#[derive(Debug)]
pub struct Subscription {
    rx: UnboundedReceiverStream<Result<Snapshot, StoreError>>,
    producer: Option<JoinHandle<()>>,
}

impl Subscription {
    /// A handle plus the sender that feeds it, for backends that push.
    pub fn channel() -> (SnapshotSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                rx: UnboundedReceiverStream::new(rx),
                producer: None,
            },
        )
    }

    pub(crate) fn with_producer(mut self, producer: JoinHandle<()>) -> Self {
        self.producer = Some(producer);
        self
    }

    pub async fn next_snapshot(&mut self) -> Option<Result<Snapshot, StoreError>> {
        self.rx.next().await
    }

    /// Explicit teardown; equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.rx.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl Stream for Subscription {
    type Item = Result<Snapshot, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_next_unpin(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
