//! Test doubles shared by the view tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tarefas_atoms::store::{
    Document, DocumentStore, Fields, Filter, MemoryStore, OrderBy, StoreError, Subscription,
};

use crate::share::{Clipboard, ShareError};

/// Records every write; can be switched to fail.
#[derive(Default)]
pub struct FakeClipboard {
    pub written: Mutex<Vec<String>>,
    pub broken: Mutex<bool>,
}

#[async_trait]
impl Clipboard for FakeClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ShareError> {
        if *self.broken.lock() {
            return Err(ShareError::Clipboard("permission denied".to_string()));
        }
        self.written.lock().push(text.to_string());
        Ok(())
    }
}

/// Memory store with switchable read faults. Writes go straight through.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    subscribes: AtomicUsize,
    refuse_subscribe: AtomicBool,
    break_next_stream: AtomicBool,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    /// Every `subscribe` call fails until switched back.
    pub fn refuse_subscribe(&self, refuse: bool) {
        self.refuse_subscribe.store(refuse, Ordering::SeqCst);
    }

    /// The next subscription yields one error and ends.
    pub fn break_next_stream(&self) {
        self.break_next_stream.store(true, Ordering::SeqCst);
    }

    /// `query` and `get_one` fail until switched back.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend("read timed out"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn subscribe(
        &self,
        collection: &str,
        order: OrderBy,
    ) -> Result<Subscription, StoreError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        if self.refuse_subscribe.load(Ordering::SeqCst) {
            return Err(StoreError::backend("subscribe refused"));
        }
        if self.break_next_stream.swap(false, Ordering::SeqCst) {
            let (tx, subscription) = Subscription::channel();
            let _ = tx.send(Err(StoreError::backend("stream dropped")));
            return Ok(subscription);
        }
        self.inner.subscribe(collection, order).await
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_reads()?;
        self.inner.query(collection, filters, order).await
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.inner.insert(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_reads()?;
        self.inner.get_one(collection, id).await
    }
}
