//! In-process document store.
//!
//! Commits and snapshot fan-out happen under the same lock, so every
//! subscriber sees snapshots in exactly the order writes were committed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::SnapshotSender;
use super::{
    evaluate_query, Document, DocumentStore, Fields, Filter, OrderBy, StoreError, Subscription,
};

#[derive(Debug)]
struct Subscriber {
    collection: String,
    order: OrderBy,
    tx: SnapshotSender,
}

#[derive(Debug, Default)]
struct Inner {
    // Insertion order is kept so unordered queries are stable.
    collections: HashMap<String, Vec<Document>>,
    subscribers: Vec<Subscriber>,
}

impl Inner {
    fn docs(&self, collection: &str) -> Vec<Document> {
        self.collections.get(collection).cloned().unwrap_or_default()
    }

    fn publish(&mut self, collection: &str) {
        self.subscribers.retain(|s| !s.tx.is_closed());
        let docs = self.docs(collection);
        for sub in self.subscribers.iter().filter(|s| s.collection == collection) {
            let snapshot = evaluate_query(docs.iter().cloned(), &[], Some(&sub.order));
            // A send can only fail if the receiver closed after the retain above.
            let _ = sub.tx.send(Ok(snapshot));
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write calls (insert, update, delete) received so far,
    /// including ones that failed.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every subsequent write fail with a backend error until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of live subscribers across all collections.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|s| !s.tx.is_closed());
        inner.subscribers.len()
    }

    fn begin_write(&self, op: &str, collection: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend(format!(
                "{} on {} rejected: writes are disabled",
                op, collection
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(
        &self,
        collection: &str,
        order: OrderBy,
    ) -> Result<Subscription, StoreError> {
        let (tx, subscription) = Subscription::channel();
        let mut inner = self.inner.lock();
        let initial = evaluate_query(inner.docs(collection), &[], Some(&order));
        let _ = tx.send(Ok(initial));
        inner.subscribers.push(Subscriber {
            collection: collection.to_string(),
            order,
            tx,
        });
        Ok(subscription)
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.inner.lock().docs(collection);
        Ok(evaluate_query(docs, filters, order.as_ref()))
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.begin_write("insert", collection)?;
        let id = uuid::Uuid::new_v4().to_string();
        let mut inner = self.inner.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        inner.publish(collection);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.begin_write("update", collection)?;
        let mut inner = self.inner.lock();
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (k, v) in fields {
            doc.fields.insert(k, v);
        }
        inner.publish(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.begin_write("delete", collection)?;
        let mut inner = self.inner.lock();
        let removed = match inner.collections.get_mut(collection) {
            Some(docs) => {
                let before = docs.len();
                docs.retain(|d| d.id != id);
                docs.len() != before
            }
            None => false,
        };
        if removed {
            inner.publish(collection);
        }
        Ok(())
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self
            .inner
            .lock()
            .collections
            .get(collection)
            .map_or(0, Vec::len))
    }
}
