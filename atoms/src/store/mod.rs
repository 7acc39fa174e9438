//! Remote collection capability.
//!
//! [`DocumentStore`] is the contract both views are written against: a
//! collection of JSON documents that can be subscribed to, queried once,
//! and mutated one document at a time. Backends are dumb document stores;
//! owner filtering, validation and access rules live in the domain services.

pub mod dynamo;
pub mod memory;
mod subscription;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;
pub use subscription::{SnapshotSender, Subscription};

/// Field map of a stored document, without its id.
pub type Fields = serde_json::Map<String, Value>;

/// A stored document: the store-assigned id plus its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Full, ordered point-in-time result of a subscribed query.
pub type Snapshot = Vec<Document>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Eq { field, value } => doc.get(field) == Some(value),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("malformed document {id}: {message}")]
    Malformed { id: String, message: String },

    #[error("backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }
}

/// Remote document store shared by every view of the process.
///
/// Implementations must deliver the snapshots of one subscription in commit
/// order, each one total for the query.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a standing query over the whole collection. The first item is
    /// the current result; every committed change pushes a fresh one.
    async fn subscribe(&self, collection: &str, order: OrderBy)
        -> Result<Subscription, StoreError>;

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Inserts a new document and returns the id the store assigned to it.
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Merges `fields` into an existing document. Missing documents fail
    /// with [`StoreError::NotFound`].
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Removes a document. Deleting an absent id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self.query(collection, &[], None).await?.len())
    }
}

/// Applies filters and ordering in process. Shared by every backend so
/// they agree on tie-breaking and mixed-type comparisons.
pub fn evaluate_query(
    docs: impl IntoIterator<Item = Document>,
    filters: &[Filter],
    order: Option<&OrderBy>,
) -> Vec<Document> {
    let mut out: Vec<Document> = docs
        .into_iter()
        .filter(|doc| filters.iter().all(|f| f.matches(doc)))
        .collect();

    if let Some(order) = order {
        out.sort_by(|a, b| {
            let ord = compare_values(a.get(&order.field), b.get(&order.field))
                .then_with(|| a.id.cmp(&b.id));
            match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }

    out
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or_default();
                let y = y.as_f64().unwrap_or_default();
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
