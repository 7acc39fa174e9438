use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::store::{Document, Fields, StoreError};

/// Sort key shared by every collection of the board.
pub const CREATED_AT: &str = "created_at";

/// A typed view of one stored document. Everything except `id` is a field.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let mut fields = doc.fields.clone();
        fields.insert("id".to_string(), Value::String(doc.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| StoreError::Malformed {
            id: doc.id.clone(),
            message: e.to_string(),
        })
    }

    fn to_fields(&self) -> Fields {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut fields)) => {
                fields.remove("id");
                fields
            }
            _ => Fields::new(),
        }
    }
}

/// Decodes a snapshot, dropping documents that do not fit the record shape.
pub fn decode_all<T: Record>(docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match T::from_document(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping {} document: {}", T::COLLECTION, e);
                None
            }
        })
        .collect()
}

/// Current time at the precision timestamps are persisted with.
pub fn timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
