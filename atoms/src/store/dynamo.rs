//! DynamoDB-backed document store.
//!
//! Single-table layout:
//!
//! | Attribute | Value                   |
//! |-----------|-------------------------|
//! | `PK`      | `COLLECTION#<name>`     |
//! | `SK`      | `DOC#<id>`              |
//! | *fields*  | native attribute values |
//!
//! DynamoDB has no push channel for arbitrary queries, so subscriptions are
//! served by a polling task that emits a snapshot whenever the result of the
//! query changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use serde_json::{Number, Value};

use super::{
    evaluate_query, Document, DocumentStore, Fields, Filter, OrderBy, StoreError, Subscription,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: DynamoClient,
    table_name: Arc<str>,
    poll_interval: Duration,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: Arc::from(table_name.into()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Reads every document of a collection, following pagination.
    async fn load_collection(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut docs = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let mut query = self
                .client
                .query()
                .table_name(self.table_name.as_ref())
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(make_pk(collection)))
                .expression_attribute_values(":sk_prefix", AttributeValue::S("DOC#".to_string()));

            if let Some(start_key) = exclusive_start_key.take() {
                query = query.set_exclusive_start_key(Some(start_key));
            }

            let output = query
                .send()
                .await
                .map_err(|e| map_sdk_error(e, collection))?;

            for item in output.items() {
                if let Some(doc) = item_to_document(item) {
                    docs.push(doc);
                }
            }

            match output.last_evaluated_key() {
                Some(last_key) if !last_key.is_empty() => {
                    exclusive_start_key = Some(last_key.clone());
                }
                _ => break,
            }
        }

        Ok(docs)
    }
}

fn make_pk(collection: &str) -> String {
    format!("COLLECTION#{}", collection)
}

fn make_sk(id: &str) -> String {
    format!("DOC#{}", id)
}

fn map_sdk_error(err: impl std::error::Error + Send + Sync + 'static, target: &str) -> StoreError {
    StoreError::Backend {
        message: format!("DynamoDB error for {}: {}", target, err),
        source: Some(Box::new(err)),
    }
}

pub fn value_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(value_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_attribute(v)))
                .collect(),
        ),
    }
}

pub fn attribute_to_value(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => n
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| n.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number))
            .unwrap_or(Value::Null),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.iter().map(attribute_to_value).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), attribute_to_value(v)))
                .collect(),
        ),
        // Sets and binary attributes are never written by this store.
        _ => Value::Null,
    }
}

fn item_to_document(item: &HashMap<String, AttributeValue>) -> Option<Document> {
    let sk = item.get("SK").and_then(|v| v.as_s().ok())?;
    let id = sk.strip_prefix("DOC#")?;
    let fields: Fields = item
        .iter()
        .filter(|(k, _)| k.as_str() != "PK" && k.as_str() != "SK")
        .map(|(k, v)| (k.clone(), attribute_to_value(v)))
        .collect();
    Some(Document::new(id, fields))
}

#[async_trait]
impl DocumentStore for DynamoStore {
    async fn subscribe(
        &self,
        collection: &str,
        order: OrderBy,
    ) -> Result<Subscription, StoreError> {
        // The first read happens inline so a broken table fails the call
        // instead of the stream.
        let initial = evaluate_query(self.load_collection(collection).await?, &[], Some(&order));
        let (tx, subscription) = Subscription::channel();
        let _ = tx.send(Ok(initial.clone()));

        let store = self.clone();
        let collection = collection.to_string();
        let producer = tokio::spawn(async move {
            let mut last = initial;
            let mut ticker = tokio::time::interval(store.poll_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                match store.load_collection(&collection).await {
                    Ok(docs) => {
                        let snapshot = evaluate_query(docs, &[], Some(&order));
                        if snapshot != last {
                            if tx.send(Ok(snapshot.clone())).is_err() {
                                break;
                            }
                            last = snapshot;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Snapshot poll failed for {}: {}", collection, e);
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
            tracing::info!("Snapshot polling stopped for {}", collection);
        });

        Ok(subscription.with_producer(producer))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.load_collection(collection).await?;
        Ok(evaluate_query(docs, filters, order.as_ref()))
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();

        let mut builder = self
            .client
            .put_item()
            .table_name(self.table_name.as_ref())
            .item("PK", AttributeValue::S(make_pk(collection)))
            .item("SK", AttributeValue::S(make_sk(&id)));
        for (k, v) in &fields {
            builder = builder.item(k.clone(), value_to_attribute(v));
        }

        builder
            .send()
            .await
            .map_err(|e| map_sdk_error(e, collection))?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut update_expr = vec![];
        let mut expr_names = HashMap::new();
        let mut expr_values = HashMap::new();

        for (i, (k, v)) in fields.iter().enumerate() {
            update_expr.push(format!("#f{i} = :v{i}"));
            expr_names.insert(format!("#f{i}"), k.clone());
            expr_values.insert(format!(":v{i}"), value_to_attribute(v));
        }

        let mut builder = self
            .client
            .update_item()
            .table_name(self.table_name.as_ref())
            .key("PK", AttributeValue::S(make_pk(collection)))
            .key("SK", AttributeValue::S(make_sk(id)))
            .update_expression(format!("SET {}", update_expr.join(", ")))
            .condition_expression("attribute_exists(PK)");

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        match builder.send().await {
            Ok(_) => Ok(()),
            Err(sdk_err) => {
                if let Some(service_err) = sdk_err.as_service_error() {
                    if service_err.is_conditional_check_failed_exception() {
                        return Err(StoreError::NotFound {
                            collection: collection.to_string(),
                            id: id.to_string(),
                        });
                    }
                }
                Err(map_sdk_error(sdk_err, id))
            }
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(self.table_name.as_ref())
            .key("PK", AttributeValue::S(make_pk(collection)))
            .key("SK", AttributeValue::S(make_sk(id)))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, id))?;
        Ok(())
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(self.table_name.as_ref())
            .key("PK", AttributeValue::S(make_pk(collection)))
            .key("SK", AttributeValue::S(make_sk(id)))
            .send()
            .await
            .map_err(|e| map_sdk_error(e, id))?;

        Ok(result.item().and_then(item_to_document))
    }
}
