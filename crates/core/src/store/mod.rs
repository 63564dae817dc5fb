//! Document store abstraction.
//!
//! Every piece of application data lives in schemaless JSON documents grouped
//! into named collections. Services talk to the [`DocumentStore`] trait and
//! run unchanged against either backend:
//!
//! - [`MemoryStore`] - in-process, used for development and tests
//! - `PgStore` - `PostgreSQL` JSONB tables (requires the `postgres` feature)
//!
//! # Change feed
//!
//! Every write is assigned a store-wide, strictly increasing sequence number
//! and published as a [`DocumentChange`]. Live consumers use [`subscribe`]
//! to receive [`Snapshot`]s; durable consumers persist the last processed
//! sequence number and catch up with [`DocumentStore::changes_since`].

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod query;
pub mod subscription;
pub mod update;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use query::{Direction, Filter, FilterOp, Query};
pub use subscription::{Snapshot, Subscription, subscribe};
pub use update::{FieldUpdate, Updates};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Requested document id.
        id: String,
    },

    /// A create targeted an id that is already taken.
    #[error("document already exists: {collection}/{id}")]
    AlreadyExists {
        /// Collection written to.
        collection: String,
        /// Id that was taken.
        id: String,
    },

    /// A document could not be converted to or from its typed model.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document data is not a JSON object or an update path is invalid.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Database error from sqlx.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Build a `NotFound` error for a collection/id pair.
    #[must_use]
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_owned(),
            id: id.to_owned(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A stored document.
///
/// `data` never contains the `id` key; [`Document::decode`] injects it so
/// typed models can carry their id as a regular field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Sequence number of the last write to this document.
    pub seq: u64,
    /// Document body (always a JSON object).
    pub data: Value,
}

impl Document {
    /// Decode the document into a typed model, exposing `id` as a field.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the data does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let mut data = self.data.clone();
        if let Value::Object(map) = &mut data {
            map.insert("id".to_owned(), Value::String(self.id.clone()));
        }
        Ok(serde_json::from_value(data)?)
    }

    /// Look up a field by dot-separated path (`address.city`).
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Value> {
        query::lookup(&self.data, path)
    }

    /// Integer value of a field, if present and numeric.
    #[must_use]
    pub fn i64_field(&self, path: &str) -> Option<i64> {
        self.field(path).and_then(Value::as_i64)
    }

    /// String value of a field, if present.
    #[must_use]
    pub fn str_field(&self, path: &str) -> Option<&str> {
        self.field(path).and_then(Value::as_str)
    }
}

/// Serialize a typed model into document data, dropping its `id` field.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the value cannot be serialized and
/// `StoreError::InvalidDocument` if it does not serialize to a JSON object.
pub fn encode<T: Serialize>(value: &T) -> StoreResult<Value> {
    let mut data = serde_json::to_value(value)?;
    match &mut data {
        Value::Object(map) => {
            map.remove("id");
        }
        other => {
            return Err(StoreError::InvalidDocument(format!(
                "expected an object, got {other}"
            )));
        }
    }
    Ok(data)
}

/// Decode a list of documents, failing on the first malformed one.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if any document does not match `T`.
pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> StoreResult<Vec<T>> {
    documents.iter().map(Document::decode).collect()
}

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl ChangeKind {
    /// Stable string form used in the `PostgreSQL` change log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(Self::Added),
            "modified" => Ok(Self::Modified),
            "removed" => Ok(Self::Removed),
            other => Err(StoreError::InvalidDocument(format!(
                "unknown change kind: {other}"
            ))),
        }
    }
}

/// A single write, as published on the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
    /// Collection the document belongs to.
    pub collection: String,
    /// Kind of write.
    pub kind: ChangeKind,
    /// Store-wide sequence number of this write.
    pub seq: u64,
    /// Document after the write (last known state for removals).
    pub document: Document,
}

/// A collection/document database with a change feed.
///
/// Writes to a single document are atomic; there are no multi-document
/// transactions. Concurrent read-modify-write cycles issued by callers are
/// last-writer-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Create a document under `id`, failing with
    /// `StoreError::AlreadyExists` instead of overwriting.
    async fn create(&self, collection: &str, id: &str, data: Value) -> StoreResult<Document>;

    /// Create or overwrite a document.
    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<Document>;

    /// Apply field updates to an existing document atomically.
    ///
    /// Fails with `StoreError::NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, updates: Updates)
    -> StoreResult<Document>;

    /// Hard-delete a document. Returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Run a query against a collection.
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    /// Subscribe to the raw change feed of every collection.
    fn changes(&self) -> broadcast::Receiver<DocumentChange>;

    /// Changes to `collection` with a sequence number greater than `after`,
    /// oldest first.
    async fn changes_since(&self, collection: &str, after: u64)
    -> StoreResult<Vec<DocumentChange>>;

    /// Highest sequence number assigned so far (0 for an empty store).
    async fn current_seq(&self) -> StoreResult<u64>;

    /// Create a document with an auto-generated id.
    async fn add(&self, collection: &str, data: Value) -> StoreResult<Document> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set(collection, &id, data).await
    }

    /// Fetch every document in a collection.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.query(collection, &Query::new()).await
    }
}

/// A store shared between services and background tasks.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Ensure document data is a JSON object.
pub(crate) fn ensure_object(data: &Value) -> StoreResult<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(format!(
            "document data must be an object, got {data}"
        )))
    }
}

/// Remove the `id` key from document data if a caller included it.
pub(crate) fn strip_id(mut data: Value) -> Value {
    if let Value::Object(map) = &mut data {
        map.remove("id");
    }
    data
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Lens {
        id: String,
        name: String,
    }

    #[test]
    fn test_decode_injects_id() {
        let doc = Document {
            id: "lens-1".to_owned(),
            seq: 3,
            data: json!({ "name": "50mm f/1.8" }),
        };
        let lens: Lens = doc.decode().unwrap();
        assert_eq!(lens.id, "lens-1");
        assert_eq!(lens.name, "50mm f/1.8");
    }

    #[test]
    fn test_encode_strips_id() {
        let lens = Lens {
            id: "lens-1".to_owned(),
            name: "85mm".to_owned(),
        };
        let data = encode(&lens).unwrap();
        assert_eq!(data, json!({ "name": "85mm" }));
    }

    #[test]
    fn test_encode_rejects_non_objects() {
        assert!(matches!(
            encode(&42),
            Err(StoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_field_lookup() {
        let doc = Document {
            id: "c1".to_owned(),
            seq: 1,
            data: json!({ "address": { "city": "Lisbon" }, "stock": 4 }),
        };
        assert_eq!(doc.str_field("address.city"), Some("Lisbon"));
        assert_eq!(doc.i64_field("stock"), Some(4));
        assert_eq!(doc.field("address.zip"), None);
    }

    #[test]
    fn test_change_kind_parse() {
        assert_eq!("removed".parse::<ChangeKind>().unwrap(), ChangeKind::Removed);
        assert!("upserted".parse::<ChangeKind>().is_err());
    }
}
