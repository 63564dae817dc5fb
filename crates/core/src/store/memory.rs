//! In-memory document store.
//!
//! Thread-safe storage using `RwLock<HashMap>` plus a broadcast channel for
//! the change feed. Data is lost on restart; use `PgStore` in production.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{
    ChangeKind, Document, DocumentChange, DocumentStore, Query, StoreError, StoreResult, Updates,
    ensure_object, strip_id,
};

/// Capacity of the live change broadcast channel.
pub const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Number of changes retained for [`DocumentStore::changes_since`].
pub const CHANGE_LOG_CAPACITY: usize = 10_000;

type Collections = HashMap<String, BTreeMap<String, Document>>;

struct State {
    collections: Collections,
    seq: u64,
}

/// In-memory document store.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rentacam_core::store::{DocumentStore, MemoryStore};
///
/// let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
/// ```
pub struct MemoryStore {
    state: RwLock<State>,
    log: Mutex<VecDeque<DocumentChange>>,
    sender: broadcast::Sender<DocumentChange>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(State {
                collections: HashMap::new(),
                seq: 0,
            }),
            log: Mutex::new(VecDeque::new()),
            sender,
        }
    }

    /// Record a change in the log and publish it to live subscribers.
    ///
    /// Callers hold the state write lock so the feed and the log see
    /// changes in seq order.
    fn publish(&self, change: DocumentChange) {
        {
            let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
            if log.len() == CHANGE_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(change.clone());
        }
        // No receivers is fine; the change is still in the log
        let _ = self.sender.send(change);
    }

    /// Write a document body under the state lock, returning the change.
    fn write(state: &mut State, collection: &str, id: &str, data: Value) -> DocumentChange {
        state.seq += 1;
        let document = Document {
            id: id.to_owned(),
            seq: state.seq,
            data,
        };
        let previous = state
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), document.clone());

        DocumentChange {
            collection: collection.to_owned(),
            kind: if previous.is_some() {
                ChangeKind::Modified
            } else {
                ChangeKind::Added
            },
            seq: document.seq,
            document,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> StoreResult<Document> {
        ensure_object(&data)?;
        let data = strip_id(data);

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state
            .collections
            .get(collection)
            .is_some_and(|docs| docs.contains_key(id))
        {
            return Err(StoreError::AlreadyExists {
                collection: collection.to_owned(),
                id: id.to_owned(),
            });
        }
        let change = Self::write(&mut state, collection, id, data);
        let document = change.document.clone();
        self.publish(change);
        drop(state);
        Ok(document)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<Document> {
        ensure_object(&data)?;
        let data = strip_id(data);

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let change = Self::write(&mut state, collection, id, data);
        let document = change.document.clone();
        self.publish(change);
        drop(state);
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Updates,
    ) -> StoreResult<Document> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let data = strip_id(updates.apply(&current.data)?);
        let change = Self::write(&mut state, collection, id, data);
        let document = change.document.clone();
        self.publish(change);
        drop(state);
        Ok(document)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(mut document) = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
        else {
            return Ok(false);
        };
        state.seq += 1;
        document.seq = state.seq;
        self.publish(DocumentChange {
            collection: collection.to_owned(),
            kind: ChangeKind::Removed,
            seq: state.seq,
            document,
        });
        drop(state);
        Ok(true)
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let documents = state
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(query.apply(documents))
    }

    fn changes(&self) -> broadcast::Receiver<DocumentChange> {
        self.sender.subscribe()
    }

    async fn changes_since(
        &self,
        collection: &str,
        after: u64,
    ) -> StoreResult<Vec<DocumentChange>> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(log
            .iter()
            .filter(|change| change.collection == collection && change.seq > after)
            .cloned()
            .collect())
    }

    async fn current_seq(&self) -> StoreResult<u64> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.seq)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::store::Direction;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = MemoryStore::new();
        store
            .set("products", "p1", json!({ "name": "A7 IV", "id": "ignored" }))
            .await
            .unwrap();

        let doc = store.get("products", "p1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({ "name": "A7 IV" }));
        assert_eq!(doc.seq, 1);
    }

    #[tokio::test]
    async fn test_set_rejects_non_object() {
        let store = MemoryStore::new();
        let result = store.set("products", "p1", json!([1, 2])).await;
        assert!(matches!(result, Err(StoreError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryStore::new();
        let result = store
            .update("inventory", "RACIN0001", Updates::new().set("stock", json!(1)))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_never_overwrites() {
        let store = MemoryStore::new();
        store
            .create("inventory", "RACIN0001", json!({ "name": "first" }))
            .await
            .unwrap();
        let result = store
            .create("inventory", "RACIN0001", json!({ "name": "second" }))
            .await;
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));

        let doc = store.get("inventory", "RACIN0001").await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "first");
        assert_eq!(store.current_seq().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set("customers", "c1", json!({})).await.unwrap();
        assert!(store.delete("customers", "c1").await.unwrap());
        assert!(!store.delete("customers", "c1").await.unwrap());
        assert!(store.get("customers", "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_generates_unique_ids() {
        let store = MemoryStore::new();
        let a = store.add("notifications", json!({})).await.unwrap();
        let b = store.add("notifications", json!({})).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list("notifications").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_change_feed_and_log() {
        let store = MemoryStore::new();
        let mut rx = store.changes();

        store.set("inventory", "RACIN0001", json!({ "stock": 2 })).await.unwrap();
        store
            .update("inventory", "RACIN0001", Updates::new().set("stock", json!(1)))
            .await
            .unwrap();
        store.delete("inventory", "RACIN0001").await.unwrap();

        let kinds: Vec<ChangeKind> = vec![
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
            rx.recv().await.unwrap().kind,
        ];
        assert_eq!(
            kinds,
            vec![ChangeKind::Added, ChangeKind::Modified, ChangeKind::Removed]
        );

        let since = store.changes_since("inventory", 1).await.unwrap();
        assert_eq!(since.len(), 2);
        assert_eq!(since[0].seq, 2);
        assert_eq!(store.current_seq().await.unwrap(), 3);
        assert!(store.changes_since("products", 0).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_publish_in_seq_order() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut rx = store.changes();

        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move {
                    for n in 0..100 {
                        store
                            .set("checkouts", &format!("o{writer}-{n}"), json!({ "n": n }))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let mut last = 0;
        for _ in 0..800 {
            let change = rx.recv().await.unwrap();
            assert!(change.seq > last, "seq {} after {last}", change.seq);
            last = change.seq;
        }
        let logged: Vec<u64> = store
            .changes_since("checkouts", 0)
            .await
            .unwrap()
            .iter()
            .map(|change| change.seq)
            .collect();
        assert!(logged.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_query_orders_and_limits() {
        let store = MemoryStore::new();
        for id in ["RACIN0002", "RACIN0010", "RACIN0001"] {
            store.set("inventory", id, json!({ "stock": 1 })).await.unwrap();
        }
        let top = store
            .query(
                "inventory",
                &Query::new().order_by("id", Direction::Descending).limit(1),
            )
            .await
            .unwrap();
        assert_eq!(top[0].id, "RACIN0010");
    }
}
