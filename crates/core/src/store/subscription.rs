//! Live query subscriptions.
//!
//! A [`Subscription`] keeps a local mirror of the documents matching a query
//! and turns the store-wide change feed into per-query [`Snapshot`]s.
//!
//! The first snapshot (and the first one after the subscriber fell behind the
//! broadcast channel) is *initial*: it carries every matching document as an
//! `Added` change. Later snapshots carry only the changes since the previous
//! one. A document modified so that it no longer matches is reported as
//! `Removed`; one modified into the query is reported as `Added`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use super::{ChangeKind, Document, DocumentChange, DocumentStore, Query, StoreResult};

/// State of a query result at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Collection the query runs against.
    pub collection: String,
    /// Whether this snapshot re-lists the whole result set.
    pub is_initial: bool,
    /// All matching documents, ordered and limited by the query.
    pub documents: Vec<Document>,
    /// Changes since the previous snapshot.
    pub changes: Vec<DocumentChange>,
}

/// A live query over one collection.
pub struct Subscription {
    store: Arc<dyn DocumentStore>,
    collection: String,
    query: Query,
    receiver: broadcast::Receiver<DocumentChange>,
    mirror: HashMap<String, Document>,
    /// Every change at or below this sequence number is already mirrored.
    watermark: u64,
    needs_sync: bool,
}

/// Start a live query.
///
/// The change feed is joined before the first read, so no write between the
/// initial listing and the first incremental snapshot is lost.
pub fn subscribe(
    store: Arc<dyn DocumentStore>,
    collection: impl Into<String>,
    query: Query,
) -> Subscription {
    let receiver = store.changes();
    Subscription {
        store,
        collection: collection.into(),
        query,
        receiver,
        mirror: HashMap::new(),
        watermark: 0,
        needs_sync: true,
    }
}

impl Subscription {
    /// Collection this subscription watches.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `Ok(None)` once the store's change feed has shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if re-listing the collection fails.
    pub async fn next(&mut self) -> StoreResult<Option<Snapshot>> {
        loop {
            if self.needs_sync {
                return self.resync().await.map(Some);
            }

            match self.receiver.recv().await {
                Ok(change) => {
                    if let Some(change) = self.apply(change) {
                        return Ok(Some(self.snapshot(false, vec![change])));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        collection = %self.collection,
                        skipped,
                        "Subscription fell behind the change feed, re-listing"
                    );
                    self.needs_sync = true;
                }
                Err(RecvError::Closed) => return Ok(None),
            }
        }
    }

    async fn resync(&mut self) -> StoreResult<Snapshot> {
        let watermark = self.store.current_seq().await?;
        let documents = self
            .store
            .query(&self.collection, &self.query.filters_only())
            .await?;

        debug!(
            collection = %self.collection,
            count = documents.len(),
            watermark,
            "Subscription listed collection"
        );

        let changes = documents
            .iter()
            .map(|document| DocumentChange {
                collection: self.collection.clone(),
                kind: ChangeKind::Added,
                seq: document.seq,
                document: document.clone(),
            })
            .collect();

        self.mirror = documents
            .into_iter()
            .map(|document| (document.id.clone(), document))
            .collect();
        self.watermark = watermark;
        self.needs_sync = false;

        Ok(self.snapshot(true, changes))
    }

    /// Fold one raw change into the mirror, returning what the query saw.
    fn apply(&mut self, change: DocumentChange) -> Option<DocumentChange> {
        if change.collection != self.collection || change.seq <= self.watermark {
            return None;
        }

        let id = change.document.id.clone();
        let known_seq = self.mirror.get(&id).map(|document| document.seq);
        if known_seq.is_some_and(|seq| seq >= change.seq) {
            return None;
        }

        match change.kind {
            ChangeKind::Added | ChangeKind::Modified => {
                if self.query.matches(&change.document) {
                    self.mirror.insert(id, change.document.clone());
                    let kind = if known_seq.is_some() {
                        ChangeKind::Modified
                    } else {
                        ChangeKind::Added
                    };
                    Some(DocumentChange { kind, ..change })
                } else if self.mirror.remove(&id).is_some() {
                    Some(DocumentChange {
                        kind: ChangeKind::Removed,
                        ..change
                    })
                } else {
                    None
                }
            }
            ChangeKind::Removed => self.mirror.remove(&id).map(|_| change),
        }
    }

    fn snapshot(&self, is_initial: bool, changes: Vec<DocumentChange>) -> Snapshot {
        let mut documents: Vec<Document> = self.mirror.values().cloned().collect();
        self.query.sort_and_limit(&mut documents);
        Snapshot {
            collection: self.collection.clone(),
            is_initial,
            documents,
            changes,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Updates, memory::CHANGE_CHANNEL_CAPACITY};
    use serde_json::json;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_initial_snapshot_lists_matching_documents() {
        let store = store();
        store.set("products", "p1", json!({ "approved": true })).await.unwrap();
        store.set("products", "p2", json!({ "approved": false })).await.unwrap();

        let mut sub = subscribe(
            store.clone(),
            "products",
            Query::new().where_eq("approved", json!(true)),
        );
        let snapshot = sub.next().await.unwrap().unwrap();

        assert!(snapshot.is_initial);
        assert_eq!(snapshot.documents.len(), 1);
        assert_eq!(snapshot.changes.len(), 1);
        assert_eq!(snapshot.changes[0].kind, ChangeKind::Added);
    }

    #[tokio::test]
    async fn test_incremental_changes() {
        let store = store();
        let mut sub = subscribe(store.clone(), "inventory", Query::new());
        assert!(sub.next().await.unwrap().unwrap().documents.is_empty());

        store.set("inventory", "RACIN0001", json!({ "stock": 3 })).await.unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert!(!snapshot.is_initial);
        assert_eq!(snapshot.changes[0].kind, ChangeKind::Added);

        store
            .update("inventory", "RACIN0001", Updates::new().set("stock", json!(2)))
            .await
            .unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.changes[0].kind, ChangeKind::Modified);
        assert_eq!(snapshot.documents[0].i64_field("stock"), Some(2));

        store.delete("inventory", "RACIN0001").await.unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.changes[0].kind, ChangeKind::Removed);
        assert!(snapshot.documents.is_empty());
    }

    #[tokio::test]
    async fn test_leaving_query_reports_removed() {
        let store = store();
        store.set("products", "p1", json!({ "approved": true })).await.unwrap();
        let mut sub = subscribe(
            store.clone(),
            "products",
            Query::new().where_eq("approved", json!(true)),
        );
        sub.next().await.unwrap();

        store
            .update("products", "p1", Updates::new().set("approved", json!(false)))
            .await
            .unwrap();
        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.changes[0].kind, ChangeKind::Removed);
        assert!(snapshot.documents.is_empty());
    }

    #[tokio::test]
    async fn test_other_collections_are_ignored() {
        let store = store();
        let mut sub = subscribe(store.clone(), "checkouts", Query::new());
        sub.next().await.unwrap();

        store.set("customers", "c1", json!({})).await.unwrap();
        store.set("checkouts", "o1", json!({})).await.unwrap();

        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.changes.len(), 1);
        assert_eq!(snapshot.changes[0].document.id, "o1");
    }

    #[tokio::test]
    async fn test_lagging_subscriber_relists() {
        let store = store();
        let mut sub = subscribe(store.clone(), "notifications", Query::new());

        let total = CHANGE_CHANNEL_CAPACITY + 10;
        for i in 0..total {
            store
                .set("notifications", &format!("n{i:05}"), json!({}))
                .await
                .unwrap();
        }

        let first = sub.next().await.unwrap().unwrap();
        assert!(first.is_initial);
        assert_eq!(first.documents.len(), total);

        // The backlog overflowed the channel, so the next read re-lists
        let second = sub.next().await.unwrap().unwrap();
        assert!(second.is_initial);
        assert_eq!(second.documents.len(), total);
    }
}
