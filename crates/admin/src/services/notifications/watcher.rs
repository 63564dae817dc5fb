//! Background tasks turning collection changes into notifications.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use rentacam_core::models::settings::DEFAULT_LOW_STOCK_THRESHOLD;
use rentacam_core::models::{Notification, collections, load_business_settings};
use rentacam_core::store::{Query, SharedStore, StoreResult, Subscription, encode, subscribe};
use rentacam_core::NotificationId;

use super::tracker::{NotificationDraft, NotificationTracker, WatchState};

/// Collections that raise notifications.
pub const WATCHED_COLLECTIONS: [&str; 3] = [
    collections::CHECKOUTS,
    collections::PRODUCTS,
    collections::CUSTOMERS,
];

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// `notificationCursors/{collection}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorDocument {
    seq: u64,
    updated_at: DateTime<Utc>,
}

/// Start one watcher per watched collection.
#[must_use]
pub fn spawn_watchers(store: &SharedStore) -> Vec<JoinHandle<()>> {
    WATCHED_COLLECTIONS
        .into_iter()
        .map(|collection| tokio::spawn(NotificationWatcher::new(store.clone(), collection).run()))
        .collect()
}

pub struct NotificationWatcher {
    store: SharedStore,
    collection: &'static str,
}

impl NotificationWatcher {
    #[must_use]
    pub const fn new(store: SharedStore, collection: &'static str) -> Self {
        Self { store, collection }
    }

    /// Follow the collection until the store's change feed closes.
    #[tracing::instrument(skip(self), fields(collection = self.collection))]
    pub async fn run(self) {
        // Everything up to here is covered by the first snapshot.
        let floor = match self.store.current_seq().await {
            Ok(seq) => seq,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read the store sequence");
                0
            }
        };
        // Joined before restoring so nothing written meanwhile is missed.
        let mut subscription = subscribe(self.store.clone(), self.collection, Query::new());

        let mut tracker = loop {
            match self.restore().await {
                Ok(tracker) => break tracker,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not restore notification cursor, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        };

        self.follow(&mut subscription, &mut tracker, floor).await;
        tracing::info!("Notification watcher stopped");
    }

    async fn follow(
        &self,
        subscription: &mut Subscription,
        tracker: &mut NotificationTracker,
        floor: u64,
    ) {
        loop {
            let snapshot = match subscription.next().await {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "Notification subscription failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            if let Ok(settings) = load_business_settings(&*self.store).await {
                tracker.set_low_stock_threshold(settings.low_stock_threshold);
            }

            let initializing = tracker.state() == WatchState::Initializing;
            let before = tracker.cursor();
            let drafts = tracker.on_snapshot(&snapshot);
            self.publish(drafts).await;
            // A first run always leaves a cursor behind, even over an empty
            // collection, so the next start resumes instead of initializing.
            if initializing {
                tracker.advance_cursor(floor);
            }
            if initializing || tracker.cursor() != before {
                self.save_cursor(tracker.cursor()).await;
            }
        }
    }

    /// Build the tracker from the persisted cursor, publishing whatever was
    /// missed since it was written.
    async fn restore(&self) -> StoreResult<NotificationTracker> {
        let threshold = load_business_settings(&*self.store)
            .await
            .map_or(DEFAULT_LOW_STOCK_THRESHOLD, |settings| settings.low_stock_threshold);

        let Some(cursor) = self.load_cursor().await? else {
            tracing::info!("No notification cursor, starting fresh");
            return Ok(NotificationTracker::new(self.collection, threshold));
        };

        let listed = self.store.list(self.collection).await?;
        let replay = self.store.changes_since(self.collection, cursor).await?;
        let (tracker, drafts) =
            NotificationTracker::resume(self.collection, threshold, cursor, &listed, &replay);

        tracing::info!(
            cursor,
            replayed = replay.len(),
            missed = drafts.len(),
            "Notification watcher resumed"
        );
        self.publish(drafts).await;
        if tracker.cursor() != cursor {
            self.save_cursor(tracker.cursor()).await;
        }
        Ok(tracker)
    }

    async fn load_cursor(&self) -> StoreResult<Option<u64>> {
        let Some(document) = self
            .store
            .get(collections::NOTIFICATION_CURSORS, self.collection)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(document.decode::<CursorDocument>()?.seq))
    }

    async fn save_cursor(&self, seq: u64) {
        let cursor = CursorDocument {
            seq,
            updated_at: Utc::now(),
        };
        let result = match encode(&cursor) {
            Ok(data) => {
                self.store
                    .set(collections::NOTIFICATION_CURSORS, self.collection, data)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(seq, error = %e, "Failed to persist notification cursor");
        }
    }

    async fn publish(&self, drafts: Vec<NotificationDraft>) {
        for draft in drafts {
            let notification = Notification {
                id: NotificationId::new(""),
                kind: draft.kind,
                title: draft.title,
                message: draft.message,
                is_read: false,
                created_at: Utc::now(),
                order_id: draft.order_id,
                data: draft.data,
            };
            let written = match encode(&notification) {
                Ok(data) => self.store.add(collections::NOTIFICATIONS, data).await,
                Err(e) => Err(e),
            };
            match written {
                Ok(document) => {
                    tracing::info!(id = %document.id, kind = ?notification.kind, "Notification raised");
                }
                Err(e) => {
                    let event_id = sentry::capture_error(&e);
                    tracing::error!(error = %e, sentry_event_id = %event_id, "Failed to write notification");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use rentacam_core::NotificationType;
    use rentacam_core::store::MemoryStore;

    async fn wait_for<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !check().await {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    async fn cursor(store: &SharedStore) -> u64 {
        store
            .get(collections::NOTIFICATION_CURSORS, collections::CUSTOMERS)
            .await
            .unwrap()
            .and_then(|doc| doc.i64_field("seq"))
            .map_or(0, |seq| u64::try_from(seq).unwrap())
    }

    async fn notifications(store: &SharedStore) -> Vec<Notification> {
        let documents = store.list(collections::NOTIFICATIONS).await.unwrap();
        rentacam_core::store::decode_all(&documents).unwrap()
    }

    async fn add_customer(store: &SharedStore, id: &str) -> u64 {
        store
            .set(
                collections::CUSTOMERS,
                id,
                json!({ "firebaseUid": id, "fullName": id, "email": format!("{id}@example.com") }),
            )
            .await
            .unwrap()
            .seq
    }

    #[tokio::test]
    async fn test_first_run_over_empty_collection_leaves_a_cursor() {
        let store: SharedStore = Arc::new(MemoryStore::new());

        let watcher = tokio::spawn(
            NotificationWatcher::new(store.clone(), collections::CUSTOMERS).run(),
        );
        wait_for(|| async {
            store
                .get(collections::NOTIFICATION_CURSORS, collections::CUSTOMERS)
                .await
                .unwrap()
                .is_some()
        })
        .await;
        watcher.abort();
        let _ = watcher.await;

        // Signed up while no watcher runs.
        let seq = add_customer(&store, "c1").await;

        let watcher = tokio::spawn(
            NotificationWatcher::new(store.clone(), collections::CUSTOMERS).run(),
        );
        wait_for(|| async { cursor(&store).await >= seq }).await;

        let raised = notifications(&store).await;
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].kind, NotificationType::NewCustomer);
        watcher.abort();
    }

    #[tokio::test]
    async fn test_restart_neither_drops_nor_duplicates() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        for id in ["c1", "c2", "c3"] {
            add_customer(&store, id).await;
        }

        let watcher = tokio::spawn(
            NotificationWatcher::new(store.clone(), collections::CUSTOMERS).run(),
        );
        // The first run only records what exists.
        let existing = store.current_seq().await.unwrap();
        wait_for(|| async { cursor(&store).await >= existing }).await;
        assert!(notifications(&store).await.is_empty());

        let seq = add_customer(&store, "c4").await;
        wait_for(|| async { cursor(&store).await >= seq }).await;
        assert_eq!(notifications(&store).await.len(), 1);

        watcher.abort();
        let _ = watcher.await;

        // Written while no watcher runs.
        let seq = add_customer(&store, "c5").await;

        let watcher = tokio::spawn(
            NotificationWatcher::new(store.clone(), collections::CUSTOMERS).run(),
        );
        wait_for(|| async { cursor(&store).await >= seq }).await;

        let raised = notifications(&store).await;
        assert_eq!(raised.len(), 2);
        assert!(raised.iter().all(|n| n.kind == NotificationType::NewCustomer));
        assert!(raised.iter().any(|n| n.message.starts_with("c5")));
        watcher.abort();
    }
}
