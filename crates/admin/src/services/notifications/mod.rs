//! Back-office notifications: raising them from collection changes and
//! managing the list staff see.

mod tracker;
mod watcher;

pub use tracker::{NotificationDraft, NotificationTracker, WatchState};
pub use watcher::{NotificationWatcher, WATCHED_COLLECTIONS, spawn_watchers};

use serde::Deserialize;
use serde_json::json;

use rentacam_core::NotificationId;
use rentacam_core::models::{Notification, collections};
use rentacam_core::store::{Direction, Query, SharedStore, Updates, decode_all};

use crate::error::Result;

/// Query string of the notification list.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
}

pub struct NotificationService<'a> {
    store: &'a SharedStore,
}

impl<'a> NotificationService<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedStore) -> Self {
        Self { store }
    }

    /// Notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list(&self, filter: NotificationFilter) -> Result<Vec<Notification>> {
        let mut query = Query::new().order_by("createdAt", Direction::Descending);
        if filter.unread_only {
            query = query.where_eq("isRead", json!(false));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        let documents = self.store.query(collections::NOTIFICATIONS, &query).await?;
        Ok(decode_all(&documents)?)
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn unread_count(&self) -> Result<usize> {
        let documents = self
            .store
            .query(
                collections::NOTIFICATIONS,
                &Query::new().where_eq("isRead", json!(false)),
            )
            .await?;
        Ok(documents.len())
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the notification does not exist.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn mark_read(&self, id: &NotificationId) -> Result<Notification> {
        let document = self
            .store
            .update(
                collections::NOTIFICATIONS,
                id.as_str(),
                Updates::new().set("isRead", json!(true)),
            )
            .await?;
        Ok(document.decode()?)
    }

    /// Mark every unread notification read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    #[tracing::instrument(skip(self))]
    pub async fn mark_all_read(&self) -> Result<usize> {
        let unread = self
            .store
            .query(
                collections::NOTIFICATIONS,
                &Query::new().where_eq("isRead", json!(false)),
            )
            .await?;
        for document in &unread {
            self.store
                .update(
                    collections::NOTIFICATIONS,
                    &document.id,
                    Updates::new().set("isRead", json!(true)),
                )
                .await?;
        }
        tracing::info!(count = unread.len(), "Notifications marked read");
        Ok(unread.len())
    }

    /// # Errors
    ///
    /// Returns an error if the store write fails.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &NotificationId) -> Result<()> {
        self.store
            .delete(collections::NOTIFICATIONS, id.as_str())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::AppError;
    use rentacam_core::store::MemoryStore;

    async fn seeded() -> SharedStore {
        let store: SharedStore = Arc::new(MemoryStore::new());
        for (id, created, read) in [
            ("n1", "2026-10-01T10:00:00Z", false),
            ("n2", "2026-10-02T10:00:00Z", true),
            ("n3", "2026-10-03T10:00:00Z", false),
        ] {
            store
                .set(
                    collections::NOTIFICATIONS,
                    id,
                    json!({
                        "type": "new_order",
                        "title": "New order received",
                        "message": "Order",
                        "isRead": read,
                        "createdAt": created
                    }),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_newest_first_and_unread_filter() {
        let store = seeded().await;
        let service = NotificationService::new(&store);

        let all = service.list(NotificationFilter::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n3", "n2", "n1"]);

        let unread = service
            .list(NotificationFilter {
                unread_only: true,
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id.as_str(), "n3");
    }

    #[tokio::test]
    async fn test_mark_read_and_delete() {
        let store = seeded().await;
        let service = NotificationService::new(&store);

        assert!(service.mark_read(&NotificationId::new("n1")).await.unwrap().is_read);
        assert_eq!(service.unread_count().await.unwrap(), 1);
        assert_eq!(service.mark_all_read().await.unwrap(), 1);
        assert_eq!(service.unread_count().await.unwrap(), 0);

        service.delete(&NotificationId::new("n2")).await.unwrap();
        assert_eq!(service.list(NotificationFilter::default()).await.unwrap().len(), 2);
        assert!(matches!(
            service.mark_read(&NotificationId::new("missing")).await,
            Err(AppError::Store(_))
        ));
    }
}
