//! `PostgreSQL` document store.
//!
//! Documents live in a single `documents` table keyed by `(collection, id)`
//! with a JSONB body. Every write appends a row to `document_changes`, whose
//! `BIGSERIAL` key is the store-wide sequence number, and fires
//! `pg_notify('document_changes', seq)` inside the same transaction.
//!
//! Appends to the log are serialized by a transaction-scoped advisory lock,
//! so sequence numbers become visible in commit order and a reader that has
//! seen `seq` will never later find a smaller one.
//!
//! A background relay task listens on that channel and re-publishes every
//! committed change on the in-process broadcast feed. Notifications are only
//! wake-ups: the relay always reads the log from the last sequence number it
//! relayed, so changes written by other processes (the CLI, the other web
//! service) are seen in order even if a notification is dropped.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgListener, PgPool};
use sqlx::{Postgres, Transaction};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::memory::CHANGE_CHANNEL_CAPACITY;
use super::{
    ChangeKind, Document, DocumentChange, DocumentStore, FilterOp, Query, StoreError, StoreResult,
    Updates, ensure_object, strip_id,
};

/// `LISTEN`/`NOTIFY` channel carrying committed sequence numbers.
pub const NOTIFY_CHANNEL: &str = "document_changes";

/// Advisory lock key held while appending to `document_changes`.
pub const CHANGE_LOG_LOCK: i64 = 0x5241_4349_4e00;

/// Maximum number of log rows the relay fetches per round trip.
const RELAY_BATCH: i64 = 500;

/// Delay before the relay reconnects after losing its listener.
const RELAY_RETRY: Duration = Duration::from_secs(5);

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    seq: i64,
    data: Value,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            seq: to_seq(row.seq),
            data: row.data,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChangeRow {
    seq: i64,
    collection: String,
    document_id: String,
    kind: String,
    data: Value,
}

impl TryFrom<ChangeRow> for DocumentChange {
    type Error = StoreError;

    fn try_from(row: ChangeRow) -> Result<Self, Self::Error> {
        let seq = to_seq(row.seq);
        Ok(Self {
            collection: row.collection,
            kind: row.kind.parse()?,
            seq,
            document: Document {
                id: row.document_id,
                seq,
                data: row.data,
            },
        })
    }
}

/// `PostgreSQL`-backed document store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    sender: broadcast::Sender<DocumentChange>,
}

impl PgStore {
    /// Create a store over an existing pool and start the change relay.
    ///
    /// Only changes committed after this call are relayed live; history is
    /// available through [`DocumentStore::changes_since`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the current sequence cannot be read.
    pub async fn start(pool: PgPool) -> StoreResult<(Self, JoinHandle<()>)> {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let store = Self { pool, sender };
        let from = store.current_seq().await?;
        let relay = tokio::spawn(relay(store.pool.clone(), store.sender.clone(), from));
        Ok((store, relay))
    }

    /// Run the document store migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to apply.
    pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn upsert(
        tx: &mut Transaction<'_, Postgres>,
        collection: &str,
        id: &str,
        kind: ChangeKind,
        data: Value,
    ) -> StoreResult<Document> {
        let seq = record_change(tx, collection, id, kind, &data).await?;

        sqlx::query(
            r"
            INSERT INTO documents (collection, id, seq, data, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (collection, id)
            DO UPDATE SET seq = EXCLUDED.seq, data = EXCLUDED.data, updated_at = NOW()
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(seq)
        .bind(&data)
        .execute(&mut **tx)
        .await?;

        Ok(Document {
            id: id.to_owned(),
            seq: to_seq(seq),
            data,
        })
    }
}

/// Append to the change log and queue the notification (sent on commit).
async fn record_change(
    tx: &mut Transaction<'_, Postgres>,
    collection: &str,
    id: &str,
    kind: ChangeKind,
    data: &Value,
) -> StoreResult<i64> {
    // Held until commit: no later seq can commit before this one.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(CHANGE_LOG_LOCK)
        .execute(&mut **tx)
        .await?;

    let (seq,): (i64,) = sqlx::query_as(
        r"
        INSERT INTO document_changes (collection, document_id, kind, data)
        VALUES ($1, $2, $3, $4)
        RETURNING seq
        ",
    )
    .bind(collection)
    .bind(id)
    .bind(kind.as_str())
    .bind(data)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(NOTIFY_CHANNEL)
        .bind(seq.to_string())
        .execute(&mut **tx)
        .await?;

    Ok(seq)
}

#[async_trait]
impl DocumentStore for PgStore {
    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT id, seq, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, data))]
    async fn create(&self, collection: &str, id: &str, data: Value) -> StoreResult<Document> {
        ensure_object(&data)?;
        let data = strip_id(data);

        let mut tx = self.pool.begin().await?;
        // Claims the id; a concurrent create of the same id blocks here until
        // this transaction ends and then sees the conflict.
        let claimed = sqlx::query(
            r"
            INSERT INTO documents (collection, id, seq, data, updated_at)
            VALUES ($1, $2, 0, $3, NOW())
            ON CONFLICT (collection, id) DO NOTHING
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists {
                collection: collection.to_owned(),
                id: id.to_owned(),
            });
        }

        let document = Self::upsert(&mut tx, collection, id, ChangeKind::Added, data).await?;
        tx.commit().await?;
        Ok(document)
    }

    #[instrument(skip(self, data))]
    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<Document> {
        ensure_object(&data)?;
        let data = strip_id(data);

        let mut tx = self.pool.begin().await?;
        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT seq FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let kind = if existing.is_some() {
            ChangeKind::Modified
        } else {
            ChangeKind::Added
        };
        let document = Self::upsert(&mut tx, collection, id, kind, data).await?;
        tx.commit().await?;
        Ok(document)
    }

    #[instrument(skip(self, updates))]
    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Updates,
    ) -> StoreResult<Document> {
        let mut tx = self.pool.begin().await?;
        let current: Option<DocumentRow> = sqlx::query_as(
            "SELECT id, seq, data FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current.ok_or_else(|| StoreError::not_found(collection, id))?;
        let data = strip_id(updates.apply(&current.data)?);
        let document = Self::upsert(&mut tx, collection, id, ChangeKind::Modified, data).await?;
        tx.commit().await?;
        Ok(document)
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let removed: Option<(Value,)> = sqlx::query_as(
            "DELETE FROM documents WHERE collection = $1 AND id = $2 RETURNING data",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((data,)) = removed else {
            return Ok(false);
        };
        record_change(&mut tx, collection, id, ChangeKind::Removed, &data).await?;
        tx.commit().await?;
        Ok(true)
    }

    #[instrument(skip(self, query))]
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        // Exact-match filters narrow the scan through the GIN index; the
        // full query is still evaluated in-process so both backends agree.
        let rows: Vec<DocumentRow> = match containment(query) {
            Some(pattern) => {
                sqlx::query_as(
                    "SELECT id, seq, data FROM documents WHERE collection = $1 AND data @> $2",
                )
                .bind(collection)
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT id, seq, data FROM documents WHERE collection = $1")
                    .bind(collection)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(query.apply(rows.into_iter().map(Document::from)))
    }

    fn changes(&self) -> broadcast::Receiver<DocumentChange> {
        self.sender.subscribe()
    }

    #[instrument(skip(self))]
    async fn changes_since(
        &self,
        collection: &str,
        after: u64,
    ) -> StoreResult<Vec<DocumentChange>> {
        let rows: Vec<ChangeRow> = sqlx::query_as(
            r"
            SELECT seq, collection, document_id, kind, data
            FROM document_changes
            WHERE collection = $1 AND seq > $2
            ORDER BY seq
            ",
        )
        .bind(collection)
        .bind(from_seq(after))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn current_seq(&self) -> StoreResult<u64> {
        let (seq,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(seq), 0) FROM document_changes")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_seq(seq))
    }
}

/// Relay committed changes from the log to the broadcast feed, forever.
async fn relay(pool: PgPool, sender: broadcast::Sender<DocumentChange>, mut last: u64) {
    loop {
        let mut listener = match PgListener::connect_with(&pool).await {
            Ok(listener) => listener,
            Err(e) => {
                warn!(error = %e, "Change relay failed to connect, retrying");
                tokio::time::sleep(RELAY_RETRY).await;
                continue;
            }
        };
        if let Err(e) = listener.listen(NOTIFY_CHANNEL).await {
            warn!(error = %e, "Change relay failed to LISTEN, retrying");
            tokio::time::sleep(RELAY_RETRY).await;
            continue;
        }
        debug!(from = last, "Change relay listening");

        loop {
            // Drain the log first: covers the gap before LISTEN took effect
            match drain(&pool, &sender, last).await {
                Ok(seq) => last = seq,
                Err(e) => warn!(error = %e, "Change relay failed to read the log"),
            }

            if let Err(e) = listener.recv().await {
                warn!(error = %e, "Change relay lost its listener, reconnecting");
                break;
            }
        }
    }
}

/// Publish every logged change after `after`, returning the new high mark.
async fn drain(
    pool: &PgPool,
    sender: &broadcast::Sender<DocumentChange>,
    mut after: u64,
) -> StoreResult<u64> {
    loop {
        let rows: Vec<ChangeRow> = sqlx::query_as(
            r"
            SELECT seq, collection, document_id, kind, data
            FROM document_changes
            WHERE seq > $1
            ORDER BY seq
            LIMIT $2
            ",
        )
        .bind(from_seq(after))
        .bind(RELAY_BATCH)
        .fetch_all(pool)
        .await?;

        let exhausted = i64::try_from(rows.len()).unwrap_or(RELAY_BATCH) < RELAY_BATCH;
        for row in rows {
            let change = DocumentChange::try_from(row)?;
            after = change.seq;
            // No receivers is fine; consumers catch up from the log
            let _ = sender.send(change);
        }
        if exhausted {
            return Ok(after);
        }
    }
}

/// Build a JSONB containment pattern from the query's string/bool equality
/// filters. Numbers are skipped because they match decimal strings too.
fn containment(query: &Query) -> Option<Value> {
    let mut pattern = Map::new();
    for filter in &query.filters {
        if filter.op != FilterOp::Eq || !(filter.value.is_string() || filter.value.is_boolean()) {
            continue;
        }
        let segments: Vec<&str> = filter.field.split('.').collect();
        insert_at_path(&mut pattern, &segments, filter.value.clone());
    }
    (!pattern.is_empty()).then_some(Value::Object(pattern))
}

/// Insert `value` under a dotted path, leaving the pattern untouched when a
/// prefix of the path already holds a non-object value.
fn insert_at_path(object: &mut Map<String, Value>, path: &[&str], value: Value) {
    match path {
        [] => {}
        [last] => {
            object.insert((*last).to_owned(), value);
        }
        [head, rest @ ..] => {
            let next = object
                .entry((*head).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(nested) = next.as_object_mut() {
                insert_at_path(nested, rest, value);
            }
        }
    }
}

fn to_seq(seq: i64) -> u64 {
    u64::try_from(seq).unwrap_or_default()
}

fn from_seq(seq: u64) -> i64 {
    i64::try_from(seq).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_containment_uses_string_and_bool_equality() {
        let query = Query::new()
            .where_eq("approved", json!(true))
            .where_eq("address.city", json!("Porto"))
            .where_eq("stock", json!(3))
            .filter("category", FilterOp::Ne, json!("lenses"));
        assert_eq!(
            containment(&query).unwrap(),
            json!({ "approved": true, "address": { "city": "Porto" } })
        );
    }

    #[test]
    fn test_containment_empty_without_eq_filters() {
        assert!(containment(&Query::new()).is_none());
        let query = Query::new().filter("stock", FilterOp::Gt, json!(0));
        assert!(containment(&query).is_none());
    }

    #[test]
    fn test_containment_merges_nested_paths_and_skips_conflicts() {
        let query = Query::new()
            .where_eq("address.city", json!("Porto"))
            .where_eq("address.country", json!("PT"))
            .where_eq("brand", json!("Sony"))
            .where_eq("brand.line", json!("Alpha"));
        assert_eq!(
            containment(&query).unwrap(),
            json!({ "address": { "city": "Porto", "country": "PT" }, "brand": "Sony" })
        );
    }

    #[test]
    fn test_seq_conversions_saturate() {
        assert_eq!(to_seq(-1), 0);
        assert_eq!(from_seq(u64::MAX), i64::MAX);
    }
}
