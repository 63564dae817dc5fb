//! `PgStore` change feed against a real database.
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/rentacam_test \
//!     cargo test -p rentacam-integration-tests --test postgres_store -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sqlx::postgres::PgPoolOptions;

use rentacam_core::store::{DocumentStore, PgStore};

async fn store() -> Arc<PgStore> {
    let url = std::env::var("DATABASE_URL").unwrap();
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .unwrap();
    PgStore::migrate(&pool).await.unwrap();
    let (store, _relay) = PgStore::start(pool).await.unwrap();
    Arc::new(store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires DATABASE_URL pointing at a scratch PostgreSQL database"]
async fn test_relay_delivers_every_concurrent_write_in_order() {
    let store = store().await;
    let collection = format!("relay_order_{}", std::process::id());
    let mut feed = store.changes();

    let writers: Vec<_> = (0..8)
        .map(|writer| {
            let store = Arc::clone(&store);
            let collection = collection.clone();
            tokio::spawn(async move {
                for n in 0..25 {
                    store
                        .set(&collection, &format!("o{writer}-{n}"), json!({ "n": n }))
                        .await
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }

    let mut seqs = Vec::new();
    while seqs.len() < 200 {
        let change = tokio::time::timeout(Duration::from_secs(10), feed.recv())
            .await
            .expect("relay stalled before delivering every write")
            .unwrap();
        if change.collection == collection {
            seqs.push(change.seq);
        }
    }
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));

    let logged = store.changes_since(&collection, 0).await.unwrap();
    assert_eq!(logged.len(), 200);
    assert_eq!(logged.iter().map(|change| change.seq).collect::<Vec<_>>(), seqs);
}
