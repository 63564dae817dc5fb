//! Decides which document changes deserve a notification.
//!
//! One tracker per watched collection. A fresh tracker starts
//! `Initializing`: the first snapshot only records what already exists.
//! After that it is `Steady` and every change is judged against the set of
//! document ids it has seen and the last stock or status it saw for each
//! document.
//!
//! The tracker also keeps a cursor, the highest change sequence number it
//! has processed. Persisting the cursor lets a restarted watcher resume
//! with [`NotificationTracker::resume`] instead of starting over, and lets a
//! re-listed snapshot (after the subscription fell behind) tell documents
//! it already knows about from documents that are really new.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use rentacam_core::models::collections;
use rentacam_core::store::{ChangeKind, Document, DocumentChange, Snapshot};
use rentacam_core::{CheckoutId, NotificationType};

/// Lifecycle of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Initializing,
    Steady,
}

/// A notification to be written, before it gets an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub order_id: Option<CheckoutId>,
    pub data: Option<Value>,
}

/// Last observed value of the field a collection's rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Observed {
    Stock(Option<i64>),
    Status(Option<String>),
    Nothing,
}

#[derive(Debug)]
pub struct NotificationTracker {
    collection: String,
    state: WatchState,
    seen: HashSet<String>,
    previous: HashMap<String, Observed>,
    cursor: u64,
    low_stock_threshold: i64,
}

impl NotificationTracker {
    /// A tracker with no history. Its first snapshot raises nothing.
    #[must_use]
    pub fn new(collection: impl Into<String>, low_stock_threshold: u32) -> Self {
        Self {
            collection: collection.into(),
            state: WatchState::Initializing,
            seen: HashSet::new(),
            previous: HashMap::new(),
            cursor: 0,
            low_stock_threshold: i64::from(low_stock_threshold),
        }
    }

    /// Rebuild a tracker from a persisted cursor.
    ///
    /// `listed` is the collection as it is now and `replay` every change
    /// after `cursor`, oldest first. Documents created after the cursor are
    /// treated as unseen, so the replay raises exactly the notifications
    /// that were missed while no watcher was running.
    pub fn resume(
        collection: impl Into<String>,
        low_stock_threshold: u32,
        cursor: u64,
        listed: &[Document],
        replay: &[DocumentChange],
    ) -> (Self, Vec<NotificationDraft>) {
        let mut tracker = Self::new(collection, low_stock_threshold);
        tracker.state = WatchState::Steady;
        tracker.cursor = cursor;

        let added_later: HashSet<&str> = replay
            .iter()
            .filter(|change| change.kind == ChangeKind::Added)
            .map(|change| change.document.id.as_str())
            .collect();
        let changed_later: HashSet<&str> = replay
            .iter()
            .map(|change| change.document.id.as_str())
            .collect();

        for document in listed {
            if added_later.contains(document.id.as_str()) {
                continue;
            }
            tracker.seen.insert(document.id.clone());
            if !changed_later.contains(document.id.as_str()) {
                let observed = tracker.observe(document);
                tracker.previous.insert(document.id.clone(), observed);
            }
        }

        let mut drafts = Vec::new();
        for change in replay {
            if change.collection == tracker.collection {
                drafts.extend(tracker.apply_change(change));
            }
        }
        (tracker, drafts)
    }

    #[must_use]
    pub const fn state(&self) -> WatchState {
        self.state
    }

    /// Highest change sequence number processed so far.
    #[must_use]
    pub const fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Move the cursor forward to `seq`; never moves it back.
    pub fn advance_cursor(&mut self, seq: u64) {
        self.cursor = self.cursor.max(seq);
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn has_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn set_low_stock_threshold(&mut self, threshold: u32) {
        self.low_stock_threshold = i64::from(threshold);
    }

    /// Process one subscription snapshot.
    pub fn on_snapshot(&mut self, snapshot: &Snapshot) -> Vec<NotificationDraft> {
        match (self.state, snapshot.is_initial) {
            (WatchState::Initializing, _) => {
                for document in &snapshot.documents {
                    self.record(document);
                    self.cursor = self.cursor.max(document.seq);
                }
                self.state = WatchState::Steady;
                tracing::debug!(
                    collection = %self.collection,
                    seen = self.seen.len(),
                    cursor = self.cursor,
                    "Notification tracker initialized"
                );
                Vec::new()
            }
            (WatchState::Steady, true) => self.resync(&snapshot.documents),
            (WatchState::Steady, false) => snapshot
                .changes
                .iter()
                .flat_map(|change| self.apply_change(change))
                .collect(),
        }
    }

    /// A re-listed collection: only documents written after the cursor can
    /// carry news.
    fn resync(&mut self, documents: &[Document]) -> Vec<NotificationDraft> {
        let cursor = self.cursor;
        let mut drafts = Vec::new();
        let mut newest = cursor;

        for document in documents {
            newest = newest.max(document.seq);
            if document.seq <= cursor {
                if !self.seen.contains(&document.id) {
                    self.record(document);
                }
                continue;
            }
            if self.seen.insert(document.id.clone()) {
                drafts.extend(self.announce_new(document));
                let observed = self.observe(document);
                self.previous.insert(document.id.clone(), observed);
            } else {
                drafts.extend(self.evaluate_modified(document));
            }
        }

        self.cursor = newest;
        drafts
    }

    fn apply_change(&mut self, change: &DocumentChange) -> Option<NotificationDraft> {
        let document = &change.document;
        if change.seq <= self.cursor {
            // A late delivery behind the cursor still counts if it introduces
            // a document never seen before.
            if change.kind == ChangeKind::Added && self.seen.insert(document.id.clone()) {
                let draft = self.announce_new(document);
                let observed = self.observe(document);
                self.previous.insert(document.id.clone(), observed);
                return draft;
            }
            return None;
        }
        self.cursor = change.seq;

        match change.kind {
            ChangeKind::Added if self.seen.insert(document.id.clone()) => {
                let draft = self.announce_new(document);
                let observed = self.observe(document);
                self.previous.insert(document.id.clone(), observed);
                draft
            }
            ChangeKind::Added | ChangeKind::Modified => self.evaluate_modified(document),
            ChangeKind::Removed => {
                self.previous.remove(&document.id);
                None
            }
        }
    }

    fn record(&mut self, document: &Document) {
        self.seen.insert(document.id.clone());
        let observed = self.observe(document);
        self.previous.insert(document.id.clone(), observed);
    }

    fn observe(&self, document: &Document) -> Observed {
        match self.collection.as_str() {
            collections::PRODUCTS => Observed::Stock(document.i64_field("stock")),
            collections::CHECKOUTS => {
                Observed::Status(document.str_field("status").map(str::to_owned))
            }
            _ => Observed::Nothing,
        }
    }

    fn announce_new(&self, document: &Document) -> Option<NotificationDraft> {
        let text = |path: &str| document.str_field(path).unwrap_or_default().to_string();

        match self.collection.as_str() {
            collections::CHECKOUTS => {
                let total = document
                    .field("pricing.total")
                    .map(display_value)
                    .unwrap_or_else(|| "0".to_string());
                Some(NotificationDraft {
                    kind: NotificationType::NewOrder,
                    title: "New order received".to_string(),
                    message: format!("Order from {} totalling {total}", text("userEmail")),
                    order_id: Some(CheckoutId::new(document.id.clone())),
                    data: None,
                })
            }
            collections::CUSTOMERS => Some(NotificationDraft {
                kind: NotificationType::NewCustomer,
                title: "New customer".to_string(),
                message: format!("{} ({}) signed up", text("fullName"), text("email")),
                order_id: None,
                data: Some(serde_json::json!({ "customerId": document.id })),
            }),
            collections::PRODUCTS => Some(NotificationDraft {
                kind: NotificationType::NewProduct,
                title: "New product".to_string(),
                message: format!("{} was added to the catalog", text("name")),
                order_id: None,
                data: Some(serde_json::json!({ "productId": document.id })),
            }),
            _ => None,
        }
    }

    /// Threshold rules for a modified document. Each rule fires on the
    /// transition only, compared with the value seen before.
    fn evaluate_modified(&mut self, document: &Document) -> Option<NotificationDraft> {
        let observed = self.observe(document);
        let before = self.previous.insert(document.id.clone(), observed.clone());

        match (observed, before) {
            (Observed::Stock(Some(stock)), before) => {
                let before = match before {
                    Some(Observed::Stock(value)) => value,
                    _ => None,
                };
                self.stock_alert(document, stock, before)
            }
            (Observed::Status(Some(status)), Some(Observed::Status(Some(before))))
                if status != before =>
            {
                Some(NotificationDraft {
                    kind: NotificationType::OrderStatus,
                    title: "Order status updated".to_string(),
                    message: format!("Order {} changed from {before} to {status}", document.id),
                    order_id: Some(CheckoutId::new(document.id.clone())),
                    data: Some(serde_json::json!({ "from": before, "to": status })),
                })
            }
            _ => None,
        }
    }

    fn stock_alert(
        &self,
        document: &Document,
        stock: i64,
        before: Option<i64>,
    ) -> Option<NotificationDraft> {
        let name = document.str_field("name").unwrap_or(&document.id);
        let is_low = |value: i64| value > 0 && value <= self.low_stock_threshold;
        let data = Some(serde_json::json!({ "productId": document.id, "stock": stock }));

        if stock <= 0 && before.is_none_or(|value| value > 0) {
            Some(NotificationDraft {
                kind: NotificationType::OutOfStock,
                title: "Out of stock".to_string(),
                message: format!("{name} is out of stock"),
                order_id: None,
                data,
            })
        } else if is_low(stock) && !before.is_some_and(is_low) {
            Some(NotificationDraft {
                kind: NotificationType::LowStock,
                title: "Low stock".to_string(),
                message: format!("{name} has only {stock} left"),
                order_id: None,
                data,
            })
        } else {
            None
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
