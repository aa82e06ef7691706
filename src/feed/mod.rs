//! In-process change-notification feed for room records.
//!
//! Mirrors the shape of a hosted backend's realtime channel: subscribers
//! register a filter (table, optional event kind, optional row id) and
//! receive a lightweight event for every matching insert/update/delete.
//! Consumers treat each event as "something changed, re-read"; no ordering
//! or delivery guarantee is offered.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Table name used for all room change events.
pub const ROOM_TABLE: &str = "room";

/// What happened to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    /// Parse the wire form used in subscription requests; `*` means "any".
    #[must_use]
    pub fn parse_filter(s: &str) -> Option<Option<Self>> {
        match s {
            "*" => Some(None),
            "insert" => Some(Some(Self::Insert)),
            "update" => Some(Some(Self::Update)),
            "delete" => Some(Some(Self::Delete)),
            _ => None,
        }
    }
}

/// A single change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub row_id: Uuid,
}

impl ChangeEvent {
    /// Build an event for the room table.
    #[must_use]
    pub fn room(kind: ChangeKind, row_id: Uuid) -> Self {
        Self {
            table: ROOM_TABLE.to_string(),
            kind,
            row_id,
        }
    }
}

/// Subscriber-side filter: equality on table, optionally on kind and row id.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    pub table: String,
    /// `None` matches every event kind (`*`).
    pub kind: Option<ChangeKind>,
    /// `None` matches every row.
    pub row_id: Option<Uuid>,
}

impl ChangeFilter {
    /// Filter matching every event on the room table.
    #[must_use]
    pub fn all_rooms() -> Self {
        Self {
            table: ROOM_TABLE.to_string(),
            kind: None,
            row_id: None,
        }
    }

    /// Filter matching every event for one room.
    #[must_use]
    pub fn room(row_id: Uuid) -> Self {
        Self {
            table: ROOM_TABLE.to_string(),
            kind: None,
            row_id: Some(row_id),
        }
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if self.table != event.table {
            return false;
        }
        if self.kind.is_some_and(|k| k != event.kind) {
            return false;
        }
        if self.row_id.is_some_and(|id| id != event.row_id) {
            return false;
        }
        true
    }
}

/// A message destined for a specific subscriber.
type FeedTx = mpsc::UnboundedSender<ChangeEvent>;

struct Subscriber {
    filter: ChangeFilter,
    tx: FeedTx,
}

/// Tracks all active feed subscriptions across the process.
///
/// Lifecycles are explicit: callers hold the id returned by [`subscribe`]
/// and must call [`unsubscribe`] when done (the WebSocket layer does this on
/// disconnect).
///
/// [`subscribe`]: ChangeFeed::subscribe
/// [`unsubscribe`]: ChangeFeed::unsubscribe
#[derive(Clone, Default)]
pub struct ChangeFeed {
    subscribers: Arc<DashMap<Uuid, Subscriber>>,
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ChangeFeed {
    /// Create a new empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
        }
    }

    /// Open a subscription; events matching `filter` arrive on the receiver.
    pub fn subscribe(&self, filter: ChangeFilter) -> (Uuid, mpsc::UnboundedReceiver<ChangeEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, Subscriber { filter, tx });
        (id, rx)
    }

    /// Close a subscription. Safe to call for an already-closed id.
    pub fn unsubscribe(&self, id: Uuid) {
        self.subscribers.remove(&id);
    }

    /// Deliver an event to every matching subscriber.
    ///
    /// Subscribers whose receiver has been dropped are pruned here rather
    /// than erroring the publisher.
    pub fn publish(&self, event: &ChangeEvent) {
        let mut dead: Vec<Uuid> = Vec::new();
        for entry in self.subscribers.iter() {
            if entry.value().filter.matches(event) && entry.value().tx.send(event.clone()).is_err()
            {
                dead.push(*entry.key());
            }
        }
        for id in dead {
            self.subscribers.remove(&id);
        }
    }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matching_event_is_delivered() {
        let feed = ChangeFeed::new();
        let (_id, mut rx) = feed.subscribe(ChangeFilter::all_rooms());

        let room_id = Uuid::new_v4();
        feed.publish(&ChangeEvent::room(ChangeKind::Insert, room_id));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.row_id, room_id);
    }

    #[tokio::test]
    async fn unrelated_row_is_filtered_out() {
        let feed = ChangeFeed::new();
        let watched = Uuid::new_v4();
        let (_id, mut rx) = feed.subscribe(ChangeFilter::room(watched));

        feed.publish(&ChangeEvent::room(ChangeKind::Update, Uuid::new_v4()));
        feed.publish(&ChangeEvent::room(ChangeKind::Update, watched));

        // Only the watched room's event arrives.
        let event = rx.recv().await.unwrap();
        assert_eq!(event.row_id, watched);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unrelated_table_is_filtered_out() {
        let feed = ChangeFeed::new();
        let (_id, mut rx) = feed.subscribe(ChangeFilter::all_rooms());

        feed.publish(&ChangeEvent {
            table: "profile".to_string(),
            kind: ChangeKind::Insert,
            row_id: Uuid::new_v4(),
        });

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn kind_filter_applies() {
        let feed = ChangeFeed::new();
        let filter = ChangeFilter {
            table: ROOM_TABLE.to_string(),
            kind: Some(ChangeKind::Update),
            row_id: None,
        };
        let (_id, mut rx) = feed.subscribe(filter);

        let room_id = Uuid::new_v4();
        feed.publish(&ChangeEvent::room(ChangeKind::Insert, room_id));
        feed.publish(&ChangeEvent::room(ChangeKind::Update, room_id));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned() {
        let feed = ChangeFeed::new();
        let (_id, rx) = feed.subscribe(ChangeFilter::all_rooms());
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);
        feed.publish(&ChangeEvent::room(ChangeKind::Insert, Uuid::new_v4()));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_closes_the_stream() {
        let feed = ChangeFeed::new();
        let (id, mut rx) = feed.subscribe(ChangeFilter::all_rooms());
        feed.unsubscribe(id);

        feed.publish(&ChangeEvent::room(ChangeKind::Insert, Uuid::new_v4()));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn parse_filter_wire_forms() {
        assert_eq!(ChangeKind::parse_filter("*"), Some(None));
        assert_eq!(
            ChangeKind::parse_filter("insert"),
            Some(Some(ChangeKind::Insert))
        );
        assert_eq!(
            ChangeKind::parse_filter("delete"),
            Some(Some(ChangeKind::Delete))
        );
        assert_eq!(ChangeKind::parse_filter("upsert"), None);
    }
}
