//! Change notification hub
//!
//! Every mutation publishes a [`ChangeEvent`] naming the collection it
//! touched. Connected clients receive events over the `/events` WebSocket
//! and re-fetch the affected collections rather than applying deltas, so
//! duplicate or out-of-order delivery is harmless. Each event carries an
//! explicit invalidation set: the collections whose cached views it makes
//! stale.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

/// Store collection an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreCollection {
    Questions,
    Answers,
    PointHistory,
    Profiles,
}

/// Mutation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
}

/// A single change notification
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub collection: StoreCollection,
    pub op: ChangeOp,
    /// RFC 3339 emission time
    pub timestamp: String,
}

impl ChangeEvent {
    pub fn new(collection: StoreCollection, op: ChangeOp) -> Self {
        Self {
            collection,
            op,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Collections a client should re-fetch after seeing this event
    ///
    /// Answer writes invalidate questions too (the first answer flips the
    /// question status); ledger writes invalidate profiles (cached balance).
    pub fn invalidates(&self) -> &'static [&'static str] {
        match self.collection {
            StoreCollection::Questions => &["questions"],
            StoreCollection::Answers => &["answers", "questions"],
            StoreCollection::PointHistory => &["point_history", "profiles"],
            StoreCollection::Profiles => &["profiles"],
        }
    }
}

/// Hub for broadcasting change events to connected clients
pub struct EventHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Broadcast an event to all connected clients
    pub fn publish(&self, event: ChangeEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidation_mapping() {
        let e = ChangeEvent::new(StoreCollection::Answers, ChangeOp::Insert);
        assert_eq!(e.invalidates(), &["answers", "questions"]);

        let e = ChangeEvent::new(StoreCollection::PointHistory, ChangeOp::Insert);
        assert_eq!(e.invalidates(), &["point_history", "profiles"]);

        let e = ChangeEvent::new(StoreCollection::Questions, ChangeOp::Update);
        assert_eq!(e.invalidates(), &["questions"]);
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let hub = EventHub::new();
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        hub.publish(ChangeEvent::new(StoreCollection::Questions, ChangeOp::Insert));

        let got1 = rx1.recv().await.unwrap();
        let got2 = rx2.recv().await.unwrap();
        assert_eq!(got1.collection, StoreCollection::Questions);
        assert_eq!(got2.op, ChangeOp::Insert);
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let hub = EventHub::new();
        hub.publish(ChangeEvent::new(StoreCollection::Profiles, ChangeOp::Update));
        assert_eq!(hub.subscriber_count(), 0);
    }
}
