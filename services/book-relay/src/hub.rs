//! Snapshot fan-out to downstream subscribers
//!
//! The hub keeps the latest serialized snapshot and a bounded queue per
//! subscriber. Attach and publish take the same lock, so a new subscriber
//! is seeded with the current snapshot and then sees every later publish
//! in order, with no gap and no duplicate in between. Publishing never
//! blocks on a slow subscriber; a full queue is handled by policy.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::metrics::RelayMetrics;

/// What to do with a subscriber whose queue is full at publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPolicy {
    /// Detach the lagging subscriber; its receiver closes.
    Disconnect,
    /// Keep the subscriber and drop this snapshot for it.
    DropNewest,
}

struct HubState {
    subscribers: BTreeMap<u64, mpsc::Sender<String>>,
    latest: String,
}

/// Fan-out point between the upstream task and subscriber handlers.
pub struct BroadcastHub {
    state: Mutex<HubState>,
    next_id: AtomicU64,
    queue_capacity: usize,
    drop_policy: DropPolicy,
    metrics: Arc<RelayMetrics>,
}

impl BroadcastHub {
    /// Create a hub seeded with an initial snapshot payload.
    pub fn new(
        queue_capacity: usize,
        drop_policy: DropPolicy,
        initial_snapshot: String,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        assert!(queue_capacity >= 1, "queue capacity must be at least 1");
        Self {
            state: Mutex::new(HubState {
                subscribers: BTreeMap::new(),
                latest: initial_snapshot,
            }),
            next_id: AtomicU64::new(1),
            queue_capacity,
            drop_policy,
            metrics,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, HubState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a subscriber and immediately queue the current snapshot
    /// for it. Returns the subscriber id and the receive side of its queue.
    pub fn attach(&self) -> (u64, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        let mut state = self.lock_state();
        // A fresh channel always has room for the seed.
        tx.try_send(state.latest.clone()).ok();
        state.subscribers.insert(id, tx);
        drop(state);

        self.metrics.record_subscriber_attached();
        debug!(subscriber_id = id, "Subscriber attached");
        (id, rx)
    }

    /// Remove a subscriber. Safe to call twice; the second call is a no-op.
    pub fn detach(&self, id: u64) {
        let removed = self.lock_state().subscribers.remove(&id).is_some();
        if removed {
            self.metrics.record_subscriber_detached();
            debug!(subscriber_id = id, "Subscriber detached");
        }
    }

    /// Record a new snapshot as latest and offer it to every subscriber
    /// without blocking.
    pub fn publish(&self, snapshot: String) {
        let mut state = self.lock_state();
        let mut stale = Vec::new();

        for (id, tx) in &state.subscribers {
            match tx.try_send(snapshot.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => match self.drop_policy {
                    DropPolicy::Disconnect => {
                        warn!(
                            subscriber_id = *id,
                            "Backpressure: disconnecting lagging subscriber"
                        );
                        self.metrics.record_queue_disconnect();
                        stale.push(*id);
                    }
                    DropPolicy::DropNewest => {
                        debug!(subscriber_id = *id, "Queue full; dropping snapshot");
                        self.metrics.record_snapshot_dropped();
                    }
                },
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber_id = *id, "Subscriber channel closed");
                    stale.push(*id);
                }
            }
        }

        for id in stale {
            if state.subscribers.remove(&id).is_some() {
                self.metrics.record_subscriber_detached();
            }
        }
        state.latest = snapshot;
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock_state().subscribers.len()
    }

    /// The payload a subscriber attaching right now would be seeded with.
    pub fn latest_snapshot(&self) -> String {
        self.lock_state().latest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_BOOK: &str = r#"{"bids":[],"asks":[]}"#;

    fn make_hub(capacity: usize, policy: DropPolicy) -> (BroadcastHub, Arc<RelayMetrics>) {
        let metrics = Arc::new(RelayMetrics::new());
        let hub = BroadcastHub::new(capacity, policy, EMPTY_BOOK.to_string(), metrics.clone());
        (hub, metrics)
    }

    #[tokio::test]
    async fn test_attach_receives_current_snapshot_immediately() {
        let (hub, _) = make_hub(8, DropPolicy::Disconnect);

        let (_, mut rx) = hub.attach();
        assert_eq!(rx.recv().await.unwrap(), EMPTY_BOOK);
    }

    #[tokio::test]
    async fn test_late_attach_is_seeded_with_latest_published() {
        let (hub, _) = make_hub(8, DropPolicy::Disconnect);
        hub.publish("snapshot-1".to_string());

        let (_, mut rx) = hub.attach();
        assert_eq!(rx.recv().await.unwrap(), "snapshot-1");
    }

    #[tokio::test]
    async fn test_publish_fans_out_to_all_subscribers() {
        let (hub, _) = make_hub(8, DropPolicy::Disconnect);
        let (_, mut rx_a) = hub.attach();
        let (_, mut rx_b) = hub.attach();
        rx_a.recv().await.unwrap();
        rx_b.recv().await.unwrap();

        hub.publish("snapshot-2".to_string());

        assert_eq!(rx_a.recv().await.unwrap(), "snapshot-2");
        assert_eq!(rx_b.recv().await.unwrap(), "snapshot-2");
    }

    #[tokio::test]
    async fn test_full_queue_disconnects_lagging_subscriber() {
        let (hub, metrics) = make_hub(1, DropPolicy::Disconnect);

        // The seed fills the only slot; the subscriber never drains it.
        let (_, mut rx) = hub.attach();
        hub.publish("snapshot-3".to_string());

        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(metrics.export()["queue_disconnects"], 1);

        // The buffered seed is still readable, then the channel is closed.
        assert_eq!(rx.recv().await.unwrap(), EMPTY_BOOK);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_newest_keeps_lagging_subscriber() {
        let (hub, metrics) = make_hub(1, DropPolicy::DropNewest);

        let (_, mut rx) = hub.attach();
        hub.publish("snapshot-4".to_string());

        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(metrics.export()["snapshots_dropped"], 1);

        // After draining the seed the subscriber keeps receiving.
        assert_eq!(rx.recv().await.unwrap(), EMPTY_BOOK);
        hub.publish("snapshot-5".to_string());
        assert_eq!(rx.recv().await.unwrap(), "snapshot-5");
    }

    #[tokio::test]
    async fn test_detach_is_idempotent() {
        let (hub, metrics) = make_hub(8, DropPolicy::Disconnect);
        let (id, _rx) = hub.attach();

        hub.detach(id);
        hub.detach(id);

        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(metrics.export()["subscribers_detached"], 1);
    }

    #[tokio::test]
    async fn test_closed_receiver_pruned_on_publish() {
        let (hub, _) = make_hub(8, DropPolicy::Disconnect);
        let (_, rx) = hub.attach();
        drop(rx);

        hub.publish("snapshot-6".to_string());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers_still_updates_latest() {
        let (hub, _) = make_hub(8, DropPolicy::Disconnect);

        hub.publish("snapshot-7".to_string());
        assert_eq!(hub.latest_snapshot(), "snapshot-7");
    }
}
