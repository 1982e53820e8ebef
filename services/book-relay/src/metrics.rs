//! Relay counters
//!
//! Plain atomic counters, incremented from the upstream task and the
//! subscriber handlers and exported as a sorted map for the metrics
//! endpoint. Relaxed ordering is enough; nothing sequences on these.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters covering the whole pipeline, upstream frame to fan-out.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    frames_received: AtomicU64,
    frames_ignored: AtomicU64,
    updates_applied: AtomicU64,
    levels_rejected: AtomicU64,
    snapshots_published: AtomicU64,
    snapshots_dropped: AtomicU64,
    reconnect_attempts: AtomicU64,
    subscribers_attached: AtomicU64,
    subscribers_detached: AtomicU64,
    queue_disconnects: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A text frame arrived from the upstream socket.
    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// A frame was discarded as malformed or irrelevant.
    pub fn record_frame_ignored(&self) {
        self.frames_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// A depth update was merged into the book.
    pub fn record_update_applied(&self) {
        self.updates_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Levels dropped during a merge for carrying invalid prices.
    pub fn record_levels_rejected(&self, count: u64) {
        self.levels_rejected.fetch_add(count, Ordering::Relaxed);
    }

    /// A snapshot was handed to the broadcast hub.
    pub fn record_snapshot_published(&self) {
        self.snapshots_published.fetch_add(1, Ordering::Relaxed);
    }

    /// A snapshot was dropped for one subscriber with a full queue.
    pub fn record_snapshot_dropped(&self) {
        self.snapshots_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// The upstream loop scheduled another connection attempt.
    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// A downstream subscriber attached to the hub.
    pub fn record_subscriber_attached(&self) {
        self.subscribers_attached.fetch_add(1, Ordering::Relaxed);
    }

    /// A downstream subscriber detached from the hub.
    pub fn record_subscriber_detached(&self) {
        self.subscribers_detached.fetch_add(1, Ordering::Relaxed);
    }

    /// A lagging subscriber was disconnected by backpressure policy.
    pub fn record_queue_disconnect(&self) {
        self.queue_disconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot every counter into a sorted map.
    pub fn export(&self) -> BTreeMap<String, u64> {
        let mut out = BTreeMap::new();
        out.insert(
            "frames_received".to_string(),
            self.frames_received.load(Ordering::Relaxed),
        );
        out.insert(
            "frames_ignored".to_string(),
            self.frames_ignored.load(Ordering::Relaxed),
        );
        out.insert(
            "updates_applied".to_string(),
            self.updates_applied.load(Ordering::Relaxed),
        );
        out.insert(
            "levels_rejected".to_string(),
            self.levels_rejected.load(Ordering::Relaxed),
        );
        out.insert(
            "snapshots_published".to_string(),
            self.snapshots_published.load(Ordering::Relaxed),
        );
        out.insert(
            "snapshots_dropped".to_string(),
            self.snapshots_dropped.load(Ordering::Relaxed),
        );
        out.insert(
            "reconnect_attempts".to_string(),
            self.reconnect_attempts.load(Ordering::Relaxed),
        );
        out.insert(
            "subscribers_attached".to_string(),
            self.subscribers_attached.load(Ordering::Relaxed),
        );
        out.insert(
            "subscribers_detached".to_string(),
            self.subscribers_detached.load(Ordering::Relaxed),
        );
        out.insert(
            "queue_disconnects".to_string(),
            self.queue_disconnects.load(Ordering::Relaxed),
        );
        out
    }
}
