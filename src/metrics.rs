//! Client metrics.
//!
//! Lightweight atomic counters covering the path from `add` to delivery.
//! Useful for verifying the at-most-once accounting: once all accepted
//! events have been attempted, `events_delivered + events_failed` equals
//! `events_accepted`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the batcher and the delivery workers.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Events accepted by `add` while enabled
    events_accepted: AtomicU64,

    /// Batches handed to the dispatch queue
    batches_dispatched: AtomicU64,

    /// Events delivered successfully
    events_delivered: AtomicU64,

    /// Events whose delivery attempt failed (not retried)
    events_failed: AtomicU64,
}

impl ClientMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            events_accepted: AtomicU64::new(0),
            batches_dispatched: AtomicU64::new(0),
            events_delivered: AtomicU64::new(0),
            events_failed: AtomicU64::new(0),
        }
    }

    /// Record an accepted event
    #[inline]
    pub(crate) fn record_accepted(&self) {
        self.events_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch handed to the dispatch queue
    #[inline]
    pub(crate) fn record_dispatched(&self) {
        self.batches_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully delivered batch of `events` events
    #[inline]
    pub(crate) fn record_delivered(&self, events: u64) {
        self.events_delivered.fetch_add(events, Ordering::Relaxed);
    }

    /// Record a failed delivery attempt covering `events` events
    #[inline]
    pub(crate) fn record_failed(&self, events: u64) {
        self.events_failed.fetch_add(events, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
            batches_dispatched: self.batches_dispatched.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.events_accepted.store(0, Ordering::Relaxed);
        self.batches_dispatched.store(0, Ordering::Relaxed);
        self.events_delivered.store(0, Ordering::Relaxed);
        self.events_failed.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of client metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_accepted: u64,
    pub batches_dispatched: u64,
    pub events_delivered: u64,
    pub events_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let metrics = ClientMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_record_and_snapshot() {
        let metrics = ClientMetrics::new();

        metrics.record_accepted();
        metrics.record_accepted();
        metrics.record_dispatched();
        metrics.record_delivered(1);
        metrics.record_failed(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_accepted, 2);
        assert_eq!(snapshot.batches_dispatched, 1);
        assert_eq!(snapshot.events_delivered, 1);
        assert_eq!(snapshot.events_failed, 1);
        assert_eq!(
            snapshot.events_delivered + snapshot.events_failed,
            snapshot.events_accepted
        );
    }

    #[test]
    fn test_reset() {
        let metrics = ClientMetrics::new();
        metrics.record_accepted();
        metrics.record_dispatched();

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
