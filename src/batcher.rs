//! Batching orchestrator.
//!
//! Owns the accumulation buffer, the outstanding-work tracker, the dispatch
//! queue, and the flush timer task. A batch becomes ready when the buffer
//! reaches `max_batch_size`, when `max_batch_wait` elapses since the last
//! flush, or when a caller forces a flush; ready batches are handed to the
//! worker pool and delivered off the caller's path.
//!
//! Two concurrent triggers may both observe a ready buffer; `drain` is
//! atomic, so the loser receives an empty batch, which is discarded without
//! dispatch. Empty batches never reach the queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::buffer::EventBuffer;
use crate::config::Options;
use crate::dispatcher;
use crate::event::Event;
use crate::metrics::ClientMetrics;
use crate::tracker::WorkTracker;
use crate::transport::Transport;

/// Orchestrates accumulation, flush triggers, and hand-off to the workers.
pub(crate) struct Batcher {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
}

/// State shared between the public API, the timer task, and dispatch.
struct Shared {
    buffer: EventBuffer,
    tracker: Arc<WorkTracker>,
    queue: mpsc::Sender<Vec<Event>>,
    /// Signaled on every dispatch so the timer window restarts from the
    /// last flush rather than accumulating wall-clock epochs.
    flushed: Notify,
    enabled: AtomicBool,
    metrics: Arc<ClientMetrics>,
}

impl Batcher {
    /// Build the batcher, spawning the worker pool and the flush timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn new(
        options: &Options,
        transport: Arc<dyn Transport>,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        let (queue, receiver) = mpsc::channel(options.queue_size);
        let tracker = Arc::new(WorkTracker::new());

        dispatcher::spawn_workers(
            options.worker_count,
            receiver,
            transport,
            Arc::clone(&tracker),
            Arc::clone(&metrics),
        );

        let shared = Arc::new(Shared {
            buffer: EventBuffer::new(options.max_batch_size),
            tracker,
            queue,
            flushed: Notify::new(),
            enabled: AtomicBool::new(true),
            metrics,
        });

        let shutdown = CancellationToken::new();
        tokio::spawn(flush_timer(
            Arc::clone(&shared),
            options.max_batch_wait,
            shutdown.clone(),
        ));

        Self { shared, shutdown }
    }

    /// Accept an event.
    ///
    /// No-op while disabled. Otherwise the event is counted as outstanding,
    /// buffered, and — if the buffer just reached the threshold — the
    /// buffer is drained and dispatched. Suspends only when the dispatch
    /// queue is saturated, never for network latency.
    pub(crate) async fn add(&self, event: Event) {
        if !self.shared.enabled.load(Ordering::Acquire) {
            return;
        }

        self.shared.tracker.add(1);
        self.shared.metrics.record_accepted();

        if self.shared.buffer.append(event) {
            self.shared.dispatch().await;
        }
    }

    /// Drain the buffer and dispatch the batch if non-empty.
    ///
    /// Returns before delivery completes.
    pub(crate) async fn flush(&self) {
        self.shared.dispatch().await;
    }

    /// Suspend until every accepted event has been processed.
    pub(crate) async fn wait(&self) {
        self.shared.tracker.wait().await;
    }

    /// Enable or disable event acceptance. While disabled, `add` performs
    /// no buffering and no outstanding-work accounting.
    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Acquire)
    }

    /// Graceful teardown: flush, wait for all deliveries, then stop the
    /// timer and release the queue so workers drain and exit. Buffered
    /// events are never discarded.
    pub(crate) async fn close(self) {
        self.shared.dispatch().await;
        self.shared.tracker.wait().await;
        self.shutdown.cancel();
        tracing::debug!("batcher closed");
    }
}

impl Shared {
    /// Atomically swap out the buffer contents and enqueue them.
    ///
    /// A concurrent trigger may have emptied the buffer already; the
    /// resulting empty batch is discarded here, which is what makes the
    /// double-drain race harmless.
    async fn dispatch(&self) {
        let batch = self.buffer.drain();
        if batch.is_empty() {
            return;
        }

        self.flushed.notify_waiters();
        self.metrics.record_dispatched();

        let count = batch.len();
        tracing::trace!(events = count, "batch dispatched");

        if self.queue.send(batch).await.is_err() {
            // Workers are gone; account for the events so wait() still
            // terminates.
            tracing::warn!(events = count, "dispatch queue closed, batch dropped");
            self.tracker.done(count);
        }
    }
}

/// Background task bounding event staleness to `period`.
///
/// Each tick flushes a non-empty buffer; a tick against an empty buffer is
/// a no-op. Any dispatch (size-triggered or explicit) resets the window.
async fn flush_timer(shared: Arc<Shared>, period: Duration, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                shared.dispatch().await;
            }
            _ = shared.flushed.notified() => {
                interval.reset();
            }
            _ = shutdown.cancelled() => break,
        }
    }

    tracing::debug!("flush timer stopped");
}

#[cfg(test)]
#[path = "batcher_test.rs"]
mod batcher_test;
