//! Delivery worker pool.
//!
//! A fixed set of workers consumes ready batches from a bounded queue and
//! invokes the transport once per batch — one network call per batch is the
//! entire point of batching. Whatever the delivery outcome, the worker
//! decrements the outstanding-work tracker by the batch length so `wait()`
//! always terminates; failures are logged, never retried or re-enqueued.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::event::Event;
use crate::metrics::ClientMetrics;
use crate::tracker::WorkTracker;
use crate::transport::Transport;

/// Spawn `worker_count` worker tasks consuming from `receiver`.
///
/// Workers run until the queue is closed and drained, then exit.
pub(crate) fn spawn_workers(
    worker_count: usize,
    receiver: mpsc::Receiver<Vec<Event>>,
    transport: Arc<dyn Transport>,
    tracker: Arc<WorkTracker>,
    metrics: Arc<ClientMetrics>,
) {
    let receiver = Arc::new(Mutex::new(receiver));
    for id in 0..worker_count {
        tokio::spawn(worker_loop(
            id,
            Arc::clone(&receiver),
            Arc::clone(&transport),
            Arc::clone(&tracker),
            Arc::clone(&metrics),
        ));
    }
}

async fn worker_loop(
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Vec<Event>>>>,
    transport: Arc<dyn Transport>,
    tracker: Arc<WorkTracker>,
    metrics: Arc<ClientMetrics>,
) {
    loop {
        // Hold the receiver lock only while dequeuing; delivery runs
        // concurrently across workers.
        let batch = {
            let mut receiver = receiver.lock().await;
            match receiver.recv().await {
                Some(batch) => batch,
                None => break,
            }
        };

        let count = batch.len();
        match transport.deliver(&batch).await {
            Ok(()) => {
                metrics.record_delivered(count as u64);
                tracing::trace!(worker = id, events = count, "batch delivered");
            }
            Err(e) => {
                metrics.record_failed(count as u64);
                tracing::warn!(
                    worker = id,
                    events = count,
                    error = %e,
                    "batch delivery failed"
                );
            }
        }
        tracker.done(count);
    }

    tracing::debug!(worker = id, "dispatch worker stopped");
}
