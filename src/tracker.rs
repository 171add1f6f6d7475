//! Outstanding-work tracking.
//!
//! Counts events that have been accepted but not yet fully processed
//! (delivered or abandoned), and lets callers suspend until the count
//! reaches zero. This is what backs the client's `wait()` contract.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Concurrency-safe counter with an async zero-wait.
///
/// Incremented once per accepted event, decremented once per event by
/// whichever worker processes the batch containing it, after the delivery
/// attempt concludes regardless of outcome. The count never goes negative.
#[derive(Debug, Default)]
pub(crate) struct WorkTracker {
    pending: AtomicUsize,
    zero: Notify,
}

impl WorkTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `n` newly accepted events.
    pub(crate) fn add(&self, n: usize) {
        self.pending.fetch_add(n, Ordering::AcqRel);
    }

    /// Record `n` fully processed events, waking waiters when the count
    /// reaches zero.
    pub(crate) fn done(&self, n: usize) {
        if n == 0 {
            return;
        }
        let prev = self.pending.fetch_sub(n, Ordering::AcqRel);
        debug_assert!(prev >= n, "tracker underflow: {prev} - {n}");
        if prev == n {
            self.zero.notify_waiters();
        }
    }

    /// Current number of outstanding events.
    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Suspend until the count reaches zero.
    ///
    /// Returns immediately when nothing is outstanding. Events accepted
    /// while waiting extend the wait. Safe to call repeatedly and from
    /// multiple tasks.
    pub(crate) async fn wait(&self) {
        loop {
            // Register interest before checking the count, so a decrement
            // to zero between the check and the await is not missed.
            let notified = self.zero.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}
