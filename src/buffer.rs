//! Accumulation buffer for pending events.
//!
//! The buffer holds events awaiting batching and reports readiness against
//! the configured threshold. `drain` swaps the contents out atomically, so a
//! concurrent `append` lands either in the returned batch or in the fresh
//! buffer, never lost or duplicated.

use std::sync::{Mutex, PoisonError};

use crate::event::Event;

/// Upper bound on eagerly reserved slots, so a huge `max_batch_size` does
/// not translate into a huge allocation up front.
const PREALLOC_CAP: usize = 1024;

/// Append-only, drainable collection of pending events.
///
/// All operations take `&self` and are safe under concurrent callers. The
/// internal lock is never held across an await point.
#[derive(Debug)]
pub(crate) struct EventBuffer {
    capacity: usize,
    events: Mutex<Vec<Event>>,
}

impl EventBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(Vec::with_capacity(capacity.min(PREALLOC_CAP))),
        }
    }

    /// Append an event, returning true when the buffer has reached the
    /// size threshold.
    pub(crate) fn append(&self, event: Event) -> bool {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.push(event);
        events.len() >= self.capacity
    }

    /// Number of buffered events.
    pub(crate) fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Atomically remove and return all buffered events.
    ///
    /// A drain of an already-emptied buffer returns an empty batch; the
    /// caller is expected to discard it without dispatch.
    pub(crate) fn drain(&self) -> Vec<Event> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(
            &mut *events,
            Vec::with_capacity(self.capacity.min(PREALLOC_CAP)),
        )
    }
}
