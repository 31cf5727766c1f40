//! Pending-timestamp outbox.
//!
//! Appends never wait on the timestamping service. Instead, each committed
//! event that needs a qualified timestamp is queued here and drained later,
//! either by a `TimestampWorker` or by an explicit sweep.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use serde::Serialize;

use certus_contracts::event::EventId;

/// One event waiting for a qualified timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTimestamp {
    pub event_id: EventId,
    /// The digest to be attested (the event's `link_hash`).
    pub digest: String,
    /// Failed requests so far.
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Outcome of one outbox sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimestampSweep {
    /// Timestamps obtained and attached.
    pub attached: usize,
    /// Requests that failed and were queued again.
    pub still_pending: usize,
    /// Entries that exhausted `max_attempts`. They stay `pending` in storage.
    pub dropped: usize,
}

/// FIFO queue of events awaiting a qualified timestamp.
#[derive(Debug, Default)]
pub struct TimestampOutbox {
    queue: Mutex<VecDeque<PendingTimestamp>>,
}

impl TimestampOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the queue half-updated:
    // every mutation is a single push/pop/retain.
    fn queue(&self) -> MutexGuard<'_, VecDeque<PendingTimestamp>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue `event_id` unless it is already waiting. Returns true if added.
    pub fn enqueue(&self, event_id: EventId, digest: impl Into<String>) -> bool {
        let mut queue = self.queue();
        if queue.iter().any(|p| p.event_id == event_id) {
            return false;
        }
        queue.push_back(PendingTimestamp {
            event_id,
            digest: digest.into(),
            attempts: 0,
            last_error: None,
        });
        true
    }

    /// Put a failed entry back at the end of the queue.
    pub fn requeue(&self, pending: PendingTimestamp) {
        let mut queue = self.queue();
        if !queue.iter().any(|p| p.event_id == pending.event_id) {
            queue.push_back(pending);
        }
    }

    /// Remove and return every queued entry.
    pub fn take_all(&self) -> Vec<PendingTimestamp> {
        self.queue().drain(..).collect()
    }

    /// Drop `event_id` from the queue, if present.
    pub fn remove(&self, event_id: &EventId) -> bool {
        let mut queue = self.queue();
        let before = queue.len();
        queue.retain(|p| &p.event_id != event_id);
        queue.len() != before
    }

    pub fn snapshot(&self) -> Vec<PendingTimestamp> {
        self.queue().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_deduplicates_by_event_id() {
        let outbox = TimestampOutbox::new();
        let id = EventId::new();
        assert!(outbox.enqueue(id, "aa"));
        assert!(!outbox.enqueue(id, "aa"));
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn take_all_drains_in_fifo_order() {
        let outbox = TimestampOutbox::new();
        let first = EventId::new();
        let second = EventId::new();
        outbox.enqueue(first, "a");
        outbox.enqueue(second, "b");

        let drained = outbox.take_all();
        assert_eq!(drained.iter().map(|p| p.event_id).collect::<Vec<_>>(), vec![first, second]);
        assert!(outbox.is_empty());
    }

    #[test]
    fn remove_and_requeue() {
        let outbox = TimestampOutbox::new();
        let id = EventId::new();
        outbox.enqueue(id, "a");
        let mut entry = outbox.take_all().remove(0);
        entry.attempts = 2;
        outbox.requeue(entry.clone());
        assert_eq!(outbox.snapshot(), vec![entry]);
        assert!(outbox.remove(&id));
        assert!(!outbox.remove(&id));
    }
}
