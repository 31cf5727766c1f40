//! Read-side filters for `list_events`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    event::{Event, EventType},
    timestamp::TimestampStatus,
};

/// Criteria for listing a scope's events.
///
/// Every populated field must match. An empty filter returns the whole
/// scope; results are always ordered by `sequence_number` ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    /// Inclusive lower bound on `sequence_number`.
    pub from_sequence: Option<u64>,
    /// Inclusive upper bound on `sequence_number`.
    pub to_sequence: Option<u64>,
    /// Inclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    pub timestamp_status: Option<TimestampStatus>,
    /// Maximum number of events to return, counted after all other criteria.
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn of_type(event_type: impl Into<String>) -> Self {
        Self {
            event_type: Some(EventType::new(event_type)),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TimestampStatus) -> Self {
        self.timestamp_status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Return true if `event` satisfies every criterion except `limit`.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(kind) = &self.event_type {
            if &event.event_type != kind {
                return false;
            }
        }
        if self.from_sequence.is_some_and(|from| event.sequence_number < from) {
            return false;
        }
        if self.to_sequence.is_some_and(|to| event.sequence_number > to) {
            return false;
        }
        if self.created_after.is_some_and(|after| event.created_at < after) {
            return false;
        }
        if self.created_before.is_some_and(|before| event.created_at >= before) {
            return false;
        }
        if self.timestamp_status.is_some_and(|status| event.timestamp_status != status) {
            return false;
        }
        true
    }
}
