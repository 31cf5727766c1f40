//! Certified event and chain-head types.
//!
//! An `Event` is created exactly once, by the log's append path, and is never
//! modified afterwards except for the qualified-timestamp metadata, which is
//! not an input to `link_hash`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp::{QualifiedTimestamp, TimestampStatus};

/// Unique identifier of a single certified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub uuid::Uuid);

impl EventId {
    /// Create a new, unique event ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the case, contract or thread a chain belongs to.
///
/// Chains are scoped: every scope has its own genesis, head and sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ScopeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Tag naming the kind of fact an event records (e.g. `document.uploaded`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(pub String);

impl EventType {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One certified fact in a scope's hash chain.
///
/// The serialized shape (camelCase) is the persisted record and the unit of
/// a scope export: it carries everything a third party needs to recompute
/// `payload_digest` and `link_hash` offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,

    pub scope_id: ScopeId,

    #[serde(rename = "type")]
    pub event_type: EventType,

    /// The fact itself. Only null, booleans, numbers, strings, lists and
    /// string-keyed maps are accepted by the append path.
    pub payload: Value,

    /// SHA-256 (hex) of the canonical serialization of `payload`.
    pub payload_digest: String,

    /// `link_hash` of the preceding event in the scope, or
    /// `Event::GENESIS_HASH` for sequence 0.
    pub previous_hash: String,

    /// SHA-256 (hex) of the canonical serialization of
    /// `(previousHash, payloadDigest, sequenceNumber, createdAt, type, scopeId)`.
    pub link_hash: String,

    /// Position in the scope's chain, starting at 0 with no gaps.
    pub sequence_number: u64,

    /// Log-assigned append time, truncated to microseconds.
    pub created_at: DateTime<Utc>,

    /// Canonicalization rule set the hashes were computed with.
    pub canonical_version: u32,

    pub timestamp_status: TimestampStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_timestamp: Option<QualifiedTimestamp>,
}

impl Event {
    /// The `previous_hash` of the first event of every scope.
    ///
    /// 64 hex zeros; no real SHA-256 output is expected to collide with it.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    /// The chain head this event establishes once committed.
    pub fn as_head(&self) -> ChainHead {
        ChainHead {
            scope_id: self.scope_id.clone(),
            sequence_number: self.sequence_number,
            link_hash: self.link_hash.clone(),
        }
    }
}

/// The most recently appended position of a scope's chain.
///
/// Owned by the log; stores compare against it before committing a new
/// event so that two writers can never claim the same sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainHead {
    pub scope_id: ScopeId,
    pub sequence_number: u64,
    pub link_hash: String,
}
