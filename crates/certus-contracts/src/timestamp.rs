//! Qualified timestamp metadata.
//!
//! A qualified timestamp is attached to an event after it is committed. It
//! attests the event's `link_hash` but never feeds into it, so a late or
//! missing timestamp degrades evidence without breaking the chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A token returned by a Qualified Timestamping Service Provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedTimestamp {
    /// Identity of the issuing QTSP.
    pub issuer: String,

    /// Time the issuer asserts the digest existed.
    pub asserted_time: DateTime<Utc>,

    /// Opaque proof or reference (token, signature, receipt ID).
    pub proof: String,

    /// The hex digest the issuer attested. Must equal the event's `link_hash`.
    pub digest: String,
}

/// Where an event stands with respect to qualified timestamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampStatus {
    /// The event type is configured to skip external timestamping.
    NotRequired,
    /// A timestamp is required but has not been attached yet.
    Pending,
    /// `qualified_timestamp` is present.
    Attached,
}
