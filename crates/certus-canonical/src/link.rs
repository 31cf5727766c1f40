//! Chain link composition.
//!
//! An event's `link_hash` is the digest of a canonical map over
//! `(previousHash, payloadDigest, sequenceNumber, createdAt, type, scopeId)`.
//! `createdAt` is rendered as RFC 3339 UTC with exactly six fractional digits.
//! The qualified timestamp is deliberately absent from the material.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use certus_contracts::{
    error::{CertusError, CertusResult},
    event::Event,
};

use crate::{canonicalizer::Canonicalizer, digest::digest_value_with};

/// Fixed rendering of `created_at` inside the link material.
pub fn format_created_at(created_at: &DateTime<Utc>) -> String {
    created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The fields that a link hash commits to.
#[derive(Debug, Clone, Copy)]
pub struct LinkMaterial<'a> {
    pub previous_hash: &'a str,
    pub payload_digest: &'a str,
    pub sequence_number: u64,
    pub created_at: &'a DateTime<Utc>,
    pub event_type: &'a str,
    pub scope_id: &'a str,
}

impl<'a> LinkMaterial<'a> {
    /// Link material read back from a stored event.
    pub fn from_event(event: &'a Event) -> Self {
        Self {
            previous_hash: &event.previous_hash,
            payload_digest: &event.payload_digest,
            sequence_number: event.sequence_number,
            created_at: &event.created_at,
            event_type: event.event_type.as_str(),
            scope_id: event.scope_id.as_str(),
        }
    }

    /// Compute the link hash under `canonicalizer`.
    pub fn link_hash(&self, canonicalizer: &Canonicalizer) -> CertusResult<String> {
        let material = json!({
            "previousHash": self.previous_hash,
            "payloadDigest": self.payload_digest,
            "sequenceNumber": self.sequence_number,
            "createdAt": format_created_at(self.created_at),
            "type": self.event_type,
            "scopeId": self.scope_id,
        });
        digest_value_with(canonicalizer, &material)
    }
}

/// Digest of a full persisted record, for re-hashing in external audits.
///
/// Uses the same canonicalizer as the chain itself.
pub fn record_digest(event: &Event) -> CertusResult<String> {
    let canonicalizer = Canonicalizer::for_version(event.canonical_version)?;
    let record = serde_json::to_value(event).map_err(|e| CertusError::UnserializableValue {
        path: "root".to_string(),
        reason: format!("event record is not serializable: {}", e),
    })?;
    digest_value_with(&canonicalizer, &record)
}
