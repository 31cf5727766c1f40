//! Hash-chain primitives: sealing new events and walking stored chains.
//!
//! An event's hashes are computed in two layers:
//!
//!   1. `payload_digest` = SHA-256 of the canonical payload
//!   2. `link_hash` = SHA-256 of the canonical map over
//!      (previousHash, payloadDigest, sequenceNumber, createdAt, type, scopeId)
//!
//! `verify_events` recomputes both layers from stored data alone, so it
//! trusts the digest engine and nothing about the storage layer.

use chrono::{SecondsFormat, SubsecRound, Timelike, Utc};
use serde_json::Value;

use certus_canonical::{digest_value_with, format_created_at, Canonicalizer, LinkMaterial};
use certus_contracts::{
    error::CertusResult,
    event::{ChainHead, Event, EventId, EventType, ScopeId},
    timestamp::TimestampStatus,
    verify::{ChainDivergence, DivergenceKind, VerificationResult},
};

/// SHA-256 of the canonical serialization of `payload`.
pub fn payload_digest(canonicalizer: &Canonicalizer, payload: &Value) -> CertusResult<String> {
    digest_value_with(canonicalizer, payload)
}

/// Build the next event of a scope on top of `head`.
///
/// `head` is `None` for an empty scope, in which case the event becomes
/// sequence 0 linked to `Event::GENESIS_HASH`. `created_at` is taken from the
/// local clock and truncated to microseconds so the stored value and the
/// hashed rendering agree exactly.
pub fn seal_event(
    canonicalizer: &Canonicalizer,
    head: Option<&ChainHead>,
    scope_id: &ScopeId,
    event_type: &EventType,
    payload: &Value,
    payload_digest: &str,
    timestamp_status: TimestampStatus,
) -> CertusResult<Event> {
    let (previous_hash, sequence_number) = match head {
        Some(h) => (h.link_hash.clone(), h.sequence_number + 1),
        None => (Event::GENESIS_HASH.to_string(), 0),
    };
    let created_at = Utc::now().trunc_subsecs(6);

    let link_hash = LinkMaterial {
        previous_hash: &previous_hash,
        payload_digest,
        sequence_number,
        created_at: &created_at,
        event_type: event_type.as_str(),
        scope_id: scope_id.as_str(),
    }
    .link_hash(canonicalizer)?;

    Ok(Event {
        id: EventId::new(),
        scope_id: scope_id.clone(),
        event_type: event_type.clone(),
        payload: payload.clone(),
        payload_digest: payload_digest.to_string(),
        previous_hash,
        link_hash,
        sequence_number,
        created_at,
        canonical_version: canonicalizer.version().as_u32(),
        timestamp_status,
        qualified_timestamp: None,
    })
}

/// Verify a scope's events, given in stored order.
///
/// Checks, per event and in this order: contiguous sequence from 0, scope
/// membership, a known canonicalization version, linkage of `previous_hash`,
/// the recomputed `payload_digest`, microsecond precision of `created_at`,
/// the recomputed `link_hash`, and that any attached qualified timestamp
/// attests the `link_hash`.
///
/// Stops at the first divergence. An empty chain is verified.
pub fn verify_events(scope_id: &ScopeId, events: &[Event]) -> VerificationResult {
    let mut expected_prev = Event::GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        let diverged = |kind: DivergenceKind, expected: String, actual: String| {
            VerificationResult::Diverged(ChainDivergence {
                scope_id: scope_id.clone(),
                sequence_number: event.sequence_number,
                kind,
                expected,
                actual,
            })
        };

        let position = position as u64;
        if event.sequence_number != position {
            return diverged(
                DivergenceKind::SequenceGap,
                position.to_string(),
                event.sequence_number.to_string(),
            );
        }

        if &event.scope_id != scope_id {
            return diverged(
                DivergenceKind::ScopeMismatch,
                scope_id.to_string(),
                event.scope_id.to_string(),
            );
        }

        let canonicalizer = match Canonicalizer::for_version(event.canonical_version) {
            Ok(c) => c,
            Err(_) => {
                return diverged(
                    DivergenceKind::UnsupportedCanonicalVersion,
                    Canonicalizer::current().version().as_u32().to_string(),
                    event.canonical_version.to_string(),
                )
            }
        };

        if event.previous_hash != expected_prev {
            return diverged(
                DivergenceKind::PreviousHashMismatch,
                expected_prev,
                event.previous_hash.clone(),
            );
        }

        let recomputed_payload = match payload_digest(&canonicalizer, &event.payload) {
            Ok(d) => d,
            Err(e) => format!("<unhashable: {}>", e),
        };
        if recomputed_payload != event.payload_digest {
            return diverged(
                DivergenceKind::PayloadDigestMismatch,
                recomputed_payload,
                event.payload_digest.clone(),
            );
        }

        // The link material renders microseconds; anything finer is unhashed.
        if event.created_at.nanosecond() % 1_000 != 0 {
            return diverged(
                DivergenceKind::CreatedAtPrecision,
                format_created_at(&event.created_at),
                event.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            );
        }

        let recomputed_link = match LinkMaterial::from_event(event).link_hash(&canonicalizer) {
            Ok(h) => h,
            Err(e) => format!("<unhashable: {}>", e),
        };
        if recomputed_link != event.link_hash {
            return diverged(
                DivergenceKind::LinkHashMismatch,
                recomputed_link,
                event.link_hash.clone(),
            );
        }

        if let Some(ts) = &event.qualified_timestamp {
            if ts.digest != event.link_hash {
                return diverged(
                    DivergenceKind::TimestampDigestMismatch,
                    event.link_hash.clone(),
                    ts.digest.clone(),
                );
            }
        }

        expected_prev = event.link_hash.clone();
    }

    VerificationResult::Verified {
        scope_id: scope_id.clone(),
        event_count: events.len() as u64,
        head_hash: events.last().map(|e| e.link_hash.clone()),
    }
}
