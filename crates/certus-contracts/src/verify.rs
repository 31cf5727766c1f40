//! Chain verification outcomes.
//!
//! `verify_chain` either covers the full contiguous range of a scope or stops
//! at the first divergence. A divergence is a finding, never something the
//! log repairs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::ScopeId;

/// The class of mismatch found while walking a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DivergenceKind {
    /// The stored payload no longer hashes to the stored `payload_digest`.
    PayloadDigestMismatch,
    /// `previous_hash` does not equal the preceding event's `link_hash`.
    PreviousHashMismatch,
    /// The stored `link_hash` does not match the recomputed one.
    LinkHashMismatch,
    /// Sequence numbers are not contiguous from 0.
    SequenceGap,
    /// An event carries a different `scope_id` than the chain being walked.
    ScopeMismatch,
    /// An attached qualified timestamp attests a digest other than `link_hash`.
    TimestampDigestMismatch,
    /// The event was hashed with a canonicalization version this build lacks.
    UnsupportedCanonicalVersion,
    /// `created_at` carries digits below a microsecond, which the link hash
    /// never covers.
    CreatedAtPrecision,
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PayloadDigestMismatch => "payload digest mismatch",
            Self::PreviousHashMismatch => "previous hash mismatch",
            Self::LinkHashMismatch => "link hash mismatch",
            Self::SequenceGap => "sequence gap",
            Self::ScopeMismatch => "scope mismatch",
            Self::TimestampDigestMismatch => "timestamp digest mismatch",
            Self::UnsupportedCanonicalVersion => "unsupported canonical version",
            Self::CreatedAtPrecision => "created-at precision",
        };
        f.write_str(label)
    }
}

/// The first point at which a chain stopped verifying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDivergence {
    pub scope_id: ScopeId,
    pub sequence_number: u64,
    pub kind: DivergenceKind,
    /// The value verification expected (recomputed or linked).
    pub expected: String,
    /// The value actually stored.
    pub actual: String,
}

impl fmt::Display for ChainDivergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in scope '{}' at sequence {}: expected {}, found {}",
            self.kind, self.scope_id, self.sequence_number, self.expected, self.actual
        )
    }
}

/// Result of walking a scope's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum VerificationResult {
    /// Every event recomputed correctly and linked contiguously.
    #[serde(rename_all = "camelCase")]
    Verified {
        scope_id: ScopeId,
        event_count: u64,
        /// `link_hash` of the last event, or `None` for an empty scope.
        head_hash: Option<String>,
    },
    /// Verification stopped at the first mismatch.
    Diverged(ChainDivergence),
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    pub fn divergence(&self) -> Option<&ChainDivergence> {
        match self {
            Self::Diverged(d) => Some(d),
            Self::Verified { .. } => None,
        }
    }
}

/// A single failed check from the offline export verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineFailure {
    /// Sequence number of the offending event, or `None` for export-level checks.
    pub sequence_number: Option<u64>,
    /// Stable identifier of the check that failed, e.g. `"link-hash"`.
    pub rule_id: String,
    pub message: String,
}

/// Outcome of verifying an exported chain without access to the log.
///
/// Unlike `VerificationResult`, every failure is collected so an auditor
/// sees the full picture in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineReport {
    pub passed: bool,
    pub events_checked: u64,
    /// `linkHash` of the last exported event, if any.
    pub terminal_hash: Option<String>,
    pub failures: Vec<OfflineFailure>,
}

impl OfflineReport {
    /// Failures attributed to `sequence_number`.
    pub fn failures_at(&self, sequence_number: u64) -> impl Iterator<Item = &OfflineFailure> {
        self.failures
            .iter()
            .filter(move |f| f.sequence_number == Some(sequence_number))
    }
}
