//! Error types for the Certus certified event log.
//!
//! All fallible operations return `CertusResult<T>`. Variants carry enough
//! context to tell a caller whether to retry, fix its input, or escalate.

use thiserror::Error;

use crate::verify::ChainDivergence;

/// The unified error type for Certus.
#[derive(Debug, Error)]
pub enum CertusError {
    /// A payload contains a value outside the canonicalizable type set.
    ///
    /// Raised before any hashing; fatal to the call.
    #[error("unserializable value at {path}: {reason}")]
    UnserializableValue { path: String, reason: String },

    /// Another writer advanced the scope's head before this write landed.
    ///
    /// Recoverable: recompute against the new head and retry.
    #[error(
        "chain head conflict in scope '{scope_id}': expected next sequence {expected_sequence}, head is at {found_sequence:?}"
    )]
    ChainHeadConflict {
        scope_id: String,
        expected_sequence: u64,
        found_sequence: Option<u64>,
    },

    /// The qualified timestamping service could not issue a token.
    ///
    /// Never surfaces as an append failure; the event stays pending.
    #[error("qualified timestamp unavailable: {reason}")]
    TimestampUnavailable { reason: String },

    /// Verification found a hash or linkage mismatch.
    #[error("chain integrity violation: {0}")]
    ChainIntegrityViolation(ChainDivergence),

    #[error("event '{event_id}' not found")]
    EventNotFound { event_id: String },

    /// The backing store failed to read or persist.
    #[error("storage failure: {reason}")]
    StorageFailure { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// No essential-field schema is configured for this event type.
    #[error("no essential-field schema configured for event type '{event_type}'")]
    UnknownEssentialSchema { event_type: String },

    #[error("unsupported canonicalization version {version}")]
    UnsupportedCanonicalVersion { version: u32 },

    /// A scope export did not match the expected document shape.
    #[error("malformed chain export: {reason}")]
    ExportMalformed { reason: String },
}

impl CertusError {
    /// True for errors a caller may resolve by simply trying again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ChainHeadConflict { .. } | Self::TimestampUnavailable { .. }
        )
    }
}

/// Convenience alias used throughout the Certus crates.
pub type CertusResult<T> = Result<T, CertusError>;
