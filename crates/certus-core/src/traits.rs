//! Trait definitions for the Certus storage and timestamping boundaries.

use certus_contracts::{
    error::CertusResult,
    event::{ChainHead, Event, EventId, ScopeId},
    timestamp::QualifiedTimestamp,
};

/// Durable storage for certified events.
///
/// Implementations are **untrusted** with respect to integrity: the log
/// re-derives every hash on verification and treats the store as a plain
/// row sink. They must, however, provide atomic compare-and-swap on the
/// scope head so two writers can never commit the same sequence number.
pub trait EventStore: Send + Sync {
    /// Return the scope's current head, or `None` for a scope with no events.
    fn head(&self, scope_id: &ScopeId) -> CertusResult<Option<ChainHead>>;

    /// Commit `event` iff the scope's head still equals `expected_head`.
    ///
    /// `expected_head` is `None` when the caller believes the scope is empty.
    /// On mismatch, returns `CertusError::ChainHeadConflict` and stores
    /// nothing. The check and the write must be atomic with respect to other
    /// commits on the same scope.
    fn commit(&self, expected_head: Option<&ChainHead>, event: &Event) -> CertusResult<()>;

    /// Fetch a single event by ID.
    fn get(&self, event_id: &EventId) -> CertusResult<Option<Event>>;

    /// A consistent snapshot of every event in the scope, in sequence order.
    ///
    /// Must never include a half-written event: the snapshot reflects the
    /// scope either before or after any concurrent commit.
    fn scope_events(&self, scope_id: &ScopeId) -> CertusResult<Vec<Event>>;

    /// Attach a qualified timestamp to a pending event.
    ///
    /// Only the timestamp metadata changes; every hashed field is left as
    /// committed. Returns `Ok(false)` if the event already carries a
    /// timestamp or does not require one, `EventNotFound` if it is unknown.
    fn attach_timestamp(
        &self,
        event_id: &EventId,
        timestamp: &QualifiedTimestamp,
    ) -> CertusResult<bool>;
}

/// Client for a Qualified Timestamping Service Provider.
///
/// Transport is left to the implementation. Failures are reported as
/// `CertusError::TimestampUnavailable` and are always retryable.
pub trait TimestampClient: Send + Sync {
    /// Request a qualified timestamp attesting `digest_hex`.
    fn request_timestamp(&self, digest_hex: &str) -> CertusResult<QualifiedTimestamp>;
}
