//! The certified event log.
//!
//! `CertifiedEventLog` is the only component that computes or stores
//! `link_hash`. It serializes appends per scope inside the process and relies
//! on the store's compare-and-swap to catch writers in other processes, in
//! which case the whole computation is redone against the fresh head.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use certus_canonical::{digest_value_with, to_payload, Canonicalizer};
use certus_config::{CertusConfig, TimestampPolicy};
use certus_contracts::{
    error::{CertusError, CertusResult},
    event::{ChainHead, Event, EventId, EventType, ScopeId},
    export::ChainExport,
    filter::EventFilter,
    timestamp::TimestampStatus,
    verify::VerificationResult,
};
use certus_core::traits::{EventStore, TimestampClient};

use crate::{
    chain::{payload_digest, seal_event, verify_events},
    outbox::{PendingTimestamp, TimestampOutbox, TimestampSweep},
};

/// Append-only, per-scope hash-chained log of certified events.
///
/// # Thread safety
///
/// All methods take `&self`; share the log behind an `Arc`. Appends on the
/// same scope queue on a per-scope mutex, appends on different scopes run
/// in parallel.
pub struct CertifiedEventLog {
    store: Arc<dyn EventStore>,
    timestamp_client: Option<Arc<dyn TimestampClient>>,
    config: CertusConfig,
    canonicalizer: Canonicalizer,
    outbox: TimestampOutbox,
    scope_locks: Mutex<HashMap<ScopeId, Arc<Mutex<()>>>>,
}

impl CertifiedEventLog {
    /// Create a log over `store`.
    ///
    /// Returns `ConfigError` if `config` does not validate.
    pub fn new(store: Arc<dyn EventStore>, config: CertusConfig) -> CertusResult<Self> {
        config.validate()?;
        let canonicalizer = Canonicalizer::for_version(config.log.canonical_version)?;
        Ok(Self {
            store,
            timestamp_client: None,
            config,
            canonicalizer,
            outbox: TimestampOutbox::new(),
            scope_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Use `client` for qualified timestamps.
    ///
    /// Without a client, events that require a timestamp stay `pending`.
    pub fn with_timestamp_client(mut self, client: Arc<dyn TimestampClient>) -> Self {
        self.timestamp_client = Some(client);
        self
    }

    pub fn config(&self) -> &CertusConfig {
        &self.config
    }

    fn scope_lock(&self, scope_id: &ScopeId) -> CertusResult<Arc<Mutex<()>>> {
        let mut locks = self.scope_locks.lock().map_err(|_| CertusError::StorageFailure {
            reason: "scope lock table poisoned".to_string(),
        })?;
        Ok(Arc::clone(locks.entry(scope_id.clone()).or_default()))
    }

    /// Drop `lock` and forget the scope's entry once no other append holds it.
    ///
    /// Clones are only handed out under the table mutex, so a count of one
    /// there means no writer is waiting on this scope.
    fn release_scope_lock(&self, scope_id: &ScopeId, lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.scope_locks.lock() else {
            return;
        };
        drop(lock);
        if locks.get(scope_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(scope_id);
        }
    }

    #[cfg(test)]
    pub(crate) fn scope_lock_count(&self) -> usize {
        self.scope_locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    // ── Append ────────────────────────────────────────────────────────────────

    /// Append a certified event to `scope_id`'s chain.
    ///
    /// The payload is canonicalized and digested before anything else; an
    /// unserializable payload fails here with nothing written. The event is
    /// then linked to the current head and committed. On
    /// `ChainHeadConflict` the head is re-read and the event re-sealed, up to
    /// `log.max_append_attempts` times in total.
    ///
    /// The qualified timestamp is never requested inline; when the event
    /// type requires one, the event is returned as `pending` and queued.
    pub fn append(
        &self,
        scope_id: &ScopeId,
        event_type: impl Into<EventType>,
        payload: Value,
    ) -> CertusResult<Event> {
        let event_type = event_type.into();
        let digest = payload_digest(&self.canonicalizer, &payload)?;

        let status = match self.config.timestamp_policy(event_type.as_str()) {
            TimestampPolicy::Required => TimestampStatus::Pending,
            TimestampPolicy::Skip => TimestampStatus::NotRequired,
        };

        let lock = self.scope_lock(scope_id)?;
        let committed = match lock.lock() {
            Ok(_serialized) => self.seal_and_commit(scope_id, &event_type, &payload, &digest, status),
            Err(_) => Err(CertusError::StorageFailure {
                reason: format!("append lock for scope '{}' poisoned", scope_id),
            }),
        };
        self.release_scope_lock(scope_id, lock);
        let event = committed?;

        info!(
            scope_id = %scope_id,
            event_id = %event.id,
            event_type = %event.event_type,
            sequence_number = event.sequence_number,
            link_hash = %event.link_hash,
            "certified event appended"
        );

        if event.timestamp_status == TimestampStatus::Pending {
            self.outbox.enqueue(event.id, event.link_hash.clone());
        }

        Ok(event)
    }

    /// Seal against the current head and commit, re-sealing on
    /// `ChainHeadConflict` up to `log.max_append_attempts` times in total.
    fn seal_and_commit(
        &self,
        scope_id: &ScopeId,
        event_type: &EventType,
        payload: &Value,
        digest: &str,
        status: TimestampStatus,
    ) -> CertusResult<Event> {
        let max_attempts = self.config.log.max_append_attempts;
        let mut attempt = 1;
        loop {
            let head = self.store.head(scope_id)?;
            let event = seal_event(
                &self.canonicalizer,
                head.as_ref(),
                scope_id,
                event_type,
                payload,
                digest,
                status,
            )?;

            match self.store.commit(head.as_ref(), &event) {
                Ok(()) => return Ok(event),
                Err(err @ CertusError::ChainHeadConflict { .. }) => {
                    if attempt >= max_attempts {
                        warn!(
                            scope_id = %scope_id,
                            attempts = attempt,
                            "append gave up after repeated chain head conflicts"
                        );
                        return Err(err);
                    }
                    debug!(
                        scope_id = %scope_id,
                        attempt,
                        "chain head moved during append; retrying against fresh head"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Append a typed payload, rejecting values outside the canonical type set.
    pub fn append_typed<T: Serialize + ?Sized>(
        &self,
        scope_id: &ScopeId,
        event_type: impl Into<EventType>,
        payload: &T,
    ) -> CertusResult<Event> {
        let payload = to_payload(payload)?;
        self.append(scope_id, event_type, payload)
    }

    /// Record a correction of an earlier event as a new event.
    ///
    /// The stored payload is `{"corrects": <event id>, "correction": payload}`.
    /// The corrected event is never modified. It must belong to `scope_id`.
    pub fn append_correction(
        &self,
        scope_id: &ScopeId,
        corrects: &EventId,
        event_type: impl Into<EventType>,
        payload: Value,
    ) -> CertusResult<Event> {
        let original = self.get_event(corrects)?;
        if &original.scope_id != scope_id {
            return Err(CertusError::EventNotFound {
                event_id: format!("{} (in scope '{}')", corrects, scope_id),
            });
        }
        self.append(
            scope_id,
            event_type,
            json!({
                "corrects": corrects.to_string(),
                "correction": payload,
            }),
        )
    }

    // ── Verification ──────────────────────────────────────────────────────────

    /// Walk the scope's chain and recompute every hash.
    ///
    /// Reads one consistent snapshot. A divergence is returned as data and
    /// logged; nothing is repaired.
    pub fn verify_chain(&self, scope_id: &ScopeId) -> CertusResult<VerificationResult> {
        let events = self.store.scope_events(scope_id)?;
        let result = verify_events(scope_id, &events);
        match &result {
            VerificationResult::Verified { event_count, .. } => {
                debug!(scope_id = %scope_id, event_count, "chain verified");
            }
            VerificationResult::Diverged(divergence) => {
                warn!(
                    scope_id = %scope_id,
                    sequence_number = divergence.sequence_number,
                    kind = %divergence.kind,
                    expected = %divergence.expected,
                    actual = %divergence.actual,
                    "chain integrity violation"
                );
            }
        }
        Ok(result)
    }

    /// Like `verify_chain`, but a divergence becomes
    /// `CertusError::ChainIntegrityViolation`. Returns the event count.
    pub fn ensure_intact(&self, scope_id: &ScopeId) -> CertusResult<u64> {
        match self.verify_chain(scope_id)? {
            VerificationResult::Verified { event_count, .. } => Ok(event_count),
            VerificationResult::Diverged(divergence) => {
                Err(CertusError::ChainIntegrityViolation(divergence))
            }
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn head(&self, scope_id: &ScopeId) -> CertusResult<Option<ChainHead>> {
        self.store.head(scope_id)
    }

    pub fn get_event(&self, event_id: &EventId) -> CertusResult<Event> {
        self.store
            .get(event_id)?
            .ok_or_else(|| CertusError::EventNotFound {
                event_id: event_id.to_string(),
            })
    }

    /// Events of `scope_id` matching `filter`, by ascending sequence number.
    pub fn list_events(&self, scope_id: &ScopeId, filter: &EventFilter) -> CertusResult<Vec<Event>> {
        let matching = self
            .store
            .scope_events(scope_id)?
            .into_iter()
            .filter(|e| filter.matches(e));
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    /// Export every event of `scope_id` for offline verification.
    pub fn export_scope(&self, scope_id: &ScopeId) -> CertusResult<ChainExport> {
        let events = self.store.scope_events(scope_id)?;
        let records = serde_json::to_value(&events).map_err(|e| {
            CertusError::UnserializableValue {
                path: "events".to_string(),
                reason: e.to_string(),
            }
        })?;
        let export_digest = digest_value_with(&self.canonicalizer, &records)?;
        let terminal_hash = events
            .last()
            .map(|e| e.link_hash.clone())
            .unwrap_or_default();

        info!(
            scope_id = %scope_id,
            event_count = events.len(),
            terminal_hash = %terminal_hash,
            "scope exported"
        );

        Ok(ChainExport {
            scope_id: scope_id.clone(),
            exported_at: chrono::Utc::now(),
            events,
            terminal_hash,
            export_digest,
        })
    }

    // ── Qualified timestamps ──────────────────────────────────────────────────

    /// Entries currently waiting in the outbox.
    pub fn pending_timestamps(&self) -> Vec<PendingTimestamp> {
        self.outbox.snapshot()
    }

    /// Request a timestamp for `digest` and attach it to `event_id`.
    fn obtain_and_attach(
        &self,
        client: &dyn TimestampClient,
        event_id: &EventId,
        digest: &str,
    ) -> CertusResult<bool> {
        let timestamp = client.request_timestamp(digest)?;
        if timestamp.digest != digest {
            return Err(CertusError::TimestampUnavailable {
                reason: format!(
                    "issuer '{}' attested digest {} instead of {}",
                    timestamp.issuer, timestamp.digest, digest
                ),
            });
        }
        self.store.attach_timestamp(event_id, &timestamp)
    }

    /// Drain the outbox once, attaching every timestamp that can be obtained.
    ///
    /// Failures are re-queued with their attempt count; entries that reach
    /// `timestamping.max_attempts` (when non-zero) are dropped from the queue
    /// and stay `pending` in storage for `requeue_pending`.
    pub fn process_pending_timestamps(&self) -> TimestampSweep {
        let mut sweep = TimestampSweep::default();
        let Some(client) = self.timestamp_client.as_deref() else {
            sweep.still_pending = self.outbox.len();
            return sweep;
        };
        let max_attempts = self.config.timestamping.max_attempts;

        for mut pending in self.outbox.take_all() {
            match self.obtain_and_attach(client, &pending.event_id, &pending.digest) {
                Ok(attached) => {
                    if attached {
                        debug!(event_id = %pending.event_id, "qualified timestamp attached");
                    }
                    sweep.attached += usize::from(attached);
                }
                Err(err) => {
                    pending.attempts += 1;
                    pending.last_error = Some(err.to_string());
                    if max_attempts > 0 && pending.attempts >= max_attempts {
                        warn!(
                            event_id = %pending.event_id,
                            attempts = pending.attempts,
                            error = %err,
                            "giving up on qualified timestamp; event stays pending"
                        );
                        sweep.dropped += 1;
                    } else {
                        warn!(
                            event_id = %pending.event_id,
                            attempts = pending.attempts,
                            error = %err,
                            "qualified timestamp unavailable; will retry"
                        );
                        self.outbox.requeue(pending);
                        sweep.still_pending += 1;
                    }
                }
            }
        }
        sweep
    }

    /// Request a timestamp for one event immediately.
    ///
    /// Events that are not `pending` are returned unchanged. On failure the
    /// error is returned and the event stays queued for the next sweep.
    pub fn request_timestamp(&self, event_id: &EventId) -> CertusResult<Event> {
        let event = self.get_event(event_id)?;
        if event.timestamp_status != TimestampStatus::Pending {
            return Ok(event);
        }
        let client = self
            .timestamp_client
            .as_deref()
            .ok_or_else(|| CertusError::TimestampUnavailable {
                reason: "no timestamp client configured".to_string(),
            })?;

        if let Err(err) = self.obtain_and_attach(client, event_id, &event.link_hash) {
            self.outbox.enqueue(event.id, event.link_hash.clone());
            return Err(err);
        }
        self.outbox.remove(event_id);
        self.get_event(event_id)
    }

    /// Re-queue every stored `pending` event of `scope_id`.
    ///
    /// Rebuilds the outbox after a restart. Returns how many entries were
    /// newly queued.
    pub fn requeue_pending(&self, scope_id: &ScopeId) -> CertusResult<usize> {
        let pending = self.list_events(
            scope_id,
            &EventFilter::default().with_status(TimestampStatus::Pending),
        )?;
        let queued = pending
            .into_iter()
            .filter(|e| self.outbox.enqueue(e.id, e.link_hash.clone()))
            .count();
        if queued > 0 {
            info!(scope_id = %scope_id, queued, "pending timestamps re-queued");
        }
        Ok(queued)
    }
}
