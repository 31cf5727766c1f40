//! # certus-log
//!
//! Append-only, per-scope, SHA-256 hash-chained certified event log.
//!
//! ## Overview
//!
//! Every legally relevant fact (document upload, signature, communication,
//! state transition) is appended as an `Event` linked to its predecessor by
//! `link_hash`. Editing or removing any stored event, even by a single byte,
//! breaks the chain and is reported by `verify_chain` at the exact sequence
//! number. Qualified timestamps are attached afterwards through an outbox,
//! so a slow or unavailable QTSP never blocks an append.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use certus_config::CertusConfig;
//! use certus_log::{CertifiedEventLog, InMemoryEventStore};
//!
//! let log = CertifiedEventLog::new(Arc::new(InMemoryEventStore::new()), CertusConfig::default())?
//!     .with_timestamp_client(qtsp);
//! let scope = ScopeId::new("contract-2026-001");
//! log.append(&scope, "document.uploaded", json!({ "sha256": doc_hash }))?;
//!
//! assert!(log.verify_chain(&scope)?.is_verified());
//! log.process_pending_timestamps();
//! ```

pub mod chain;
pub mod log;
pub mod memory;
pub mod outbox;
pub mod worker;

pub use chain::{payload_digest, seal_event, verify_events};
pub use log::CertifiedEventLog;
pub use memory::InMemoryEventStore;
pub use outbox::{PendingTimestamp, TimestampOutbox, TimestampSweep};
pub use worker::TimestampWorker;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    use chrono::Utc;
    use serde_json::{json, Value};

    use certus_canonical::{digest_value, Canonicalizer};
    use certus_config::CertusConfig;
    use certus_contracts::{
        error::{CertusError, CertusResult},
        event::{ChainHead, Event, EventId, EventType, ScopeId},
        filter::EventFilter,
        timestamp::{QualifiedTimestamp, TimestampStatus},
        verify::{DivergenceKind, VerificationResult},
    };
    use certus_core::traits::{EventStore, TimestampClient};

    use super::{seal_event, verify_events, CertifiedEventLog, InMemoryEventStore, TimestampWorker};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// A timestamping stub whose availability can be switched at runtime.
    struct StubQtsp {
        available: AtomicBool,
        calls: AtomicUsize,
        wrong_digest: bool,
    }

    impl StubQtsp {
        fn up() -> Arc<Self> {
            Arc::new(Self {
                available: AtomicBool::new(true),
                calls: AtomicUsize::new(0),
                wrong_digest: false,
            })
        }

        fn down() -> Arc<Self> {
            let qtsp = Self::up();
            qtsp.available.store(false, Ordering::SeqCst);
            qtsp
        }
    }

    impl TimestampClient for StubQtsp {
        fn request_timestamp(&self, digest_hex: &str) -> CertusResult<QualifiedTimestamp> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.available.load(Ordering::SeqCst) {
                return Err(CertusError::TimestampUnavailable {
                    reason: "stub qtsp offline".to_string(),
                });
            }
            Ok(QualifiedTimestamp {
                issuer: "stub-qtsp".to_string(),
                asserted_time: Utc::now(),
                proof: format!("token-{}", &digest_hex[..8]),
                digest: if self.wrong_digest {
                    "f".repeat(64)
                } else {
                    digest_hex.to_string()
                },
            })
        }
    }

    /// Store wrapper that lets a rival writer win the first commit race.
    struct RacingStore {
        inner: InMemoryEventStore,
        raced: AtomicBool,
        conflicts: AtomicUsize,
    }

    impl RacingStore {
        fn new() -> Self {
            Self {
                inner: InMemoryEventStore::new(),
                raced: AtomicBool::new(false),
                conflicts: AtomicUsize::new(0),
            }
        }
    }

    impl EventStore for RacingStore {
        fn head(&self, scope_id: &ScopeId) -> CertusResult<Option<ChainHead>> {
            self.inner.head(scope_id)
        }

        fn commit(&self, expected_head: Option<&ChainHead>, event: &Event) -> CertusResult<()> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                let rival_payload = json!({ "rival": true });
                let rival = seal_event(
                    &Canonicalizer::current(),
                    expected_head,
                    &event.scope_id,
                    &EventType::new("rival.write"),
                    &rival_payload,
                    &digest_value(&rival_payload).unwrap(),
                    TimestampStatus::NotRequired,
                )
                .unwrap();
                self.inner.commit(expected_head, &rival).unwrap();
            }
            let result = self.inner.commit(expected_head, event);
            if matches!(result, Err(CertusError::ChainHeadConflict { .. })) {
                self.conflicts.fetch_add(1, Ordering::SeqCst);
            }
            result
        }

        fn get(&self, event_id: &EventId) -> CertusResult<Option<Event>> {
            self.inner.get(event_id)
        }

        fn scope_events(&self, scope_id: &ScopeId) -> CertusResult<Vec<Event>> {
            self.inner.scope_events(scope_id)
        }

        fn attach_timestamp(
            &self,
            event_id: &EventId,
            timestamp: &QualifiedTimestamp,
        ) -> CertusResult<bool> {
            self.inner.attach_timestamp(event_id, timestamp)
        }
    }

    fn scope(id: &str) -> ScopeId {
        ScopeId::new(id)
    }

    fn new_log() -> (Arc<InMemoryEventStore>, CertifiedEventLog) {
        let store = Arc::new(InMemoryEventStore::new());
        let log = CertifiedEventLog::new(store.clone(), CertusConfig::default()).unwrap();
        (store, log)
    }

    fn skip_timestamps() -> CertusConfig {
        CertusConfig::from_toml_str("[timestamping]\ndefault = \"skip\"\n").unwrap()
    }

    fn append_n(log: &CertifiedEventLog, scope_id: &ScopeId, n: u64) -> Vec<Event> {
        (0..n)
            .map(|i| {
                log.append(scope_id, "document.uploaded", json!({ "doc": i, "name": format!("doc-{i}.pdf") }))
                    .unwrap()
            })
            .collect()
    }

    fn divergence_of(result: VerificationResult) -> (u64, DivergenceKind) {
        match result {
            VerificationResult::Diverged(d) => (d.sequence_number, d.kind),
            other => panic!("expected divergence, got {:?}", other),
        }
    }

    // ── Append & chain shape ──────────────────────────────────────────────────

    /// After N sequential appends the chain verifies and runs 0..N-1.
    #[test]
    fn test_sequential_appends_verify() {
        let (_, log) = new_log();
        let s = scope("contract-001");
        let events = append_n(&log, &s, 10);

        for (idx, event) in events.iter().enumerate() {
            assert_eq!(event.sequence_number, idx as u64);
        }
        match log.verify_chain(&s).unwrap() {
            VerificationResult::Verified { event_count, head_hash, .. } => {
                assert_eq!(event_count, 10);
                assert_eq!(head_hash.as_deref(), Some(events[9].link_hash.as_str()));
            }
            other => panic!("expected Verified, got {:?}", other),
        }
    }

    /// The first event links to the genesis hash; later ones to their predecessor.
    #[test]
    fn test_previous_hash_linkage() {
        let (_, log) = new_log();
        let s = scope("contract-002");
        let events = append_n(&log, &s, 3);

        assert_eq!(events[0].previous_hash, Event::GENESIS_HASH);
        assert_eq!(events[1].previous_hash, events[0].link_hash);
        assert_eq!(events[2].previous_hash, events[1].link_hash);
    }

    #[test]
    fn test_head_advances_by_one_per_append() {
        let (_, log) = new_log();
        let s = scope("contract-003");
        assert_eq!(log.head(&s).unwrap(), None);

        let first = log.append(&s, "communication.sent", json!({ "to": "notary" })).unwrap();
        assert_eq!(log.head(&s).unwrap(), Some(first.as_head()));

        let second = log.append(&s, "communication.sent", json!({ "to": "buyer" })).unwrap();
        let head = log.head(&s).unwrap().unwrap();
        assert_eq!(head.sequence_number, 1);
        assert_eq!(head.link_hash, second.link_hash);
    }

    #[test]
    fn test_payload_digest_is_reproducible() {
        let (_, log) = new_log();
        let s = scope("contract-004");
        let event = log
            .append(&s, "contract.terms_recorded", json!({ "price": 250000, "parties": ["V", "B"] }))
            .unwrap();
        assert_eq!(event.payload_digest, digest_value(&event.payload).unwrap());
        assert_eq!(event.canonical_version, 1);
    }

    /// Scopes are independent chains, each with its own genesis.
    #[test]
    fn test_scopes_are_independent() {
        let (_, log) = new_log();
        let a = scope("contract-a");
        let b = scope("contract-b");
        append_n(&log, &a, 3);
        let first_b = log.append(&b, "document.uploaded", json!({})).unwrap();

        assert_eq!(first_b.sequence_number, 0);
        assert_eq!(first_b.previous_hash, Event::GENESIS_HASH);
        assert!(log.verify_chain(&a).unwrap().is_verified());
        assert!(log.verify_chain(&b).unwrap().is_verified());
    }

    #[test]
    fn test_empty_scope_verifies() {
        let (_, log) = new_log();
        match log.verify_chain(&scope("nothing-here")).unwrap() {
            VerificationResult::Verified { event_count, head_hash, .. } => {
                assert_eq!(event_count, 0);
                assert_eq!(head_hash, None);
            }
            other => panic!("expected Verified, got {:?}", other),
        }
        assert!(verify_events(&scope("x"), &[]).is_verified());
    }

    /// Unserializable payloads are rejected before anything is written.
    #[test]
    fn test_unserializable_payload_rejected_before_write() {
        let (_, log) = new_log();
        let s = scope("contract-005");

        let mut deep = json!(0);
        for _ in 0..200 {
            deep = json!([deep]);
        }
        assert!(matches!(
            log.append(&s, "document.uploaded", deep),
            Err(CertusError::UnserializableValue { .. })
        ));

        #[derive(serde::Serialize)]
        struct Offer {
            price: f64,
        }
        assert!(matches!(
            log.append_typed(&s, "contract.terms_recorded", &Offer { price: f64::NAN }),
            Err(CertusError::UnserializableValue { .. })
        ));

        assert_eq!(log.head(&s).unwrap(), None);
    }

    #[test]
    fn test_append_typed_accepts_structs() {
        #[derive(serde::Serialize)]
        struct Signature<'a> {
            signer: &'a str,
            method: &'a str,
        }
        let (_, log) = new_log();
        let event = log
            .append_typed(
                &scope("contract-006"),
                "document.signed",
                &Signature { signer: "Buyer Ana", method: "qualified-esign" },
            )
            .unwrap();
        assert_eq!(event.payload, json!({ "signer": "Buyer Ana", "method": "qualified-esign" }));
    }

    // ── Tamper detection ──────────────────────────────────────────────────────

    /// Editing a stored payload is reported at the exact sequence number.
    #[test]
    fn test_payload_tamper_detected_at_sequence() {
        let (store, log) = new_log();
        let s = scope("contract-tamper-payload");
        append_n(&log, &s, 5);

        store.tamper(&s, |events| events[3].payload = json!({ "doc": 3, "name": "forged.pdf" }));

        assert_eq!(
            divergence_of(log.verify_chain(&s).unwrap()),
            (3, DivergenceKind::PayloadDigestMismatch)
        );
    }

    #[test]
    fn test_previous_hash_tamper_detected_at_sequence() {
        let (store, log) = new_log();
        let s = scope("contract-tamper-prev");
        append_n(&log, &s, 5);

        store.tamper(&s, |events| events[2].previous_hash = "ab".repeat(32));

        assert_eq!(
            divergence_of(log.verify_chain(&s).unwrap()),
            (2, DivergenceKind::PreviousHashMismatch)
        );
    }

    /// Re-digesting a forged payload still breaks the link hash.
    #[test]
    fn test_consistent_payload_forgery_detected_by_link_hash() {
        let (store, log) = new_log();
        let s = scope("contract-tamper-consistent");
        append_n(&log, &s, 4);

        store.tamper(&s, |events| {
            let forged = json!({ "doc": 1, "name": "forged.pdf" });
            events[1].payload_digest = digest_value(&forged).unwrap();
            events[1].payload = forged;
        });

        assert_eq!(
            divergence_of(log.verify_chain(&s).unwrap()),
            (1, DivergenceKind::LinkHashMismatch)
        );
    }

    #[test]
    fn test_created_at_tamper_detected() {
        let (store, log) = new_log();
        let s = scope("contract-tamper-time");
        append_n(&log, &s, 3);

        store.tamper(&s, |events| events[0].created_at -= chrono::Duration::days(30));

        assert_eq!(
            divergence_of(log.verify_chain(&s).unwrap()),
            (0, DivergenceKind::LinkHashMismatch)
        );
    }

    #[test]
    fn test_sub_microsecond_created_at_edit_detected() {
        let (store, log) = new_log();
        let s = scope("contract-tamper-nanos");
        append_n(&log, &s, 3);

        store.tamper(&s, |events| events[1].created_at += chrono::Duration::nanoseconds(999));

        match log.verify_chain(&s).unwrap() {
            VerificationResult::Diverged(d) => {
                assert_eq!(d.sequence_number, 1);
                assert_eq!(d.kind, DivergenceKind::CreatedAtPrecision);
                assert!(d.actual.ends_with("999Z"), "unexpected actual: {}", d.actual);
            }
            other => panic!("expected Diverged, got {:?}", other),
        }
    }

    #[test]
    fn test_removed_event_detected_as_gap() {
        let (store, log) = new_log();
        let s = scope("contract-tamper-remove");
        append_n(&log, &s, 4);

        store.tamper(&s, |events| {
            events.remove(1);
        });

        let (sequence, kind) = divergence_of(log.verify_chain(&s).unwrap());
        assert_eq!(kind, DivergenceKind::SequenceGap);
        assert_eq!(sequence, 2);
    }

    #[test]
    fn test_timestamp_for_other_digest_detected() {
        let (store, log) = new_log();
        let s = scope("contract-tamper-ts");
        append_n(&log, &s, 2);

        store.tamper(&s, |events| {
            events[1].timestamp_status = TimestampStatus::Attached;
            events[1].qualified_timestamp = Some(QualifiedTimestamp {
                issuer: "forger".to_string(),
                asserted_time: Utc::now(),
                proof: "x".to_string(),
                digest: "0".repeat(64),
            });
        });

        assert_eq!(
            divergence_of(log.verify_chain(&s).unwrap()),
            (1, DivergenceKind::TimestampDigestMismatch)
        );
    }

    #[test]
    fn test_unknown_canonical_version_detected() {
        let (store, log) = new_log();
        let s = scope("contract-tamper-version");
        append_n(&log, &s, 1);

        store.tamper(&s, |events| events[0].canonical_version = 99);

        assert_eq!(
            divergence_of(log.verify_chain(&s).unwrap()),
            (0, DivergenceKind::UnsupportedCanonicalVersion)
        );
    }

    /// Rows restored from a doctored backup are caught before being trusted.
    #[test]
    fn test_restored_rows_are_verified_not_trusted() {
        let (_, log) = new_log();
        let s = scope("contract-backup");
        append_n(&log, &s, 3);
        let mut backup = log.export_scope(&s).unwrap().events;
        backup[1].payload = json!({ "doc": 1, "name": "swapped.pdf" });

        let restored = Arc::new(InMemoryEventStore::new());
        assert_eq!(restored.restore(backup.clone()).unwrap(), 3);
        let restored_log = CertifiedEventLog::new(restored.clone(), CertusConfig::default()).unwrap();

        assert_eq!(
            divergence_of(restored_log.verify_chain(&s).unwrap()),
            (1, DivergenceKind::PayloadDigestMismatch)
        );
        assert_eq!(restored_log.get_event(&backup[2].id).unwrap(), backup[2]);
        assert_eq!(restored.scope_count(), 1);
    }

    /// Appends after a restored chain with a gap stay reachable by id.
    #[test]
    fn test_event_appended_after_gapped_restore_is_found() {
        let (_, log) = new_log();
        let s = scope("contract-backup-gap");
        let mut backup = append_n(&log, &s, 3);
        backup.remove(1);

        let restored = Arc::new(InMemoryEventStore::new());
        restored.restore(backup).unwrap();
        let restored_log = CertifiedEventLog::new(restored, skip_timestamps()).unwrap();

        let appended = restored_log
            .append(&s, "document.uploaded", json!({ "doc": "after-restore" }))
            .unwrap();
        assert_eq!(appended.sequence_number, 3);
        assert_eq!(restored_log.get_event(&appended.id).unwrap(), appended);
    }

    #[test]
    fn test_failed_commit_leaves_no_row_behind() {
        let (store, log) = new_log();
        let s = scope("contract-poisoned-index");
        store.poison_index();

        match log.append(&s, "document.uploaded", json!({ "doc": 0 })) {
            Err(CertusError::StorageFailure { reason }) => {
                assert!(reason.contains("index"), "unexpected reason: {reason}");
            }
            other => panic!("expected StorageFailure, got {:?}", other),
        }
        assert!(log.head(&s).unwrap().is_none());
        assert!(store.scope_events(&s).unwrap().is_empty());
    }

    #[test]
    fn test_scope_locks_are_released_after_append() {
        let (_, log) = new_log();
        for i in 0..5 {
            append_n(&log, &scope(&format!("contract-lock-{i}")), 2);
        }
        assert_eq!(log.scope_lock_count(), 0);
    }

    #[test]
    fn test_ensure_intact_surfaces_violation_as_error() {
        let (store, log) = new_log();
        let s = scope("contract-ensure");
        append_n(&log, &s, 3);
        assert_eq!(log.ensure_intact(&s).unwrap(), 3);

        store.tamper(&s, |events| events[2].payload = json!(null));

        match log.ensure_intact(&s) {
            Err(CertusError::ChainIntegrityViolation(d)) => {
                assert_eq!(d.sequence_number, 2);
                assert_eq!(d.scope_id, s);
            }
            other => panic!("expected ChainIntegrityViolation, got {:?}", other),
        }
    }

    // ── Concurrency ───────────────────────────────────────────────────────────

    /// A rival commit wins the race once; the append retries on the new head.
    #[test]
    fn test_chain_head_conflict_is_retried() {
        let store = Arc::new(RacingStore::new());
        let log = CertifiedEventLog::new(store.clone(), CertusConfig::default()).unwrap();
        let s = scope("contract-race");

        let event = log.append(&s, "document.signed", json!({ "signer": "Vendor SL" })).unwrap();

        assert_eq!(store.conflicts.load(Ordering::SeqCst), 1);
        assert_eq!(event.sequence_number, 1);
        let events = log.list_events(&s, &EventFilter::default()).unwrap();
        assert_eq!(events[0].event_type.as_str(), "rival.write");
        assert_eq!(event.previous_hash, events[0].link_hash);
        assert!(log.verify_chain(&s).unwrap().is_verified());
    }

    /// With a single attempt allowed, the conflict reaches the caller.
    #[test]
    fn test_chain_head_conflict_surfaces_when_attempts_exhausted() {
        let store = Arc::new(RacingStore::new());
        let config = CertusConfig::from_toml_str("[log]\nmax_append_attempts = 1\n").unwrap();
        let log = CertifiedEventLog::new(store, config).unwrap();

        match log.append(&scope("contract-race-1"), "document.signed", json!({})) {
            Err(err @ CertusError::ChainHeadConflict { .. }) => assert!(err.is_retryable()),
            other => panic!("expected ChainHeadConflict, got {:?}", other),
        }
    }

    /// Many threads appending to one scope through one log never share a sequence.
    #[test]
    fn test_concurrent_appends_same_scope() {
        let (_, log) = new_log();
        let log = Arc::new(log);
        let s = scope("contract-threads");

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                let s = s.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        log.append(&s, "communication.sent", json!({ "thread": t, "i": i }))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let events = log.list_events(&s, &EventFilter::default()).unwrap();
        assert_eq!(events.len(), 200);
        for (idx, event) in events.iter().enumerate() {
            assert_eq!(event.sequence_number, idx as u64);
        }
        assert!(log.verify_chain(&s).unwrap().is_verified());
    }

    /// Two independent log instances over one store race through CAS.
    #[test]
    fn test_two_writers_share_a_store() {
        let store = Arc::new(InMemoryEventStore::new());
        let config = CertusConfig::from_toml_str("[log]\nmax_append_attempts = 100\n").unwrap();
        let s = scope("contract-two-writers");

        let handles: Vec<_> = (0..2)
            .map(|w| {
                let log = CertifiedEventLog::new(store.clone(), config.clone()).unwrap();
                let s = s.clone();
                thread::spawn(move || {
                    for i in 0..30 {
                        log.append(&s, "communication.received", json!({ "writer": w, "i": i }))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let events = store.scope_events(&s).unwrap();
        assert_eq!(events.len(), 60);
        assert!(verify_events(&s, &events).is_verified());
    }

    /// Verification during appends always sees a complete snapshot.
    #[test]
    fn test_verify_while_appending_sees_consistent_snapshot() {
        let (_, log) = new_log();
        let log = Arc::new(log);
        let s = scope("contract-snapshot");

        let writer = {
            let log = Arc::clone(&log);
            let s = s.clone();
            thread::spawn(move || append_n(&log, &s, 100))
        };
        for _ in 0..50 {
            assert!(log.verify_chain(&s).unwrap().is_verified());
        }
        writer.join().unwrap();
        assert_eq!(log.ensure_intact(&s).unwrap(), 100);
    }

    // ── Qualified timestamps ──────────────────────────────────────────────────

    #[test]
    fn test_timestamp_attached_by_sweep_without_changing_link_hash() {
        let qtsp = StubQtsp::up();
        let (_, log) = new_log();
        let log = log.with_timestamp_client(qtsp.clone());
        let s = scope("contract-ts");

        let event = log.append(&s, "document.signed", json!({ "signer": "Buyer Ana" })).unwrap();
        assert_eq!(event.timestamp_status, TimestampStatus::Pending);
        assert_eq!(qtsp.calls.load(Ordering::SeqCst), 0, "append must not call the QTSP");
        assert_eq!(log.pending_timestamps().len(), 1);

        let sweep = log.process_pending_timestamps();
        assert_eq!(sweep.attached, 1);
        assert!(log.pending_timestamps().is_empty());

        let stored = log.get_event(&event.id).unwrap();
        assert_eq!(stored.timestamp_status, TimestampStatus::Attached);
        assert_eq!(stored.link_hash, event.link_hash);
        assert_eq!(stored.qualified_timestamp.unwrap().digest, event.link_hash);
        assert!(log.verify_chain(&s).unwrap().is_verified());
    }

    /// A QTSP outage never fails an append; the event stays pending until recovery.
    #[test]
    fn test_qtsp_outage_keeps_event_pending() {
        let qtsp = StubQtsp::down();
        let (_, log) = new_log();
        let log = log.with_timestamp_client(qtsp.clone());
        let s = scope("contract-outage");

        let event = log.append(&s, "communication.sent", json!({ "to": "notary" })).unwrap();

        let sweep = log.process_pending_timestamps();
        assert_eq!(sweep.still_pending, 1);
        let pending = log.pending_timestamps();
        assert_eq!(pending[0].attempts, 1);
        assert!(pending[0].last_error.as_deref().unwrap().contains("offline"));
        assert_eq!(
            log.get_event(&event.id).unwrap().timestamp_status,
            TimestampStatus::Pending
        );
        assert!(log.verify_chain(&s).unwrap().is_verified());

        qtsp.available.store(true, Ordering::SeqCst);
        assert_eq!(log.process_pending_timestamps().attached, 1);
        assert_eq!(
            log.get_event(&event.id).unwrap().timestamp_status,
            TimestampStatus::Attached
        );
    }

    #[test]
    fn test_max_attempts_drops_from_outbox_and_requeue_recovers() {
        let qtsp = StubQtsp::down();
        let store = Arc::new(InMemoryEventStore::new());
        let config = CertusConfig::from_toml_str("[timestamping]\nmax_attempts = 2\n").unwrap();
        let log = CertifiedEventLog::new(store, config)
            .unwrap()
            .with_timestamp_client(qtsp.clone());
        let s = scope("contract-drop");
        log.append(&s, "document.uploaded", json!({})).unwrap();

        assert_eq!(log.process_pending_timestamps().still_pending, 1);
        assert_eq!(log.process_pending_timestamps().dropped, 1);
        assert!(log.pending_timestamps().is_empty());

        assert_eq!(log.requeue_pending(&s).unwrap(), 1);
        assert_eq!(log.requeue_pending(&s).unwrap(), 0, "already queued");
        qtsp.available.store(true, Ordering::SeqCst);
        assert_eq!(log.process_pending_timestamps().attached, 1);
    }

    #[test]
    fn test_skip_policy_marks_not_required() {
        let store = Arc::new(InMemoryEventStore::new());
        let log = CertifiedEventLog::new(store, skip_timestamps()).unwrap();
        let event = log.append(&scope("contract-skip"), "communication.received", json!({})).unwrap();
        assert_eq!(event.timestamp_status, TimestampStatus::NotRequired);
        assert!(log.pending_timestamps().is_empty());
    }

    #[test]
    fn test_manual_request_timestamp() {
        let qtsp = StubQtsp::down();
        let (_, log) = new_log();
        let log = log.with_timestamp_client(qtsp.clone());
        let event = log.append(&scope("contract-manual"), "document.signed", json!({})).unwrap();

        assert!(matches!(
            log.request_timestamp(&event.id),
            Err(CertusError::TimestampUnavailable { .. })
        ));
        assert_eq!(log.pending_timestamps().len(), 1);

        qtsp.available.store(true, Ordering::SeqCst);
        let stamped = log.request_timestamp(&event.id).unwrap();
        assert_eq!(stamped.timestamp_status, TimestampStatus::Attached);
        assert!(log.pending_timestamps().is_empty());

        // Already attached: returned unchanged, no extra QTSP call.
        let calls = qtsp.calls.load(Ordering::SeqCst);
        assert_eq!(log.request_timestamp(&event.id).unwrap(), stamped);
        assert_eq!(qtsp.calls.load(Ordering::SeqCst), calls);
    }

    #[test]
    fn test_request_timestamp_without_client() {
        let (_, log) = new_log();
        let event = log.append(&scope("contract-no-client"), "document.signed", json!({})).unwrap();
        assert!(matches!(
            log.request_timestamp(&event.id),
            Err(CertusError::TimestampUnavailable { .. })
        ));
        // Sweeping without a client is a no-op.
        assert_eq!(log.process_pending_timestamps().still_pending, 1);
    }

    #[test]
    fn test_timestamp_for_wrong_digest_is_rejected() {
        let qtsp = Arc::new(StubQtsp {
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            wrong_digest: true,
        });
        let (_, log) = new_log();
        let log = log.with_timestamp_client(qtsp);
        let s = scope("contract-wrong-digest");
        let event = log.append(&s, "document.signed", json!({})).unwrap();

        assert_eq!(log.process_pending_timestamps().still_pending, 1);
        assert_eq!(log.get_event(&event.id).unwrap().qualified_timestamp, None);
        assert!(log.verify_chain(&s).unwrap().is_verified());
    }

    #[test]
    fn test_background_worker_attaches_timestamps() {
        let qtsp = StubQtsp::up();
        let (_, log) = new_log();
        let log = Arc::new(log.with_timestamp_client(qtsp));
        let s = scope("contract-worker");
        let events = append_n(&log, &s, 3);

        let worker = TimestampWorker::spawn(Arc::clone(&log), Duration::from_millis(10)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !log.pending_timestamps().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        worker.shutdown();

        for event in events {
            assert_eq!(
                log.get_event(&event.id).unwrap().timestamp_status,
                TimestampStatus::Attached
            );
        }
    }

    // ── Reads, corrections, export ────────────────────────────────────────────

    #[test]
    fn test_list_events_filters_and_orders() {
        let (_, log) = new_log();
        let s = scope("contract-list");
        log.append(&s, "document.uploaded", json!({ "n": 0 })).unwrap();
        log.append(&s, "communication.sent", json!({ "n": 1 })).unwrap();
        log.append(&s, "document.uploaded", json!({ "n": 2 })).unwrap();
        log.append(&s, "document.uploaded", json!({ "n": 3 })).unwrap();

        let uploads = log.list_events(&s, &EventFilter::of_type("document.uploaded")).unwrap();
        let sequences: Vec<u64> = uploads.iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequences, vec![0, 2, 3]);

        let limited = log
            .list_events(&s, &EventFilter::of_type("document.uploaded").with_limit(2))
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[1].sequence_number, 2);

        let ranged = log
            .list_events(&s, &EventFilter { from_sequence: Some(1), to_sequence: Some(2), ..EventFilter::default() })
            .unwrap();
        assert_eq!(ranged.len(), 2);

        assert!(log.list_events(&scope("unknown"), &EventFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_get_event_not_found() {
        let (_, log) = new_log();
        let missing = EventId::new();
        match log.get_event(&missing) {
            Err(CertusError::EventNotFound { event_id }) => assert_eq!(event_id, missing.to_string()),
            other => panic!("expected EventNotFound, got {:?}", other),
        }
    }

    /// A correction is a new event; the original is untouched.
    #[test]
    fn test_correction_appends_referencing_event() {
        let (_, log) = new_log();
        let s = scope("contract-correction");
        let original = log
            .append(&s, "notary.appointment_scheduled", json!({ "date": "2026-05-04" }))
            .unwrap();

        let correction = log
            .append_correction(&s, &original.id, "notary.appointment_scheduled", json!({ "date": "2026-05-05" }))
            .unwrap();

        assert_eq!(correction.sequence_number, 1);
        assert_eq!(correction.payload["corrects"], Value::String(original.id.to_string()));
        assert_eq!(correction.payload["correction"]["date"], "2026-05-05");
        assert_eq!(log.get_event(&original.id).unwrap(), original);
        assert!(log.verify_chain(&s).unwrap().is_verified());
    }

    #[test]
    fn test_correction_must_reference_event_in_same_scope() {
        let (_, log) = new_log();
        let other = log.append(&scope("contract-x"), "document.uploaded", json!({})).unwrap();

        assert!(matches!(
            log.append_correction(&scope("contract-y"), &other.id, "document.uploaded", json!({})),
            Err(CertusError::EventNotFound { .. })
        ));
        assert!(matches!(
            log.append_correction(&scope("contract-y"), &EventId::new(), "document.uploaded", json!({})),
            Err(CertusError::EventNotFound { .. })
        ));
    }

    #[test]
    fn test_export_contains_chain_and_commitments() {
        let (_, log) = new_log();
        let s = scope("contract-export");
        let events = append_n(&log, &s, 4);

        let export = log.export_scope(&s).unwrap();
        assert_eq!(export.scope_id, s);
        assert_eq!(export.events, events);
        assert_eq!(export.terminal_hash, events[3].link_hash);
        assert_eq!(
            export.export_digest,
            digest_value(&serde_json::to_value(&events).unwrap()).unwrap()
        );

        // The export survives a JSON round trip and still verifies.
        let json = serde_json::to_string(&export).unwrap();
        let decoded: certus_contracts::export::ChainExport = serde_json::from_str(&json).unwrap();
        assert!(verify_events(&s, &decoded.events).is_verified());
    }

    #[test]
    fn test_export_of_empty_scope() {
        let (_, log) = new_log();
        let export = log.export_scope(&scope("empty")).unwrap();
        assert!(export.events.is_empty());
        assert_eq!(export.terminal_hash, "");
    }
}
