//! Scenario 4: QTSP Outage
//!
//! The timestamping provider goes down while events are being recorded.
//! Appends are never blocked: every event is committed, linked and
//! verifiable, and is marked `pending` until a timestamp arrives.
//!
//! Once the provider recovers, one event is timestamped on demand and the
//! background worker picks up the rest. Attaching a timestamp never changes
//! an event's link hash, so the chain verifies before and after.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use certus_contracts::{
    error::{CertusError, CertusResult},
    filter::EventFilter,
    timestamp::TimestampStatus,
};
use certus_log::TimestampWorker;

use crate::{
    mock_data,
    producers::{CommunicationService, DocumentService},
    qtsp::MockQtsp,
    reference_log,
    scenarios::{print_event, print_verification},
};

const RECOVERY_DEADLINE: Duration = Duration::from_secs(10);

/// Run Scenario 4: QTSP Outage.
pub fn run_scenario() -> CertusResult<()> {
    println!("=== Scenario 4: QTSP Outage ===");
    println!();

    let qtsp = Arc::new(MockQtsp::default());
    let (_, log) = reference_log(Arc::clone(&qtsp))?;
    let scope = mock_data::contract_scope();
    let documents = DocumentService::new(Arc::clone(&log));
    let outbound = CommunicationService::new(Arc::clone(&log));

    // ── Outage ────────────────────────────────────────────────────────────────
    qtsp.set_outage(true);
    println!("  QTSP:           DOWN");

    let events = vec![
        documents.upload(&scope, &mock_data::purchase_agreement())?,
        documents.upload(&scope, &mock_data::property_survey())?,
        outbound.send(&scope, &mock_data::offer_email())?,
    ];
    for event in &events {
        print_event(event);
    }

    let sweep = log.process_pending_timestamps();
    println!(
        "  Sweep:          {} attached, {} still pending, {} refused by QTSP",
        sweep.attached,
        sweep.still_pending,
        qtsp.refused()
    );
    print_verification(&log.verify_chain(&scope)?);
    println!();

    // ── Recovery ──────────────────────────────────────────────────────────────
    qtsp.set_outage(false);
    println!("  QTSP:           UP");

    let first = log.request_timestamp(&events[0].id)?;
    println!(
        "  On demand:      sequence {} → {:?}",
        first.sequence_number, first.timestamp_status
    );

    let interval = log.config().worker_interval();
    let worker = TimestampWorker::spawn(Arc::clone(&log), interval)?;
    let deadline = Instant::now() + RECOVERY_DEADLINE;
    while !log.pending_timestamps().is_empty() && Instant::now() < deadline {
        thread::sleep(interval / 4);
    }
    worker.shutdown();
    println!("  Worker:         outbox drained ({} timestamp(s) issued)", qtsp.issued());

    for event in &events {
        let stored = log.get_event(&event.id)?;
        if stored.link_hash != event.link_hash {
            return Err(CertusError::StorageFailure {
                reason: format!("link hash of sequence {} changed", event.sequence_number),
            });
        }
        print_event(&stored);
    }

    let result = log.verify_chain(&scope)?;
    print_verification(&result);
    if let Some(divergence) = result.divergence() {
        return Err(CertusError::ChainIntegrityViolation(divergence.clone()));
    }

    let still_pending = log
        .list_events(&scope, &EventFilter::default().with_status(TimestampStatus::Pending))?
        .len();
    if still_pending > 0 {
        println!("  WARNING: {} event(s) still awaiting a timestamp", still_pending);
    }
    println!();

    Ok(())
}
