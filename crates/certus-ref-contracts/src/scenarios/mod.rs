//! Contract-management demo scenarios.
//!
//! Each scenario is a self-contained module that wires up the real Certus
//! components (event log, in-memory store, mock QTSP, offline verifier) with
//! mock contract data and demonstrates one property of the certified log.

pub mod contract_lifecycle;
pub mod material_change;
pub mod qtsp_outage;
pub mod tamper_evidence;

use certus_contracts::{event::Event, verify::VerificationResult};

/// First 16 hex digits of a hash, for display.
pub(crate) fn short(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

pub(crate) fn print_event(event: &Event) {
    println!(
        "  [{:>2}] {:<30} link {}…  prev {}…  timestamp: {:?}",
        event.sequence_number,
        event.event_type.as_str(),
        short(&event.link_hash),
        short(&event.previous_hash),
        event.timestamp_status,
    );
}

pub(crate) fn print_verification(result: &VerificationResult) {
    match result {
        VerificationResult::Verified { event_count, head_hash, .. } => println!(
            "  Chain:          VERIFIED ({} event(s), head {}…)",
            event_count,
            short(head_hash.as_deref().unwrap_or("-"))
        ),
        VerificationResult::Diverged(d) => println!(
            "  Chain:          DIVERGED at sequence {} ({})",
            d.sequence_number, d.kind
        ),
    }
}
