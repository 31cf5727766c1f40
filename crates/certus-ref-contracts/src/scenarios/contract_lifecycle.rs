//! Scenario 1: Contract Lifecycle
//!
//! Records the everyday facts of one property sale on a single contract
//! chain and proves the chain afterwards, both through the log and offline
//! from an export.
//!
//!   document.uploaded            purchase agreement
//!   communication.sent           agreement sent to the buyer
//!   communication.received       buyer's reply (no qualified timestamp)
//!   document.signed              buyer signs
//!   contract.state_changed       negotiation → reserved
//!   notary.appointment_scheduled signing at the notary
//!   notary.appointment_scheduled correction: moved one day later

use std::sync::Arc;

use certus_contracts::error::{CertusError, CertusResult};
use certus_verify::ExportVerifier;

use crate::{
    mock_data,
    model::{ContractState, Signature, SignatureMethod, StateChange},
    producers::{
        CommunicationService, ContractService, DocumentService, InboundService, NotaryService,
    },
    qtsp::MockQtsp,
    reference_log,
    scenarios::{print_event, print_verification, short},
};

/// Run Scenario 1: Contract Lifecycle.
pub fn run_scenario() -> CertusResult<()> {
    println!("=== Scenario 1: Contract Lifecycle ===");
    println!();

    let qtsp = Arc::new(MockQtsp::default());
    let (_, log) = reference_log(Arc::clone(&qtsp))?;
    let scope = mock_data::contract_scope();

    let documents = DocumentService::new(Arc::clone(&log));
    let outbound = CommunicationService::new(Arc::clone(&log));
    let inbound = InboundService::new(Arc::clone(&log));
    let notary = NotaryService::new(Arc::clone(&log));
    let contracts = ContractService::new(Arc::clone(&log));

    println!("  Scope:    {}", scope);
    println!("  Property: Calle del Olmo 14, 3B");
    println!();

    let agreement = mock_data::purchase_agreement();
    let mut events = Vec::new();
    events.push(documents.upload(&scope, &agreement)?);
    events.push(outbound.send(&scope, &mock_data::offer_email())?);
    events.push(inbound.receive(&scope, &mock_data::buyer_reply())?);
    events.push(documents.sign(
        &scope,
        &Signature {
            document_id: agreement.document_id.clone(),
            signer: "Lucia Ortega".to_string(),
            method: SignatureMethod::AdvancedEsign,
        },
    )?);
    events.push(contracts.transition(
        &scope,
        &StateChange {
            from: ContractState::Negotiation,
            to: ContractState::Reserved,
            reason: "agreement signed by buyer".to_string(),
        },
    )?);
    let appointment = notary.schedule(&scope, &mock_data::notary_appointment())?;
    let original_appointment = appointment.id;
    events.push(appointment);
    events.push(notary.reschedule(&scope, &original_appointment, &mock_data::rescheduled_appointment())?);

    for event in &events {
        print_event(event);
    }
    println!();

    // ── Qualified timestamps ──────────────────────────────────────────────────
    let sweep = log.process_pending_timestamps();
    println!(
        "  Timestamps:     {} attached, {} still pending (issuer: {} issued)",
        sweep.attached,
        sweep.still_pending,
        qtsp.issued()
    );

    // ── Online verification ───────────────────────────────────────────────────
    let result = log.verify_chain(&scope)?;
    print_verification(&result);
    if let Some(divergence) = result.divergence() {
        return Err(CertusError::ChainIntegrityViolation(divergence.clone()));
    }

    // ── Offline verification from an export ───────────────────────────────────
    let export = log.export_scope(&scope)?;
    let report = ExportVerifier::new()?.verify_export(&export)?;
    println!(
        "  Export:         {} event(s), terminal {}…, digest {}…",
        export.events.len(),
        short(&export.terminal_hash),
        short(&export.export_digest)
    );
    println!(
        "  Offline check:  {} ({} event(s) checked, {} finding(s))",
        if report.passed { "PASS" } else { "FAIL" },
        report.events_checked,
        report.failures.len()
    );
    println!();

    Ok(())
}
