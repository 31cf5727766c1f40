//! Scenario 2: Tamper Evidence
//!
//! A contract chain is recorded and exported. Three out-of-band edits are
//! then made, each of the kind an insider with database access could attempt:
//!
//!   Sub-case A: the signer of a signature event is rewritten in a backup
//!   Sub-case B: an event is deleted from a backup
//!   Sub-case C: a document hash is swapped inside an exported certificate
//!
//! Every edit is detected, and reported at the sequence number that was
//! touched. Nothing is repaired.

use std::sync::Arc;

use serde_json::json;

use certus_canonical::hash_sha256;
use certus_config::CertusConfig;
use certus_contracts::{
    error::{CertusError, CertusResult},
    event::{Event, ScopeId},
    verify::VerificationResult,
};
use certus_log::{CertifiedEventLog, InMemoryEventStore};
use certus_verify::ExportVerifier;

use crate::{
    mock_data,
    model::{Signature, SignatureMethod},
    producers::{CommunicationService, DocumentService},
    qtsp::MockQtsp,
    reference_log, CONTRACTS_CONFIG,
    scenarios::{print_event, print_verification},
};

/// Restore `rows` into a fresh store and verify the scope from scratch.
fn verify_restored(scope: &ScopeId, rows: Vec<Event>) -> CertusResult<VerificationResult> {
    let store = Arc::new(InMemoryEventStore::new());
    store.restore(rows)?;
    let log = CertifiedEventLog::new(store, CertusConfig::from_toml_str(CONTRACTS_CONFIG)?)?;
    log.verify_chain(scope)
}

/// Run Scenario 2: Tamper Evidence.
pub fn run_scenario() -> CertusResult<()> {
    println!("=== Scenario 2: Tamper Evidence ===");
    println!();

    let (_, log) = reference_log(Arc::new(MockQtsp::default()))?;
    let scope = ScopeId::new("contract-2026-0043");
    let documents = DocumentService::new(Arc::clone(&log));
    let outbound = CommunicationService::new(Arc::clone(&log));

    let agreement = mock_data::purchase_agreement();
    for event in [
        documents.upload(&scope, &agreement)?,
        documents.upload(&scope, &mock_data::property_survey())?,
        outbound.send(&scope, &mock_data::offer_email())?,
        documents.sign(
            &scope,
            &Signature {
                document_id: agreement.document_id.clone(),
                signer: "Lucia Ortega".to_string(),
                method: SignatureMethod::QualifiedEsign,
            },
        )?,
    ] {
        print_event(&event);
    }
    log.process_pending_timestamps();

    let original = log.verify_chain(&scope)?;
    print_verification(&original);
    if let Some(divergence) = original.divergence() {
        return Err(CertusError::ChainIntegrityViolation(divergence.clone()));
    }
    let export = log.export_scope(&scope)?;
    println!();

    // ── Sub-case A: rewritten signer ─────────────────────────────────────────
    println!("  ── Sub-case A: signer rewritten in a backup ──");
    let mut rows = export.events.clone();
    if let Some(signer) = rows
        .get_mut(3)
        .and_then(|event| event.payload.get_mut("signer"))
    {
        *signer = json!("Someone Else");
    }
    print_verification(&verify_restored(&scope, rows)?);
    println!();

    // ── Sub-case B: deleted event ────────────────────────────────────────────
    println!("  ── Sub-case B: outbound communication deleted from a backup ──");
    let mut rows = export.events.clone();
    rows.remove(2);
    print_verification(&verify_restored(&scope, rows)?);
    println!();

    // ── Sub-case C: doctored export ──────────────────────────────────────────
    println!("  ── Sub-case C: document hash swapped in an exported certificate ──");
    let mut doctored = serde_json::to_value(&export).map_err(|e| CertusError::ExportMalformed {
        reason: e.to_string(),
    })?;
    if let Some(sha256) = doctored.pointer_mut("/events/0/payload/sha256") {
        *sha256 = json!(hash_sha256("a different agreement"));
    }
    let report = ExportVerifier::new()?.verify_value(&doctored);
    println!(
        "  Offline check:  {} ({} finding(s))",
        if report.passed { "PASS" } else { "FAIL" },
        report.failures.len()
    );
    for failure in &report.failures {
        let at = failure
            .sequence_number
            .map(|s| format!("sequence {}", s))
            .unwrap_or_else(|| "export".to_string());
        println!("    - {:<12} {}: {}", at, failure.rule_id, failure.message);
    }
    println!();

    // The live log was never touched.
    print_verification(&log.verify_chain(&scope)?);
    println!();

    Ok(())
}
