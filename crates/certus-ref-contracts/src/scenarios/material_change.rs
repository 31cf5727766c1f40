//! Scenario 3: Material Change Detection
//!
//! Four versions of the contract terms are recorded. Each new version is
//! compared with the previous one through the essential-field digest of
//! `contract.terms_recorded` (price, parties, deadlines, property). A change
//! confined to notes or the revision counter is cosmetic; anything else is
//! material and would require the parties to re-sign.

use std::sync::Arc;

use certus_canonical::to_payload;
use certus_contracts::error::CertusResult;

use crate::{
    mock_data,
    producers::{event_types, ContractService},
    qtsp::MockQtsp,
    reference_log,
    scenarios::{print_verification, short},
};

/// Run Scenario 3: Material Change Detection.
pub fn run_scenario() -> CertusResult<()> {
    println!("=== Scenario 3: Material Change Detection ===");
    println!();

    let (_, log) = reference_log(Arc::new(MockQtsp::default()))?;
    let scope = mock_data::contract_scope();
    let contracts = ContractService::new(Arc::clone(&log));
    let essential = log.config().essential_fields();

    println!(
        "  Essential keys: {}",
        essential
            .keys_for(event_types::CONTRACT_TERMS_RECORDED)?
            .join(", ")
    );
    println!();

    let v1 = mock_data::initial_terms();
    let v2 = mock_data::cosmetic_revision(&v1);
    let v3 = mock_data::price_renegotiation(&v2);
    let v4 = mock_data::deadline_extension(&v3);

    for (label, terms) in [
        ("initial terms", &v1),
        ("notes reworded", &v2),
        ("price lowered by 7,500 EUR", &v3),
        ("signing deadline moved", &v4),
    ] {
        let recorded = contracts.record_terms(&scope, terms)?;
        let digest = essential.essential_digest(
            event_types::CONTRACT_TERMS_RECORDED,
            &to_payload(terms)?,
        )?;
        let verdict = match recorded.material {
            None => "FIRST VERSION",
            Some(true) => "MATERIAL",
            Some(false) => "COSMETIC",
        };
        println!(
            "  rev {} [{:>2}] {:<28} essential {}…  {}",
            terms.revision,
            recorded.event.sequence_number,
            label,
            short(&digest),
            verdict
        );
    }
    println!();

    println!(
        "  v1 → v4 overall: {}",
        if contracts.material_change(&v1, &v4)? { "MATERIAL" } else { "COSMETIC" }
    );
    print_verification(&log.verify_chain(&scope)?);
    println!();

    Ok(())
}
