//! Certus certified event log demo CLI
//!
//! Runs one or all of the contract-management demo scenarios, or verifies an
//! exported chain file offline. Each scenario uses the real Certus components
//! (event log, in-memory store, mock QTSP, offline verifier) wired together
//! with mock contract data.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- contract-lifecycle
//!   cargo run -p demo -- tamper-evidence
//!   cargo run -p demo -- material-change
//!   cargo run -p demo -- qtsp-outage
//!   cargo run -p demo -- verify-export contract-2026-0042.json

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use certus_contracts::error::{CertusError, CertusResult};
use certus_ref_contracts::scenarios::{
    contract_lifecycle, material_change, qtsp_outage, tamper_evidence,
};
use certus_verify::ExportVerifier;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Certus certified event log demo.
///
/// Each subcommand runs one or all of the contract-management scenarios,
/// demonstrating hash chaining, tamper evidence, material-change detection
/// and deferred qualified timestamping.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Certus certified event log reference demo",
    long_about = "Runs Certus contract-management demo scenarios showing hash-chained\n\
                  event recording, tamper evidence, material-change detection,\n\
                  and qualified timestamping through a QTSP outage."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: Contract Lifecycle (record, timestamp, verify, export).
    ContractLifecycle,
    /// Scenario 2: Tamper Evidence (edited backup, deleted row, doctored export).
    TamperEvidence,
    /// Scenario 3: Material Change Detection (essential-field digests).
    MaterialChange,
    /// Scenario 4: QTSP Outage (pending timestamps, recovery, worker).
    QtspOutage,
    /// Verify an exported chain (JSON) offline.
    VerifyExport {
        /// Path to the export document.
        path: PathBuf,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::ContractLifecycle => contract_lifecycle::run_scenario(),
        Command::TamperEvidence => tamper_evidence::run_scenario(),
        Command::MaterialChange => material_change::run_scenario(),
        Command::QtspOutage => qtsp_outage::run_scenario(),
        Command::VerifyExport { path } => verify_export(&path),
    };

    match result {
        Ok(()) => {
            println!("Done.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_all() -> CertusResult<()> {
    contract_lifecycle::run_scenario()?;
    tamper_evidence::run_scenario()?;
    material_change::run_scenario()?;
    qtsp_outage::run_scenario()?;
    Ok(())
}

fn verify_export(path: &Path) -> CertusResult<()> {
    let text = std::fs::read_to_string(path).map_err(|e| CertusError::ExportMalformed {
        reason: format!("cannot read {}: {}", path.display(), e),
    })?;
    info!(path = %path.display(), bytes = text.len(), "verifying export");

    let report = ExportVerifier::new()?.verify_json(&text)?;
    println!("  File:           {}", path.display());
    println!("  Events checked: {}", report.events_checked);
    println!(
        "  Terminal hash:  {}",
        report.terminal_hash.as_deref().unwrap_or("-")
    );
    println!("  Result:         {}", if report.passed { "PASS" } else { "FAIL" });
    for failure in &report.failures {
        let at = failure
            .sequence_number
            .map(|s| format!("sequence {}", s))
            .unwrap_or_else(|| "export".to_string());
        println!("    - {:<12} {}: {}", at, failure.rule_id, failure.message);
    }
    println!();

    if report.passed {
        Ok(())
    } else {
        Err(CertusError::ExportMalformed {
            reason: format!("{} verification finding(s)", report.failures.len()),
        })
    }
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Certus: Certified Event Log");
    println!("Contract Management Reference Demo");
    println!("==================================");
    println!();
    println!("Per append:");
    println!("  [1] Payload canonicalized (sorted keys, no whitespace) and SHA-256 digested");
    println!("  [2] Link hash = SHA-256 over (previous hash, payload digest, sequence, time, type, scope)");
    println!("  [3] Committed only if the scope head is unchanged; otherwise retried on the new head");
    println!("  [4] Qualified timestamp over the link hash requested asynchronously via the outbox");
    println!();
}
