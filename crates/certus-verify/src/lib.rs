//! # certus-verify
//!
//! Offline verification of exported event chains.
//!
//! This crate provides [`engine::ExportVerifier`], which checks a
//! `ChainExport` document without any access to the log that produced it.
//! Verification runs in two phases:
//!
//! 1. **Structural**: JSON Schema validation of the export document via the
//!    `jsonschema` crate, against [`schema::export_schema`].
//! 2. **Chain walk**: every event's payload digest and link hash are
//!    recomputed from the raw exported fields, linkage and sequence are
//!    checked, and the export-level `terminalHash` and `exportDigest` are
//!    re-derived.
//!
//! All failures are collected into one `OfflineReport`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use certus_verify::engine::ExportVerifier;
//!
//! let verifier = ExportVerifier::new()?;
//! let report = verifier.verify_json(&std::fs::read_to_string("contract-001.json")?)?;
//! if !report.passed {
//!     for failure in &report.failures {
//!         eprintln!("{:?} {}: {}", failure.sequence_number, failure.rule_id, failure.message);
//!     }
//! }
//! ```

pub mod engine;
pub mod schema;

pub use engine::ExportVerifier;
