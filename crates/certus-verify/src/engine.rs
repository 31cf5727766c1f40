//! Offline export verifier.
//!
//! `ExportVerifier` works on the exported JSON document alone. It does not
//! deserialize into `Event`; the link material is reassembled from the raw
//! exported fields, so a record that would no longer parse as an `Event`
//! still gets a precise finding instead of a parse error.
//!
//! Unlike the log's own `verify_chain`, the walk does not stop at the first
//! mismatch. Each event is checked against the hash stored in its
//! predecessor, so one edited event yields findings at that sequence only.

use chrono::{DateTime, Timelike, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use certus_canonical::{digest_value, digest_value_with, format_created_at, Canonicalizer};
use certus_contracts::{
    error::{CertusError, CertusResult},
    event::Event,
    export::ChainExport,
    verify::{OfflineFailure, OfflineReport},
};

use crate::schema::export_schema;

/// The Certus offline export verifier.
///
/// Holds the compiled export schema; build once and reuse.
pub struct ExportVerifier {
    validator: jsonschema::Validator,
}

impl ExportVerifier {
    /// Compile the built-in export schema.
    pub fn new() -> CertusResult<Self> {
        let validator =
            jsonschema::validator_for(&export_schema()).map_err(|e| CertusError::ConfigError {
                reason: format!("invalid export schema document: {e}"),
            })?;
        Ok(Self { validator })
    }

    /// Verify an export given as JSON text.
    ///
    /// Returns `ExportMalformed` only if `text` is not JSON at all; every
    /// other problem is a finding in the report.
    pub fn verify_json(&self, text: &str) -> CertusResult<OfflineReport> {
        let export: Value = serde_json::from_str(text).map_err(|e| CertusError::ExportMalformed {
            reason: format!("export is not valid JSON: {e}"),
        })?;
        Ok(self.verify_value(&export))
    }

    /// Verify an in-memory export by way of its JSON form.
    pub fn verify_export(&self, export: &ChainExport) -> CertusResult<OfflineReport> {
        let value = serde_json::to_value(export).map_err(|e| CertusError::ExportMalformed {
            reason: format!("export could not be rendered as JSON: {e}"),
        })?;
        Ok(self.verify_value(&value))
    }

    /// Verify an export document.
    pub fn verify_value(&self, export: &Value) -> OfflineReport {
        // ── Phase 1: structure ────────────────────────────────────────────────
        let structural: Vec<OfflineFailure> = self
            .validator
            .iter_errors(export)
            .map(|error| {
                let message = format!("export schema violation at {}: {}", error.instance_path, error);
                warn!(%message, "structural export failure");
                OfflineFailure {
                    sequence_number: None,
                    rule_id: "export-schema".to_string(),
                    message,
                }
            })
            .collect();
        if !structural.is_empty() {
            return OfflineReport {
                passed: false,
                events_checked: 0,
                terminal_hash: None,
                failures: structural,
            };
        }

        // ── Phase 2: chain walk ───────────────────────────────────────────────
        let scope_id = text(export, "scopeId");
        let events: &[Value] = export
            .get("events")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut failures = Vec::new();
        let mut expected_prev = Event::GENESIS_HASH;
        for (position, event) in events.iter().enumerate() {
            failures.extend(check_event(scope_id, position as u64, expected_prev, event));
            expected_prev = text(event, "linkHash");
        }

        // ── Phase 3: export commitments ───────────────────────────────────────
        let terminal_hash = events.last().map(|e| text(e, "linkHash").to_string());
        let claimed_terminal = text(export, "terminalHash");
        if claimed_terminal != terminal_hash.as_deref().unwrap_or("") {
            failures.push(OfflineFailure {
                sequence_number: None,
                rule_id: "terminal-hash".to_string(),
                message: format!(
                    "terminalHash {} does not match the last event's linkHash {}",
                    claimed_terminal,
                    terminal_hash.as_deref().unwrap_or("<none>")
                ),
            });
        }

        let claimed_digest = text(export, "exportDigest");
        match export.get("events").map(digest_value) {
            Some(Ok(digest)) if digest == claimed_digest => {}
            Some(Ok(digest)) => failures.push(OfflineFailure {
                sequence_number: None,
                rule_id: "export-digest".to_string(),
                message: format!("exportDigest {claimed_digest} but events digest to {digest}"),
            }),
            Some(Err(e)) => failures.push(OfflineFailure {
                sequence_number: None,
                rule_id: "export-digest".to_string(),
                message: format!("events cannot be digested: {e}"),
            }),
            None => {}
        }

        for failure in &failures {
            warn!(
                scope_id,
                sequence_number = ?failure.sequence_number,
                rule_id = %failure.rule_id,
                message = %failure.message,
                "offline verification finding"
            );
        }

        let passed = failures.is_empty();
        info!(
            scope_id,
            events_checked = events.len(),
            passed,
            failure_count = failures.len(),
            "offline export verification complete"
        );

        OfflineReport {
            passed,
            events_checked: events.len() as u64,
            terminal_hash,
            failures,
        }
    }
}

/// String field of a schema-validated object; empty if absent.
fn text<'v>(value: &'v Value, key: &str) -> &'v str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Every finding for one exported event.
fn check_event(
    scope_id: &str,
    position: u64,
    expected_prev: &str,
    event: &Value,
) -> Vec<OfflineFailure> {
    let sequence = event.get("sequenceNumber").and_then(Value::as_u64).unwrap_or(position);
    let mut failures = Vec::new();
    let mut fail = |rule_id: &str, message: String| {
        failures.push(OfflineFailure {
            sequence_number: Some(sequence),
            rule_id: rule_id.to_string(),
            message,
        });
    };

    debug!(scope_id, sequence, "checking exported event");

    if sequence != position {
        fail(
            "sequence-number",
            format!("event at position {position} carries sequenceNumber {sequence}"),
        );
    }

    let event_scope = text(event, "scopeId");
    if event_scope != scope_id {
        fail(
            "scope-id",
            format!("event belongs to scope '{event_scope}', export is for '{scope_id}'"),
        );
    }

    let previous_hash = text(event, "previousHash");
    if previous_hash != expected_prev {
        fail(
            "previous-hash",
            format!("previousHash {previous_hash} does not link to {expected_prev}"),
        );
    }

    let version = event.get("canonicalVersion").and_then(Value::as_u64).unwrap_or(0);
    let canonicalizer = match u32::try_from(version)
        .ok()
        .and_then(|v| Canonicalizer::for_version(v).ok())
    {
        Some(c) => c,
        None => {
            fail(
                "canonical-version",
                format!("canonicalization version {version} is not supported; hashes not recomputed"),
            );
            return failures;
        }
    };

    let payload_digest = text(event, "payloadDigest");
    let payload = event.get("payload").unwrap_or(&Value::Null);
    match digest_value_with(&canonicalizer, payload) {
        Ok(d) if d == payload_digest => {}
        Ok(d) => fail(
            "payload-digest",
            format!("payload digests to {d}, export records {payload_digest}"),
        ),
        Err(e) => fail("payload-digest", format!("payload cannot be canonicalized: {e}")),
    }

    let link_hash = text(event, "linkHash");
    let raw_created_at = text(event, "createdAt");
    match DateTime::parse_from_rfc3339(raw_created_at) {
        Err(e) => fail("created-at", format!("createdAt '{raw_created_at}' is not RFC 3339: {e}")),
        Ok(created_at) if created_at.nanosecond() % 1_000 != 0 => fail(
            "created-at",
            format!("createdAt '{raw_created_at}' is finer than the microseconds the link hash covers"),
        ),
        Ok(created_at) => {
            let material = json!({
                "previousHash": previous_hash,
                "payloadDigest": payload_digest,
                "sequenceNumber": sequence,
                "createdAt": format_created_at(&created_at.with_timezone(&Utc)),
                "type": text(event, "type"),
                "scopeId": event_scope,
            });
            match digest_value_with(&canonicalizer, &material) {
                Ok(h) if h == link_hash => {}
                Ok(h) => fail(
                    "link-hash",
                    format!("link material digests to {h}, export records {link_hash}"),
                ),
                Err(e) => fail("link-hash", format!("link material cannot be canonicalized: {e}")),
            }
        }
    }

    let timestamp = event.get("qualifiedTimestamp").filter(|t| !t.is_null());
    match timestamp {
        Some(ts) => {
            let attested = text(ts, "digest");
            if attested != link_hash {
                fail(
                    "timestamp-digest",
                    format!("qualified timestamp attests {attested}, not linkHash {link_hash}"),
                );
            }
        }
        None if text(event, "timestampStatus") == "attached" => fail(
            "timestamp-status",
            "timestampStatus is attached but no qualifiedTimestamp is present".to_string(),
        ),
        None => {}
    }

    failures
}

// ── Tests ─────────────────────────────────────────────────────────────────────
