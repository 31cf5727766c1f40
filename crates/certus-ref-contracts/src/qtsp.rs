//! Mock Qualified Timestamping Service Provider.
//!
//! Stands in for a real QTSP. The "token" is a SHA-256 over the issuer, the
//! attested digest and the asserted time; it is not a real RFC 3161 token.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{SecondsFormat, Utc};
use tracing::debug;

use certus_canonical::hash_sha256;
use certus_contracts::{
    error::{CertusError, CertusResult},
    timestamp::QualifiedTimestamp,
};
use certus_core::traits::TimestampClient;

/// In-process QTSP with a switchable outage.
#[derive(Debug)]
pub struct MockQtsp {
    issuer: String,
    outage: AtomicBool,
    issued: AtomicUsize,
    refused: AtomicUsize,
}

impl MockQtsp {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            outage: AtomicBool::new(false),
            issued: AtomicUsize::new(0),
            refused: AtomicUsize::new(0),
        }
    }

    /// Start or end a simulated outage.
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    pub fn is_down(&self) -> bool {
        self.outage.load(Ordering::SeqCst)
    }

    /// Timestamps issued so far.
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Requests refused during outages.
    pub fn refused(&self) -> usize {
        self.refused.load(Ordering::SeqCst)
    }
}

impl Default for MockQtsp {
    fn default() -> Self {
        Self::new("qtsp.mock.example")
    }
}

impl TimestampClient for MockQtsp {
    fn request_timestamp(&self, digest_hex: &str) -> CertusResult<QualifiedTimestamp> {
        if self.is_down() {
            self.refused.fetch_add(1, Ordering::SeqCst);
            return Err(CertusError::TimestampUnavailable {
                reason: format!("{} is not responding", self.issuer),
            });
        }

        let asserted_time = Utc::now();
        let proof = hash_sha256(&format!(
            "{}|{}|{}",
            self.issuer,
            digest_hex,
            asserted_time.to_rfc3339_opts(SecondsFormat::Micros, true)
        ));
        self.issued.fetch_add(1, Ordering::SeqCst);
        debug!(issuer = %self.issuer, digest = digest_hex, "timestamp issued");

        Ok(QualifiedTimestamp {
            issuer: self.issuer.clone(),
            asserted_time,
            proof,
            digest: digest_hex.to_string(),
        })
    }
}
