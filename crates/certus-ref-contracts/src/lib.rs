//! # certus-ref-contracts
//!
//! Contract-management reference producers for the Certus certified event log.
//!
//! Demonstrates four scenarios using mock data:
//!
//! 1. **Contract lifecycle**: uploads, signatures, communications and a
//!    notary appointment recorded on one contract's chain, then verified
//!    online and offline.
//! 2. **Tamper evidence**: a doctored backup and a doctored export are both
//!    caught at the exact sequence number that was edited.
//! 3. **Material change**: new versions of the contract terms classified as
//!    material or cosmetic by their essential-field digest.
//! 4. **QTSP outage**: appends keep succeeding while the timestamping
//!    provider is down; timestamps are attached once it recovers.
//!
//! All data is hardcoded and fictional. No external services are contacted.

pub mod mock_data;
pub mod model;
pub mod producers;
pub mod qtsp;
pub mod scenarios;

use std::sync::Arc;

use certus_config::CertusConfig;
use certus_contracts::error::CertusResult;
use certus_log::{CertifiedEventLog, InMemoryEventStore};

/// Configuration shipped with the reference producers.
pub const CONTRACTS_CONFIG: &str = include_str!("../config/contracts.toml");

/// A log over a fresh in-memory store, configured from `CONTRACTS_CONFIG`.
pub fn reference_log(qtsp: Arc<qtsp::MockQtsp>) -> CertusResult<(Arc<InMemoryEventStore>, Arc<CertifiedEventLog>)> {
    let config = CertusConfig::from_toml_str(CONTRACTS_CONFIG)?;
    let store = Arc::new(InMemoryEventStore::new());
    let log = CertifiedEventLog::new(store.clone(), config)?.with_timestamp_client(qtsp);
    Ok((store, Arc::new(log)))
}
