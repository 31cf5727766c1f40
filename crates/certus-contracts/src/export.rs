//! Full-chain export for offline verification and certificate generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{Event, ScopeId};

/// Every event of one scope, in sequence order, plus commitments over them.
///
/// Produced by the log's export operation. A third party holding only this
/// document and a SHA-256 implementation can re-run chain verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainExport {
    pub scope_id: ScopeId,

    /// Wall-clock time (UTC) the export was produced.
    pub exported_at: DateTime<Utc>,

    /// All events in chain order (sequence 0 first).
    pub events: Vec<Event>,

    /// The `link_hash` of the last event. Empty string if the scope is empty.
    pub terminal_hash: String,

    /// SHA-256 (hex) of the canonical serialization of `events`.
    pub export_digest: String,
}
