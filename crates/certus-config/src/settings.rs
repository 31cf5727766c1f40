//! Configuration schema.
//!
//! A `CertusConfig` is deserialized from TOML. Every section is optional;
//! missing values fall back to the defaults documented on each field.
//!
//! ```toml
//! [log]
//! max_append_attempts = 5
//! canonical_version = 1
//!
//! [timestamping]
//! default = "required"
//! worker_interval_ms = 1000
//! max_attempts = 0
//!
//! [[event_types]]
//! name = "contract.terms_recorded"
//! essential_keys = ["price", "parties", "deadlines"]
//!
//! [[event_types]]
//! name = "communication.received"
//! timestamp = "skip"
//! ```

use serde::{Deserialize, Serialize};

/// Settings for the append path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// How many times `append` recomputes against a fresh head after a
    /// `ChainHeadConflict` before surfacing it. Must be at least 1.
    pub max_append_attempts: u32,

    /// Canonicalization version new events are hashed with.
    pub canonical_version: u32,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            max_append_attempts: 5,
            canonical_version: 1,
        }
    }
}

/// Whether events of a type are sent to the qualified timestamping service.
///
/// Expressed in TOML as `"required"` or `"skip"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampPolicy {
    Required,
    Skip,
}

/// Settings for the timestamp outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampSettings {
    /// Policy for event types without an explicit override.
    pub default: TimestampPolicy,

    /// Pause between background outbox sweeps, in milliseconds.
    pub worker_interval_ms: u64,

    /// Attempts per event before it is dropped from the outbox (it stays
    /// `pending` in storage and can be re-queued). 0 means unlimited.
    pub max_attempts: u32,
}

impl Default for TimestampSettings {
    fn default() -> Self {
        Self {
            default: TimestampPolicy::Required,
            worker_interval_ms: 1000,
            max_attempts: 0,
        }
    }
}

/// Per-event-type configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeConfig {
    /// The event type tag, e.g. `"document.uploaded"`.
    pub name: String,

    /// Top-level payload keys that carry legally material terms. Empty means
    /// no essential-field schema is defined for this type.
    #[serde(default)]
    pub essential_keys: Vec<String>,

    /// Overrides `[timestamping] default` for this type.
    pub timestamp: Option<TimestampPolicy>,
}

/// The top-level structure deserialized from a Certus TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertusConfig {
    #[serde(default)]
    pub log: LogSettings,

    #[serde(default)]
    pub timestamping: TimestampSettings,

    #[serde(default)]
    pub event_types: Vec<EventTypeConfig>,
}
