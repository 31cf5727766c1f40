//! Loading and validating `CertusConfig`.

use std::{collections::HashSet, path::Path, time::Duration};

use tracing::debug;

use certus_canonical::CanonicalVersion;
use certus_contracts::error::{CertusError, CertusResult};

use crate::{
    registry::EssentialFieldRegistry,
    settings::{CertusConfig, TimestampPolicy},
};

impl CertusConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `CertusError::ConfigError` if the TOML is malformed, does not
    /// match the schema, or fails validation.
    pub fn from_toml_str(s: &str) -> CertusResult<Self> {
        let config: CertusConfig = toml::from_str(s).map_err(|e| CertusError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        debug!(
            event_types = config.event_types.len(),
            max_append_attempts = config.log.max_append_attempts,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> CertusResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CertusError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> CertusResult<()> {
        if self.log.max_append_attempts == 0 {
            return Err(CertusError::ConfigError {
                reason: "log.max_append_attempts must be at least 1".to_string(),
            });
        }

        if self.timestamping.worker_interval_ms == 0 {
            return Err(CertusError::ConfigError {
                reason: "timestamping.worker_interval_ms must be at least 1".to_string(),
            });
        }

        CanonicalVersion::from_u32(self.log.canonical_version).map_err(|_| {
            CertusError::ConfigError {
                reason: format!(
                    "log.canonical_version {} is not supported",
                    self.log.canonical_version
                ),
            }
        })?;

        let mut seen = HashSet::new();
        for event_type in &self.event_types {
            if event_type.name.trim().is_empty() {
                return Err(CertusError::ConfigError {
                    reason: "event type name must not be empty".to_string(),
                });
            }
            if !seen.insert(event_type.name.as_str()) {
                return Err(CertusError::ConfigError {
                    reason: format!("event type '{}' is configured more than once", event_type.name),
                });
            }
        }
        Ok(())
    }

    /// Timestamping policy for `event_type`, falling back to the default.
    pub fn timestamp_policy(&self, event_type: &str) -> TimestampPolicy {
        self.event_types
            .iter()
            .find(|t| t.name == event_type)
            .and_then(|t| t.timestamp)
            .unwrap_or(self.timestamping.default)
    }

    pub fn worker_interval(&self) -> Duration {
        Duration::from_millis(self.timestamping.worker_interval_ms)
    }

    /// Build the essential-field registry from `[[event_types]]`.
    pub fn essential_fields(&self) -> EssentialFieldRegistry {
        EssentialFieldRegistry::from_event_types(&self.event_types)
    }
}
