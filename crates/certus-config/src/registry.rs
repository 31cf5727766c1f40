//! Essential-field schemas per event type.
//!
//! Which payload keys are legally material is a configuration decision, not
//! something inferred from payload shape. An event type without a declared
//! schema has no essential digest.

use std::collections::HashMap;

use serde_json::Value;

use certus_canonical::essential_digest;
use certus_contracts::error::{CertusError, CertusResult};

use crate::settings::EventTypeConfig;

/// Maps event types to the payload keys their essential digest covers.
#[derive(Debug, Clone, Default)]
pub struct EssentialFieldRegistry {
    schemas: HashMap<String, Vec<String>>,
}

impl EssentialFieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every configured type that declares at least one key.
    pub fn from_event_types(event_types: &[EventTypeConfig]) -> Self {
        let mut registry = Self::new();
        for event_type in event_types {
            if !event_type.essential_keys.is_empty() {
                registry.register(event_type.name.clone(), event_type.essential_keys.clone());
            }
        }
        registry
    }

    /// Declare the essential keys of `event_type`. Replaces any earlier entry.
    pub fn register(&mut self, event_type: impl Into<String>, mut keys: Vec<String>) {
        keys.sort();
        keys.dedup();
        self.schemas.insert(event_type.into(), keys);
    }

    /// The essential keys for `event_type`, sorted.
    pub fn keys_for(&self, event_type: &str) -> CertusResult<&[String]> {
        self.schemas
            .get(event_type)
            .map(Vec::as_slice)
            .ok_or_else(|| CertusError::UnknownEssentialSchema {
                event_type: event_type.to_string(),
            })
    }

    /// Essential digest of `payload` under the schema for `event_type`.
    pub fn essential_digest(&self, event_type: &str, payload: &Value) -> CertusResult<String> {
        let keys = self.keys_for(event_type)?;
        essential_digest(payload, keys)
    }

    /// True if the two payloads differ in any essential key of `event_type`.
    pub fn is_material_change(
        &self,
        event_type: &str,
        previous: &Value,
        next: &Value,
    ) -> CertusResult<bool> {
        Ok(self.essential_digest(event_type, previous)? != self.essential_digest(event_type, next)?)
    }
}
