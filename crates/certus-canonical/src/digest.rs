//! SHA-256 digest engine.
//!
//! Two entry points sit on top of the raw byte hash:
//!
//! - `digest_value` hashes the canonical form of a whole value;
//! - `essential_digest` hashes only a selected set of top-level keys, so two
//!   versions of a document that differ only in cosmetic fields (notes,
//!   display metadata) produce the same digest.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use certus_contracts::error::{CertusError, CertusResult};

use crate::canonicalizer::Canonicalizer;

/// SHA-256 over `bytes`, rendered as 64 lowercase hex characters.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 of a UTF-8 string.
pub fn hash_sha256(text: &str) -> String {
    sha256_hex(text.as_bytes())
}

/// SHA-256 of the canonical serialization of `value` (current rule set).
pub fn digest_value(value: &Value) -> CertusResult<String> {
    digest_value_with(&Canonicalizer::current(), value)
}

/// SHA-256 of the canonical serialization of `value` under `canonicalizer`.
pub fn digest_value_with(canonicalizer: &Canonicalizer, value: &Value) -> CertusResult<String> {
    let bytes = canonicalizer.canonicalize(value)?;
    Ok(sha256_hex(&bytes))
}

/// Digest only the `selected_keys` of a map-shaped `value`.
///
/// Selected keys absent from `value` are left out of the hashed subset, so
/// removing an essential key changes the digest, and a key present with
/// `null` differs from an absent one. Keys outside the selection never
/// influence the result. Duplicate selections are ignored.
pub fn essential_digest<S: AsRef<str>>(value: &Value, selected_keys: &[S]) -> CertusResult<String> {
    let map = value.as_object().ok_or_else(|| CertusError::UnserializableValue {
        path: "root".to_string(),
        reason: "essential digest requires a map value".to_string(),
    })?;

    let mut subset = Map::new();
    for key in selected_keys {
        let key = key.as_ref();
        if let Some(field) = map.get(key) {
            subset.insert(key.to_string(), field.clone());
        }
    }

    digest_value(&Value::Object(subset))
}
