//! # certus-canonical
//!
//! Deterministic canonicalization and SHA-256 digests for the Certus
//! certified event chain.
//!
//! Everything that participates in hashing lives here: the canonical byte
//! form, whole-value and essential-field digests, and the link-hash
//! composition that ties each event to its predecessor. A verifier that
//! trusts only this crate can recompute every hash in a chain.

pub mod canonicalizer;
pub mod digest;
pub mod link;
pub mod payload;

#[cfg(test)]
mod strategies;

pub use canonicalizer::{canonicalize, CanonicalVersion, Canonicalizer};
pub use digest::{digest_value, digest_value_with, essential_digest, hash_sha256, sha256_hex};
pub use link::{format_created_at, record_digest, LinkMaterial};
pub use payload::to_payload;
