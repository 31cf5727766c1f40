//! # certus-core
//!
//! The two trust boundaries of the Certus certified event log.
//!
//! - `EventStore`: durable row sink; the only shared mutable state is
//!   each scope's chain head, guarded by compare-and-swap on commit
//! - `TimestampClient`: outbound call to a qualified timestamping service
//!
//! The log owns all hashing and linking. Implementations of these traits
//! never compute or alter `link_hash`.

pub mod traits;

pub use traits::{EventStore, TimestampClient};
