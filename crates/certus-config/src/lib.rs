//! # certus-config
//!
//! TOML-driven configuration for the Certus certified event log.
//!
//! ## Overview
//!
//! [`CertusConfig`] covers three concerns:
//!
//! - append retry bounds and the canonicalization version (`[log]`);
//! - which event types are sent for qualified timestamping, and how often
//!   the outbox is swept (`[timestamping]`, per-type `timestamp`);
//! - the essential payload keys of each event type (`[[event_types]]`),
//!   exposed through [`EssentialFieldRegistry`].
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use certus_config::CertusConfig;
//!
//! let config = CertusConfig::from_file(Path::new("config/contracts.toml"))?;
//! let registry = config.essential_fields();
//! ```

pub mod loader;
pub mod registry;
pub mod settings;

pub use registry::EssentialFieldRegistry;
pub use settings::{CertusConfig, EventTypeConfig, LogSettings, TimestampPolicy, TimestampSettings};

// ── Tests ─────────────────────────────────────────────────────────────────────
