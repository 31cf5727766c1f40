//! # certus-contracts
//!
//! Shared types and errors for the Certus certified event log.
//!
//! Every crate in the workspace imports from here. No hashing or chain logic
//! lives in this crate, only data definitions and the error type.

pub mod error;
pub mod event;
pub mod export;
pub mod filter;
pub mod timestamp;
pub mod verify;
