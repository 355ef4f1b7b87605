//! # attest-contracts
//!
//! Shared types for the ATTEST audit-packet integrity and diff engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, configuration and error types.

pub mod config;
pub mod diff;
pub mod error;
pub mod hash;
pub mod packet;
pub mod verify;
