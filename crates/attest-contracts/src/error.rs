//! Error types for packet resolution, integrity checks and diffing.
//!
//! Every variant carries a message that tells an operator which remediation
//! applies: a missing packet, an unreachable remote, a malformed document or a
//! local cache problem are never collapsed into one generic string.
//!
//! A hash mismatch is deliberately absent from this enum.  It is a valid
//! verification outcome (`Verdict::Fail`), not an error.

use thiserror::Error;

/// The unified error type for the ATTEST crates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestError {
    /// The supplied hash is not a 64-character lowercase hex string.
    ///
    /// Raised before any lookup is attempted.
    #[error("invalid packet hash '{hash}': expected 64 lowercase hex characters")]
    InvalidHash { hash: String },

    /// Neither the remote source nor the local cache hold the packet.
    #[error("packet {hash} not found: {message}")]
    NotFound { hash: String, message: String },

    /// The remote answered with an error, or could not be reached at all.
    ///
    /// `status` is `None` when no response was received.
    #[error("remote unavailable{}: {message}", status_suffix(.status))]
    TransportFailure { status: Option<u16>, message: String },

    /// The document is not shaped like a packet, or lacks a required field.
    #[error("malformed packet: {reason}")]
    MalformedPacket { reason: String },

    /// The local packet cache could not be read or written.
    ///
    /// Reported as a warning next to an otherwise successful operation.
    #[error("local storage failure: {reason}")]
    StorageFailure { reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl AttestError {
    /// Shorthand for a `MalformedPacket` with the given reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPacket {
            reason: reason.into(),
        }
    }

    /// Shorthand for a `StorageFailure` with the given reason.
    pub fn storage(reason: impl Into<String>) -> Self {
        Self::StorageFailure {
            reason: reason.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Convenience alias used throughout the ATTEST crates.
pub type AttestResult<T> = Result<T, AttestError>;
