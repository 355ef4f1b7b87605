//! Interfaces to the storage collaborators the core consumes.
//!
//! - `LocalPacketStore`   — content-addressed local persistence
//! - `RemotePacketSource` — the server holding canonical packets
//!
//! Both are treated as opaque key-value transports.  The facade in
//! [`crate::store`] decides what each outcome means for resolution.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use attest_contracts::{
    error::{AttestError, AttestResult},
    verify::VerificationResult,
};

/// Local packet persistence keyed by packet hash.
///
/// Content is immutable and addressed by its own hash, so concurrent `put`s
/// of the same key converge to the same value.
#[async_trait]
pub trait LocalPacketStore: Send + Sync {
    /// Load the packet document stored under `hash`.
    ///
    /// Returns `NotFound` for a miss and `StorageFailure` for a read error.
    async fn get(&self, hash: &str) -> AttestResult<Value>;

    /// Store `document` under `hash`, overwriting any previous value.
    async fn put(&self, hash: &str, document: &Value) -> AttestResult<()>;
}

/// Why a remote call did not produce data.
///
/// "Not found" is kept apart from the other two: it is the only outcome that
/// says the packet is absent rather than unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFailure {
    /// The remote answered 404.
    #[error("remote has no such packet: {message}")]
    NotFound { message: String },

    /// No response at all (offline, DNS, connection refused).
    #[error("remote unreachable: {message}")]
    Unreachable { message: String },

    /// The remote answered with a non-404 error status.
    #[error("remote error (status {status}): {message}")]
    Server { status: u16, message: String },
}

impl RemoteFailure {
    /// Classify an HTTP-style status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 404 {
            RemoteFailure::NotFound { message }
        } else {
            RemoteFailure::Server { status, message }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RemoteFailure::NotFound { message }
            | RemoteFailure::Unreachable { message }
            | RemoteFailure::Server { message, .. } => message,
        }
    }

    /// The `AttestError` this failure becomes when it ends a resolution.
    pub fn into_error(self, hash: &str) -> AttestError {
        match self {
            RemoteFailure::NotFound { message } => AttestError::NotFound {
                hash: hash.to_string(),
                message,
            },
            RemoteFailure::Unreachable { message } => AttestError::TransportFailure {
                status: None,
                message,
            },
            RemoteFailure::Server { status, message } => AttestError::TransportFailure {
                status: Some(status),
                message,
            },
        }
    }
}

/// The remote packet service.
#[async_trait]
pub trait RemotePacketSource: Send + Sync {
    /// Fetch the packet document stored under `hash`.
    async fn fetch_by_hash(&self, hash: &str) -> Result<Value, RemoteFailure>;

    /// Fetch server-side metadata for `hash`.  Best effort.
    async fn fetch_meta(&self, hash: &str) -> Result<Map<String, Value>, RemoteFailure>;

    /// Ask the server to recompute and compare the packet's hash.
    async fn verify(&self, document: &Value) -> Result<VerificationResult, RemoteFailure>;
}
