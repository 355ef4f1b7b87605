//! A remote source for running without a server.
//!
//! Every call reports `Unreachable`, so the packet store falls through to
//! its local cache exactly as it would when the network is down.

use async_trait::async_trait;
use serde_json::{Map, Value};

use attest_contracts::verify::VerificationResult;
use attest_core::traits::{RemoteFailure, RemotePacketSource};

const NO_REMOTE: &str = "no remote packet service configured";

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl RemotePacketSource for OfflineRemote {
    async fn fetch_by_hash(&self, _hash: &str) -> Result<Value, RemoteFailure> {
        Err(RemoteFailure::Unreachable {
            message: NO_REMOTE.to_string(),
        })
    }

    async fn fetch_meta(&self, _hash: &str) -> Result<Map<String, Value>, RemoteFailure> {
        Err(RemoteFailure::Unreachable {
            message: NO_REMOTE.to_string(),
        })
    }

    async fn verify(&self, _document: &Value) -> Result<VerificationResult, RemoteFailure> {
        Err(RemoteFailure::Unreachable {
            message: NO_REMOTE.to_string(),
        })
    }
}
