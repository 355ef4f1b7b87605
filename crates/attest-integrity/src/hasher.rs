//! Content hashing over canonical bytes.
//!
//! Hash input is always the canonical form of the document with its own hash
//! field removed.  Stripping happens here, before canonicalization, so the
//! same rule covers embed-time, verify-time and export-time hashing.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use attest_contracts::{
    config::IntegrityConfig,
    error::{AttestError, AttestResult},
    hash::{HashAlgorithm, PACKET_HASH_FIELD},
    packet::AuditPacket,
    verify::VerificationResult,
};

use crate::canonical::canonical_bytes;

/// Return a copy of `document` without its top-level `hash_field`.
///
/// Non-object values are returned unchanged.
pub fn strip_hash_field(document: &Value, hash_field: &str) -> Value {
    match document {
        Value::Object(map) => {
            let mut stripped = map.clone();
            stripped.remove(hash_field);
            Value::Object(stripped)
        }
        other => other.clone(),
    }
}

/// Computes and checks content hashes with one configured algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
}

impl ContentHasher {
    pub fn new(config: &IntegrityConfig) -> Self {
        Self {
            algorithm: config.algorithm,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest raw canonical bytes.  Returns lowercase hex.
    pub fn digest(&self, canonical: &[u8]) -> String {
        match self.algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(canonical);
                hex::encode(hasher.finalize())
            }
        }
    }

    /// Hash `document` with `hash_field` excluded.
    pub fn compute_hash(&self, document: &Value, hash_field: &str) -> String {
        let stripped = strip_hash_field(document, hash_field);
        let hash = self.digest(&canonical_bytes(&stripped));
        debug!(hash_field, computed = %hash, "content hash computed");
        hash
    }

    /// Hash a packet's document with `packetHash` excluded.
    pub fn compute_packet_hash(&self, packet: &AuditPacket) -> String {
        self.compute_hash(&packet.to_value(), PACKET_HASH_FIELD)
    }

    /// Compare the hash `document` claims in `hash_field` with a fresh
    /// recomputation.
    ///
    /// Returns `MalformedPacket` if `document` is not an object or the hash
    /// field holds something other than a string or `null`.  A missing or
    /// `null` claim yields a `Pending` result, never an error.
    pub fn verify_document(
        &self,
        document: &Value,
        hash_field: &str,
    ) -> AttestResult<VerificationResult> {
        let map = document
            .as_object()
            .ok_or_else(|| AttestError::malformed("document root must be an object"))?;

        let claimed = match map.get(hash_field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(AttestError::malformed(format!(
                    "`{hash_field}` must be a string, got {other}"
                )))
            }
        };

        let computed = self.compute_hash(document, hash_field);
        Ok(VerificationResult::new(claimed, Some(computed)))
    }

    /// Compute the hash of `document` and embed it under `hash_field`.
    ///
    /// Any existing value of `hash_field` is ignored and replaced.
    pub fn seal(&self, document: Value, hash_field: &str) -> AttestResult<Value> {
        let Value::Object(mut map) = document else {
            return Err(AttestError::malformed("document root must be an object"));
        };
        map.remove(hash_field);
        let hash = self.digest(&canonical_bytes(&Value::Object(map.clone())));
        map.insert(hash_field.to_string(), Value::String(hash));
        Ok(Value::Object(map))
    }
}
