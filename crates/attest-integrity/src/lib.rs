//! # attest-integrity
//!
//! Canonical serialization, SHA-256 content hashing and tamper verification
//! for audit packets and exported diffs.
//!
//! ## Overview
//!
//! A packet carries the hash its producer computed over its own content,
//! with the hash field excluded.  Recomputing that hash later proves the
//! packet unaltered (`Pass`) or tampered (`Fail`); a packet without a claim
//! is `Pending`.  The same contract applies to exported diffs through their
//! `diffHash` field.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attest_integrity::PacketVerifier;
//!
//! let verifier = PacketVerifier::new(&config.integrity)?;
//! let packet = verifier.parse_packet_str(&raw_json)?;
//! let result = verifier.verify(&packet);
//! println!("{}", result.verdict());
//! ```

pub mod canonical;
pub mod hasher;
pub mod schema;

pub use canonical::{canonical_bytes, canonical_string, maps_equal, values_equal};
pub use hasher::{strip_hash_field, ContentHasher};
pub use schema::{packet_schema, PacketSchema};

use serde_json::Value;
use tracing::{info, warn};

use attest_contracts::{
    config::IntegrityConfig,
    error::{AttestError, AttestResult},
    hash::{DIFF_HASH_FIELD, PACKET_HASH_FIELD},
    packet::AuditPacket,
    verify::{Verdict, VerificationResult},
};

/// Parses, hashes and verifies packets and diff artifacts.
#[derive(Debug)]
pub struct PacketVerifier {
    hasher: ContentHasher,
    schema: PacketSchema,
}

impl PacketVerifier {
    pub fn new(config: &IntegrityConfig) -> AttestResult<Self> {
        Ok(Self {
            hasher: ContentHasher::new(config),
            schema: PacketSchema::new()?,
        })
    }

    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    /// Validate and parse a packet document.
    pub fn parse_packet(&self, document: Value) -> AttestResult<AuditPacket> {
        self.schema.parse(document)
    }

    /// Parse JSON text into a validated packet.
    pub fn parse_packet_str(&self, raw: &str) -> AttestResult<AuditPacket> {
        let document: Value = serde_json::from_str(raw)
            .map_err(|e| AttestError::malformed(format!("packet is not valid JSON: {e}")))?;
        self.parse_packet(document)
    }

    /// Hash a packet with `packetHash` excluded.
    pub fn compute_hash(&self, packet: &AuditPacket) -> String {
        self.hasher.compute_packet_hash(packet)
    }

    /// Compare the packet's claimed hash with a recomputation.
    pub fn verify(&self, packet: &AuditPacket) -> VerificationResult {
        let result = VerificationResult::new(
            packet.packet_hash().map(str::to_string),
            Some(self.compute_hash(packet)),
        );
        log_verdict(PACKET_HASH_FIELD, &result);
        result
    }

    /// Parse and verify raw JSON.  Malformed input fails before hashing.
    pub fn verify_json(&self, raw: &str) -> AttestResult<VerificationResult> {
        let packet = self.parse_packet_str(raw)?;
        Ok(self.verify(&packet))
    }

    /// Verify an exported diff artifact against its embedded `diffHash`.
    pub fn verify_diff_artifact(&self, document: &Value) -> AttestResult<VerificationResult> {
        let result = self.hasher.verify_document(document, DIFF_HASH_FIELD)?;
        log_verdict(DIFF_HASH_FIELD, &result);
        Ok(result)
    }

    /// Embed a freshly computed `packetHash` into a packet document.
    ///
    /// The document is validated first; the sealed result verifies `Pass`.
    pub fn seal_packet(&self, document: Value) -> AttestResult<AuditPacket> {
        self.schema.validate(&document)?;
        let sealed = self.hasher.seal(document, PACKET_HASH_FIELD)?;
        AuditPacket::from_value(sealed)
    }
}

fn log_verdict(hash_field: &str, result: &VerificationResult) {
    match result.verdict() {
        Verdict::Pass => info!(hash_field, "integrity check passed"),
        Verdict::Fail => warn!(
            hash_field,
            claimed = result.claimed.as_deref().unwrap_or(""),
            computed = result.computed.as_deref().unwrap_or(""),
            "integrity check failed: content does not match claimed hash"
        ),
        Verdict::Pending => info!(hash_field, "no claimed hash; verification pending"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
