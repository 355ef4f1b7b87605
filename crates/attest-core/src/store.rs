//! The packet store facade: remote-first resolution with local fallback and
//! cache-fill.
//!
//! Resolution order for `resolve(hash)`:
//!
//!   Validate → Remote fetch → [Meta fetch] → Cache-fill
//!                  └─ not found / unreachable → Local lookup
//!
//! A remote that answers with an error status is surfaced at once: it says
//! nothing about whether the packet exists, only that the server is
//! unavailable.  A remote that cannot be reached at all falls through to the
//! local cache, which is what makes previously resolved packets available
//! offline.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use attest_contracts::{
    error::{AttestError, AttestResult},
    hash::PACKET_HASH_FIELD,
    packet::AuditPacket,
    verify::{ServerVerification, VerificationReport},
};
use attest_integrity::PacketVerifier;

use crate::traits::{LocalPacketStore, RemoteFailure, RemotePacketSource};

/// Where a resolved packet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    Remote,
    Local,
    Pasted,
}

/// A successfully resolved packet.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub hash: String,
    pub packet: AuditPacket,
    /// Server-side metadata; only present for remote resolutions whose
    /// metadata fetch succeeded.
    pub meta: Option<Map<String, Value>>,
    pub source: ResolvedFrom,
    /// Non-fatal problems encountered along the way (cache-fill failures).
    pub warnings: Vec<AttestError>,
}

/// One side of a comparison as the caller supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketInput {
    /// A packet hash to resolve.
    Hash(String),
    /// Raw packet JSON pasted by the caller.
    Pasted(String),
}

/// Local-first, remote-fallback packet retrieval.
#[derive(Clone)]
pub struct PacketStore {
    local: Arc<dyn LocalPacketStore>,
    remote: Arc<dyn RemotePacketSource>,
    verifier: Arc<PacketVerifier>,
}

impl PacketStore {
    pub fn new(
        local: Arc<dyn LocalPacketStore>,
        remote: Arc<dyn RemotePacketSource>,
        verifier: Arc<PacketVerifier>,
    ) -> Self {
        Self {
            local,
            remote,
            verifier,
        }
    }

    pub fn verifier(&self) -> &PacketVerifier {
        &self.verifier
    }

    /// Resolve either kind of input.
    pub async fn obtain(&self, input: &PacketInput) -> AttestResult<Resolution> {
        match input {
            PacketInput::Hash(hash) => self.resolve(hash).await,
            PacketInput::Pasted(raw) => self.accept_pasted(raw).await,
        }
    }

    /// Resolve a packet by hash.
    ///
    /// # Errors
    ///
    /// - `InvalidHash` — `hash` is malformed; nothing is looked up
    /// - `TransportFailure` — the remote errored, or was unreachable and the
    ///   local cache had no copy
    /// - `NotFound` — the remote reported absence and the local cache missed
    /// - `MalformedPacket` — the stored document is not packet-shaped
    pub async fn resolve(&self, hash: &str) -> AttestResult<Resolution> {
        self.verifier.hasher().algorithm().check_hash(hash)?;

        match self.remote.fetch_by_hash(hash).await {
            Ok(document) => {
                let packet = self.verifier.parse_packet(document)?;
                let meta = match self.remote.fetch_meta(hash).await {
                    Ok(meta) => Some(meta),
                    Err(e) => {
                        debug!(hash = %hash, error = %e, "metadata fetch failed; continuing without it");
                        None
                    }
                };
                let warnings = self.cache_fill(hash, &packet).await;

                info!(hash = %hash, "packet resolved from remote");
                Ok(Resolution {
                    hash: hash.to_string(),
                    packet,
                    meta,
                    source: ResolvedFrom::Remote,
                    warnings,
                })
            }
            Err(failure @ RemoteFailure::Server { .. }) => {
                warn!(hash = %hash, error = %failure, "remote errored; not falling back to local");
                Err(failure.into_error(hash))
            }
            Err(failure) => {
                debug!(hash = %hash, error = %failure, "remote miss; trying local cache");
                self.resolve_local(hash, failure).await
            }
        }
    }

    async fn resolve_local(&self, hash: &str, remote: RemoteFailure) -> AttestResult<Resolution> {
        let local_err = match self.local.get(hash).await {
            Ok(document) => {
                let packet = self.verifier.parse_packet(document)?;
                if packet.packet_hash() != Some(hash) {
                    warn!(hash = %hash, "cached packet carries a different packetHash than its key");
                }
                info!(hash = %hash, "packet resolved from local cache");
                return Ok(Resolution {
                    hash: hash.to_string(),
                    packet,
                    meta: None,
                    source: ResolvedFrom::Local,
                    warnings: Vec::new(),
                });
            }
            Err(e) => e,
        };

        let message = match local_message(&local_err) {
            Some(local) => local,
            None => remote.message().to_string(),
        };
        warn!(hash = %hash, remote = %remote, local = %local_err, "packet could not be resolved");

        Err(match remote {
            RemoteFailure::Unreachable { message: remote_message } => AttestError::TransportFailure {
                status: None,
                message: format!("{remote_message}; no local copy ({message})"),
            },
            _ => AttestError::NotFound {
                hash: hash.to_string(),
                message,
            },
        })
    }

    /// Accept raw packet JSON supplied directly by the caller.
    ///
    /// The document must carry a well-formed `packetHash`; it is cached under
    /// that hash.  The hash is not checked against the content here; use
    /// [`PacketStore::cross_verify`] or the verifier for that.
    pub async fn accept_pasted(&self, raw: &str) -> AttestResult<Resolution> {
        let document: Value = serde_json::from_str(raw)
            .map_err(|e| AttestError::malformed(format!("pasted text is not valid JSON: {e}")))?;

        let hash = document
            .get(PACKET_HASH_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AttestError::malformed(format!("pasted packet must carry a `{PACKET_HASH_FIELD}` field"))
            })?;
        self.verifier.hasher().algorithm().check_hash(&hash)?;

        let packet = self.verifier.parse_packet(document)?;
        let warnings = self.cache_fill(&hash, &packet).await;

        info!(hash = %hash, "pasted packet accepted");
        Ok(Resolution {
            hash,
            packet,
            meta: None,
            source: ResolvedFrom::Pasted,
            warnings,
        })
    }

    /// Verify locally and on the server, reporting both without reconciling.
    pub async fn cross_verify(&self, packet: &AuditPacket) -> VerificationReport {
        let client = self.verifier.verify(packet);
        let server = match self.remote.verify(&packet.to_value()).await {
            Ok(result) => ServerVerification::Completed { result },
            Err(e) => ServerVerification::Unavailable {
                message: e.to_string(),
            },
        };

        let report = VerificationReport { client, server };
        if report.disagreement() {
            warn!(
                client = %report.client.verdict(),
                server = %report.server.verdict(),
                "client and server verification disagree"
            );
        }
        report
    }

    /// Write `packet` to the local cache.  Failures become warnings.
    async fn cache_fill(&self, hash: &str, packet: &AuditPacket) -> Vec<AttestError> {
        match self.local.put(hash, &packet.to_value()).await {
            Ok(()) => Vec::new(),
            Err(e) => {
                warn!(hash = %hash, error = %e, "cache-fill failed");
                let warning = match e {
                    AttestError::StorageFailure { .. } => e,
                    other => AttestError::storage(other.to_string()),
                };
                vec![warning]
            }
        }
    }
}

/// The most specific message a local lookup error carries.
fn local_message(err: &AttestError) -> Option<String> {
    let message = match err {
        AttestError::NotFound { message, .. } => message.clone(),
        AttestError::StorageFailure { reason } => reason.clone(),
        other => other.to_string(),
    };
    (!message.is_empty()).then_some(message)
}
