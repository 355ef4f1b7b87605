//! Structural validation of packet documents.
//!
//! Validation runs in two phases, mirroring how packets are admitted:
//!
//! 1. **Structural** — the document is checked against [`packet_schema`]
//!    with the `jsonschema` crate.  Every violation is collected, with its
//!    instance path, so an operator sees the full failure set at once.
//! 2. **Typed** — the document is projected into `AuditPacket`.
//!
//! Either phase failing yields `MalformedPacket`; no hashing happens on
//! malformed input.

use serde_json::{json, Value};
use tracing::warn;

use attest_contracts::{
    error::{AttestError, AttestResult},
    packet::AuditPacket,
};

/// The JSON Schema every audit packet document must satisfy.
pub fn packet_schema() -> Value {
    let nullable_string = json!({ "type": ["string", "null"] });
    json!({
        "type": "object",
        "required": ["metadata", "decision"],
        "properties": {
            "metadata": {
                "type": "object",
                "required": ["caseId", "decisionId", "generatedAt"],
                "properties": {
                    "caseId": { "type": "string" },
                    "decisionId": { "type": "string" },
                    "generatedAt": { "type": "string" }
                }
            },
            "decision": {
                "type": "object",
                "required": ["status"],
                "properties": {
                    "status": { "type": "string" },
                    "riskLevel": nullable_string,
                    "confidence": { "type": ["number", "null"], "minimum": 0, "maximum": 1 }
                }
            },
            "evidenceIndex": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["type", "source"],
                    "properties": {
                        "id": { "type": "string" },
                        "type": { "type": "string" },
                        "source": { "type": "string" },
                        "timestamp": nullable_string,
                        "details": { "type": "object" }
                    }
                }
            },
            "humanActions": {
                "type": "object",
                "properties": {
                    "events": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["type"],
                            "properties": {
                                "id": { "type": "string" },
                                "type": { "type": "string" },
                                "timestamp": nullable_string
                            }
                        }
                    }
                }
            },
            "timelineEvents": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "id": { "type": "string" },
                        "type": { "type": "string" },
                        "timestamp": nullable_string
                    }
                }
            },
            "decisionTrace": {
                "type": ["object", "null"],
                "properties": {
                    "spec": {
                        "type": ["object", "null"],
                        "required": ["specId", "specVersionUsed"],
                        "properties": {
                            "specId": { "type": "string" },
                            "specVersionUsed": { "type": "string" },
                            "latestSpecVersion": nullable_string,
                            "drift": { "type": ["boolean", "null"] }
                        }
                    }
                }
            },
            "packetHash": nullable_string
        }
    })
}

/// Compiled packet schema.
pub struct PacketSchema {
    validator: jsonschema::Validator,
}

impl PacketSchema {
    /// Compile [`packet_schema`].
    ///
    /// Returns `ConfigError` if the schema document fails to compile.
    pub fn new() -> AttestResult<Self> {
        let validator =
            jsonschema::validator_for(&packet_schema()).map_err(|e| AttestError::ConfigError {
                reason: format!("packet schema failed to compile: {}", e),
            })?;
        Ok(Self { validator })
    }

    /// Check `document` against the schema, collecting every violation.
    pub fn validate(&self, document: &Value) -> AttestResult<()> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(document)
            .map(|error| format!("at '{}': {}", error.instance_path, error))
            .collect();

        if violations.is_empty() {
            return Ok(());
        }

        warn!(count = violations.len(), "packet failed structural validation");
        Err(AttestError::malformed(violations.join("; ")))
    }

    /// Validate `document` and project it into an `AuditPacket`.
    pub fn parse(&self, document: Value) -> AttestResult<AuditPacket> {
        self.validate(&document)?;
        AuditPacket::from_value(document)
    }
}

impl std::fmt::Debug for PacketSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketSchema").finish_non_exhaustive()
    }
}
