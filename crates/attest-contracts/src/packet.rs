//! Audit packet types.
//!
//! An `AuditPacket` is the immutable snapshot of one governed decision.  It
//! keeps the exact JSON document it was parsed from, and hashing always runs
//! over that document: typed views are for reading and diffing only, so a
//! producer's choice between an absent key and an explicit `null` survives
//! parsing untouched.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    error::{AttestError, AttestResult},
    hash::PACKET_HASH_FIELD,
};

/// Case and decision identity plus the moment the packet was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketMetadata {
    pub case_id: String,
    pub decision_id: String,
    pub generated_at: DateTime<Utc>,
}

/// The decision outcome.
///
/// Producers may add fields beyond the three named ones; those land in
/// `extra` and take part in decision-field diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub status: String,
    #[serde(default)]
    pub risk_level: Option<String>,
    /// Model confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One piece of evidence consulted for the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub details: Map<String, Value>,
    /// Any other keys the producer attached to the item.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EvidenceItem {
    /// Identity key used to match evidence across two packets.
    ///
    /// Derived from `(type, source)` only; the timestamp and details are what
    /// a "changed" entry reports.
    pub fn signature(&self) -> String {
        format!("{}::{}", self.kind, self.source)
    }
}

/// A human action (approval, override, note) recorded against the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl ActionEvent {
    /// Identity key used to match actions across two packets.
    pub fn signature(&self) -> String {
        format!("{}@{}", self.kind, self.timestamp.as_deref().unwrap_or(""))
    }
}

/// Container for human actions, mirroring the `humanActions` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanActions {
    #[serde(default)]
    pub events: Vec<ActionEvent>,
}

/// An informational event on the case timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

/// Which regulatory spec produced the decision, and whether it has drifted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecTrace {
    pub spec_id: String,
    pub spec_version_used: String,
    #[serde(default)]
    pub latest_spec_version: Option<String>,
    #[serde(default)]
    pub drift: Option<bool>,
    #[serde(default)]
    pub parsed_conditions: Vec<Value>,
    #[serde(default)]
    pub constraints_triggered: Vec<Value>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub regulation_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    #[serde(default)]
    pub spec: Option<SpecTrace>,
}

/// Typed projection of the packet document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PacketView {
    metadata: PacketMetadata,
    decision: Decision,
    #[serde(default)]
    evidence_index: Vec<EvidenceItem>,
    #[serde(default)]
    human_actions: HumanActions,
    #[serde(default)]
    timeline_events: Vec<TimelineEvent>,
    #[serde(default)]
    decision_trace: Option<DecisionTrace>,
    #[serde(default)]
    packet_hash: Option<String>,
}

/// An immutable, hashable snapshot of one governed decision.
///
/// Construct with [`AuditPacket::from_value`] or [`AuditPacket::from_json_str`].
/// There are no setters: a modified packet is a different packet and must be
/// rebuilt from a modified document.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditPacket {
    document: Map<String, Value>,
    view: PacketView,
}

impl AuditPacket {
    /// Build a packet from a parsed JSON value.
    ///
    /// Returns `MalformedPacket` when the root is not an object, a required
    /// field is missing or mistyped, or `decision.confidence` lies outside
    /// `[0, 1]`.
    pub fn from_value(value: Value) -> AttestResult<Self> {
        let Value::Object(document) = value else {
            return Err(AttestError::malformed("packet JSON root must be an object"));
        };

        let view: PacketView = serde_json::from_value(Value::Object(document.clone()))
            .map_err(|e| AttestError::malformed(format!("failed to deserialize packet: {e}")))?;

        if let Some(confidence) = view.decision.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(AttestError::malformed(format!(
                    "decision.confidence must lie in [0, 1], got {confidence}"
                )));
            }
        }

        Ok(Self { document, view })
    }

    /// Parse `s` as JSON and build a packet from it.
    pub fn from_json_str(s: &str) -> AttestResult<Self> {
        let value: Value = serde_json::from_str(s)
            .map_err(|e| AttestError::malformed(format!("packet is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// The exact document this packet was parsed from.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// A copy of the document as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.document.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.document)
    }

    pub fn metadata(&self) -> &PacketMetadata {
        &self.view.metadata
    }

    pub fn decision(&self) -> &Decision {
        &self.view.decision
    }

    /// The raw `decision` object, including fields the typed view does not name.
    pub fn decision_fields(&self) -> Option<&Map<String, Value>> {
        self.document.get("decision").and_then(Value::as_object)
    }

    pub fn evidence(&self) -> &[EvidenceItem] {
        &self.view.evidence_index
    }

    pub fn actions(&self) -> &[ActionEvent] {
        &self.view.human_actions.events
    }

    pub fn timeline(&self) -> &[TimelineEvent] {
        &self.view.timeline_events
    }

    pub fn decision_trace(&self) -> Option<&DecisionTrace> {
        self.view.decision_trace.as_ref()
    }

    /// The hash the producer claims for this packet, if one is embedded.
    pub fn packet_hash(&self) -> Option<&str> {
        self.view.packet_hash.as_deref()
    }

    /// Return true if the document carries a `packetHash` key at all.
    pub fn has_hash_field(&self) -> bool {
        self.document.contains_key(PACKET_HASH_FIELD)
    }
}

impl Serialize for AuditPacket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AuditPacket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        AuditPacket::from_value(value).map_err(de::Error::custom)
    }
}
