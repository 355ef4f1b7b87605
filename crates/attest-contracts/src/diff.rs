//! Audit diff and export artifact types.
//!
//! An `AuditDiff` is derived data: it is built fresh for each comparison and
//! has no identity beyond its own content hash.  `exported_at` and
//! `diff_hash` stay empty until the diff is exported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::packet::{ActionEvent, EvidenceItem};

/// Denormalized identity of one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSide {
    pub packet_hash: Option<String>,
    pub case_id: String,
    pub decision_id: String,
    pub created_at: String,
    /// Caller-supplied metadata (e.g. server-side fields not embedded in the
    /// packet).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// One decision field whose value differs between the two packets.
///
/// A side is `None` when the field is absent from that packet, which is
/// distinct from `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Value>,
}

/// Both versions of an evidence item whose signature matched but whose
/// content did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChange {
    pub left: EvidenceItem,
    pub right: EvidenceItem,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChanges {
    pub added: Vec<EvidenceItem>,
    pub removed: Vec<EvidenceItem>,
    pub changed: Vec<EvidenceChange>,
}

impl EvidenceChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Human actions are atomic facts: they appear or disappear, never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanActionChanges {
    pub added: Vec<ActionEvent>,
    pub removed: Vec<ActionEvent>,
}

impl HumanActionChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineCounts {
    pub left: usize,
    pub right: usize,
}

/// Coarse timeline comparison: counts plus event types new on the right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSummary {
    pub counts: TimelineCounts,
    pub added_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffChanges {
    pub decision: Vec<FieldChange>,
    pub evidence: EvidenceChanges,
    pub human_actions: HumanActionChanges,
    pub timeline: TimelineSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    /// True iff decision, evidence or human-action changes are non-empty.
    /// Timeline additions never set this.
    pub has_changes: bool,
}

/// The structured difference between two audit packets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDiff {
    pub left: DiffSide,
    pub right: DiffSide,
    pub changes: DiffChanges,
    pub summary: DiffSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_hash: Option<String>,
}

/// A diff ready for download: the stamped document, its hash and a
/// deterministic file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffArtifact {
    pub file_name: String,
    pub diff_hash: String,
    pub document: Value,
}

impl DiffArtifact {
    /// Pretty-printed JSON of the artifact document, suitable for writing to
    /// disk.
    pub fn to_pretty_json(&self) -> String {
        // A `Value` always serializes.
        serde_json::to_string_pretty(&self.document).unwrap_or_default()
    }
}
