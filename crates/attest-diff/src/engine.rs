//! Structural diff engine for audit packets.
//!
//! `DiffEngine::build_diff` is a pure function of two packets and optional
//! caller metadata.  Comparison runs in four independent parts:
//!
//! 1. **Decision fields** — the configured tracked fields, then (optionally)
//!    every other field either decision object defines.  Values compare
//!    as the canonicalizer writes them, so `1` equals `1.0`; an absent
//!    field differs from a `null` one.
//! 2. **Evidence** — items are matched by signature, never by position.
//!    Right-only items are added, left-only removed, matched-but-unequal
//!    changed.
//! 3. **Human actions** — matched by signature, added/removed only.
//! 4. **Timeline** — counts and newly appearing event types.  Timeline
//!    changes alone never make a diff material.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::debug;

use attest_contracts::{
    config::DiffConfig,
    diff::{
        AuditDiff, DiffChanges, DiffSide, DiffSummary, EvidenceChange, EvidenceChanges,
        FieldChange, HumanActionChanges, TimelineCounts, TimelineSummary,
    },
    packet::{ActionEvent, AuditPacket, EvidenceItem, TimelineEvent},
};
use attest_integrity::{maps_equal, values_equal};

/// Caller-supplied metadata merged into each side's summary.
///
/// String values under `packetHash`, `caseId`, `decisionId` or `createdAt`
/// override what the packet itself carries.
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    pub left_meta: Option<Map<String, Value>>,
    pub right_meta: Option<Map<String, Value>>,
}

/// Builds `AuditDiff`s according to a `DiffConfig`.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Compare `left` against `right`.
    pub fn build_diff(
        &self,
        left: &AuditPacket,
        right: &AuditPacket,
        options: &DiffOptions,
    ) -> AuditDiff {
        let decision = self.decision_changes(left, right);
        let evidence = evidence_changes(left.evidence(), right.evidence());
        let human_actions = action_changes(left.actions(), right.actions());
        let timeline = timeline_summary(left.timeline(), right.timeline());

        let has_changes = !decision.is_empty() || !evidence.is_empty() || !human_actions.is_empty();

        debug!(
            decision_changes = decision.len(),
            evidence_added = evidence.added.len(),
            evidence_removed = evidence.removed.len(),
            evidence_changed = evidence.changed.len(),
            actions_added = human_actions.added.len(),
            actions_removed = human_actions.removed.len(),
            timeline_added_types = timeline.added_types.len(),
            has_changes,
            "diff built"
        );

        AuditDiff {
            left: side_summary(left, options.left_meta.as_ref()),
            right: side_summary(right, options.right_meta.as_ref()),
            changes: DiffChanges {
                decision,
                evidence,
                human_actions,
                timeline,
            },
            summary: DiffSummary { has_changes },
            exported_at: None,
            diff_hash: None,
        }
    }

    // ── Decision fields ───────────────────────────────────────────────────────

    fn decision_changes(&self, left: &AuditPacket, right: &AuditPacket) -> Vec<FieldChange> {
        let empty = Map::new();
        let left_fields = left.decision_fields().unwrap_or(&empty);
        let right_fields = right.decision_fields().unwrap_or(&empty);

        self.compared_fields(left_fields, right_fields)
            .into_iter()
            .filter_map(|field| {
                let l = left_fields.get(&field);
                let r = right_fields.get(&field);
                let unchanged = match (l, r) {
                    (Some(l), Some(r)) => values_equal(l, r),
                    (l, r) => l.is_none() && r.is_none(),
                };
                (!unchanged).then(|| FieldChange {
                    field,
                    left: l.cloned(),
                    right: r.cloned(),
                })
            })
            .collect()
    }

    /// Tracked fields first, then untracked fields in first-seen order.
    fn compared_fields(&self, left: &Map<String, Value>, right: &Map<String, Value>) -> Vec<String> {
        let mut fields = self.config.tracked_decision_fields.clone();
        if self.config.include_untracked_decision_fields {
            let mut seen: HashSet<String> = fields.iter().cloned().collect();
            for key in left.keys().chain(right.keys()) {
                if seen.insert(key.clone()) {
                    fields.push(key.clone());
                }
            }
        }
        fields
    }
}

// ── Signature matching ────────────────────────────────────────────────────────

/// Items of one side keyed by signature, with first-seen signature order.
struct SignatureIndex<'a, T> {
    order: Vec<String>,
    items: HashMap<String, &'a T>,
}

impl<'a, T> SignatureIndex<'a, T> {
    /// Index `items` by `signature`.  A repeated signature keeps its first
    /// position but the last item wins.
    fn build(items: &'a [T], signature: impl Fn(&T) -> String) -> Self {
        let mut order = Vec::with_capacity(items.len());
        let mut map = HashMap::with_capacity(items.len());
        for item in items {
            let sig = signature(item);
            if map.insert(sig.clone(), item).is_some() {
                debug!(signature = %sig, "duplicate signature; keeping last item");
            } else {
                order.push(sig);
            }
        }
        Self { order, items: map }
    }

    fn get(&self, signature: &str) -> Option<&'a T> {
        self.items.get(signature).copied()
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &'a T)> + '_ {
        self.order
            .iter()
            .filter_map(|sig| self.items.get(sig).map(|item| (sig.as_str(), *item)))
    }
}

fn evidence_changes(left: &[EvidenceItem], right: &[EvidenceItem]) -> EvidenceChanges {
    let left_index = SignatureIndex::build(left, EvidenceItem::signature);
    let right_index = SignatureIndex::build(right, EvidenceItem::signature);

    let mut changes = EvidenceChanges::default();
    for (sig, l) in left_index.iter() {
        match right_index.get(sig) {
            None => changes.removed.push(l.clone()),
            Some(r) if !evidence_equal(l, r) => changes.changed.push(EvidenceChange {
                left: l.clone(),
                right: r.clone(),
            }),
            Some(_) => {}
        }
    }
    for (sig, r) in right_index.iter() {
        if left_index.get(sig).is_none() {
            changes.added.push(r.clone());
        }
    }
    changes
}

/// Deep equality of two items sharing a signature, with numbers compared the
/// way the canonicalizer writes them.
fn evidence_equal(left: &EvidenceItem, right: &EvidenceItem) -> bool {
    left.id == right.id
        && left.kind == right.kind
        && left.source == right.source
        && left.timestamp == right.timestamp
        && maps_equal(&left.details, &right.details)
        && maps_equal(&left.extra, &right.extra)
}

fn action_changes(left: &[ActionEvent], right: &[ActionEvent]) -> HumanActionChanges {
    let left_index = SignatureIndex::build(left, ActionEvent::signature);
    let right_index = SignatureIndex::build(right, ActionEvent::signature);

    HumanActionChanges {
        added: right_index
            .iter()
            .filter(|(sig, _)| left_index.get(sig).is_none())
            .map(|(_, item)| item.clone())
            .collect(),
        removed: left_index
            .iter()
            .filter(|(sig, _)| right_index.get(sig).is_none())
            .map(|(_, item)| item.clone())
            .collect(),
    }
}

fn timeline_summary(left: &[TimelineEvent], right: &[TimelineEvent]) -> TimelineSummary {
    let left_types: HashSet<&str> = left.iter().map(|e| e.kind.as_str()).collect();
    let mut seen = HashSet::new();
    let added_types = right
        .iter()
        .map(|e| e.kind.as_str())
        .filter(|kind| !left_types.contains(kind) && seen.insert(*kind))
        .map(str::to_string)
        .collect();

    TimelineSummary {
        counts: TimelineCounts {
            left: left.len(),
            right: right.len(),
        },
        added_types,
    }
}

// ── Side summaries ────────────────────────────────────────────────────────────

fn side_summary(packet: &AuditPacket, meta: Option<&Map<String, Value>>) -> DiffSide {
    let metadata = packet.metadata();
    let override_str = |key: &str| {
        meta.and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    DiffSide {
        packet_hash: override_str("packetHash").or_else(|| packet.packet_hash().map(str::to_string)),
        case_id: override_str("caseId").unwrap_or_else(|| metadata.case_id.clone()),
        decision_id: override_str("decisionId").unwrap_or_else(|| metadata.decision_id.clone()),
        created_at: override_str("createdAt")
            .or_else(|| generated_at_text(packet))
            .unwrap_or_else(|| metadata.generated_at.to_rfc3339()),
        meta: meta.cloned(),
    }
}

/// `metadata.generatedAt` exactly as the producer wrote it.
fn generated_at_text(packet: &AuditPacket) -> Option<String> {
    packet
        .document()
        .get("metadata")
        .and_then(|m| m.get("generatedAt"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
