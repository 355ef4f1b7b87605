//! # attest-diff
//!
//! Field-by-field and collection-by-collection comparison of two audit
//! packets, plus hash-stamped export of the resulting diff.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attest_diff::{DiffEngine, DiffExporter, DiffOptions};
//!
//! let engine = DiffEngine::new(config.diff.clone());
//! let diff = engine.build_diff(&left, &right, &DiffOptions::default());
//!
//! let exporter = DiffExporter::new(ContentHasher::new(&config.integrity), config.export.clone());
//! let artifact = exporter.export(&diff)?;
//! std::fs::write(&artifact.file_name, artifact.to_pretty_json())?;
//! ```

pub mod engine;
pub mod export;
pub mod summary;

pub use engine::{DiffEngine, DiffOptions};
pub use export::DiffExporter;
pub use summary::render_summary;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Map, Value};

    use attest_contracts::{
        config::{DiffConfig, ExportConfig, IntegrityConfig},
        packet::AuditPacket,
        verify::Verdict,
    };
    use attest_integrity::{ContentHasher, PacketVerifier};

    use super::{render_summary, DiffEngine, DiffExporter, DiffOptions};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn base_doc() -> Value {
        json!({
            "metadata": {
                "caseId": "case-100",
                "decisionId": "dec-100",
                "generatedAt": "2026-05-10T08:00:00Z"
            },
            "decision": { "status": "pending_review", "riskLevel": "medium", "confidence": 0.64 },
            "evidenceIndex": [
                { "id": "ev-1", "type": "dea_lookup", "source": "state_db", "timestamp": "2026-05-10T07:55:00Z", "details": {} },
                { "id": "ev-2", "type": "npi_lookup", "source": "nppes", "timestamp": "2026-05-10T07:56:00Z", "details": { "npi": "1234567893" } }
            ],
            "humanActions": { "events": [
                { "id": "a-1", "type": "assign", "timestamp": "2026-05-10T08:01:00Z", "payload": { "to": "reviewer-1" } }
            ] },
            "timelineEvents": [
                { "id": "t-1", "type": "submitted", "timestamp": "2026-05-10T07:50:00Z", "payload": {} }
            ]
        })
    }

    fn packet(doc: Value) -> AuditPacket {
        AuditPacket::from_value(doc).unwrap()
    }

    fn sealed(doc: Value) -> AuditPacket {
        PacketVerifier::new(&IntegrityConfig::default())
            .unwrap()
            .seal_packet(doc)
            .unwrap()
    }

    fn engine() -> DiffEngine {
        DiffEngine::new(DiffConfig::default())
    }

    fn diff(left: Value, right: Value) -> attest_contracts::diff::AuditDiff {
        engine().build_diff(&packet(left), &packet(right), &DiffOptions::default())
    }

    // ── Identity and symmetry ─────────────────────────────────────────────────

    #[test]
    fn identical_packets_have_no_changes() {
        let d = diff(base_doc(), base_doc());

        assert!(!d.summary.has_changes);
        assert!(d.changes.decision.is_empty());
        assert!(d.changes.evidence.is_empty());
        assert!(d.changes.human_actions.is_empty());
        assert!(d.changes.timeline.added_types.is_empty());
        assert_eq!(d.changes.timeline.counts.left, d.changes.timeline.counts.right);
    }

    #[test]
    fn evidence_order_is_irrelevant() {
        let mut right = base_doc();
        right["evidenceIndex"].as_array_mut().unwrap().reverse();

        let d = diff(base_doc(), right);
        assert!(!d.summary.has_changes);
    }

    #[test]
    fn added_evidence_mirrors_as_removed() {
        let mut right = base_doc();
        right["evidenceIndex"].as_array_mut().unwrap().push(json!({
            "id": "ev-3", "type": "pdmp_query", "source": "state_pdmp", "timestamp": null, "details": {}
        }));

        let forward = diff(base_doc(), right.clone());
        let backward = diff(right, base_doc());

        assert_eq!(forward.changes.evidence.added.len(), 1);
        assert!(forward.changes.evidence.removed.is_empty());
        assert_eq!(backward.changes.evidence.removed, forward.changes.evidence.added);
        assert!(backward.changes.evidence.added.is_empty());
        assert!(forward.summary.has_changes && backward.summary.has_changes);
    }

    // ── Evidence reconciliation ───────────────────────────────────────────────

    #[test]
    fn same_signature_new_timestamp_is_changed() {
        let left = json!({
            "metadata": { "caseId": "c", "decisionId": "d", "generatedAt": "2026-05-10T08:00:00Z" },
            "decision": { "status": "approved" },
            "evidenceIndex": [ { "type": "dea_lookup", "source": "state_db", "timestamp": "2026-05-10T07:00:00Z" } ]
        });
        let mut right = left.clone();
        right["evidenceIndex"][0]["timestamp"] = json!("2026-05-11T07:00:00Z");

        let d = diff(left, right);
        let evidence = &d.changes.evidence;

        assert_eq!(evidence.changed.len(), 1);
        assert!(evidence.added.is_empty());
        assert!(evidence.removed.is_empty());
        assert_eq!(evidence.changed[0].left.timestamp.as_deref(), Some("2026-05-10T07:00:00Z"));
        assert_eq!(evidence.changed[0].right.timestamp.as_deref(), Some("2026-05-11T07:00:00Z"));
        assert!(d.summary.has_changes);
    }

    #[test]
    fn evidence_differing_only_in_extra_key_is_changed() {
        let mut right = base_doc();
        right["evidenceIndex"][1]["score"] = json!(0.9);

        let d = diff(base_doc(), right);
        let changed = &d.changes.evidence.changed;

        assert_eq!(changed.len(), 1);
        assert!(changed[0].left.extra.is_empty());
        assert_eq!(changed[0].right.extra["score"], json!(0.9));
        assert!(d.summary.has_changes);
    }

    #[test]
    fn evidence_details_compare_numbers_by_value() {
        let mut left = base_doc();
        left["evidenceIndex"][0]["details"] = json!({ "matches": 3 });
        let mut right = base_doc();
        right["evidenceIndex"][0]["details"] = json!({ "matches": 3.0 });

        let d = diff(left, right);
        assert!(d.changes.evidence.is_empty());
    }

    #[test]
    fn duplicate_signature_last_item_wins() {
        let mut left = base_doc();
        left["evidenceIndex"].as_array_mut().unwrap().push(json!({
            "id": "ev-1b", "type": "dea_lookup", "source": "state_db", "timestamp": "2026-05-10T07:58:00Z", "details": {}
        }));
        let mut right = base_doc();
        right["evidenceIndex"][0]["timestamp"] = json!("2026-05-10T07:58:00Z");
        right["evidenceIndex"][0]["id"] = json!("ev-1b");

        let d = diff(left, right);
        assert!(d.changes.evidence.is_empty(), "{:?}", d.changes.evidence);
    }

    // ── Human actions ─────────────────────────────────────────────────────────

    #[test]
    fn actions_are_added_or_removed_never_changed() {
        let mut right = base_doc();
        right["humanActions"]["events"][0]["timestamp"] = json!("2026-05-10T09:00:00Z");
        right["humanActions"]["events"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "id": "a-2", "type": "approve", "timestamp": "2026-05-10T09:05:00Z" }));

        let d = diff(base_doc(), right);
        let actions = &d.changes.human_actions;

        let added: Vec<&str> = actions.added.iter().map(|a| a.id.as_str()).collect();
        let removed: Vec<&str> = actions.removed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(added, vec!["a-1", "a-2"]);
        assert_eq!(removed, vec!["a-1"]);
        assert!(d.summary.has_changes);
    }

    // ── Decision fields ───────────────────────────────────────────────────────

    #[test]
    fn decision_changes_follow_tracked_order() {
        let mut right = base_doc();
        right["decision"]["confidence"] = json!(0.71);
        right["decision"]["status"] = json!("approved");

        let d = diff(base_doc(), right);
        let fields: Vec<&str> = d.changes.decision.iter().map(|c| c.field.as_str()).collect();

        assert_eq!(fields, vec!["status", "confidence"]);
        assert_eq!(d.changes.decision[0].left, Some(json!("pending_review")));
        assert_eq!(d.changes.decision[0].right, Some(json!("approved")));
    }

    #[test]
    fn absent_and_null_decision_fields_differ() {
        let mut left = base_doc();
        left["decision"].as_object_mut().unwrap().remove("riskLevel");
        let mut right = base_doc();
        right["decision"]["riskLevel"] = Value::Null;

        let d = diff(left, right);
        assert_eq!(d.changes.decision.len(), 1);
        assert_eq!(d.changes.decision[0].field, "riskLevel");
        assert_eq!(d.changes.decision[0].left, None);
        assert_eq!(d.changes.decision[0].right, Some(Value::Null));
    }

    #[test]
    fn confidence_uses_exact_equality() {
        let mut right = base_doc();
        right["decision"]["confidence"] = json!(0.6400000001);

        let d = diff(base_doc(), right);
        assert_eq!(d.changes.decision.len(), 1);
    }

    #[test]
    fn integral_float_equals_integer_confidence() {
        let mut left = base_doc();
        left["decision"]["confidence"] = json!(1);
        let mut right = base_doc();
        right["decision"]["confidence"] = json!(1.0);

        let (left, right) = (sealed(left), sealed(right));
        assert_eq!(left.packet_hash(), right.packet_hash());

        let d = engine().build_diff(&left, &right, &DiffOptions::default());
        assert!(d.changes.decision.is_empty(), "{:?}", d.changes.decision);
        assert!(!d.summary.has_changes);
    }

    #[test]
    fn untracked_decision_fields_respect_config() {
        let mut right = base_doc();
        right["decision"]["overrideReason"] = json!("manual verification");

        let with_extra = diff(base_doc(), right.clone());
        assert_eq!(with_extra.changes.decision[0].field, "overrideReason");
        assert_eq!(with_extra.changes.decision[0].left, None);

        let tracked_only = DiffEngine::new(DiffConfig {
            include_untracked_decision_fields: false,
            ..DiffConfig::default()
        })
        .build_diff(&packet(base_doc()), &packet(right), &DiffOptions::default());
        assert!(tracked_only.changes.decision.is_empty());
        assert!(!tracked_only.summary.has_changes);
    }

    // ── Timeline ──────────────────────────────────────────────────────────────

    #[test]
    fn new_timeline_type_is_not_material() {
        let mut right = base_doc();
        right["timelineEvents"].as_array_mut().unwrap().push(json!({
            "id": "t-2", "type": "escalated", "timestamp": "2026-05-10T08:10:00Z", "payload": {}
        }));

        let d = diff(base_doc(), right);

        assert!(!d.summary.has_changes);
        assert_eq!(d.changes.timeline.added_types, vec!["escalated"]);
        assert_eq!(d.changes.timeline.counts.left, 1);
        assert_eq!(d.changes.timeline.counts.right, 2);
    }

    #[test]
    fn added_types_are_deduplicated() {
        let mut right = base_doc();
        let events = right["timelineEvents"].as_array_mut().unwrap();
        for id in ["t-2", "t-3"] {
            events.push(json!({ "id": id, "type": "note", "timestamp": "2026-05-10T08:20:00Z" }));
        }

        let d = diff(base_doc(), right);
        assert_eq!(d.changes.timeline.added_types, vec!["note"]);
    }

    // ── Side summaries ────────────────────────────────────────────────────────

    #[test]
    fn meta_overrides_side_summary() {
        let mut meta = Map::new();
        meta.insert("createdAt".to_string(), json!("2026-05-10T08:00:05Z"));
        meta.insert("submittedBy".to_string(), json!("intake-portal"));

        let options = DiffOptions {
            left_meta: Some(meta),
            right_meta: None,
        };
        let d = engine().build_diff(&packet(base_doc()), &packet(base_doc()), &options);

        assert_eq!(d.left.created_at, "2026-05-10T08:00:05Z");
        assert_eq!(d.left.meta.as_ref().unwrap()["submittedBy"], json!("intake-portal"));
        assert_eq!(d.right.created_at, "2026-05-10T08:00:00Z", "producer text is kept verbatim");
        assert!(d.right.meta.is_none());
        assert_eq!(d.left.case_id, "case-100");
    }

    // ── Export ────────────────────────────────────────────────────────────────

    fn exporter() -> DiffExporter {
        DiffExporter::new(
            ContentHasher::new(&IntegrityConfig::default()),
            ExportConfig::default(),
        )
    }

    #[test]
    fn exported_diff_verifies_pass() {
        let left = sealed(base_doc());
        let mut right_doc = base_doc();
        right_doc["decision"]["status"] = json!("approved");
        let right = sealed(right_doc);

        let d = engine().build_diff(&left, &right, &DiffOptions::default());
        let artifact = exporter().export(&d).unwrap();

        let verifier = PacketVerifier::new(&IntegrityConfig::default()).unwrap();
        let result = verifier.verify_diff_artifact(&artifact.document).unwrap();
        assert_eq!(result.verdict(), Verdict::Pass);
        assert_eq!(result.claimed.as_deref(), Some(artifact.diff_hash.as_str()));

        // Survives a trip through pretty-printed text.
        let reread: Value = serde_json::from_str(&artifact.to_pretty_json()).unwrap();
        assert_eq!(
            verifier.verify_diff_artifact(&reread).unwrap().verdict(),
            Verdict::Pass
        );
    }

    #[test]
    fn tampered_export_fails() {
        let d = diff(base_doc(), base_doc());
        let artifact = exporter().export(&d).unwrap();

        let mut document = artifact.document.clone();
        document["summary"]["hasChanges"] = json!(true);

        let verifier = PacketVerifier::new(&IntegrityConfig::default()).unwrap();
        assert_eq!(
            verifier.verify_diff_artifact(&document).unwrap().verdict(),
            Verdict::Fail
        );
    }

    #[test]
    fn export_is_deterministic_for_fixed_time() {
        let d = diff(base_doc(), base_doc());
        let at = Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap();

        let a = exporter().export_at(&d, at).unwrap();
        let b = exporter().export_at(&d, at).unwrap();
        assert_eq!(a.diff_hash, b.diff_hash);
        assert_eq!(a.document["exportedAt"], json!("2026-05-10T12:00:00Z"));
    }

    #[test]
    fn artifact_name_uses_hash_prefixes() {
        let left = sealed(base_doc());
        let right = sealed(base_doc());
        let d = engine().build_diff(&left, &right, &DiffOptions::default());

        let name = exporter().file_name(&d);
        let l = &left.packet_hash().unwrap()[..8];
        let r = &right.packet_hash().unwrap()[..8];
        assert_eq!(name, format!("audit-diff-{l}-{r}.json"));

        let unsealed = diff(base_doc(), base_doc());
        assert_eq!(exporter().file_name(&unsealed), "audit-diff-unhashed-unhashed.json");
    }

    // ── Summary ───────────────────────────────────────────────────────────────

    #[test]
    fn summary_lists_material_changes() {
        let mut right = base_doc();
        right["decision"]["status"] = json!("approved");
        right["evidenceIndex"].as_array_mut().unwrap().remove(1);

        let text = render_summary(&diff(base_doc(), right));
        assert!(text.contains("**status**"));
        assert!(text.contains("removed `npi_lookup::nppes`"));
        assert!(!text.contains("No material changes"));
    }

    #[test]
    fn summary_of_identical_packets() {
        let text = render_summary(&diff(base_doc(), base_doc()));
        assert!(text.contains("_No material changes._"));
        assert!(text.contains("events: 1 → 1"));
    }
}
