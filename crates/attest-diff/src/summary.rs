//! Human-readable summary renderer for audit diffs.

use serde_json::Value;

use attest_contracts::diff::AuditDiff;

/// Render a Markdown review summary of an [`AuditDiff`].
///
/// Informational only; the structured diff is the record of truth.
pub fn render_summary(diff: &AuditDiff) -> String {
    let mut out = String::new();

    out.push_str("## Audit Packet Diff\n\n");
    out.push_str(&format!(
        "| | Packet | Case | Decision | Created |\n\
         |---|---|---|---|---|\n\
         | Left | `{}` | {} | {} | {} |\n\
         | Right | `{}` | {} | {} | {} |\n\n",
        short(diff.left.packet_hash.as_deref()),
        diff.left.case_id,
        diff.left.decision_id,
        diff.left.created_at,
        short(diff.right.packet_hash.as_deref()),
        diff.right.case_id,
        diff.right.decision_id,
        diff.right.created_at,
    ));

    let changes = &diff.changes;
    if !diff.summary.has_changes {
        out.push_str("_No material changes._\n\n");
    }

    if !changes.decision.is_empty() {
        out.push_str("### Decision\n\n");
        for change in &changes.decision {
            out.push_str(&format!(
                "- **{}**: {} → {}\n",
                change.field,
                render_value(change.left.as_ref()),
                render_value(change.right.as_ref())
            ));
        }
        out.push('\n');
    }

    let evidence = &changes.evidence;
    if !evidence.is_empty() {
        out.push_str("### Evidence\n\n");
        for item in &evidence.added {
            out.push_str(&format!("- added `{}`\n", item.signature()));
        }
        for item in &evidence.removed {
            out.push_str(&format!("- removed `{}`\n", item.signature()));
        }
        for change in &evidence.changed {
            out.push_str(&format!("- changed `{}`\n", change.left.signature()));
        }
        out.push('\n');
    }

    let actions = &changes.human_actions;
    if !actions.is_empty() {
        out.push_str(&format!(
            "### Human Actions\n\n- added: {}\n- removed: {}\n\n",
            actions.added.len(),
            actions.removed.len()
        ));
    }

    let timeline = &changes.timeline;
    out.push_str(&format!(
        "### Timeline\n\n- events: {} → {}\n",
        timeline.counts.left, timeline.counts.right
    ));
    if !timeline.added_types.is_empty() {
        out.push_str(&format!("- new types: {}\n", timeline.added_types.join(", ")));
    }

    out
}

fn short(hash: Option<&str>) -> String {
    match hash {
        Some(h) => h.chars().take(12).collect(),
        None => "(none)".to_string(),
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None => "_absent_".to_string(),
        Some(v) => format!("`{}`", v),
    }
}
