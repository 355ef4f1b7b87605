//! Hash-stamped diff export.
//!
//! Export stamps `exportedAt`, hashes the stamped diff with `diffHash`
//! excluded, embeds the hash and names the artifact from the two packet
//! hash prefixes.  The resulting document verifies `Pass` under the same
//! verifier contract that packets use.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use attest_contracts::{
    config::ExportConfig,
    diff::{AuditDiff, DiffArtifact},
    error::{AttestError, AttestResult},
    hash::DIFF_HASH_FIELD,
};
use attest_integrity::ContentHasher;

/// Placeholder used in file names when a side has no packet hash.
const UNHASHED: &str = "unhashed";

#[derive(Debug, Clone)]
pub struct DiffExporter {
    hasher: ContentHasher,
    config: ExportConfig,
}

impl DiffExporter {
    pub fn new(hasher: ContentHasher, config: ExportConfig) -> Self {
        Self { hasher, config }
    }

    /// Export `diff` stamped with the current time.
    pub fn export(&self, diff: &AuditDiff) -> AttestResult<DiffArtifact> {
        self.export_at(diff, Utc::now())
    }

    /// Export `diff` stamped with `exported_at`.
    ///
    /// Any `exported_at` / `diff_hash` already on `diff` is replaced.
    pub fn export_at(
        &self,
        diff: &AuditDiff,
        exported_at: DateTime<Utc>,
    ) -> AttestResult<DiffArtifact> {
        let mut stamped = diff.clone();
        stamped.exported_at = Some(exported_at);
        stamped.diff_hash = None;

        let document = serde_json::to_value(&stamped)
            .map_err(|e| AttestError::malformed(format!("diff could not be serialized: {e}")))?;
        let sealed = self.hasher.seal(document, DIFF_HASH_FIELD)?;
        let diff_hash = sealed
            .get(DIFF_HASH_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let file_name = self.file_name(diff);
        info!(file_name = %file_name, diff_hash = %diff_hash, "diff exported");

        Ok(DiffArtifact {
            file_name,
            diff_hash,
            document: sealed,
        })
    }

    /// `<prefix>-<left hash prefix>-<right hash prefix>.json`
    pub fn file_name(&self, diff: &AuditDiff) -> String {
        let len = self.config.hash_prefix_len;
        let short = |hash: Option<&str>| -> String {
            hash.map(|h| h.chars().take(len).collect())
                .unwrap_or_else(|| UNHASHED.to_string())
        };
        format!(
            "{}-{}-{}.json",
            self.config.file_prefix,
            short(diff.left.packet_hash.as_deref()),
            short(diff.right.packet_hash.as_deref())
        )
    }
}
