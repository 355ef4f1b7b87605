//! Two-sided packet comparison.
//!
//! Both sides are resolved concurrently.  One side failing neither cancels
//! nor blocks the other: both outcomes are collected, and a diff is built
//! only when both sides resolved.

use thiserror::Error;
use tracing::{info, warn};

use attest_contracts::{diff::AuditDiff, error::AttestError};
use attest_diff::{DiffEngine, DiffOptions};

use crate::store::{PacketInput, PacketStore, Resolution};

/// Both resolved sides and the diff between them.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub left: Resolution,
    pub right: Resolution,
    pub diff: AuditDiff,
}

/// Per-side resolution errors.  At least one side is `Some`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("comparison failed: {}", describe(.left, .right))]
pub struct CompareFailure {
    pub left: Option<AttestError>,
    pub right: Option<AttestError>,
}

fn describe(left: &Option<AttestError>, right: &Option<AttestError>) -> String {
    let mut parts = Vec::new();
    if let Some(e) = left {
        parts.push(format!("left: {e}"));
    }
    if let Some(e) = right {
        parts.push(format!("right: {e}"));
    }
    parts.join("; ")
}

/// Resolves two packets and diffs them.
#[derive(Clone)]
pub struct Comparator {
    store: PacketStore,
    engine: DiffEngine,
}

impl Comparator {
    pub fn new(store: PacketStore, engine: DiffEngine) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &PacketStore {
        &self.store
    }

    /// Resolve `left` and `right` concurrently and build their diff.
    ///
    /// Server metadata fetched for either side is passed to the diff engine
    /// as that side's meta overrides.
    pub async fn compare(
        &self,
        left: &PacketInput,
        right: &PacketInput,
    ) -> Result<Comparison, CompareFailure> {
        let (left, right) = tokio::join!(self.store.obtain(left), self.store.obtain(right));

        match (left, right) {
            (Ok(left), Ok(right)) => {
                let options = DiffOptions {
                    left_meta: left.meta.clone(),
                    right_meta: right.meta.clone(),
                };
                let diff = self.engine.build_diff(&left.packet, &right.packet, &options);
                info!(
                    left = %left.hash,
                    right = %right.hash,
                    has_changes = diff.summary.has_changes,
                    "comparison complete"
                );
                Ok(Comparison { left, right, diff })
            }
            (left, right) => {
                let failure = CompareFailure {
                    left: left.err(),
                    right: right.err(),
                };
                warn!(error = %failure, "comparison aborted");
                Err(failure)
            }
        }
    }
}
