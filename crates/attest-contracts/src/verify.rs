//! Verification result and report types.
//!
//! A verification compares the hash a document claims against the hash
//! recomputed from its content.  The outcome is tri-state: a mismatch is a
//! valid `Fail`, distinct from `Pending` where verification could not run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The rendered outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Claimed and computed hashes are both present and equal.
    Pass,
    /// Both present, unequal: the content was altered after hashing.
    Fail,
    /// Claimed or computed hash is missing.
    Pending,
}

impl Verdict {
    /// A remediation-oriented description for operators.
    pub fn describe(self) -> &'static str {
        match self {
            Verdict::Pass => "content matches its embedded hash",
            Verdict::Fail => "tampered or mismatched: content does not match its embedded hash",
            Verdict::Pending => "not verified: claimed or computed hash unavailable",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Pending => "PENDING",
        };
        f.write_str(label)
    }
}

/// `{ claimed, computed, match }` for one verifier run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub claimed: Option<String>,
    pub computed: Option<String>,
    #[serde(rename = "match")]
    pub matched: bool,
}

impl VerificationResult {
    pub fn new(claimed: Option<String>, computed: Option<String>) -> Self {
        let matched = matches!((&claimed, &computed), (Some(c), Some(k)) if c == k);
        Self {
            claimed,
            computed,
            matched,
        }
    }

    pub fn verdict(&self) -> Verdict {
        match (&self.claimed, &self.computed) {
            (Some(claimed), Some(computed)) if claimed == computed => Verdict::Pass,
            (Some(_), Some(_)) => Verdict::Fail,
            _ => Verdict::Pending,
        }
    }
}

/// What the server-side verifier returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServerVerification {
    Completed { result: VerificationResult },
    Unavailable { message: String },
}

impl ServerVerification {
    pub fn verdict(&self) -> Verdict {
        match self {
            ServerVerification::Completed { result } => result.verdict(),
            ServerVerification::Unavailable { .. } => Verdict::Pending,
        }
    }
}

/// Client and server verification results, side by side.
///
/// The two are never reconciled: a disagreement is itself a signal and is
/// surfaced through [`VerificationReport::disagreement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub client: VerificationResult,
    pub server: ServerVerification,
}

impl VerificationReport {
    /// True when the server completed and its verdict differs from the
    /// client's, or both computed hashes are present but differ.
    pub fn disagreement(&self) -> bool {
        match &self.server {
            ServerVerification::Completed { result } => {
                if result.verdict() != self.client.verdict() {
                    return true;
                }
                matches!(
                    (&result.computed, &self.client.computed),
                    (Some(server), Some(client)) if server != client
                )
            }
            ServerVerification::Unavailable { .. } => false,
        }
    }
}
