//! Engine configuration.
//!
//! Configuration is an explicit value handed to the hasher, diff engine and
//! exporter at construction.  It is read from TOML; every field has a
//! default, so an empty document is a valid configuration.
//!
//! ```toml
//! [integrity]
//! algorithm = "sha256"
//!
//! [diff]
//! tracked_decision_fields = ["status", "riskLevel", "confidence"]
//! include_untracked_decision_fields = true
//!
//! [export]
//! file_prefix = "audit-diff"
//! hash_prefix_len = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AttestError, AttestResult},
    hash::HashAlgorithm,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    pub algorithm: HashAlgorithm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Decision fields compared first, in this order.
    pub tracked_decision_fields: Vec<String>,

    /// Also compare every other field either decision object defines.
    pub include_untracked_decision_fields: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            tracked_decision_fields: vec![
                "status".to_string(),
                "riskLevel".to_string(),
                "confidence".to_string(),
            ],
            include_untracked_decision_fields: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_prefix: String,

    /// Number of leading hash characters used in artifact file names.
    pub hash_prefix_len: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_prefix: "audit-diff".to_string(),
            hash_prefix_len: 8,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestConfig {
    pub integrity: IntegrityConfig,
    pub diff: DiffConfig,
    pub export: ExportConfig,
}

impl AttestConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `AttestError::ConfigError` if the TOML is malformed or a value
    /// is out of range.
    pub fn from_toml_str(s: &str) -> AttestResult<Self> {
        let config: AttestConfig = toml::from_str(s).map_err(|e| AttestError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> AttestResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AttestError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> AttestResult<()> {
        let max = self.integrity.algorithm.hex_len();
        if self.export.hash_prefix_len == 0 || self.export.hash_prefix_len > max {
            return Err(AttestError::ConfigError {
                reason: format!(
                    "export.hash_prefix_len must be between 1 and {}, got {}",
                    max, self.export.hash_prefix_len
                ),
            });
        }
        if self.diff.tracked_decision_fields.is_empty()
            && !self.diff.include_untracked_decision_fields
        {
            return Err(AttestError::ConfigError {
                reason: "diff config compares no decision fields".to_string(),
            });
        }
        Ok(())
    }
}
