//! Filesystem implementation of `LocalPacketStore`.
//!
//! One pretty-printed JSON file per packet, sharded by the first two hex
//! characters of its hash: `<root>/ab/abc123….json`.  Every write goes to
//! its own uniquely named temp file in the shard directory and is renamed
//! into place, so readers never observe a partial packet and concurrent
//! fills of one key converge on a complete file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use attest_contracts::error::{AttestError, AttestResult};
use attest_core::traits::LocalPacketStore;

/// Distinguishes temp files of concurrent writers within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct FsPacketStore {
    root: PathBuf,
}

impl FsPacketStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<first two chars>/<hash>.json`
    ///
    /// Rejects keys that are not plain hex so a key can never escape `root`.
    pub fn path_for(&self, hash: &str) -> AttestResult<PathBuf> {
        if hash.len() < 2 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AttestError::storage(format!(
                "refusing to map non-hex key '{}' to a path",
                hash
            )));
        }
        Ok(self.root.join(&hash[..2]).join(format!("{}.json", hash)))
    }
}

#[async_trait]
impl LocalPacketStore for FsPacketStore {
    async fn get(&self, hash: &str) -> AttestResult<Value> {
        let path = self.path_for(hash)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AttestError::NotFound {
                    hash: hash.to_string(),
                    message: format!("no cached copy at {}", path.display()),
                })
            }
            Err(e) => {
                return Err(AttestError::storage(format!(
                    "failed to read '{}': {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            AttestError::storage(format!("cached file '{}' is corrupt: {}", path.display(), e))
        })
    }

    async fn put(&self, hash: &str, document: &Value) -> AttestResult<()> {
        let path = self.path_for(hash)?;
        let io_err = |op: &str, e: std::io::Error| {
            AttestError::storage(format!("{} '{}': {}", op, path.display(), e))
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err("failed to create cache directory for", e))?;
        }

        let content = serde_json::to_vec_pretty(document)
            .map_err(|e| AttestError::storage(format!("failed to encode packet {}: {}", hash, e)))?;

        let temp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = tokio::fs::write(&temp_path, &content).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(io_err("failed to write temp file for", e));
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(io_err("failed to move temp file into", e));
        }

        debug!(hash = %hash, path = %path.display(), "packet cached on disk");
        Ok(())
    }
}
