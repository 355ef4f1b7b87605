//! In-memory implementation of `LocalPacketStore`.
//!
//! Entries live in a `HashMap` behind `Arc<Mutex<_>>`, so clones of the store
//! share one cache.  Writes are overwrites: content is addressed by its own
//! hash, so two writers racing on a key store the same value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use attest_contracts::error::{AttestError, AttestResult};
use attest_core::traits::LocalPacketStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPacketStore {
    pub(crate) entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl InMemoryPacketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached packets.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LocalPacketStore for InMemoryPacketStore {
    async fn get(&self, hash: &str) -> AttestResult<Value> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| AttestError::storage(format!("packet cache lock poisoned: {}", e)))?;

        entries.get(hash).cloned().ok_or_else(|| AttestError::NotFound {
            hash: hash.to_string(),
            message: "not in local cache".to_string(),
        })
    }

    async fn put(&self, hash: &str, document: &Value) -> AttestResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AttestError::storage(format!("packet cache lock poisoned: {}", e)))?;

        if entries.get(hash) == Some(document) {
            debug!(hash = %hash, "packet already cached");
            return Ok(());
        }
        entries.insert(hash.to_string(), document.clone());
        Ok(())
    }
}
