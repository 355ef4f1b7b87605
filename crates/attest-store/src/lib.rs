//! # attest-store
//!
//! Content-addressed local packet caches and an offline remote for the
//! ATTEST packet store facade.
//!
//! - `InMemoryPacketStore` — shared `HashMap` cache, for tests and
//!   short-lived sessions
//! - `FsPacketStore` — sharded on-disk cache with atomic writes
//! - `OfflineRemote` — a remote that is never reachable, so resolution is
//!   served from the local cache alone

pub mod fs;
pub mod memory;
pub mod offline;

pub use fs::FsPacketStore;
pub use memory::InMemoryPacketStore;
pub use offline::OfflineRemote;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use tempfile::TempDir;

    use attest_contracts::{config::IntegrityConfig, error::AttestError};
    use attest_core::{
        traits::{LocalPacketStore, RemoteFailure, RemotePacketSource},
        PacketStore, ResolvedFrom,
    };
    use attest_integrity::PacketVerifier;

    use super::{FsPacketStore, InMemoryPacketStore, OfflineRemote};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn sealed_packet() -> (String, Value) {
        let verifier = PacketVerifier::new(&IntegrityConfig::default()).unwrap();
        let packet = verifier
            .seal_packet(json!({
                "metadata": { "caseId": "case-9", "decisionId": "dec-9", "generatedAt": "2026-07-01T10:00:00Z" },
                "decision": { "status": "approved", "confidence": 1 },
                "evidenceIndex": [],
                "humanActions": { "events": [] },
                "timelineEvents": []
            }))
            .unwrap();
        (packet.packet_hash().unwrap().to_string(), packet.into_value())
    }

    // ── InMemoryPacketStore ───────────────────────────────────────────────────

    #[tokio::test]
    async fn memory_round_trip_and_miss() {
        let store = InMemoryPacketStore::new();
        let (hash, doc) = sealed_packet();

        assert!(matches!(
            store.get(&hash).await,
            Err(AttestError::NotFound { .. })
        ));

        store.put(&hash, &doc).await.unwrap();
        store.put(&hash, &doc).await.unwrap();

        assert_eq!(store.get(&hash).await.unwrap(), doc);
        assert_eq!(store.len(), 1, "repeated cache-fill must not duplicate");
    }

    #[tokio::test]
    async fn memory_clones_share_entries() {
        let store = InMemoryPacketStore::new();
        let clone = store.clone();
        let (hash, doc) = sealed_packet();

        clone.put(&hash, &doc).await.unwrap();
        assert!(!store.is_empty());
    }

    // ── FsPacketStore ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn fs_round_trip_uses_sharded_path() {
        let dir = TempDir::new().unwrap();
        let store = FsPacketStore::new(dir.path());
        let (hash, doc) = sealed_packet();

        store.put(&hash, &doc).await.unwrap();

        let expected = dir.path().join(&hash[..2]).join(format!("{hash}.json"));
        assert!(expected.exists());
        assert_eq!(store.get(&hash).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn fs_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FsPacketStore::new(dir.path());
        let (hash, doc) = sealed_packet();

        store.put(&hash, &doc).await.unwrap();

        let shard = dir.path().join(&hash[..2]);
        let tmp_count = std::fs::read_dir(shard)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(tmp_count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fs_concurrent_fills_of_one_key_converge() {
        let dir = TempDir::new().unwrap();
        let store = FsPacketStore::new(dir.path());
        let (hash, doc) = sealed_packet();

        let writers: Vec<_> = (0..16)
            .map(|_| {
                let (store, hash, doc) = (store.clone(), hash.clone(), doc.clone());
                tokio::spawn(async move {
                    store.put(&hash, &doc).await?;
                    store.get(&hash).await
                })
            })
            .collect();

        for writer in writers {
            let read_back = writer.await.unwrap().unwrap();
            assert_eq!(read_back, doc, "a reader observed a partial packet");
        }

        let leftovers = std::fs::read_dir(dir.path().join(&hash[..2]))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn fs_miss_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsPacketStore::new(dir.path());

        let err = store.get(&"c".repeat(64)).await.unwrap_err();
        assert!(matches!(err, AttestError::NotFound { .. }));
    }

    #[tokio::test]
    async fn fs_corrupt_file_is_storage_failure() {
        let dir = TempDir::new().unwrap();
        let store = FsPacketStore::new(dir.path());
        let hash = "d".repeat(64);
        let path = store.path_for(&hash).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ truncated").unwrap();

        let err = store.get(&hash).await.unwrap_err();
        assert!(matches!(err, AttestError::StorageFailure { .. }));
    }

    #[test]
    fn fs_rejects_non_hex_keys() {
        let store = FsPacketStore::new("/tmp/attest");
        assert!(store.path_for("../../etc/passwd").is_err());
        assert!(store.path_for("a").is_err());
        assert!(store.path_for(&"e".repeat(64)).is_ok());
    }

    // ── OfflineRemote ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn offline_remote_is_unreachable() {
        let err = OfflineRemote.fetch_by_hash(&"a".repeat(64)).await.unwrap_err();
        assert!(matches!(err, RemoteFailure::Unreachable { .. }));
    }

    // ── Facade over real adapters ─────────────────────────────────────────────

    #[tokio::test]
    async fn offline_facade_serves_disk_cache() {
        let dir = TempDir::new().unwrap();
        let local = Arc::new(FsPacketStore::new(dir.path()));
        let verifier = Arc::new(PacketVerifier::new(&IntegrityConfig::default()).unwrap());
        let store = PacketStore::new(local.clone(), Arc::new(OfflineRemote), verifier);

        let (hash, doc) = sealed_packet();
        let pasted = store.accept_pasted(&doc.to_string()).await.unwrap();
        assert!(pasted.warnings.is_empty());

        let resolved = store.resolve(&hash).await.unwrap();
        assert_eq!(resolved.source, ResolvedFrom::Local);
        assert_eq!(resolved.packet, pasted.packet);

        let missing = store.resolve(&"f".repeat(64)).await.unwrap_err();
        assert!(matches!(missing, AttestError::TransportFailure { status: None, .. }));
    }
}
