//! # attest-core
//!
//! Packet resolution and two-sided comparison for the ATTEST engine.
//!
//! This crate provides:
//! - The storage interfaces (`LocalPacketStore`, `RemotePacketSource`)
//! - The `PacketStore` facade that resolves packets remote-first with local
//!   fallback and cache-fill
//! - The `Comparator` that resolves two sides concurrently and diffs them
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attest_core::{Comparator, PacketInput, PacketStore};
//!
//! let store = PacketStore::new(local, remote, verifier);
//! let comparator = Comparator::new(store, DiffEngine::new(config.diff));
//! let comparison = comparator
//!     .compare(&PacketInput::Hash(left), &PacketInput::Hash(right))
//!     .await?;
//! ```

pub mod compare;
pub mod store;
pub mod traits;

pub use compare::{CompareFailure, Comparator, Comparison};
pub use store::{PacketInput, PacketStore, Resolution, ResolvedFrom};

// ── Tests ─────────────────────────────────────────────────────────────────────
