//! Hash algorithm selection and hash-format validation.
//!
//! One algorithm is applied consistently at embed time, verify time and
//! export time.  The format check here is what the packet store runs before
//! attempting any lookup.

use serde::{Deserialize, Serialize};

use crate::error::{AttestError, AttestResult};

/// The JSON key that carries a packet's embedded content hash.
pub const PACKET_HASH_FIELD: &str = "packetHash";

/// The JSON key that carries an exported diff's content hash.
pub const DIFF_HASH_FIELD: &str = "diffHash";

/// Content hash algorithm used for packets and diff artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    /// SHA-256, rendered as 64 lowercase hex characters.
    #[default]
    Sha256,
}

impl HashAlgorithm {
    /// Length of the hex rendering of a digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
        }
    }

    /// Return true if `hash` has exactly the shape of this algorithm's output.
    pub fn is_valid_hash(self, hash: &str) -> bool {
        hash.len() == self.hex_len()
            && hash
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Validate `hash`, returning `InvalidHash` on any format violation.
    pub fn check_hash(self, hash: &str) -> AttestResult<()> {
        if self.is_valid_hash(hash) {
            Ok(())
        } else {
            Err(AttestError::InvalidHash {
                hash: hash.to_string(),
            })
        }
    }
}
