//! Server Seed Commitments
//!
//! Before play the operator publishes `SHA-256(serverSeed)`. After the seed is
//! revealed, anyone can check it against that hash.

use serde::{Deserialize, Serialize};

use crate::core::hash::{normalize_hex, sha256_hex};

/// Published commitment to a server seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCommitment {
    /// Hex SHA-256 of the server seed, as published.
    pub server_seed_hash: String,
}

impl SeedCommitment {
    /// Commit to a seed.
    pub fn from_seed(server_seed: &str) -> Self {
        Self {
            server_seed_hash: commitment_hash(server_seed),
        }
    }

    /// Wrap a published hash.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self {
            server_seed_hash: hash.into(),
        }
    }

    /// Check a revealed seed against this commitment.
    pub fn verify(&self, server_seed: &str) -> bool {
        verify_commitment(server_seed, &self.server_seed_hash)
    }
}

/// Hex SHA-256 of a server seed.
pub fn commitment_hash(server_seed: &str) -> String {
    sha256_hex(server_seed.as_bytes())
}

/// Check that `SHA-256(server_seed)` equals `published_hash`.
///
/// Case-insensitive, ignores surrounding whitespace. A mismatch is `false`,
/// never an error.
pub fn verify_commitment(server_seed: &str, published_hash: &str) -> bool {
    commitment_hash(server_seed) == normalize_hex(published_hash)
}

/// Outcome of the batch-level commitment check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentCheck {
    /// Hash the seed was checked against.
    pub published_hash: String,
    /// Hash computed from the revealed seed.
    pub computed_hash: String,
    /// Whether they match.
    pub valid: bool,
}

impl CommitmentCheck {
    /// Run the check.
    pub fn run(server_seed: &str, published_hash: &str) -> Self {
        let computed_hash = commitment_hash(server_seed);
        let valid = computed_hash == normalize_hex(published_hash);
        Self {
            published_hash: published_hash.to_string(),
            computed_hash,
            valid,
        }
    }
}
