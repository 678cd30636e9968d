//! Fairness Proofs
//!
//! Everything needed to check a session after the server seed is revealed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs   - SHA-256 server seed commitments          │
//! │  records.rs      - Recorded round ingestion                 │
//! │  verify.rs       - Batch replay, nonce audit, verdict       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod records;
pub mod verify;

// Re-export key types
pub use commitment::{commitment_hash, verify_commitment, CommitmentCheck, SeedCommitment};
pub use records::{ExportConfig, RecordedRound, RoundExport};
pub use verify::{
    analyze_nonces, verify_batch, verify_round, BatchOptions, NonceGap, NonceSequence,
    RoundDetail, RoundStatus, SeedPair, SkipReason, VerificationReport, Verdict,
};
