//! # Plinko Audit
//!
//! Provably-fair verification for Plinko rounds: seed replay, commitment checks
//! and distribution analysis.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PLINKO AUDIT                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Cryptographic primitives                  │
//! │  ├── hash.rs     - SHA-256 / HMAC-SHA256                     │
//! │  └── stream.rs   - Paged HMAC byte stream                    │
//! │                                                              │
//! │  game/           - Game model (deterministic)                │
//! │  ├── tables.rs   - Probability/payout tables                 │
//! │  └── resolver.rs - Seed material to bucket                   │
//! │                                                              │
//! │  proof/          - Post-reveal verification                  │
//! │  ├── commitment.rs - Server seed commitments                 │
//! │  ├── records.rs  - Recorded round ingestion                  │
//! │  └── verify.rs   - Batch verification and verdict            │
//! │                                                              │
//! │  stats/          - Statistics                                │
//! │  ├── analysis.rs - Chi-squared, RTP, symmetry                │
//! │  └── simulation.rs - Parallel Monte-Carlo                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! `core/` and `game/` are pure functions of their inputs:
//! - No global state (tables travel in [`config::EngineConfig`])
//! - No HashMap (BTreeMap for sorted iteration)
//! - No system time or randomness
//!
//! Given the same seeds and nonce, the resolver returns the same bucket on any
//! platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod proof;
pub mod report;
pub mod stats;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{ConfigurationError, Error, InputError};
pub use game::resolver::{resolve, Algorithm, RoundResult};
pub use game::tables::{Difficulty, GameTable, TableRegistry};
pub use proof::verify::{verify_batch, BatchOptions, SeedPair, VerificationReport, Verdict};
pub use stats::analysis::{analyze, AnalysisReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
