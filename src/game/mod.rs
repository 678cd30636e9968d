//! Game Model
//!
//! ## Module Structure
//!
//! - `tables`: Probability and payout tables per (pins, difficulty)
//! - `resolver`: Seed material to bucket, canonical and legacy

pub mod tables;
pub mod resolver;

// Re-export key types
pub use tables::{Difficulty, GameTable, TableRegistry};
pub use resolver::{resolve, resolve_with, Algorithm, RoundResult};
