//! Error taxonomy.
//!
//! Only configuration and input problems are errors. Unverifiable records and
//! mismatches are report data (see [`crate::proof::verify`]).

use std::path::PathBuf;

use crate::game::tables::Difficulty;

/// Missing or invalid game configuration. Fatal for the current run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// No table registered for the requested pair.
    #[error("No probability/payout table for {pins} pins, {difficulty} difficulty")]
    MissingTable {
        /// Requested pin count.
        pins: u8,
        /// Requested difficulty.
        difficulty: Difficulty,
    },

    /// Difficulty name not recognized.
    #[error("Unknown difficulty '{0}' (expected low, medium, high or extreme)")]
    UnknownDifficulty(String),

    /// No chi-squared critical value tabulated for this pin count.
    #[error("Unsupported pin count {0} (expected 8, 12 or 16)")]
    UnsupportedPins(u8),

    /// Probability table does not sum to one.
    #[error("Probability table for {pins} pins, {difficulty} sums to {sum}, expected 1.0")]
    ProbabilitySum {
        /// Pin count of the faulty table.
        pins: u8,
        /// Difficulty of the faulty table.
        difficulty: Difficulty,
        /// Actual sum.
        sum: f64,
    },

    /// Probability or payout vector has the wrong length.
    #[error("Table for {pins} pins, {difficulty} has {probabilities} probabilities and {payouts} payouts, expected {expected}")]
    LengthMismatch {
        /// Pin count of the faulty table.
        pins: u8,
        /// Difficulty of the faulty table.
        difficulty: Difficulty,
        /// Probability vector length.
        probabilities: usize,
        /// Payout vector length.
        payouts: usize,
        /// Required length (pins + 1).
        expected: usize,
    },

    /// Negative, non-finite or missing probability/payout entry.
    #[error("Table for {pins} pins, {difficulty} has an invalid entry at bucket {bucket}")]
    InvalidEntry {
        /// Pin count of the faulty table.
        pins: u8,
        /// Difficulty of the faulty table.
        difficulty: Difficulty,
        /// Offending bucket.
        bucket: usize,
    },

    /// Two tables registered for the same pair.
    #[error("Duplicate table for {pins} pins, {difficulty}")]
    DuplicateTable {
        /// Pin count.
        pins: u8,
        /// Difficulty.
        difficulty: Difficulty,
    },

    /// Histogram does not match the table it is analyzed against.
    #[error("Histogram has {got} buckets, table for {pins} pins needs {expected}")]
    HistogramMismatch {
        /// Table pin count.
        pins: u8,
        /// Required bucket count.
        expected: usize,
        /// Histogram bucket count.
        got: usize,
    },

    /// Environment override could not be parsed.
    #[error("Invalid value '{value}' for {key}")]
    InvalidSetting {
        /// Environment variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Problems reading or writing round exports and reports.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// File could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File is not a recognized export.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Export contains no rounds.
    #[error("No rounds found in {}", path.display())]
    Empty {
        /// File path.
        path: PathBuf,
    },

    /// Report could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Any error surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration problem.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Input/output problem.
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Result alias for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
