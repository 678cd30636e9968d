//! Outcome Resolver
//!
//! Turns `(serverSeed, clientSeed, nonce, pins, difficulty)` into a bucket.
//!
//! ## Canonical algorithm
//!
//! 1. Draw 4 bytes from the [`ByteStream`].
//! 2. `float = Σ byte[i] / 256^(i+1)`, most significant byte first.
//! 3. Walk the probability table; the bucket is the first index where the
//!    running sum exceeds `float`. Rounding at the tail falls back to the last
//!    bucket.
//! 4. Look up the payout for that bucket.
//!
//! ## Legacy algorithm
//!
//! An earlier per-row left/right model, kept only for comparison. It never
//! matched recorded live rounds and is never the default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::hash::{hmac_sha256_hex, sha256_hex};
use crate::core::stream::ByteStream;
use crate::error::ConfigurationError;
use crate::game::tables::{Difficulty, GameTable, TableRegistry};

/// Bytes consumed per canonical resolution.
pub const FLOAT_BYTES: usize = 4;

/// Outcome of one round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Resolved bucket in `[0, pins]`.
    pub bucket: usize,
    /// Uniform value in `[0, 1)` that selected the bucket.
    pub float: f64,
    /// Payout multiplier for the bucket.
    pub multiplier: f64,
}

/// Resolution algorithm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Byte stream + cumulative probability lookup.
    #[default]
    ByteStream,
    /// Historical per-row left/right path counting.
    LegacyPath,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByteStream => f.write_str("byte_stream"),
            Self::LegacyPath => f.write_str("legacy_path"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "byte_stream" | "byte-stream" | "canonical" => Ok(Self::ByteStream),
            "legacy_path" | "legacy-path" | "legacy" => Ok(Self::LegacyPath),
            other => Err(format!("unknown algorithm '{}'", other)),
        }
    }
}

/// Convert 4 bytes into a float in `[0, 1)`, most significant byte first.
#[inline]
pub fn bytes_to_float(bytes: [u8; FLOAT_BYTES]) -> f64 {
    let mut value = 0.0;
    let mut scale = 1.0;
    for byte in bytes {
        scale /= 256.0;
        value += f64::from(byte) * scale;
    }
    value
}

/// Draw the round's float from the byte stream.
pub fn round_float(server_seed: &str, client_seed: &str, nonce: u64) -> f64 {
    let mut stream = ByteStream::new(server_seed, client_seed, nonce);
    bytes_to_float(stream.next_array::<FLOAT_BYTES>())
}

/// First bucket whose cumulative probability exceeds `float`.
///
/// Falls back to the last bucket when rounding leaves the cumulative sum at or
/// below `float`.
#[inline]
pub fn bucket_for_float(float: f64, probabilities: &[f64]) -> usize {
    let mut cumulative = 0.0;
    for (index, probability) in probabilities.iter().enumerate() {
        cumulative += probability;
        if float < cumulative {
            return index;
        }
    }
    probabilities.len().saturating_sub(1)
}

/// Resolve a round against an already looked-up table.
///
/// # Errors
///
/// [`ConfigurationError::InvalidEntry`] if the table has no payout for the
/// resolved bucket. Tables from a [`TableRegistry`] are validated and never
/// hit this.
pub fn resolve_with_table(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    table: &GameTable,
) -> Result<RoundResult, ConfigurationError> {
    let float = round_float(server_seed, client_seed, nonce);
    let bucket = bucket_for_float(float, &table.probabilities);
    Ok(RoundResult {
        bucket,
        float,
        multiplier: payout_for(table, bucket)?,
    })
}

fn payout_for(table: &GameTable, bucket: usize) -> Result<f64, ConfigurationError> {
    table.payout(bucket).ok_or(ConfigurationError::InvalidEntry {
        pins: table.pins,
        difficulty: table.difficulty,
        bucket,
    })
}

/// Resolve a round with the canonical algorithm.
///
/// # Errors
///
/// [`ConfigurationError::MissingTable`] if the registry has no entry for
/// `(pins, difficulty)`.
pub fn resolve(
    registry: &TableRegistry,
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    pins: u8,
    difficulty: Difficulty,
) -> Result<RoundResult, ConfigurationError> {
    let table = registry.get(pins, difficulty)?;
    resolve_with_table(server_seed, client_seed, nonce, table)
}

/// Resolve a round with the selected algorithm.
///
/// For [`Algorithm::LegacyPath`] the reported `float` is the first row's value.
pub fn resolve_with(
    algorithm: Algorithm,
    registry: &TableRegistry,
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    pins: u8,
    difficulty: Difficulty,
) -> Result<RoundResult, ConfigurationError> {
    let table = registry.get(pins, difficulty)?;
    match algorithm {
        Algorithm::ByteStream => resolve_with_table(server_seed, client_seed, nonce, table),
        Algorithm::LegacyPath => {
            let legacy = resolve_legacy(server_seed, client_seed, nonce, pins);
            Ok(RoundResult {
                bucket: legacy.bucket,
                float: legacy.row_floats.first().copied().unwrap_or(0.0),
                multiplier: payout_for(table, legacy.bucket)?,
            })
        }
    }
}

// =============================================================================
// LEGACY PATH MODEL
// =============================================================================

/// Direction taken at one row of pins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Float below 0.5.
    Left,
    /// Float at or above 0.5.
    Right,
}

impl Direction {
    /// Single-letter rendering.
    pub fn as_char(&self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
        }
    }
}

/// Full detail of a legacy resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyResolution {
    /// `HMAC-SHA256(serverSeed, "{clientSeed}:{nonce}")` as hex.
    pub hash: String,
    /// One float per row.
    pub row_floats: Vec<f64>,
    /// One direction per row.
    pub path: Vec<Direction>,
    /// Number of right moves.
    pub bucket: usize,
}

impl LegacyResolution {
    /// Path as an `LRRL...` string.
    pub fn path_string(&self) -> String {
        self.path.iter().map(Direction::as_char).collect()
    }
}

/// Hex characters consumed per legacy row.
const LEGACY_ROW_HEX: usize = 8;

/// Resolve with the historical per-row model.
pub fn resolve_legacy(server_seed: &str, client_seed: &str, nonce: u64, rows: u8) -> LegacyResolution {
    let message = format!("{}:{}", client_seed, nonce);
    let hash = hmac_sha256_hex(server_seed.as_bytes(), message.as_bytes());

    let row_floats: Vec<f64> = (0..usize::from(rows)).map(|row| legacy_row_float(&hash, row)).collect();
    let path: Vec<Direction> = row_floats
        .iter()
        .map(|f| if *f < 0.5 { Direction::Left } else { Direction::Right })
        .collect();
    let bucket = path.iter().filter(|d| **d == Direction::Right).count();

    LegacyResolution {
        hash,
        row_floats,
        path,
        bucket,
    }
}

/// Float for one legacy row.
///
/// Rows beyond the 64-char digest read `SHA-256(hash + row)` instead.
fn legacy_row_float(hash: &str, row: usize) -> f64 {
    let start = row * LEGACY_ROW_HEX;
    let window = if start + LEGACY_ROW_HEX > hash.len() {
        let extended = sha256_hex(format!("{}{}", hash, row).as_bytes());
        u32::from_str_radix(&extended[..LEGACY_ROW_HEX], 16)
    } else {
        u32::from_str_radix(&hash[start..start + LEGACY_ROW_HEX], 16)
    };
    // Digests are lowercase hex produced above, so parsing cannot fail.
    f64::from(window.unwrap_or(0)) / 4_294_967_296.0
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SEED: &str = "a]Y`yJj5B=Kc5FD";

    fn registry() -> TableRegistry {
        TableRegistry::standard().unwrap()
    }

    #[test]
    fn test_golden_round() {
        // Golden values: these must never change.
        let result = resolve(&registry(), SEED, "test", 0, 16, Difficulty::Low).unwrap();
        assert_eq!(result.float, 0.18523933016695082);
        assert_eq!(result.bucket, 6);
        assert_eq!(result.multiplier, 1.1);
    }

    #[test]
    fn test_bytes_to_float() {
        assert_eq!(bytes_to_float([0, 0, 0, 0]), 0.0);
        assert_eq!(bytes_to_float([0x80, 0, 0, 0]), 0.5);
        assert_eq!(bytes_to_float([0x2f, 0x6b, 0xd8, 0x41]), 0.18523933016695082);
        let max = bytes_to_float([0xff; 4]);
        assert!(max < 1.0);
        assert_eq!(max, 4_294_967_295.0 / 4_294_967_296.0);
    }

    #[test]
    fn test_determinism() {
        let registry = registry();
        let first = resolve(&registry, SEED, "test", 17, 12, Difficulty::High).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve(&registry, SEED, "test", 17, 12, Difficulty::High).unwrap(), first);
        }
    }

    #[test]
    fn test_recorded_live_history() {
        // 16 pins / medium, nonces 1..=30 of a revealed live session.
        let server = "59436d5114d239bc388947e9dcbe9546532bf9b8b1bd96669550ca124330d244";
        let client = "bc0077399f741f4e44c0d257820c0b55aa64f5836ab69f598c876f14205eee2e";
        let multipliers = [
            0.5, 1.0, 0.3, 1.0, 1.0, 0.5, 1.5, 1.5, 0.5, 1.0, 0.5, 1.0, 0.3, 1.0, 1.0,
            0.5, 1.5, 1.0, 0.5, 1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 0.5, 1.5, 0.5, 0.5, 1.0,
        ];

        let registry = registry();
        for (i, expected) in multipliers.iter().enumerate() {
            let nonce = i as u64 + 1;
            let result = resolve(&registry, server, client, nonce, 16, Difficulty::Medium).unwrap();
            assert_eq!(result.multiplier, *expected, "nonce {}", nonce);
        }

        let first = resolve(&registry, server, client, 0, 16, Difficulty::Medium).unwrap();
        assert_eq!(first.bucket, 8);
        assert_eq!(first.multiplier, 0.3);
    }

    #[test]
    fn test_missing_table_is_error() {
        let err = resolve(&registry(), SEED, "test", 0, 14, Difficulty::Low).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingTable { pins: 14, difficulty: Difficulty::Low });
    }

    #[test]
    fn test_tail_fallback() {
        // Sums to slightly less than 1.0; a float above the sum lands in the last bucket.
        let probabilities = [0.25, 0.25, 0.4999999];
        assert_eq!(bucket_for_float(0.99999999, &probabilities), 2);
        assert_eq!(bucket_for_float(0.0, &probabilities), 0);
        assert_eq!(bucket_for_float(0.25, &probabilities), 1);
    }

    #[test]
    fn test_zero_probability_bucket_never_selected() {
        let probabilities = [0.5, 0.0, 0.5];
        assert_eq!(bucket_for_float(0.5, &probabilities), 2);
        assert_eq!(bucket_for_float(0.4999, &probabilities), 0);
    }

    #[test]
    fn test_legacy_known_path() {
        let legacy = resolve_legacy(SEED, "test", 0, 16);
        assert_eq!(legacy.hash, "5077c788a50bcdba08a598c08450901b36444c842070e0042bffb3ea81a363a4");
        assert_eq!(legacy.path_string(), "LRLRLLLRLRLLRRRL");
        assert_eq!(legacy.bucket, 7);
        assert_eq!(legacy.row_floats.len(), 16);
    }

    #[test]
    fn test_legacy_selector() {
        let registry = registry();
        let canonical = resolve_with(Algorithm::ByteStream, &registry, SEED, "test", 0, 16, Difficulty::Low).unwrap();
        let legacy = resolve_with(Algorithm::LegacyPath, &registry, SEED, "test", 0, 16, Difficulty::Low).unwrap();

        assert_eq!(canonical.bucket, 6);
        assert_eq!(legacy.bucket, 7);
        assert_eq!(legacy.multiplier, 1.0);
        assert_eq!(Algorithm::default(), Algorithm::ByteStream);
    }

    #[test]
    fn test_short_payout_vector_is_error() {
        let mut table = registry().get(16, Difficulty::Low).unwrap().clone();
        table.payouts.truncate(3);

        // Golden round lands in bucket 6, past the truncated payouts.
        let err = resolve_with_table(SEED, "test", 0, &table).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidEntry { pins: 16, difficulty: Difficulty::Low, bucket: 6 }
        );
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("legacy".parse::<Algorithm>().unwrap(), Algorithm::LegacyPath);
        assert_eq!("byte_stream".parse::<Algorithm>().unwrap(), Algorithm::ByteStream);
        assert!("path".parse::<Algorithm>().is_err());
    }

    proptest! {
        #[test]
        fn prop_resolution_is_deterministic(
            server in "[ -~]{1,64}",
            client in "[ -~]{0,32}",
            nonce in any::<u64>(),
        ) {
            let registry = TableRegistry::standard().unwrap();
            let a = resolve(&registry, &server, &client, nonce, 16, Difficulty::Medium).unwrap();
            let b = resolve(&registry, &server, &client, nonce, 16, Difficulty::Medium).unwrap();
            prop_assert_eq!(a, b);
            prop_assert!(a.float >= 0.0 && a.float < 1.0);
            prop_assert!(a.bucket <= 16);
        }

        #[test]
        fn prop_every_float_maps_to_one_bucket(float in 0.0f64..1.0) {
            let registry = TableRegistry::standard().unwrap();
            for table in registry.iter() {
                let bucket = bucket_for_float(float, &table.probabilities);
                prop_assert!(bucket < table.bucket_count());

                // Exactly one bucket satisfies lower <= float < upper (or is the tail fallback).
                let lower: f64 = table.probabilities[..bucket].iter().sum();
                prop_assert!(float >= lower || bucket == 0);
            }
        }
    }
}
