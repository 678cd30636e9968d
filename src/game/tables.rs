//! Payout and Probability Tables
//!
//! Static registry keyed by `(pins, difficulty)`. Every entry is validated
//! when the registry is built; a bad table stops the program at startup.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Supported pin counts.
pub const SUPPORTED_PINS: [u8; 3] = [8, 12, 16];

/// Allowed deviation of a probability table's sum from 1.0.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Risk tier selecting the payout curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Flat curve, small edges.
    Low,
    /// Default tier.
    #[default]
    Medium,
    /// Steep curve.
    High,
    /// Zero-payout middle, huge edges.
    Extreme,
}

impl Difficulty {
    /// All tiers in registry order.
    pub const ALL: [Difficulty; 4] = [Self::Low, Self::Medium, Self::High, Self::Extreme];

    /// Lowercase name as used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "extreme" => Ok(Self::Extreme),
            _ => Err(ConfigurationError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// One validated `(pins, difficulty)` configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameTable {
    /// Pin rows; the table has `pins + 1` buckets.
    pub pins: u8,
    /// Risk tier.
    pub difficulty: Difficulty,
    /// Probability per bucket, summing to 1.
    pub probabilities: Vec<f64>,
    /// Payout multiplier per bucket.
    pub payouts: Vec<f64>,
    /// Payout vector confirmed against the live game.
    pub payouts_verified: bool,
    /// Probability vector confirmed against live game history.
    pub probabilities_verified: bool,
}

impl GameTable {
    /// Number of buckets (`pins + 1`).
    pub fn bucket_count(&self) -> usize {
        self.pins as usize + 1
    }

    /// Both vectors confirmed against the live game.
    pub fn is_verified(&self) -> bool {
        self.payouts_verified && self.probabilities_verified
    }

    /// Payout for a bucket, if in range.
    pub fn payout(&self, bucket: usize) -> Option<f64> {
        self.payouts.get(bucket).copied()
    }

    /// Theoretical return-to-player in percent: `Σ p[i] * payout[i] * 100`.
    pub fn theoretical_rtp(&self) -> f64 {
        expected_rtp(&self.probabilities, &self.payouts)
    }

    /// Check length, entry and sum invariants.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let expected = self.bucket_count();
        if self.probabilities.len() != expected || self.payouts.len() != expected {
            return Err(ConfigurationError::LengthMismatch {
                pins: self.pins,
                difficulty: self.difficulty,
                probabilities: self.probabilities.len(),
                payouts: self.payouts.len(),
                expected,
            });
        }

        let bad_entry = self
            .probabilities
            .iter()
            .zip(&self.payouts)
            .position(|(p, m)| !p.is_finite() || *p < 0.0 || !m.is_finite() || *m < 0.0);
        if let Some(bucket) = bad_entry {
            return Err(ConfigurationError::InvalidEntry {
                pins: self.pins,
                difficulty: self.difficulty,
                bucket,
            });
        }

        let sum: f64 = self.probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ConfigurationError::ProbabilitySum {
                pins: self.pins,
                difficulty: self.difficulty,
                sum,
            });
        }

        Ok(())
    }
}

/// `Σ p[i] * payout[i] * 100`.
pub fn expected_rtp(probabilities: &[f64], payouts: &[f64]) -> f64 {
    probabilities
        .iter()
        .zip(payouts)
        .map(|(p, m)| p * m)
        .sum::<f64>()
        * 100.0
}

/// Binomial coefficient `C(n, k)` as f64 (exact for the pin counts in use).
pub fn binomial_coefficient(n: u8, k: u8) -> f64 {
    if k > n {
        return 0.0;
    }
    let mut result = 1.0;
    for i in 0..k {
        result = result * f64::from(n - i) / f64::from(i + 1);
    }
    result
}

/// Fair-coin path distribution: `C(pins, k) * 0.5^pins` for `k = 0..=pins`.
pub fn binomial_distribution(pins: u8) -> Vec<f64> {
    let scale = 0.5f64.powi(i32::from(pins));
    (0..=pins).map(|k| binomial_coefficient(pins, k) * scale).collect()
}

/// Chi-squared critical value at significance 0.05 with `df = pins`.
pub fn critical_value(pins: u8) -> Result<f64, ConfigurationError> {
    match pins {
        8 => Ok(15.5),
        12 => Ok(21.0),
        16 => Ok(26.3),
        other => Err(ConfigurationError::UnsupportedPins(other)),
    }
}

/// Immutable `(pins, difficulty) -> GameTable` mapping.
#[derive(Clone, Debug)]
pub struct TableRegistry {
    tables: BTreeMap<(u8, Difficulty), GameTable>,
}

impl TableRegistry {
    /// Build a registry from tables, validating each.
    pub fn from_tables(tables: Vec<GameTable>) -> Result<Self, ConfigurationError> {
        let mut map = BTreeMap::new();
        for table in tables {
            table.validate()?;
            let key = (table.pins, table.difficulty);
            if map.contains_key(&key) {
                return Err(ConfigurationError::DuplicateTable {
                    pins: table.pins,
                    difficulty: table.difficulty,
                });
            }
            map.insert(key, table);
        }
        Ok(Self { tables: map })
    }

    /// The game's published configurations.
    pub fn standard() -> Result<Self, ConfigurationError> {
        Self::from_tables(standard_tables())
    }

    /// Look up a table.
    pub fn get(&self, pins: u8, difficulty: Difficulty) -> Result<&GameTable, ConfigurationError> {
        self.tables
            .get(&(pins, difficulty))
            .ok_or(ConfigurationError::MissingTable { pins, difficulty })
    }

    /// Iterate tables in `(pins, difficulty)` order.
    pub fn iter(&self) -> impl Iterator<Item = &GameTable> {
        self.tables.values()
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// =============================================================================
// PUBLISHED TABLES
// =============================================================================

/// 16 pins / medium, recovered from the game client and confirmed against
/// recorded live rounds.
const PROBABILITIES_16_MEDIUM: [f64; 17] = [
    0.0000099993, 0.0000299303, 0.0018310547, 0.0085449219, 0.0277709961,
    0.0666503906, 0.1221923828, 0.1745605469, 0.1966054369, 0.1745605469,
    0.1221923828, 0.0666503906, 0.0277709961, 0.0085449219, 0.0018310547,
    0.0002441406, 0.0000099069,
];

const PAYOUTS_8: [[f64; 9]; 4] = [
    [5.6, 2.1, 1.1, 1.0, 0.5, 1.0, 1.1, 2.1, 5.6],
    [13.0, 3.0, 1.3, 0.7, 0.4, 0.7, 1.3, 3.0, 13.0],
    [29.0, 4.0, 1.5, 0.3, 0.2, 0.3, 1.5, 4.0, 29.0],
    // Copy of high; the extreme curve for 8 pins was never observed.
    [29.0, 4.0, 1.5, 0.3, 0.2, 0.3, 1.5, 4.0, 29.0],
];

const PAYOUTS_12: [[f64; 13]; 4] = [
    [10.0, 3.0, 1.6, 1.4, 1.1, 1.0, 0.5, 1.0, 1.1, 1.4, 1.6, 3.0, 10.0],
    [33.0, 11.0, 4.0, 2.0, 1.1, 0.6, 0.3, 0.6, 1.1, 2.0, 4.0, 11.0, 33.0],
    [170.0, 24.0, 8.1, 2.0, 0.7, 0.2, 0.2, 0.2, 0.7, 2.0, 8.1, 24.0, 170.0],
    // Copy of high; the extreme curve for 12 pins was never observed.
    [170.0, 24.0, 8.1, 2.0, 0.7, 0.2, 0.2, 0.2, 0.7, 2.0, 8.1, 24.0, 170.0],
];

const PAYOUTS_16: [[f64; 17]; 4] = [
    [16.0, 9.0, 2.0, 1.4, 1.4, 1.2, 1.1, 1.0, 0.5, 1.0, 1.1, 1.2, 1.4, 1.4, 2.0, 9.0, 16.0],
    [110.0, 41.0, 10.0, 5.0, 3.0, 1.5, 1.0, 0.5, 0.3, 0.5, 1.0, 1.5, 3.0, 5.0, 10.0, 41.0, 110.0],
    [1000.0, 130.0, 26.0, 9.0, 4.0, 2.0, 0.2, 0.2, 0.2, 0.2, 0.2, 2.0, 4.0, 9.0, 26.0, 130.0, 1000.0],
    // Skull slots pay nothing.
    [2000.0, 100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0, 2000.0],
];

/// Build the standard table set.
///
/// Only 16/medium has a confirmed probability vector; the rest fall back to the
/// binomial distribution and are flagged unverified.
pub fn standard_tables() -> Vec<GameTable> {
    let mut tables = Vec::with_capacity(12);

    for (difficulty, payouts) in Difficulty::ALL.iter().zip(PAYOUTS_8.iter()) {
        tables.push(binomial_table(8, *difficulty, payouts.to_vec(), *difficulty != Difficulty::Extreme));
    }
    for (difficulty, payouts) in Difficulty::ALL.iter().zip(PAYOUTS_12.iter()) {
        tables.push(binomial_table(12, *difficulty, payouts.to_vec(), *difficulty != Difficulty::Extreme));
    }
    for (difficulty, payouts) in Difficulty::ALL.iter().zip(PAYOUTS_16.iter()) {
        if *difficulty == Difficulty::Medium {
            tables.push(GameTable {
                pins: 16,
                difficulty: *difficulty,
                probabilities: PROBABILITIES_16_MEDIUM.to_vec(),
                payouts: payouts.to_vec(),
                payouts_verified: true,
                probabilities_verified: true,
            });
        } else {
            tables.push(binomial_table(16, *difficulty, payouts.to_vec(), true));
        }
    }

    tables
}

fn binomial_table(pins: u8, difficulty: Difficulty, payouts: Vec<f64>, payouts_verified: bool) -> GameTable {
    GameTable {
        pins,
        difficulty,
        probabilities: binomial_distribution(pins),
        payouts,
        payouts_verified,
        probabilities_verified: false,
    }
}

// =============================================================================
// TESTS
// =============================================================================
