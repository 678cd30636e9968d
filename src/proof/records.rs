//! Round Export Ingestion
//!
//! Capture tools hand us JSON exports in one of three shapes:
//!
//! ```text
//! [ {round}, ... ]
//! { "results": [ {round}, ... ] }
//! { "config": { "pins": 16, "difficulty": "medium" }, "buckets": [...], "results": [...] }
//! ```
//!
//! Field spellings vary between capture tools (`mult` vs `multiplier`, numeric
//! vs string ids). Everything is normalized here, once, into [`RecordedRound`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigurationError, Error, InputError};
use crate::game::tables::Difficulty;

/// One recorded round in canonical form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedRound {
    /// Identifier assigned by the capture tool.
    pub id: Option<String>,
    /// Recorded bucket.
    pub bucket: Option<usize>,
    /// Recorded payout multiplier.
    pub multiplier: Option<f64>,
    /// Round nonce.
    pub nonce: Option<u64>,
    /// Client seed active for the round.
    pub client_seed: Option<String>,
    /// Published server seed hash active for the round.
    pub server_seed_hash: Option<String>,
    /// Pin count.
    pub pins: Option<u8>,
    /// Risk tier.
    pub difficulty: Option<Difficulty>,
    /// Capture time in epoch milliseconds.
    pub timestamp: Option<i64>,
}

/// Session-level settings carried by an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Pin count for rounds that do not state one.
    pub pins: Option<u8>,
    /// Difficulty for rounds that do not state one.
    pub difficulty: Option<Difficulty>,
}

/// A parsed, normalized export.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundExport {
    /// Rounds in file order.
    pub rounds: Vec<RecordedRound>,
    /// Session settings, if the export carried them.
    pub config: ExportConfig,
    /// Pre-aggregated bucket counts, if the export carried them.
    pub buckets: Option<Vec<u64>>,
}

impl RoundExport {
    /// Read and normalize an export file.
    ///
    /// # Errors
    ///
    /// [`InputError`] if the file is missing, unparsable or has no rounds;
    /// [`ConfigurationError`] if a round names an unknown difficulty.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse and normalize export text. `path` is used for error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, Error> {
        let raw: RawExport = serde_json::from_str(text).map_err(|source| InputError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let export = raw.normalize()?;
        if export.rounds.is_empty() {
            return Err(InputError::Empty {
                path: path.to_path_buf(),
            }
            .into());
        }

        debug!("Loaded {} rounds from {}", export.rounds.len(), path.display());
        Ok(export)
    }

    /// Histogram of recorded buckets for a pin count, ignoring out-of-range buckets.
    pub fn bucket_histogram(&self, pins: u8) -> Vec<u64> {
        let mut histogram = vec![0u64; pins as usize + 1];
        for bucket in self.rounds.iter().filter_map(|r| r.bucket) {
            if let Some(slot) = histogram.get_mut(bucket) {
                *slot += 1;
            }
        }
        histogram
    }
}

// =============================================================================
// RAW SHAPES
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExport {
    Rounds(Vec<RawRound>),
    Wrapped {
        results: Vec<RawRound>,
        #[serde(default)]
        config: Option<RawConfig>,
        #[serde(default)]
        buckets: Option<Vec<u64>>,
    },
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    pins: Option<u8>,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRound {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    bucket: Option<usize>,
    #[serde(default)]
    mult: Option<f64>,
    #[serde(default)]
    multiplier: Option<f64>,
    #[serde(default)]
    nonce: Option<u64>,
    #[serde(default)]
    client_seed: Option<String>,
    #[serde(default)]
    server_seed_hash: Option<String>,
    #[serde(default)]
    pins: Option<u8>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    ts: Option<i64>,
}

impl RawExport {
    fn normalize(self) -> Result<RoundExport, ConfigurationError> {
        let (results, config, buckets) = match self {
            Self::Rounds(results) => (results, None, None),
            Self::Wrapped { results, config, buckets } => (results, config, buckets),
        };

        let config = match config {
            Some(raw) => ExportConfig {
                pins: raw.pins,
                difficulty: parse_difficulty(raw.difficulty)?,
            },
            None => ExportConfig::default(),
        };

        let rounds = results
            .into_iter()
            .map(|raw| raw.normalize(&config))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RoundExport { rounds, config, buckets })
    }
}

impl RawRound {
    fn normalize(self, config: &ExportConfig) -> Result<RecordedRound, ConfigurationError> {
        Ok(RecordedRound {
            id: self.id.and_then(normalize_id),
            bucket: self.bucket,
            multiplier: self.multiplier.or(self.mult),
            nonce: self.nonce,
            client_seed: non_empty(self.client_seed),
            server_seed_hash: non_empty(self.server_seed_hash),
            pins: self.pins.or(config.pins),
            difficulty: parse_difficulty(self.difficulty)?.or(config.difficulty),
            timestamp: self.ts,
        })
    }
}

fn normalize_id(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn parse_difficulty(value: Option<String>) -> Result<Option<Difficulty>, ConfigurationError> {
    value.map(|name| name.parse()).transpose()
}

// =============================================================================
// TESTS
// =============================================================================
