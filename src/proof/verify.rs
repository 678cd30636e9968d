//! Batch Verification
//!
//! Replays every recorded round from the revealed server seed and builds one
//! [`VerificationReport`]:
//!
//! 1. Order rounds by capture time (stable; file order when no timestamps).
//! 2. Check the server seed commitment once, if a hash is known.
//! 3. Resolve each verifiable round and compare buckets. Rounds without seed
//!    material are skipped, never fatal.
//! 4. Audit the nonce sequence for gaps and duplicates.
//! 5. Analyze the recorded bucket distribution per configuration.
//! 6. Decide the verdict.
//!
//! Only configuration problems abort the batch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::ConfigurationError;
use crate::game::resolver::{resolve_with, Algorithm, RoundResult};
use crate::game::tables::Difficulty;
use crate::proof::commitment::CommitmentCheck;
use crate::proof::records::RecordedRound;
use crate::stats::analysis::{analyze, AnalysisReport, ExpectedSource};

/// Revealed seed material for a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPair {
    /// Revealed server seed.
    pub server_seed: String,
    /// Client seed.
    pub client_seed: String,
}

impl SeedPair {
    /// Create a seed pair.
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>) -> Self {
        Self {
            server_seed: server_seed.into(),
            client_seed: client_seed.into(),
        }
    }
}

/// Batch-level inputs that fill gaps in the records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Client seed for rounds that do not carry one.
    pub client_seed: Option<String>,
    /// Nonce of the first round (in capture order) for rounds without one.
    pub start_nonce: Option<u64>,
    /// Published server seed hash; takes precedence over hashes in the records.
    pub server_seed_hash: Option<String>,
    /// Resolution algorithm.
    pub algorithm: Algorithm,
    /// Distribution the fairness verdict is tested against.
    pub expected_source: ExpectedSource,
}

/// Per-round outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Resolved bucket matches the recorded one.
    Passed,
    /// Resolved bucket differs.
    Failed,
    /// Not enough data to resolve.
    Skipped,
}

/// Why a round could not be checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No nonce on the record and no start nonce.
    MissingNonce,
    /// No client seed on the record or in the options.
    MissingClientSeed,
    /// Nothing recorded to compare against.
    MissingBucket,
    /// `start_nonce + position` does not fit in a u64.
    NonceOverflow,
}

/// Full detail for one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundDetail {
    /// Capture tool identifier.
    pub id: Option<String>,
    /// Nonce used (record or derived).
    pub nonce: Option<u64>,
    /// Pin count used.
    pub pins: u8,
    /// Difficulty used.
    pub difficulty: Difficulty,
    /// Outcome.
    pub status: RoundStatus,
    /// Set for skipped rounds.
    pub skip_reason: Option<SkipReason>,
    /// Resolved float.
    pub float: Option<f64>,
    /// Resolved bucket.
    pub computed_bucket: Option<usize>,
    /// Payout for the resolved bucket.
    pub computed_multiplier: Option<f64>,
    /// Recorded bucket.
    pub expected_bucket: Option<usize>,
    /// Recorded multiplier.
    pub expected_multiplier: Option<f64>,
}

/// A break in the nonce sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceGap {
    /// Last nonce before the gap.
    pub from: u64,
    /// First nonce after the gap.
    pub to: u64,
    /// Nonces absent between them.
    pub missing: u64,
}

/// Integrity of the recorded nonce sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceSequence {
    /// Smallest nonce.
    pub min: u64,
    /// Largest nonce.
    pub max: u64,
    /// Nonces seen (with repeats).
    pub count: u64,
    /// `max - min + 1`; `None` when the range spans every u64.
    pub expected_count: Option<u64>,
    /// Non-consecutive runs.
    pub gaps: Vec<NonceGap>,
    /// Distinct nonces seen more than once.
    pub duplicates: Vec<u64>,
}

impl NonceSequence {
    /// No gaps and no duplicates.
    pub fn is_continuous(&self) -> bool {
        self.gaps.is_empty() && self.duplicates.is_empty()
    }
}

/// Audit a set of nonces. `None` when empty.
pub fn analyze_nonces(nonces: &[u64]) -> Option<NonceSequence> {
    let mut sorted = nonces.to_vec();
    sorted.sort_unstable();

    let min = *sorted.first()?;
    let max = *sorted.last()?;

    let mut gaps = Vec::new();
    let mut duplicates: Vec<u64> = Vec::new();
    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next == prev {
            if duplicates.last() != Some(&next) {
                duplicates.push(next);
            }
        } else if next - prev > 1 {
            gaps.push(NonceGap {
                from: prev,
                to: next,
                missing: next - prev - 1,
            });
        }
    }

    Some(NonceSequence {
        min,
        max,
        count: sorted.len() as u64,
        expected_count: (max - min).checked_add(1),
        gaps,
        duplicates,
    })
}

/// Overall batch verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Every checked round matched and the commitment (if any) held.
    Verified,
    /// Revealed seed does not match the published hash.
    FailedCommitment,
    /// At least one round resolved to a different bucket.
    FailedMismatch,
    /// No round carried enough seed data.
    Inconclusive,
    /// Anything else.
    Partial,
}

impl Verdict {
    /// Decide the verdict. Commitment failure outranks everything.
    pub fn decide(commitment_valid: Option<bool>, passed: u64, failed: u64, skipped: u64, total: u64) -> Self {
        if commitment_valid == Some(false) {
            Self::FailedCommitment
        } else if failed > 0 {
            Self::FailedMismatch
        } else if skipped == total {
            Self::Inconclusive
        } else if passed > 0 {
            Self::Verified
        } else {
            Self::Partial
        }
    }

    /// One-line human description.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED - all checked rounds match the server seed",
            Self::FailedCommitment => "FAILED - server seed does not match the published hash",
            Self::FailedMismatch => "FAILED - some rounds do not match the server seed",
            Self::Inconclusive => "INCONCLUSIVE - no seed data, supply a client seed and start nonce",
            Self::Partial => "PARTIAL - incomplete verification",
        }
    }
}

/// Consolidated batch result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Revealed server seed.
    pub server_seed: String,
    /// Hash checked against, if any.
    pub server_seed_hash: Option<String>,
    /// Batch-level client seed (override, else first record's).
    pub client_seed: Option<String>,
    /// Algorithm used.
    pub algorithm: Algorithm,
    /// Commitment check detail.
    pub commitment: Option<CommitmentCheck>,
    /// Shortcut for `commitment.valid`.
    pub commitment_valid: Option<bool>,
    /// Rounds in the batch.
    pub total_rounds: u64,
    /// Rounds resolved (passed + failed).
    pub verified: u64,
    /// Rounds that matched.
    pub passed: u64,
    /// Rounds that did not match.
    pub failed: u64,
    /// Rounds without enough data.
    pub skipped: u64,
    /// `passed / verified * 100`.
    pub pass_rate: Option<f64>,
    /// Nonce integrity over resolved rounds.
    pub nonce_sequence: Option<NonceSequence>,
    /// Failed rounds only.
    pub failures: Vec<RoundDetail>,
    /// Every round, in capture order.
    pub details: Vec<RoundDetail>,
    /// Distribution analysis per configuration present.
    pub analyses: Vec<AnalysisReport>,
    /// Some configuration used has not been confirmed against the live game.
    pub unverified_configuration: bool,
    /// Overall verdict.
    pub verdict: Verdict,
    /// Report creation time.
    pub generated_at: DateTime<Utc>,
}

/// Verify a batch of recorded rounds against a revealed server seed.
///
/// # Errors
///
/// [`ConfigurationError`] when a round names a `(pins, difficulty)` pair with
/// no table. Mismatches and unverifiable rounds are reported, not returned.
pub fn verify_batch(
    config: &EngineConfig,
    server_seed: &str,
    records: &[RecordedRound],
    options: &BatchOptions,
) -> Result<VerificationReport, ConfigurationError> {
    let mut ordered: Vec<&RecordedRound> = records.iter().collect();
    if ordered.iter().any(|r| r.timestamp.is_some()) {
        ordered.sort_by_key(|r| r.timestamp.unwrap_or(0));
    }

    let published_hash = options
        .server_seed_hash
        .clone()
        .or_else(|| ordered.iter().find_map(|r| r.server_seed_hash.clone()));
    let commitment = published_hash
        .as_deref()
        .map(|hash| CommitmentCheck::run(server_seed, hash));
    if let Some(check) = &commitment {
        if check.valid {
            info!("Commitment verified: SHA-256(server seed) = {}", check.computed_hash);
        } else {
            warn!(
                "Commitment mismatch: published {}, computed {}",
                check.published_hash, check.computed_hash
            );
        }
    }

    let mut details = Vec::with_capacity(ordered.len());
    let mut nonces = Vec::with_capacity(ordered.len());
    let mut histograms: BTreeMap<(u8, Difficulty), Vec<u64>> = BTreeMap::new();
    let (mut passed, mut failed, mut skipped) = (0u64, 0u64, 0u64);

    for (position, record) in ordered.iter().enumerate() {
        let pins = record.pins.unwrap_or(config.default_pins);
        let difficulty = record.difficulty.unwrap_or(config.default_difficulty);
        let table = config.registry.get(pins, difficulty)?;

        if let Some(bucket) = record.bucket {
            let histogram = histograms
                .entry((pins, difficulty))
                .or_insert_with(|| vec![0; table.bucket_count()]);
            match histogram.get_mut(bucket) {
                Some(slot) => *slot += 1,
                None => warn!("Recorded bucket {} out of range for {} pins", bucket, pins),
            }
        }

        let (nonce, overflow) = match (record.nonce, options.start_nonce) {
            (Some(nonce), _) => (Some(nonce), false),
            (None, Some(start)) => match start.checked_add(position as u64) {
                Some(nonce) => (Some(nonce), false),
                None => (None, true),
            },
            (None, None) => (None, false),
        };
        let client_seed = record.client_seed.as_deref().or(options.client_seed.as_deref());

        let mut detail = RoundDetail {
            id: record.id.clone(),
            nonce,
            pins,
            difficulty,
            status: RoundStatus::Skipped,
            skip_reason: None,
            float: None,
            computed_bucket: None,
            computed_multiplier: None,
            expected_bucket: record.bucket,
            expected_multiplier: record.multiplier,
        };

        if overflow {
            warn!("start nonce + {} overflows u64, skipping round", position);
            detail.skip_reason = Some(SkipReason::NonceOverflow);
            skipped += 1;
            details.push(detail);
            continue;
        }

        let (nonce, client_seed, expected_bucket) = match (nonce, client_seed, record.bucket) {
            (Some(n), Some(c), Some(b)) => (n, c, b),
            (None, _, _) => {
                detail.skip_reason = Some(SkipReason::MissingNonce);
                skipped += 1;
                details.push(detail);
                continue;
            }
            (_, None, _) => {
                detail.skip_reason = Some(SkipReason::MissingClientSeed);
                skipped += 1;
                details.push(detail);
                continue;
            }
            (_, _, None) => {
                detail.skip_reason = Some(SkipReason::MissingBucket);
                skipped += 1;
                details.push(detail);
                continue;
            }
        };

        let result: RoundResult = resolve_with(
            options.algorithm,
            &config.registry,
            server_seed,
            client_seed,
            nonce,
            pins,
            difficulty,
        )?;
        nonces.push(nonce);

        detail.float = Some(result.float);
        detail.computed_bucket = Some(result.bucket);
        detail.computed_multiplier = Some(result.multiplier);

        if result.bucket == expected_bucket {
            detail.status = RoundStatus::Passed;
            passed += 1;
            debug!("nonce={} float={:.8} bucket={} ok", nonce, result.float, result.bucket);
        } else {
            detail.status = RoundStatus::Failed;
            failed += 1;
            warn!(
                "nonce={} float={:.8} computed={}({}x) recorded={}({:?}x)",
                nonce, result.float, result.bucket, result.multiplier, expected_bucket, record.multiplier
            );
        }
        details.push(detail);
    }

    let settings = config.analysis_settings(options.expected_source);
    let mut analyses = Vec::with_capacity(histograms.len());
    for ((pins, difficulty), histogram) in &histograms {
        let table = config.registry.get(*pins, *difficulty)?;
        analyses.push(analyze(histogram, table, &settings)?);
    }

    let unverified_configuration = details
        .iter()
        .map(|d| (d.pins, d.difficulty))
        .filter_map(|(pins, difficulty)| config.registry.get(pins, difficulty).ok())
        .any(|table| !table.is_verified());

    let total_rounds = details.len() as u64;
    let verified = passed + failed;
    let commitment_valid = commitment.as_ref().map(|c| c.valid);
    let verdict = Verdict::decide(commitment_valid, passed, failed, skipped, total_rounds);

    info!(
        "Verified {} of {} rounds: {} passed, {} failed, {} skipped -> {:?}",
        verified, total_rounds, passed, failed, skipped, verdict
    );

    Ok(VerificationReport {
        server_seed: server_seed.to_string(),
        server_seed_hash: published_hash,
        client_seed: options
            .client_seed
            .clone()
            .or_else(|| ordered.iter().find_map(|r| r.client_seed.clone())),
        algorithm: options.algorithm,
        commitment,
        commitment_valid,
        total_rounds,
        verified,
        passed,
        failed,
        skipped,
        pass_rate: (verified > 0).then(|| passed as f64 / verified as f64 * 100.0),
        nonce_sequence: analyze_nonces(&nonces),
        failures: details
            .iter()
            .filter(|d| d.status == RoundStatus::Failed)
            .cloned()
            .collect(),
        details,
        analyses,
        unverified_configuration,
        verdict,
        generated_at: Utc::now(),
    })
}

/// Check one round against a recorded bucket.
pub fn verify_round(
    config: &EngineConfig,
    seeds: &SeedPair,
    nonce: u64,
    pins: u8,
    difficulty: Difficulty,
    expected_bucket: usize,
) -> Result<(RoundResult, bool), ConfigurationError> {
    let result = resolve_with(
        Algorithm::ByteStream,
        &config.registry,
        &seeds.server_seed,
        &seeds.client_seed,
        nonce,
        pins,
        difficulty,
    )?;
    Ok((result, result.bucket == expected_bucket))
}

// =============================================================================
// TESTS
// =============================================================================
