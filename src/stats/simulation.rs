//! Monte-Carlo Simulation
//!
//! Resolves a long run of consecutive nonces from one seed pair and feeds the
//! histogram to the analyzer. Used to validate the resolver against its own
//! probability table.
//!
//! Nonces are split into contiguous chunks, one per worker thread. Each worker
//! keeps a local histogram; they are merged after the scope joins. The cancel
//! flag is checked between rounds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::ConfigurationError;
use crate::game::resolver::resolve_with_table;
use crate::game::tables::{Difficulty, GameTable};
use crate::proof::commitment::commitment_hash;
use crate::stats::analysis::{analyze, AnalysisReport, ExpectedSource};

/// Client seed used for simulations.
pub const SIMULATION_CLIENT_SEED: &str = "sim_test";

/// Rounds between progress lines, per worker.
pub const PROGRESS_INTERVAL: u64 = 25_000;

/// Rounds simulated when none are requested.
pub const DEFAULT_ROUNDS: u64 = 100_000;

/// What to simulate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of rounds.
    pub rounds: u64,
    /// Pin count.
    pub pins: u8,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Server seed; random when `None`.
    pub server_seed: Option<String>,
    /// Client seed.
    pub client_seed: String,
    /// First nonce.
    pub start_nonce: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            pins: 16,
            difficulty: Difficulty::Medium,
            server_seed: None,
            client_seed: SIMULATION_CLIENT_SEED.to_string(),
            start_nonce: 0,
        }
    }
}

/// Simulation outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Server seed used.
    pub server_seed: String,
    /// SHA-256 of the server seed.
    pub server_seed_hash: String,
    /// Client seed used.
    pub client_seed: String,
    /// Pin count.
    pub pins: u8,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Rounds asked for.
    pub rounds_requested: u64,
    /// Rounds actually resolved.
    pub rounds_completed: u64,
    /// Stopped early by the cancel flag.
    pub cancelled: bool,
    /// Worker threads used.
    pub workers: usize,
    /// Wall time in milliseconds.
    pub elapsed_ms: u64,
    /// Throughput.
    pub rounds_per_second: f64,
    /// Observed return to player, percent.
    pub rtp: Option<f64>,
    /// `100 - rtp`.
    pub house_edge: Option<f64>,
    /// Distribution analysis of the simulated histogram.
    pub analysis: AnalysisReport,
    /// Report creation time.
    pub generated_at: DateTime<Utc>,
}

/// Random 32-byte server seed as hex.
pub fn random_server_seed() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Run a simulation.
///
/// # Errors
///
/// [`ConfigurationError`] if no table exists for the requested configuration.
pub fn simulate(
    engine: &EngineConfig,
    config: &SimulationConfig,
    cancel: &AtomicBool,
) -> Result<SimulationReport, ConfigurationError> {
    let table = engine.registry.get(config.pins, config.difficulty)?;
    table.validate()?;
    if !table.is_verified() {
        warn!(
            "Simulating {} pins / {}: table not confirmed against live rounds",
            config.pins, config.difficulty
        );
    }

    let server_seed = config.server_seed.clone().unwrap_or_else(random_server_seed);
    let workers = engine.workers.clamp(1, config.rounds.max(1) as usize);

    info!(
        "Simulating {} rounds ({} pins, {}) on {} workers",
        config.rounds, config.pins, config.difficulty, workers
    );

    let started = Instant::now();
    let (histogram, completed) = run_workers(table, &server_seed, config, workers, cancel)?;
    let elapsed = started.elapsed();

    let cancelled = completed < config.rounds;
    if cancelled {
        warn!("Simulation cancelled after {} of {} rounds", completed, config.rounds);
    }

    let analysis = analyze(&histogram, table, &engine.analysis_settings(ExpectedSource::Published))?;
    let rtp = analysis.observed_rtp;
    let secs = elapsed.as_secs_f64();

    info!(
        "Simulation done: {} rounds in {:.2}s, RTP {:?}, chi2 {:.4} (critical {})",
        completed, secs, rtp, analysis.chi_squared, analysis.critical_value
    );

    Ok(SimulationReport {
        server_seed_hash: commitment_hash(&server_seed),
        server_seed,
        client_seed: config.client_seed.clone(),
        pins: config.pins,
        difficulty: config.difficulty,
        rounds_requested: config.rounds,
        rounds_completed: completed,
        cancelled,
        workers,
        elapsed_ms: elapsed.as_millis() as u64,
        rounds_per_second: if secs > 0.0 { completed as f64 / secs } else { 0.0 },
        rtp,
        house_edge: rtp.map(|r| 100.0 - r),
        analysis,
        generated_at: Utc::now(),
    })
}

/// Resolve all rounds across `workers` threads. Returns the merged histogram
/// and the number of rounds completed.
fn run_workers(
    table: &GameTable,
    server_seed: &str,
    config: &SimulationConfig,
    workers: usize,
    cancel: &AtomicBool,
) -> Result<(Vec<u64>, u64), ConfigurationError> {
    let chunk = config.rounds.div_ceil(workers as u64);

    let partials: Vec<Result<(Vec<u64>, u64), ConfigurationError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers as u64)
            .map(|worker| {
                let first = config.start_nonce.saturating_add(worker * chunk);
                let last = config.start_nonce.saturating_add(((worker + 1) * chunk).min(config.rounds));
                let client_seed = config.client_seed.as_str();
                scope.spawn(move || simulate_range(table, server_seed, client_seed, worker, first..last, cancel))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut histogram = vec![0u64; table.bucket_count()];
    let mut completed = 0;
    for partial in partials {
        let (local, count) = partial?;
        for (total, value) in histogram.iter_mut().zip(local) {
            *total += value;
        }
        completed += count;
    }
    Ok((histogram, completed))
}

fn simulate_range(
    table: &GameTable,
    server_seed: &str,
    client_seed: &str,
    worker: u64,
    nonces: std::ops::Range<u64>,
    cancel: &AtomicBool,
) -> Result<(Vec<u64>, u64), ConfigurationError> {
    let mut histogram = vec![0u64; table.bucket_count()];
    let mut done = 0u64;
    let total = nonces.end.saturating_sub(nonces.start);

    for nonce in nonces {
        if cancel.load(Ordering::Relaxed) {
            debug!("Worker {} stopping at nonce {}", worker, nonce);
            break;
        }

        let result = resolve_with_table(server_seed, client_seed, nonce, table)?;
        if let Some(slot) = histogram.get_mut(result.bucket) {
            *slot += 1;
        }
        done += 1;

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(worker, nonce, bucket = result.bucket, float = result.float, "simulated round");

        if done % PROGRESS_INTERVAL == 0 {
            info!("Worker {}: {}/{} rounds", worker, done, total);
        }
    }

    Ok((histogram, done))
}

// =============================================================================
// TESTS
// =============================================================================
