//! Plinko Audit CLI
//!
//! Replays recorded Plinko rounds from a revealed server seed and reports
//! whether they were fair.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use plinko_audit::{
    config::EngineConfig,
    core::stream::compute_page,
    game::resolver::{resolve, resolve_legacy, Algorithm},
    game::tables::Difficulty,
    proof::commitment::commitment_hash,
    proof::records::RoundExport,
    proof::verify::{verify_batch, BatchOptions, RoundStatus},
    report::{sibling_path, write_json, ANALYSIS_SUFFIX, VERIFIED_SUFFIX},
    stats::analysis::{analyze, AnalysisReport, ExpectedSource},
    stats::simulation::{simulate, SimulationConfig, DEFAULT_ROUNDS, SIMULATION_CLIENT_SEED},
    VERSION,
};

/// Golden round used by `self-test`.
const SELF_TEST_SERVER_SEED: &str = "a]Y`yJj5B=Kc5FD";
const SELF_TEST_CLIENT_SEED: &str = "test";

#[derive(Parser)]
#[command(name = "plinko-audit", version, about = "Provably-fair Plinko verifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify an export of recorded rounds against a revealed server seed
    Verify {
        /// Export file (JSON)
        input: PathBuf,
        /// Revealed server seed
        server_seed: String,
        /// Client seed for rounds that do not carry one
        #[arg(long)]
        client_seed: Option<String>,
        /// Nonce of the first round, for rounds without one
        #[arg(long)]
        start_nonce: Option<u64>,
        /// Published server seed hash
        #[arg(long)]
        server_seed_hash: Option<String>,
        /// Use the historical per-row path algorithm
        #[arg(long)]
        legacy: bool,
        /// Test the distribution against the binomial model instead of the table
        #[arg(long)]
        binomial: bool,
        /// Report path, default <input>_verified.json
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Resolve a single round
    Resolve {
        server_seed: String,
        client_seed: String,
        nonce: u64,
        #[arg(default_value_t = 16)]
        pins: u8,
        #[arg(default_value = "medium")]
        difficulty: Difficulty,
        /// Also show the historical per-row path result
        #[arg(long)]
        legacy: bool,
    },
    /// Monte-Carlo simulation of the resolver
    Simulate {
        #[arg(default_value_t = DEFAULT_ROUNDS)]
        rounds: u64,
        #[arg(default_value_t = 16)]
        pins: u8,
        #[arg(default_value = "medium")]
        difficulty: Difficulty,
        /// Server seed, random when omitted
        #[arg(long)]
        server_seed: Option<String>,
        #[arg(long, default_value = SIMULATION_CLIENT_SEED)]
        client_seed: String,
        #[arg(long, default_value = "data/simulation_results.json")]
        output: PathBuf,
    },
    /// Analyze the bucket distribution of an export
    Analyze {
        input: PathBuf,
        #[arg(long)]
        pins: Option<u8>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Test against the binomial model instead of the table
        #[arg(long)]
        binomial: bool,
    },
    /// Check resolver determinism on a fixed seed
    SelfTest,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env().context("Invalid engine configuration")?;

    info!("Plinko Audit v{}", VERSION);

    match cli.command {
        Commands::Verify {
            input,
            server_seed,
            client_seed,
            start_nonce,
            server_seed_hash,
            legacy,
            binomial,
            output,
        } => {
            let export = RoundExport::load(&input)?;
            let options = BatchOptions {
                client_seed,
                start_nonce,
                server_seed_hash,
                algorithm: if legacy { Algorithm::LegacyPath } else { Algorithm::ByteStream },
                expected_source: expected_source(binomial),
            };

            let report = verify_batch(&config, &server_seed, &export.rounds, &options)?;

            info!("=== Verification Results ===");
            info!("Rounds: {} total, {} verified, {} skipped", report.total_rounds, report.verified, report.skipped);
            if let Some(rate) = report.pass_rate {
                info!("Passed: {}/{} ({:.1}%)", report.passed, report.verified, rate);
            }
            if let Some(valid) = report.commitment_valid {
                info!("Commitment: {}", if valid { "valid" } else { "INVALID" });
            }
            if let Some(sequence) = &report.nonce_sequence {
                info!(
                    "Nonces {}..={}: {} gaps, {} duplicates",
                    sequence.min,
                    sequence.max,
                    sequence.gaps.len(),
                    sequence.duplicates.len()
                );
            }
            for failure in report.details.iter().filter(|d| d.status == RoundStatus::Failed).take(10) {
                warn!(
                    "Mismatch at nonce {:?}: computed {:?}, recorded {:?}",
                    failure.nonce, failure.computed_bucket, failure.expected_bucket
                );
            }
            for analysis in &report.analyses {
                log_analysis(analysis);
            }
            if report.unverified_configuration {
                warn!("Report uses a configuration not confirmed against live rounds");
            }
            info!("Verdict: {}", report.verdict.describe());

            let path = output.unwrap_or_else(|| sibling_path(&input, VERIFIED_SUFFIX));
            write_json(&path, &report)?;
        }

        Commands::Resolve {
            server_seed,
            client_seed,
            nonce,
            pins,
            difficulty,
            legacy,
        } => {
            let page = compute_page(&server_seed, &client_seed, nonce, 0);
            let result = resolve(&config.registry, &server_seed, &client_seed, nonce, pins, difficulty)?;

            info!("HMAC page 0: {}", hex::encode(page));
            info!("Float:       {:.16}", result.float);
            info!("Bucket:      {} / {}", result.bucket, pins);
            info!("Multiplier:  {}x", result.multiplier);
            info!("Server hash: {}", commitment_hash(&server_seed));

            if legacy {
                let legacy = resolve_legacy(&server_seed, &client_seed, nonce, pins);
                info!("=== Legacy Path ===");
                info!("Hash:   {}", legacy.hash);
                info!("Path:   {}", legacy.path_string());
                info!("Bucket: {}", legacy.bucket);
            }
        }

        Commands::Simulate {
            rounds,
            pins,
            difficulty,
            server_seed,
            client_seed,
            output,
        } => {
            let sim = SimulationConfig {
                rounds,
                pins,
                difficulty,
                server_seed,
                client_seed,
                start_nonce: 0,
            };
            let cancel = AtomicBool::new(false);
            let report = simulate(&config, &sim, &cancel)?;

            info!("=== Simulation Results ===");
            info!("Server seed: {}", report.server_seed);
            info!(
                "{} rounds in {} ms ({:.0} rounds/s)",
                report.rounds_completed, report.elapsed_ms, report.rounds_per_second
            );
            if let (Some(rtp), Some(edge)) = (report.rtp, report.house_edge) {
                info!("RTP: {:.4}%  House edge: {:.4}%", rtp, edge);
            }
            log_analysis(&report.analysis);

            write_json(&output, &report)?;
        }

        Commands::Analyze {
            input,
            pins,
            difficulty,
            binomial,
        } => {
            let export = RoundExport::load(&input)?;
            let first = export.rounds.first();
            let pins = pins
                .or(export.config.pins)
                .or_else(|| first.and_then(|r| r.pins))
                .unwrap_or(config.default_pins);
            let difficulty = difficulty
                .or(export.config.difficulty)
                .or_else(|| first.and_then(|r| r.difficulty))
                .unwrap_or(config.default_difficulty);

            let table = config.registry.get(pins, difficulty)?;
            let histogram = match &export.buckets {
                Some(buckets) if buckets.len() == table.bucket_count() => buckets.clone(),
                Some(buckets) => {
                    warn!(
                        "Ignoring exported histogram with {} buckets, rebuilding from rounds",
                        buckets.len()
                    );
                    export.bucket_histogram(pins)
                }
                None => export.bucket_histogram(pins),
            };

            let analysis = analyze(&histogram, table, &config.analysis_settings(expected_source(binomial)))?;
            log_analysis(&analysis);
            write_json(&sibling_path(&input, ANALYSIS_SUFFIX), &analysis)?;
        }

        Commands::SelfTest => self_test(&config)?,
    }

    Ok(())
}

fn expected_source(binomial: bool) -> ExpectedSource {
    if binomial {
        ExpectedSource::Binomial
    } else {
        ExpectedSource::Published
    }
}

fn log_analysis(analysis: &AnalysisReport) {
    info!(
        "[{} pins / {}] n={} chi2={:.4} (critical {}, df {}) -> {}",
        analysis.pins,
        analysis.difficulty,
        analysis.sample_count,
        analysis.chi_squared,
        analysis.critical_value,
        analysis.degrees_of_freedom,
        if analysis.fair { "fair" } else { "NOT fair" }
    );
    if let (Some(rtp), Some(ci)) = (analysis.observed_rtp, analysis.confidence_interval) {
        info!(
            "RTP {:.4}% (theoretical {:.4}%, 95% CI {:.4}..{:.4})",
            rtp, analysis.theoretical_rtp, ci.lower, ci.upper
        );
    }
    if let Some(symmetry) = &analysis.symmetry {
        if symmetry.biased {
            warn!("Left/right imbalance: {:.2}% left", symmetry.left_pct);
        }
    }
    if analysis.unverified_configuration {
        warn!("Table for {} pins / {} is not confirmed against live rounds", analysis.pins, analysis.difficulty);
    }
}

fn self_test(config: &EngineConfig) -> anyhow::Result<()> {
    info!("=== Self Test ===");

    let runs = (0..5)
        .map(|_| {
            resolve(
                &config.registry,
                SELF_TEST_SERVER_SEED,
                SELF_TEST_CLIENT_SEED,
                0,
                16,
                Difficulty::Low,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let first = runs[0];
    if runs.iter().any(|r| *r != first) {
        bail!("DETERMINISM FAILURE: repeated resolutions differ");
    }
    info!(
        "Deterministic: float {:.16}, bucket {}, {}x",
        first.float, first.bucket, first.multiplier
    );

    let mut distinct = BTreeSet::new();
    for nonce in 0..100 {
        let result = resolve(
            &config.registry,
            SELF_TEST_SERVER_SEED,
            SELF_TEST_CLIENT_SEED,
            nonce,
            config.default_pins,
            config.default_difficulty,
        )?;
        distinct.insert(result.bucket);
    }
    info!("{} distinct buckets over 100 nonces", distinct.len());
    if distinct.len() < 2 {
        bail!("Resolver produced a single bucket for 100 nonces");
    }

    info!("Self test passed");
    Ok(())
}
