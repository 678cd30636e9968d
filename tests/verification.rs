//! End-to-end: export file in, report file out.

use std::fs;
use std::path::{Path, PathBuf};

use plinko_audit::config::EngineConfig;
use plinko_audit::error::{Error, InputError};
use plinko_audit::proof::commitment::commitment_hash;
use plinko_audit::proof::records::RoundExport;
use plinko_audit::proof::verify::{verify_batch, BatchOptions, Verdict};
use plinko_audit::report::{sibling_path, write_json, ANALYSIS_SUFFIX, VERIFIED_SUFFIX};
use plinko_audit::stats::analysis::{analyze, AnalysisReport};

/// Recorded 16-pin medium session, nonces 1..=30.
const SERVER_SEED: &str = "59436d5114d239bc388947e9dcbe9546532bf9b8b1bd96669550ca124330d244";
const CLIENT_SEED: &str = "bc0077399f741f4e44c0d257820c0b55aa64f5836ab69f598c876f14205eee2e";
const BUCKETS: [usize; 30] = [
    7, 10, 8, 6, 10, 9, 11, 11, 9, 10, 7, 10, 8, 6, 10, 9, 11, 6, 7, 6, 10, 9, 9, 6, 10, 7, 5, 9, 7, 10,
];

fn live_rounds(with_seed: bool) -> Vec<serde_json::Value> {
    BUCKETS
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            let mut round = serde_json::json!({
                "id": i + 1,
                "bucket": bucket,
                "ts": 1_700_000_000_000i64 + i as i64 * 1000,
            });
            if with_seed {
                round["nonce"] = serde_json::json!(i + 1);
                round["clientSeed"] = serde_json::json!(CLIENT_SEED);
            }
            round
        })
        .collect()
}

fn write_export(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

#[test]
fn test_live_session_verifies_end_to_end() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let dir = tmp.path();
    let input = write_export(dir, "session.json", &serde_json::Value::Array(live_rounds(true)));

    let config = EngineConfig::standard().unwrap();
    let export = RoundExport::load(&input).unwrap();
    let options = BatchOptions {
        server_seed_hash: Some(commitment_hash(SERVER_SEED)),
        ..Default::default()
    };
    let report = verify_batch(&config, SERVER_SEED, &export.rounds, &options).unwrap();

    assert_eq!(report.verdict, Verdict::Verified);
    assert_eq!(report.passed, 30);
    assert!(!report.unverified_configuration);
    let sequence = report.nonce_sequence.as_ref().unwrap();
    assert_eq!((sequence.min, sequence.max), (1, 30));
    assert!(sequence.is_continuous());

    let output = sibling_path(&input, VERIFIED_SUFFIX);
    assert_eq!(output, dir.join("session_verified.json"));
    write_json(&output, &report).unwrap();

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["verdict"], "VERIFIED");
    assert_eq!(written["passed"], 30);
    assert_eq!(written["commitment_valid"], true);
    assert_eq!(written["details"].as_array().unwrap().len(), 30);
}

#[test]
fn test_overrides_from_command_line() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let dir = tmp.path();
    let export = serde_json::json!({
        "config": { "pins": 16, "difficulty": "medium" },
        "results": live_rounds(false),
    });
    let input = write_export(dir, "bare.json", &export);

    let config = EngineConfig::standard().unwrap();
    let export = RoundExport::load(&input).unwrap();

    let without = verify_batch(&config, SERVER_SEED, &export.rounds, &BatchOptions::default()).unwrap();
    assert_eq!(without.verdict, Verdict::Inconclusive);

    let options = BatchOptions {
        client_seed: Some(CLIENT_SEED.to_string()),
        start_nonce: Some(1),
        ..Default::default()
    };
    let with = verify_batch(&config, SERVER_SEED, &export.rounds, &options).unwrap();
    assert_eq!(with.verdict, Verdict::Verified);
    assert_eq!(with.passed, 30);
}

#[test]
fn test_tampered_round_and_wrong_hash() {
    let config = EngineConfig::standard().unwrap();
    let mut rounds = live_rounds(true);
    rounds[4]["bucket"] = serde_json::json!(0);
    let export = RoundExport::parse(&serde_json::Value::Array(rounds).to_string(), Path::new("mem.json")).unwrap();

    let report = verify_batch(&config, SERVER_SEED, &export.rounds, &BatchOptions::default()).unwrap();
    assert_eq!(report.verdict, Verdict::FailedMismatch);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].nonce, Some(5));
    assert_eq!(report.failures[0].computed_bucket, Some(10));

    let options = BatchOptions {
        server_seed_hash: Some(commitment_hash("not the seed")),
        ..Default::default()
    };
    let report = verify_batch(&config, SERVER_SEED, &export.rounds, &options).unwrap();
    assert_eq!(report.verdict, Verdict::FailedCommitment);
}

#[test]
fn test_analysis_report_written() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let dir = tmp.path();
    let input = write_export(dir, "samples.json", &serde_json::Value::Array(live_rounds(false)));

    let config = EngineConfig::standard().unwrap();
    let export = RoundExport::load(&input).unwrap();
    let table = config.registry.get(16, config.default_difficulty).unwrap();
    let analysis = analyze(&export.bucket_histogram(16), table, &config.analysis_settings(Default::default())).unwrap();
    assert_eq!(analysis.sample_count, 30);

    let output = sibling_path(&input, ANALYSIS_SUFFIX);
    write_json(&output, &analysis).unwrap();
    let back: AnalysisReport = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(back.bucket_histogram, analysis.bucket_histogram);
}

#[test]
fn test_bad_input_is_an_error() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let dir = tmp.path();
    let empty = write_export(dir, "empty.json", &serde_json::json!([]));
    let garbage = dir.join("garbage.json");
    fs::write(&garbage, "{ not json").unwrap();

    assert!(matches!(RoundExport::load(&empty), Err(Error::Input(InputError::Empty { .. }))));
    assert!(matches!(RoundExport::load(&garbage), Err(Error::Input(InputError::Parse { .. }))));
    assert!(matches!(
        RoundExport::load(&dir.join("missing.json")),
        Err(Error::Input(InputError::Io { .. }))
    ));
}
