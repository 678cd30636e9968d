//! Resolver throughput.
//!
//! Run with: cargo bench --bench resolver

use std::sync::atomic::AtomicBool;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use plinko_audit::config::EngineConfig;
use plinko_audit::core::stream::ByteStream;
use plinko_audit::game::resolver::{resolve_legacy, resolve_with_table};
use plinko_audit::game::tables::Difficulty;
use plinko_audit::stats::simulation::{simulate, SimulationConfig};

const SERVER_SEED: &str = "59436d5114d239bc388947e9dcbe9546532bf9b8b1bd96669550ca124330d244";
const CLIENT_SEED: &str = "bc0077399f741f4e44c0d257820c0b55aa64f5836ab69f598c876f14205eee2e";

fn benchmark_single_round(c: &mut Criterion) {
    let config = EngineConfig::standard().expect("standard tables");
    let table = config.registry.get(16, Difficulty::Medium).expect("16/medium");

    c.bench_function("resolve_16_medium", |b| {
        let mut nonce = 0u64;
        b.iter(|| {
            nonce += 1;
            black_box(resolve_with_table(SERVER_SEED, CLIENT_SEED, black_box(nonce), table))
        });
    });

    c.bench_function("resolve_legacy_16", |b| {
        b.iter(|| black_box(resolve_legacy(SERVER_SEED, CLIENT_SEED, black_box(7), 16)));
    });
}

fn benchmark_byte_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("byte_stream");
    for bytes in [32usize, 256, 4096] {
        group.throughput(Throughput::Bytes(bytes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(bytes), &bytes, |b, &bytes| {
            b.iter(|| {
                let stream = ByteStream::new(SERVER_SEED, CLIENT_SEED, 1);
                black_box(stream.take(bytes).fold(0u64, |acc, byte| acc + u64::from(byte)))
            });
        });
    }
    group.finish();
}

fn benchmark_simulation(c: &mut Criterion) {
    let config = EngineConfig::standard().expect("standard tables");
    let sim = SimulationConfig {
        rounds: 10_000,
        server_seed: Some(SERVER_SEED.to_string()),
        ..Default::default()
    };

    let mut group = c.benchmark_group("simulation");
    group.throughput(Throughput::Elements(sim.rounds));
    group.sample_size(10);
    group.bench_function("10k_rounds", |b| {
        b.iter(|| black_box(simulate(&config, &sim, &AtomicBool::new(false))))
    });
    group.finish();
}

criterion_group!(benches, benchmark_single_round, benchmark_byte_stream, benchmark_simulation);
criterion_main!(benches);
