//! Benchmark for ring growth and chunk assembly.
//!
//! Run with: cargo bench --package tunnelcave_procedural --bench ring_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tunnelcave_procedural::{
    ChunkStreamer, FieldType, StreamerConfig, TunnelParams, TunnelTerrainGenerator,
};

fn benchmark_ring_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_growth");
    group.throughput(Throughput::Elements(1_000));
    group.sample_size(10);

    for field_type in [FieldType::DivergenceFree, FieldType::PipeNetwork] {
        group.bench_function(format!("1000_rings_{field_type}"), |b| {
            let params = TunnelParams { field_type, ..TunnelParams::default() };
            b.iter(|| {
                let mut generator = TunnelTerrainGenerator::new(params.clone())
                    .unwrap_or_else(|e| panic!("bench params must be valid: {e}"));
                generator.ensure_ring(1_000);
                black_box(generator.ring_count())
            });
        });
    }

    group.finish();
}

fn benchmark_chunk_assembly(c: &mut Criterion) {
    let mut generator = TunnelTerrainGenerator::new(TunnelParams::default())
        .unwrap_or_else(|e| panic!("bench params must be valid: {e}"));
    // Rings are cached, so only mesh and SDF assembly is measured.
    generator.ensure_ring(generator.chunk_ring_range(64).end);

    c.bench_function("cached_chunk_assembly", |b| {
        let mut index = 0usize;
        b.iter(|| {
            index = (index + 1) % 64;
            black_box(generator.generate_chunk(index))
        });
    });
}

fn benchmark_streaming_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming");
    group.sample_size(10);

    group.bench_function("walk_100_chunks", |b| {
        b.iter(|| {
            let generator = TunnelTerrainGenerator::new(TunnelParams::default())
                .unwrap_or_else(|e| panic!("bench params must be valid: {e}"));
            let mut streamer = ChunkStreamer::new(generator, StreamerConfig::default())
                .unwrap_or_else(|e| panic!("bench band must be valid: {e}"));
            for chunk in 0..100 {
                black_box(streamer.update(chunk));
            }
            black_box(streamer.stats())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_ring_growth,
    benchmark_chunk_assembly,
    benchmark_streaming_walk,
);
criterion_main!(benches);
