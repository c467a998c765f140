use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_compress::legacy::{LegacyCodec, compress_legacy};
use strata_compress::{ChunkedCompressor, CompressionLevel};

/// Smooth field of 16-bit samples, compresses like a real density grid.
fn density_bytes(len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut out = Vec::with_capacity(len);
    let mut value: i16 = 0;
    while out.len() < len {
        value = value.saturating_add(rng.random_range(-64..=64));
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.truncate(len);
    out
}

fn bench_compress_default(c: &mut Criterion) {
    let data = density_bytes(1 << 20);
    let compressor = ChunkedCompressor::new(CompressionLevel::DEFAULT);
    c.bench_function("compress_1mib_default", |bencher| {
        bencher.iter(|| black_box(compressor.compress(black_box(&data))))
    });
}

fn bench_compress_fast(c: &mut Criterion) {
    let data = density_bytes(1 << 20);
    let compressor = ChunkedCompressor::new(CompressionLevel::BEST_SPEED);
    c.bench_function("compress_1mib_fast", |bencher| {
        bencher.iter(|| black_box(compressor.compress(black_box(&data))))
    });
}

fn bench_decompress(c: &mut Criterion) {
    let data = density_bytes(1 << 20);
    let compressor = ChunkedCompressor::default();
    let blob = compressor
        .compress(&data)
        .expect("benchmark input compresses");
    c.bench_function("decompress_1mib", |bencher| {
        bencher.iter(|| black_box(compressor.decompress(black_box(&blob))))
    });
}

fn bench_decompress_legacy(c: &mut Criterion) {
    let data = density_bytes(1 << 20);
    let blob = compress_legacy(&data, LegacyCodec::Zlib, 0).expect("benchmark input compresses");
    c.bench_function("decompress_1mib_legacy", |bencher| {
        bencher.iter(|| black_box(strata_compress::decompress(black_box(&blob))))
    });
}

criterion_group!(
    benches,
    bench_compress_default,
    bench_compress_fast,
    bench_decompress,
    bench_decompress_legacy
);
criterion_main!(benches);
