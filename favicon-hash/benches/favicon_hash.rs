use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use favicon_hash::{compute_hashes, encode_base64_lines, legacy_hash};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Typical favicon sizes: a 16x16 ICO, a 32x32 PNG, a 180x180 touch icon.
const SIZES: &[usize] = &[318, 1_150, 15_086];

/// Generates a random payload of the given size.
/// Uses a fixed seed for reproducible benchmark results.
fn random_payload(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..len).map(|_| rng.r#gen::<u8>()).collect()
}

fn bench_legacy_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("legacy_hash");
    for &size in SIZES {
        let payload = random_payload(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| black_box(legacy_hash(black_box(payload))))
        });
    }
    group.finish();
}

fn bench_base64_lines(c: &mut Criterion) {
    let payload = random_payload(15_086);

    c.bench_function("encode_base64_lines_15k", |b| {
        b.iter(|| black_box(encode_base64_lines(black_box(&payload))))
    });
}

fn bench_compute_hashes(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_hashes");
    for &size in SIZES {
        let payload = random_payload(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| black_box(compute_hashes(black_box(payload))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_legacy_hash, bench_base64_lines, bench_compute_hashes);
criterion_main!(benches);
