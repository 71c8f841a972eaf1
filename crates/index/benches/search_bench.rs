//! Benchmarks for exact nearest-neighbor search
//!
//! Run with: cargo bench -p index

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use index::{FlatL2Index, VectorIndex};

const DIMENSION: usize = 768;

/// Cheap deterministic pseudo-random vectors
fn generate_vectors(count: usize, seed: u32) -> Vec<Vec<f32>> {
  let mut state = seed.wrapping_mul(2_654_435_761).max(1);
  (0..count)
    .map(|_| {
      (0..DIMENSION)
        .map(|_| {
          state ^= state << 13;
          state ^= state >> 17;
          state ^= state << 5;
          (state % 1000) as f32 / 1000.0
        })
        .collect()
    })
    .collect()
}

fn bench_search(c: &mut Criterion) {
  let mut group = c.benchmark_group("flat_l2_search");
  let query = generate_vectors(1, 7).remove(0);

  for size in [100, 1_000, 10_000].iter() {
    let mut index = FlatL2Index::new(DIMENSION);
    index.add(generate_vectors(*size, 42)).unwrap();

    group.throughput(Throughput::Elements(*size as u64));
    group.bench_with_input(BenchmarkId::from_parameter(size), &index, |b, index| {
      b.iter(|| index.search(black_box(&query), 5));
    });
  }

  group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
