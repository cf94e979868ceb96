use cardinality_sketch::CardinalitySketch;
use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Insert, estimate and merge are benchmarked against cardinalities ranging
/// from 0 to `MAX_CARDINALITY`, doubling with every step.
const MAX_CARDINALITY: u64 = 65_536;

const PRECISION: u8 = 12;

criterion_group!(benches, benchmark);
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let cardinalities: Vec<u64> = std::iter::once(0)
        .chain((0..).map(|exp| 1u64 << exp))
        .take_while(|&n| n <= MAX_CARDINALITY)
        .collect();

    let mut group = c.benchmark_group("insert");
    for &n in &cardinalities {
        group.throughput(Throughput::Elements(n.max(1)));
        bench_insert(&mut group, n);
    }
    group.finish();

    let mut group = c.benchmark_group("estimate");
    group.throughput(Throughput::Elements(1));
    for &n in &cardinalities {
        bench_estimate(&mut group, n);
    }
    group.finish();

    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements(1));
    for &n in &cardinalities {
        bench_merge(&mut group, n);
    }
    group.finish();
}

fn sketch_of(seed: u64, n: u64) -> CardinalitySketch {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sketch = CardinalitySketch::new(PRECISION).unwrap();
    for _ in 0..n {
        sketch.add(rng.gen()).unwrap();
    }
    sketch
}

fn bench_insert(group: &mut BenchmarkGroup<WallTime>, n: u64) {
    group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
        b.iter(|| {
            let mut sketch = CardinalitySketch::new(PRECISION).unwrap();
            for item in 0..black_box(n) {
                sketch.add(item).unwrap();
            }
            sketch
        });
    });
}

fn bench_estimate(group: &mut BenchmarkGroup<WallTime>, n: u64) {
    let sketch = sketch_of(1, n);
    group.bench_with_input(
        BenchmarkId::new("bias_corrected", n),
        &sketch,
        |b, sketch| b.iter(|| black_box(sketch).estimate_bias_corrected()),
    );
    group.bench_with_input(
        BenchmarkId::new("maximum_likelihood", n),
        &sketch,
        |b, sketch| b.iter(|| black_box(sketch).estimate_maximum_likelihood()),
    );
}

fn bench_merge(group: &mut BenchmarkGroup<WallTime>, n: u64) {
    let lhs = sketch_of(2, n);
    let rhs = sketch_of(3, n);
    group.bench_with_input(BenchmarkId::from_parameter(n), &(lhs, rhs), |b, (lhs, rhs)| {
        b.iter(|| {
            let mut merged = lhs.clone();
            merged.merge(black_box(rhs)).unwrap();
            merged
        });
    });
}
