use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use physicslab::experiment::van_der_pauw::{
    analyze, process, Geometry, MeasurementRow, MeasurementTable, VanDerPauw,
};
use physicslab::experiment::{process_all, Sample};

fn build_table(rh: f64, rv: f64) -> MeasurementTable {
    Geometry::PERMUTATIONS
        .into_iter()
        .map(|g| {
            let r = if g.is_horizontal() { rh } else { rv };
            MeasurementRow::new(g, r * 1.0e-3, 1.0e-3)
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    for ratio in [1.0, 10.0, 1000.0] {
        group.bench_function(BenchmarkId::new("ratio", ratio), |b| {
            b.iter(|| analyze(black_box(1000.0 * ratio), black_box(1000.0)))
        });
    }
    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    group.bench_function("single_table", |b| {
        b.iter_batched(
            || build_table(1200.0, 800.0),
            |table| black_box(process(&table, Some(1.0e-7))),
            BatchSize::SmallInput,
        )
    });

    let samples: Vec<_> = (0..1_000)
        .map(|i| Sample::new(format!("s{i}"), build_table(1000.0 + i as f64, 1000.0)))
        .collect();
    group.bench_function(BenchmarkId::new("batch", samples.len()), |b| {
        b.iter(|| process_all(&VanDerPauw::default(), black_box(&samples)))
    });
    group.finish();
}

criterion_group!(benches, bench_analyze, bench_process);
criterion_main!(benches);
