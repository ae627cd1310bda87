use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ossim_core::deadlock::{BankersInput, CycleDetector, GraphBuilder, SafetyEngine};
use ossim_core::scheduler::{AlgorithmKind, ProcessSpec, SchedulerEngine};

fn workload(size: usize) -> Vec<ProcessSpec> {
    (0..size)
        .map(|i| {
            ProcessSpec::new(format!("P{}", i + 1), (i * 2) as u32, (i % 7 + 1) as u32)
                .with_priority((i % 5) as i64)
        })
        .collect()
}

fn bench_schedulers(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedulers");

    for size in [10, 50, 200].iter() {
        let engine = SchedulerEngine::new(workload(*size));
        group.throughput(Throughput::Elements(*size as u64));

        for kind in AlgorithmKind::ALL {
            let algorithm = kind.with_params(3, 1, 0);
            group.bench_with_input(BenchmarkId::new(kind.code(), size), size, |b, _| {
                b.iter(|| black_box(engine.run(algorithm)));
            });
        }
    }
    group.finish();
}

// Ring of n processes, each holding R{i} and requesting R{i+1}.
fn ring(n: usize) -> (Vec<(String, String)>, Vec<(String, String)>) {
    let allocations = (1..=n)
        .map(|i| (format!("P{}", i), format!("R{}", i)))
        .collect();
    let requests = (1..=n)
        .map(|i| (format!("P{}", i), format!("R{}", i % n + 1)))
        .collect();
    (allocations, requests)
}

fn bench_cycle_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_detection");

    for size in [10, 100, 1000].iter() {
        let (allocations, requests) = ring(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let graph = GraphBuilder::build(Some(size), Some(size), &allocations, &requests);
                black_box(CycleDetector::detect(graph))
            });
        });
    }
    group.finish();
}

fn bench_bankers(c: &mut Criterion) {
    let mut group = c.benchmark_group("bankers");

    for size in [5, 50, 200].iter() {
        // Reverse order forces one grant per pass.
        let allocation: Vec<Vec<i64>> = (0..*size).map(|_| vec![1, 1, 1]).collect();
        let max: Vec<Vec<i64>> = (0..*size)
            .map(|i| vec![1 + (*size - i) as i64, 1, 1])
            .collect();
        let input = BankersInput::new(vec![1, 0, 0], max, allocation);
        let engine = SafetyEngine::with_max_passes(*size + 1);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(engine.check(&input)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_schedulers, bench_cycle_detection, bench_bankers);
criterion_main!(benches);
