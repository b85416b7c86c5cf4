//! Performance benchmarks for StackTune
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stacktune::emit::EnvManifest;
use stacktune::monitor::{evaluate, resolve, MetricSnapshot, ServiceStatus};
use stacktune::plan::{classify, DiskType, HardwareFacts, ParameterPlanner};

fn host(ram_gb: u64, cores: u32) -> HardwareFacts {
    HardwareFacts::from_memory_mb(ram_gb * 1024, cores, cores * 2, DiskType::Ssd, 200)
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    let planner = ParameterPlanner::default();

    for (ram_gb, cores) in [(1u64, 1u32), (8, 4), (128, 32)] {
        let facts = host(ram_gb, cores);
        group.bench_with_input(
            BenchmarkId::new("classify_and_plan", format!("{}GB", ram_gb)),
            &facts,
            |b, facts| {
                b.iter(|| {
                    let tier = classify(black_box(facts));
                    black_box(planner.plan(facts, tier))
                });
            },
        );
    }

    group.finish();
}

fn bench_manifest(c: &mut Criterion) {
    let facts = host(16, 8);
    let params = match ParameterPlanner::default().plan(&facts, classify(&facts)) {
        Ok(params) => params,
        Err(e) => panic!("planning failed: {}", e),
    };

    c.bench_function("render_manifest", |b| {
        b.iter(|| black_box(EnvManifest::from_params(black_box(&params)).render()));
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let facts = host(2, 2);
    let thresholds = resolve(&facts);
    let snapshot = MetricSnapshot::new(91.0, 50.0, 93.0)
        .with_service("elasticsearch", ServiceStatus::Up)
        .with_service("kibana", ServiceStatus::Down)
        .with_service("filebeat", ServiceStatus::Degraded);

    c.bench_function("evaluate_snapshot", |b| {
        b.iter(|| black_box(evaluate(black_box(&snapshot), &thresholds, 30)));
    });
}

criterion_group!(benches, bench_plan, bench_manifest, bench_evaluate);
criterion_main!(benches);
