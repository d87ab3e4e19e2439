//! Criterion benchmarks for stepping model graphs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use saltus_bench::{fanout_profile, pipeline_profile};
use saltus_core::SimTime;
use saltus_engine::RootCoordinator;

fn bench_step_pipeline(c: &mut Criterion) {
    // An open window: the generator never exhausts the schedule.
    let mut root = RootCoordinator::new(pipeline_profile(8, SimTime::INFINITY)).unwrap();

    // Warm up: first step pays for initialization
    root.run_one_step().unwrap();

    c.bench_function("step_pipeline_8", |b| {
        b.iter(|| {
            let outcome = root.run_one_step().unwrap();
            black_box(&outcome);
        });
    });
}

fn bench_step_fanout(c: &mut Criterion) {
    let mut root = RootCoordinator::new(fanout_profile(64, SimTime::INFINITY)).unwrap();

    root.run_one_step().unwrap();

    c.bench_function("step_fanout_64", |b| {
        b.iter(|| {
            let outcome = root.run_one_step().unwrap();
            black_box(&outcome);
        });
    });
}

fn bench_run_window(c: &mut Criterion) {
    let window = SimTime::new(1000.0).unwrap();
    c.bench_function("run_window_1000", |b| {
        b.iter(|| {
            let mut root = RootCoordinator::new(pipeline_profile(4, window)).unwrap();
            let summary = root.run().unwrap();
            black_box(&summary);
        });
    });
}

criterion_group!(
    benches,
    bench_step_pipeline,
    bench_step_fanout,
    bench_run_window
);
criterion_main!(benches);
