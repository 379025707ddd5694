use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lossbench::linalg::{Inverse, StochasticMatrixRecovery};
use lossbench::optim::Adam;
use lossbench::prelude::*;

fn bench_synthetic_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthetic_eval");

    for dims in [16, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("quadratic", dims), &dims, |b, &dims| {
            let mut bench = Quadratic::new(dims, 0).unwrap();
            b.iter(|| {
                let loss = bench.evaluate().unwrap();
                let grad = bench.gradient().unwrap();
                (loss, grad)
            });
        });
        group.bench_with_input(BenchmarkId::new("rosenbrock", dims), &dims, |b, &dims| {
            let mut bench = Rosenbrock::new(dims).unwrap();
            b.iter(|| {
                let loss = bench.evaluate().unwrap();
                let grad = bench.gradient().unwrap();
                (loss, grad)
            });
        });
    }
    group.finish();
}

fn bench_linalg_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("linalg_eval");
    group.sample_size(20);

    for size in [8, 32, 64] {
        group.bench_with_input(BenchmarkId::new("inverse", size), &size, |b, &size| {
            let mut bench = Inverse::new(lossbench::data::randn(size, 0)).unwrap();
            bench.state_mut().disable_images();
            b.iter(|| {
                let loss = bench.evaluate().unwrap();
                let grad = bench.gradient().unwrap();
                (loss, grad)
            });
        });
        group.bench_with_input(BenchmarkId::new("recovery", size), &size, |b, &size| {
            let mut bench = StochasticMatrixRecovery::randn(size, 0)
                .unwrap()
                .with_batch_size(4)
                .unwrap();
            b.iter(|| {
                bench.pre_step();
                let loss = bench.evaluate().unwrap();
                let grad = bench.gradient().unwrap();
                (loss, grad)
            });
        });
    }
    group.finish();
}

fn bench_full_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_runs");
    group.sample_size(10);

    group.bench_function("adam_sphere_100", |b| {
        b.iter(|| {
            let mut bench = Sphere::randn(64, 0);
            let mut opt = Adam::new(0.1);
            run(&mut bench, &mut opt, 100).unwrap()
        });
    });
    group.bench_function("adam_colorization_50", |b| {
        b.iter(|| {
            let mut bench = Colorization::small(1, 2).unwrap();
            let mut opt = Adam::new(0.05);
            run(&mut bench, &mut opt, 50).unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_synthetic_eval, bench_linalg_eval, bench_full_runs);
criterion_main!(benches);
