//! Criterion micro-benchmarks for construct and update.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use symbind_bench::{ladder_profile, ledger_givens, ledger_profile, rung};
use symbind_engine::Resolver;
use symbind_test_utils::fixtures;

/// Benchmark: forward-only construct, no unknown feeds the solver.
fn bench_construct_forward(c: &mut Criterion) {
    let resolver = Resolver::new(fixtures::sum());
    c.bench_function("construct_sum_forward", |b| {
        b.iter(|| black_box(resolver.construct([("a", 1.0), ("b", 2.0)]).unwrap()));
    });
}

/// Benchmark: inverse construct through Newton.
fn bench_construct_inverse(c: &mut Criterion) {
    let resolver = Resolver::new(fixtures::sum());
    c.bench_function("construct_sum_inverse", |b| {
        b.iter(|| black_box(resolver.construct([("a", 1.0), ("c", 3.0)]).unwrap()));
    });
}

/// Benchmark: two roots, one removed by the constraint filter.
fn bench_construct_filtered(c: &mut Criterion) {
    let resolver = Resolver::new(fixtures::square(Some("a > 0")));
    c.bench_function("construct_square_filtered", |b| {
        b.iter(|| black_box(resolver.construct([("b", 4.0)]).unwrap()));
    });
}

/// Benchmark: ladders of growing length solved from the last rung.
fn bench_ladder_from_top(c: &mut Criterion) {
    let mut group = c.benchmark_group("ladder_from_top");
    for n in [4usize, 16, 64] {
        let resolver = Resolver::new(ladder_profile(n).build().unwrap());
        let top = rung(n - 1);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(resolver.construct([(top.as_str(), n as f64)]).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark: many independent blocks, each filtered by a constraint.
fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_prices");
    for n in [1usize, 8, 32] {
        let resolver = Resolver::new(ledger_profile(n).build().unwrap());
        let givens = ledger_givens(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &givens, |b, givens| {
            b.iter(|| black_box(resolver.construct(givens.iter().cloned()).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark: mid-chain update re-deriving the root.
fn bench_update_ladder(c: &mut Criterion) {
    let resolver = Resolver::new(fixtures::ladder());
    let base = resolver.construct([("a", 1.0)]).unwrap();
    c.bench_function("update_ladder_mid_chain", |b| {
        b.iter(|| {
            let mut ladder = base.clone();
            ladder.set("c", 10.0).unwrap();
            black_box(ladder)
        });
    });
}

/// Benchmark: no-op update short-circuit.
fn bench_update_noop(c: &mut Criterion) {
    let resolver = Resolver::new(fixtures::rectangle());
    let base = resolver
        .construct([("width", 3.0), ("height", 4.0)])
        .unwrap();
    c.bench_function("update_rectangle_noop", |b| {
        b.iter(|| {
            let mut rect = base.clone();
            rect.set("width", 3.0).unwrap();
            black_box(rect)
        });
    });
}

criterion_group!(
    benches,
    bench_construct_forward,
    bench_construct_inverse,
    bench_construct_filtered,
    bench_ladder_from_top,
    bench_ledger,
    bench_update_ladder,
    bench_update_noop
);
criterion_main!(benches);
