//! # Reuse Pool Benchmark
//!
//! Acquire/release cycles against a prewarmed pool must not construct.
//!
//! Run with: `cargo bench --package horde_core --bench pool_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use horde_core::ReusePool;

#[derive(Default)]
struct Payload {
    hp: f32,
    visible: bool,
}

fn bench_acquire_release(c: &mut Criterion) {
    let mut pool = ReusePool::new(600, Payload::default)
        .with_on_acquire(|p| p.visible = true)
        .with_on_release(|p| p.visible = false);
    pool.prewarm(600);
    let mut held = Vec::with_capacity(600);

    c.bench_function("pool_cycle_600", |b| {
        b.iter(|| {
            for _ in 0..600 {
                let h = pool.acquire();
                pool[h].hp = 25.0;
                held.push(h);
            }
            for h in held.drain(..) {
                pool.release(h);
            }
            black_box(pool.total_count())
        });
    });
}

criterion_group!(benches, bench_acquire_release);
criterion_main!(benches);
