//! # Spatial Grid Benchmark
//!
//! REQUIREMENTS:
//! - Query cost tracks cells touched, not population
//! - Zero allocations during steady-state move churn
//!
//! Run with: `cargo bench --package horde_core --bench spatial_benchmark`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use horde_core::{SpatialIndex2D, Vec2};

/// Deterministic scatter over a square arena.
fn scatter(count: usize, arena: f32) -> Vec<Vec2> {
    let mut state = 0x2545_F491_u32;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state as f32 / u32::MAX as f32) * arena - arena * 0.5
    };
    (0..count).map(|_| Vec2::new(next(), next())).collect()
}

fn build(points: &[Vec2], cell: f32) -> SpatialIndex2D<usize> {
    let mut grid = SpatialIndex2D::new(cell);
    for (i, p) in points.iter().enumerate() {
        let (x, y) = grid.cell_of(*p);
        grid.add(i, x, y);
    }
    grid
}

/// Query cost should stay flat as the population grows at constant density.
fn bench_query_by_population(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_query_radius_0_5");

    for count in [100usize, 500, 5_000] {
        let arena = (count as f32).sqrt() * 4.0;
        let points = scatter(count, arena);
        let grid = build(&points, 2.2);
        let mut out = [0usize; 64];

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                black_box(grid.query(black_box(Vec2::ZERO), 0.5, &mut out, |i| points[*i]))
            });
        });
    }

    group.finish();
}

/// Every item hops one cell and back: the churn pattern of a ticking horde.
fn bench_move_churn(c: &mut Criterion) {
    let points = scatter(500, 90.0);
    let mut grid = build(&points, 2.2);
    let cells: Vec<(i32, i32)> = points.iter().map(|p| grid.cell_of(*p)).collect();

    c.bench_function("grid_move_churn_500", |b| {
        b.iter(|| {
            for (i, (x, y)) in cells.iter().enumerate() {
                grid.move_item(i, *x, *y, *x + 1, *y);
                grid.move_item(i, *x + 1, *y, *x, *y);
            }
            black_box(grid.len())
        });
    });
}

criterion_group!(benches, bench_query_by_population, bench_move_churn);
criterion_main!(benches);
