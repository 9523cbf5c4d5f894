//! # Pool + Grid Churn Test
//!
//! Pool-backed bodies wander, spawn and despawn while a grid tracks them.
//! After every round, grid queries must agree with a brute-force scan over
//! the live bodies and the pool counters must add up.
//!
//! Run with: cargo test -p horde_core --test grid_pool_churn

use horde_core::{PoolHandle, ReusePool, SpatialIndex2D, Vec2};

#[derive(Default)]
struct Body {
    position: Vec2,
    cell: (i32, i32),
    live: bool,
}

/// Deterministic xorshift so the test needs no RNG crate.
struct Xorshift(u32);

impl Xorshift {
    fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }

    fn unit(&mut self) -> f32 {
        (self.next() % 10_000) as f32 / 10_000.0
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.unit() * (hi - lo)
    }
}

#[test]
fn grid_tracks_pool_through_churn() {
    let mut rng = Xorshift(0x1234_5678);
    let mut pool = ReusePool::new(64, Body::default)
        .with_on_acquire(|b| b.live = true)
        .with_on_release(|b| b.live = false);
    pool.prewarm(64);

    let mut grid = SpatialIndex2D::new(2.2);
    let mut live: Vec<PoolHandle> = Vec::new();
    let mut out = vec![PoolHandle::NULL; 512];

    for round in 0..400 {
        // Spawn a few.
        for _ in 0..(rng.next() % 4) {
            let handle = pool.acquire();
            let position = Vec2::new(rng.range(-20.0, 20.0), rng.range(-20.0, 20.0));
            let cell = grid.cell_of(position);
            pool[handle].position = position;
            pool[handle].cell = cell;
            grid.add(handle, cell.0, cell.1);
            live.push(handle);
        }

        // Despawn one.
        if round % 3 == 0 && !live.is_empty() {
            let victim = live.swap_remove(rng.next() as usize % live.len());
            let (x, y) = pool[victim].cell;
            assert!(grid.remove(victim, x, y));
            pool.release(victim);
        }

        // Everyone wanders.
        for &handle in &live {
            let body = &mut pool[handle];
            body.position = body.position + Vec2::new(rng.range(-1.0, 1.0), rng.range(-1.0, 1.0));
            let cell = grid.cell_of(body.position);
            grid.move_item(handle, body.cell.0, body.cell.1, cell.0, cell.1);
            body.cell = cell;
        }

        assert_eq!(grid.len(), live.len());
        assert_eq!(pool.active_count(), live.len());
        assert_eq!(pool.total_count(), pool.active_count() + pool.inactive_count());
        assert!(live.iter().all(|h| pool[*h].live));

        let center = Vec2::new(rng.range(-10.0, 10.0), rng.range(-10.0, 10.0));
        let radius = rng.range(0.5, 6.0);
        let n = grid.query(center, radius, &mut out, |h| pool[*h].position);
        let mut found: Vec<usize> = out[..n].iter().map(|h| h.index()).collect();
        found.sort_unstable();

        let mut expected: Vec<usize> = live
            .iter()
            .filter(|h| pool[**h].position.distance_squared(center) <= radius * radius)
            .map(|h| h.index())
            .collect();
        expected.sort_unstable();
        assert_eq!(found, expected, "round {round}");
    }
}

#[test]
fn grid_query_matches_brute_force_on_a_lattice() {
    let mut grid = SpatialIndex2D::new(1.5);
    let mut points = Vec::new();
    for i in 0..40 {
        for j in 0..40 {
            let p = Vec2::new(i as f32 * 0.37 - 7.0, j as f32 * 0.41 - 8.0);
            let (x, y) = grid.cell_of(p);
            grid.add(points.len(), x, y);
            points.push(p);
        }
    }

    let mut out = vec![0usize; points.len()];
    for (center, radius) in [
        (Vec2::new(0.0, 0.0), 2.0),
        (Vec2::new(-3.3, 4.1), 0.74),
        (Vec2::new(5.0, -5.0), 3.5),
    ] {
        let n = grid.query(center, radius, &mut out, |i| points[*i]);
        let mut found: Vec<usize> = out[..n].to_vec();
        found.sort_unstable();

        let expected: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].distance_squared(center) <= radius * radius)
            .collect();
        assert_eq!(found, expected);
    }
}
