//! # HORDE Soak Test
//!
//! Runs the simulation headless at 60 Hz with a scripted player walking a
//! circle, answers every upgrade offer with the first slot, and prints
//! population and timing statistics.
//!
//! Usage: `horde_soak [config.toml] [seconds]`
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::process::ExitCode;
use std::time::Instant;

use horde_sim::{SimConfig, SimEvent, Simulation};
use tracing_subscriber::EnvFilter;

/// Config used when no path is given and it exists.
const DEFAULT_CONFIG: &str = "config/horde.toml";

const TICK_RATE: u32 = 60;
const DEFAULT_SECONDS: u32 = 300;
const WALK_RADIUS: f32 = 12.0;
const WALK_PERIOD_SECONDS: f32 = 40.0;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let seconds = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SECONDS);

    let config = match &config_path {
        Some(path) => SimConfig::load(path),
        None if std::path::Path::new(DEFAULT_CONFIG).is_file() => SimConfig::load(DEFAULT_CONFIG),
        None => Ok(SimConfig::default()),
    };
    let mut sim = match config.and_then(Simulation::new) {
        Ok(sim) => sim,
        Err(err) => {
            tracing::error!(%err, "cannot start simulation");
            return ExitCode::FAILURE;
        }
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                  HORDE - HEADLESS SOAK TEST                      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ──────────────────────────────────────────────────┐");
    println!("│ Config:             {}", config_path.as_deref().unwrap_or(DEFAULT_CONFIG));
    println!("│ Tick Rate:          {TICK_RATE} Hz");
    println!("│ Duration:           {seconds} seconds");
    println!("│ Max Enemies:        {}", sim.enemies().config().max_active);
    println!("│ Tick Budget:        {}", sim.enemies().config().tick_budget);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let dt = 1.0 / TICK_RATE as f32;
    let total_ticks = u64::from(seconds) * u64::from(TICK_RATE);
    let events = sim.events();
    let mut drained = Vec::with_capacity(1024);
    let mut upgrades_taken = 0u32;
    let mut peak_enemies = 0usize;
    let mut player_hits = 0u64;
    let start = Instant::now();

    for tick in 0..total_ticks {
        let t = tick as f32 * dt;
        if let Some(player) = sim.player_mut() {
            let angle = t / WALK_PERIOD_SECONDS * std::f32::consts::TAU;
            player.position.x = angle.cos() * WALK_RADIUS;
            player.position.z = angle.sin() * WALK_RADIUS;
        }

        sim.step(dt);

        while sim.is_paused() {
            if !sim.choose_upgrade(0) {
                break;
            }
            upgrades_taken += 1;
        }

        drained.clear();
        events.drain_into(&mut drained);
        player_hits += drained
            .iter()
            .filter(|event| matches!(event, SimEvent::PlayerDamaged { .. }))
            .count() as u64;

        peak_enemies = peak_enemies.max(sim.enemies().active_count());

        if tick % (u64::from(TICK_RATE) * 30) == 0 {
            let c = sim.counters();
            tracing::info!(
                elapsed = c.elapsed,
                enemies = c.enemies.active,
                projectiles = c.projectiles.active,
                orbs = c.orbs.active,
                level = c.level,
                "soak progress"
            );
        }
    }

    let wall = start.elapsed();
    let counters = sim.counters();

    println!();
    sim.stats().print_summary();
    println!();
    println!("┌─ POPULATION ─────────────────────────────────────────────────────┐");
    println!(
        "│ Enemies:            {} active / {} pooled / {} total (peak {})",
        counters.enemies.active,
        counters.enemies.pool_inactive,
        counters.enemies.pool_total,
        peak_enemies
    );
    println!(
        "│ Projectiles:        {} active / {} pooled / {} total",
        counters.projectiles.active,
        counters.projectiles.pool_inactive,
        counters.projectiles.pool_total
    );
    println!(
        "│ Orbs:               {} active / {} pooled / {} total",
        counters.orbs.active, counters.orbs.pool_inactive, counters.orbs.pool_total
    );
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ PROGRESSION ────────────────────────────────────────────────────┐");
    println!("│ Level:              {}", counters.level);
    println!("│ Upgrades Taken:     {upgrades_taken}");
    println!("│ Player Hits:        {player_hits}");
    println!("│ Rejected Spawns:    {}", sim.spawner().total_rejected());
    println!("│ Dropped Events:     {}", counters.events_dropped);
    println!("│ Wall Time:          {:.2} s", wall.as_secs_f64());
    println!("└──────────────────────────────────────────────────────────────────┘");

    let conserved = counters.enemies.is_conserved()
        && counters.projectiles.is_conserved()
        && counters.orbs.is_conserved();
    if conserved {
        println!("✅ Pool conservation holds");
        ExitCode::SUCCESS
    } else {
        println!("❌ Pool conservation violated");
        ExitCode::FAILURE
    }
}
