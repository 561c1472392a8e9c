//! Kartsim sandbox
//!
//! Runs a headless race on a small demo track and logs what the movement
//! core reports: laps, item pickups, spin-outs and kart-to-kart bounces.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p kartsim-sandbox -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--ticks <N>`: Number of ticks to simulate (default: 700)
//! - `--karts <N>`: Number of karts on the grid (default: 8)
//! - `--classic`: Karts block each other instead of bouncing
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod race;
mod track;

use anyhow::Context;
use kartsim_entity::{Category, MobjSpawn};
use kartsim_physics::{InteractionPolicy, PhysicsConfig, PhysicsWorld};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::race::{Driver, RaceHooks};
use crate::track::{fx, ROOM};

#[derive(Debug, Clone, Copy)]
struct SandboxArgs {
    ticks: u64,
    karts: u32,
    classic: bool,
}

impl Default for SandboxArgs {
    fn default() -> Self {
        Self {
            ticks: 700,
            karts: 8,
            classic: false,
        }
    }
}

impl SandboxArgs {
    fn from_args() -> Self {
        let mut params = Self::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--ticks" => {
                    if i + 1 < args.len() {
                        if let Ok(v) = args[i + 1].parse() {
                            params.ticks = v;
                            i += 1;
                        }
                    }
                }
                "--karts" => {
                    if i + 1 < args.len() {
                        if let Ok(v) = args[i + 1].parse() {
                            params.karts = v;
                            i += 1;
                        }
                    }
                }
                "--classic" => params.classic = true,
                _ => {}
            }
            i += 1;
        }

        params
    }
}

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    #[cfg(feature = "profiling")]
    kartsim_profiler::init();

    let args = SandboxArgs::from_args();
    info!(?args, "starting sandbox race");

    let policy = if args.classic {
        InteractionPolicy::classic()
    } else {
        InteractionPolicy::kart_racing()
    };
    let level = track::build().context("failed to build demo track")?;
    let mut world = PhysicsWorld::new(level, PhysicsConfig::default().with_policy(policy));
    populate(&mut world, args.karts)?;

    let mut hooks = RaceHooks::default();
    let mut driver = Driver::default();
    for _ in 0..args.ticks {
        driver.steer(&mut world);
        world.tick(&mut hooks);
    }

    let stats = world.stats();
    info!(
        ticks = world.gametic(),
        objects = world.len(),
        checks = stats.check_position,
        substeps = stats.substeps,
        slides = stats.slides,
        events = stats.events_dispatched,
        "simulation finished"
    );
    let race = &hooks.stats;
    let laps: u32 = race.laps.values().sum();
    info!(
        laps,
        pickups = race.pickups,
        spinouts = race.spinouts,
        bounces = race.bounces,
        boosts = race.boosts,
        "race summary"
    );

    #[cfg(feature = "profiling")]
    {
        let snapshot = kartsim_profiler::shutdown().unwrap_or_default();
        for category in &snapshot.categories {
            info!(
                "{:<16} count={:<8} avg={:.2}us max={:.2}us total={:.2}ms",
                category.category.name(),
                category.count,
                category.avg_us(),
                category.max_us(),
                category.total_ms()
            );
        }
    }

    Ok(())
}

/// Karts on a grid in the pit lane, item boxes and bananas scattered on the
/// ramp, and a few pillars.
fn populate(world: &mut PhysicsWorld, karts: u32) -> anyhow::Result<()> {
    let rows = (ROOM - 128) / 64;
    for i in 0..i32::try_from(karts)? {
        let (x, y) = (96 + (i / rows) * 64, 64 + (i % rows) * 64);
        world
            .spawn(MobjSpawn::kart(fx(x), fx(y)))
            .with_context(|| format!("kart {i} does not fit on the grid"))?;
    }

    for i in 0..12 {
        let (x, y) = (ROOM + 160 + (i % 4) * 200, 160 + (i / 4) * 300);
        world.spawn(MobjSpawn::new(Category::Pickup, fx(x), fx(y), fx(20), fx(32)))?;
        world.spawn(MobjSpawn::new(Category::Hazard, fx(x + 100), fx(y + 60), fx(12), fx(16)))?;
    }

    for y in [256, 768] {
        world.spawn(MobjSpawn::new(Category::Obstacle, fx(ROOM / 2), fx(y), fx(24), fx(128)))?;
    }

    info!(objects = world.len(), "track populated");
    Ok(())
}

fn print_help() {
    eprintln!(
        "Kartsim sandbox

Runs a headless race on the demo track.

USAGE:
    cargo run -p kartsim-sandbox -- [OPTIONS]

OPTIONS:
    --ticks <N>     Number of ticks to simulate (default: 700)
    --karts <N>     Number of karts on the grid (default: 8)
    --classic       Karts block each other instead of bouncing
    -h, --help      Print this help message

ENVIRONMENT:
    RUST_LOG        Log filter (e.g. info, kartsim_physics=debug)"
    );
}
