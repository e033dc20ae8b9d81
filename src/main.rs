use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use signal_sim::render::{sync, ConsoleRenderer, Renderer};
use signal_sim::simulation::{PhasePlan, SignalConfig, SimConfig, SimWorld, StrategyKind};
use signal_sim::spawner::SpawnScheduler;

#[derive(Parser)]
#[command(name = "signal_sim")]
#[command(about = "Adaptive traffic signal simulation for a single intersection")]
struct Cli {
    /// Simulated seconds to run
    #[arg(long, default_value = "120")]
    seconds: u32,

    /// Motion ticks per simulated second
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Signal control strategy: fixed or adaptive
    #[arg(long, default_value = "adaptive")]
    strategy: String,

    #[arg(long, default_value = "30")]
    primary_green: u32,

    #[arg(long, default_value = "5")]
    branch_green: u32,

    /// Minimum primary green before demand can end it
    #[arg(long, default_value = "15")]
    min_hold: u32,

    /// Hard ceiling on primary green
    #[arg(long, default_value = "120")]
    emergency: u32,

    /// Hard ceiling on a minor branch green
    #[arg(long, default_value = "20")]
    branch_ceiling: u32,

    /// Departures after which a branch green stops being extended
    #[arg(long, default_value = "5")]
    max_per_phase: u32,

    #[arg(long, default_value = "1")]
    yellow: u32,

    /// Serve both minor branches in one shared green
    #[arg(long)]
    shared_branch: bool,

    /// Frames between primary road spawns (0 disables)
    #[arg(long, default_value = "150")]
    primary_every: u64,

    /// Frames between minor road spawns (0 disables)
    #[arg(long, default_value = "240")]
    secondary_every: u64,

    /// Draw the ASCII map once per simulated second
    #[arg(long)]
    map: bool,
}

impl Cli {
    fn config(&self) -> Result<SimConfig> {
        let strategy: StrategyKind = self.strategy.parse()?;
        let signal = SignalConfig {
            primary_green: self.primary_green,
            branch_green: self.branch_green,
            min_hold: self.min_hold,
            emergency_ceiling: self.emergency,
            branch_ceiling: self.branch_ceiling,
            max_vehicles_per_phase: self.max_per_phase,
            yellow: self.yellow,
            plan: if self.shared_branch {
                PhasePlan::SharedBranch
            } else {
                PhasePlan::SplitBranches
            },
            ..SignalConfig::default()
        };

        Ok(SimConfig {
            signal,
            frames_per_signal_tick: self.fps,
            strategy,
            ..SimConfig::default()
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,signal_sim=info"))
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    let (mut world, mut scheduler) = match cli.seed {
        Some(seed) => (
            SimWorld::new_with_seed(config, seed)?,
            SpawnScheduler::with_seed(cli.primary_every, cli.secondary_every, seed),
        ),
        None => (
            SimWorld::new(config)?,
            SpawnScheduler::new(cli.primary_every, cli.secondary_every),
        ),
    };

    run_headless(&mut world, &mut scheduler, &cli).context("Simulation run failed")
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(world: &mut SimWorld, scheduler: &mut SpawnScheduler, cli: &Cli) -> Result<()> {
    info!(
        "Running intersection simulation: {}s at {} fps, {:?} strategy",
        cli.seconds,
        cli.fps,
        world.strategy()
    );

    let mut renderer = ConsoleRenderer::new(world.layout.clone());
    let total_frames = u64::from(cli.seconds) * u64::from(cli.fps);

    world.start();
    for _ in 0..total_frames {
        for request in scheduler.poll(world.frame()) {
            if let Err(e) = world.spawn(request) {
                debug!("Spawn request dropped: {:#}", e);
            }
        }

        world.tick();

        let events = world.drain_events();
        sync(&mut renderer, &events, &world.snapshot());

        if cli.map && world.frame() % u64::from(cli.fps) == 0 {
            renderer.draw_map();
        }
    }

    let snapshot = world.snapshot();
    renderer.print_summary(&snapshot, &world.stats);

    let stats = world.stats;
    let success_rate = if stats.spawned > 0 {
        stats.completed as f64 / stats.spawned as f64 * 100.0
    } else {
        0.0
    };
    info!("=== SIMULATION COMPLETE ===");
    info!("Total cars spawned: {}", stats.spawned);
    info!("Total cars completed: {}", stats.completed);
    info!("Active cars: {}", snapshot.cars.len());
    info!("Phase changes: {}", stats.phase_changes);
    info!("Deadlocks resolved: {}", stats.deadlocks_resolved);
    info!("Success rate: {:.1}%", success_rate);

    world.stop();
    renderer.clear();
    Ok(())
}
