//! # Headless Walk
//!
//! Scripted session with no window: walks the player in a straight line
//! across chunk boundaries, jumps when blocked, mines and places on a fixed
//! cadence, and prints tick statistics.
//!
//! ```text
//! cargo run -p strata --bin headless_walk -- --seed canyon --ticks 2000
//! RUST_LOG=strata=debug cargo run -p strata --bin headless_walk
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use strata::{
    ActionOutcome, EngineConfig, EngineResult, FrameInput, GameLoop, PlayerAction, StepOutcome,
    Vec3,
};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI arguments for the headless driver.
#[derive(Parser, Debug)]
#[command(name = "headless_walk", about = "Scripted headless STRATA session")]
struct Args {
    /// World seed; overrides the config file.
    #[arg(long)]
    seed: Option<String>,

    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticks to simulate.
    #[arg(long, default_value_t = 1200)]
    ticks: u64,

    /// Simulated frame time in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Walk direction, x component.
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    walk_x: f32,

    /// Walk direction, z component.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    walk_z: f32,

    /// Ticks between mine/place attempts; 0 disables editing.
    #[arg(long, default_value_t = 90)]
    edit_every: u64,

    /// Grass blocks to start with; overrides the config file. Without a
    /// config file the session starts with 16.
    #[arg(long)]
    starting_grass: Option<u32>,
}

/// Grass handed out when neither a config file nor a flag says otherwise.
const SESSION_STARTING_GRASS: u32 = 16;

#[derive(Debug, Default)]
struct Session {
    regenerations: u64,
    jumps: u64,
    mined: u64,
    placed: u64,
    missed: u64,
    rejected: u64,
    no_support: u64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn load_config(args: &Args) -> EngineResult<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => {
            let mut config = EngineConfig::default();
            config.player.starting_blocks.grass = SESSION_STARTING_GRASS;
            config
        }
    };
    if let Some(seed) = &args.seed {
        config.world.seed.clone_from(seed);
    }
    if let Some(grass) = args.starting_grass {
        config.player.starting_blocks.grass = grass;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> EngineResult<Session> {
    let config = load_config(args)?;
    let mut game = GameLoop::new(config)?;
    let mut session = Session::default();

    let walk = Vec3::new(args.walk_x, 0.0, args.walk_z)
        .normalized()
        .unwrap_or(Vec3::ZERO);
    // Down and slightly ahead, so edits land near the feet.
    let look = Vec3::new(walk.x * 0.3, -1.0, walk.z * 0.3);
    let frame = Duration::from_millis(args.frame_ms);

    let mut now = game.clock().last();
    let mut blocked = false;

    for tick in 0..args.ticks {
        now += frame;

        let mut actions = Vec::new();
        if blocked {
            actions.push(PlayerAction::Jump);
        }
        if args.edit_every > 0 && tick % args.edit_every == 0 && tick > 0 {
            actions.push(PlayerAction::Mine);
        }
        if args.edit_every > 0 && tick % args.edit_every == args.edit_every / 2 {
            actions.push(PlayerAction::Place);
        }

        let before = game.player().head;
        let report = game.tick(
            &FrameInput {
                camera: None,
                walk,
                look,
                actions,
            },
            now,
        );
        let after = game.player().head;

        let moved = (after.x - before.x).abs() + (after.z - before.z).abs();
        blocked = report.outcome == StepOutcome::Grounded && !walk.is_zero() && moved == 0.0;

        if report.regenerated {
            session.regenerations += 1;
            info!(
                tick,
                x = after.x,
                z = after.z,
                cubes = report.cube_count,
                regeneration_ms = report.regeneration_us as f64 / 1000.0,
                "world regenerated"
            );
        }
        if report.outcome == StepOutcome::NoSupport {
            session.no_support += 1;
        }

        for outcome in &report.actions {
            match outcome {
                ActionOutcome::Jumped => session.jumps += 1,
                ActionOutcome::Mined { .. } => session.mined += 1,
                ActionOutcome::Placed { .. } => session.placed += 1,
                ActionOutcome::Missed => session.missed += 1,
                ActionOutcome::Rejected(_) => session.rejected += 1,
                ActionOutcome::SlotSelected(_) => {}
            }
        }
    }

    let head = game.player().head;
    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                      HEADLESS WALK SUMMARY                       ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!("  Seed:            {}", game.config().world.seed);
    println!("  Final position:  ({:.2}, {:.2}, {:.2})", head.x, head.y, head.z);
    println!("  Final chunk:     ({}, {})", game.player().chunk.x, game.player().chunk.z);
    println!("  Regenerations:   {}", session.regenerations);
    println!("  Jumps:           {}", session.jumps);
    println!("  Mined / placed:  {} / {}", session.mined, session.placed);
    println!("  Missed / refused:{} / {}", session.missed, session.rejected);
    println!("  Ledger entries:  {}", game.ledger().read().len());
    println!("  Voxels rendered: {}", game.world().cube_count());
    println!();
    game.stats().print_summary();

    Ok(session)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match run(&args) {
        Ok(session) => {
            if session.no_support > 0 {
                tracing::warn!(ticks = session.no_support, "player lost support during the walk");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "headless walk failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("headless_walk").chain(extra.iter().copied()))
    }

    #[test]
    fn test_session_default_hands_out_grass() {
        let config = load_config(&args(&[])).expect("defaults are valid");
        assert_eq!(config.player.starting_blocks.grass, SESSION_STARTING_GRASS);
    }

    #[test]
    fn test_configured_empty_inventory_is_kept() {
        let path = std::env::temp_dir().join(format!("strata-empty-{}.toml", std::process::id()));
        std::fs::write(&path, "[player]\nstarting_blocks = { grass = 0 }\n").expect("write config");

        let config = load_config(&args(&["--config", path.to_str().expect("utf-8 path")]));
        std::fs::remove_file(&path).ok();

        let config = config.expect("valid config");
        assert_eq!(config.player.starting_blocks.total(), 0, "Explicit zeroes survive");
    }

    #[test]
    fn test_flag_overrides_grass() {
        let config = load_config(&args(&["--starting-grass", "3", "--seed", "flag"])).expect("valid");
        assert_eq!(config.player.starting_blocks.grass, 3);
        assert_eq!(config.world.seed, "flag");
    }
}
