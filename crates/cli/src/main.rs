mod batch;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use strike_shared::*;
use strike_sim::analyzer::analyze;
use strike_sim::{
    run_game, IdleRocket, IdleTurret, RocketController, TurretController, UnimplementedRocket,
    UnimplementedTurret,
};

#[derive(Parser)]
#[command(name = "strike", about = "Rocket vs turret duel simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single game
    Run {
        /// Game configuration JSON (built-in defaults if omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rocket controller (default, player, or idle)
        #[arg(long)]
        rocket: Option<String>,

        /// Turret controller (default, player, or idle)
        #[arg(long)]
        turret: Option<String>,

        /// Output path for replay JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Load and validate a configuration file
    Validate {
        /// Path to the configuration JSON
        #[arg(long)]
        config: PathBuf,
    },

    /// Run randomized scenarios in parallel and tally the outcomes
    Batch {
        /// Number of games
        #[arg(long)]
        games: u32,

        /// Seed of the first scenario; later games use the following seeds
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Base configuration whose layout gets randomized
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Resolve a rocket controller name to the player slot contents and the active strategy.
///
/// Supported names:
/// - "default" -> built-in controller
/// - "player" -> player slot with no strategy written, defers to the built-in
/// - "idle" -> IdleRocket
fn resolve_rocket(name: &str) -> (Box<dyn RocketController>, ActiveController) {
    match name {
        "default" => (Box::new(UnimplementedRocket), ActiveController::Default),
        "player" => (Box::new(UnimplementedRocket), ActiveController::Player),
        "idle" => (Box::new(IdleRocket), ActiveController::Player),
        other => {
            eprintln!("Unknown rocket controller '{other}'. Valid options: default, player, idle.");
            std::process::exit(1);
        }
    }
}

fn resolve_turret(name: &str) -> (Box<dyn TurretController>, ActiveController) {
    match name {
        "default" => (Box::new(UnimplementedTurret), ActiveController::Default),
        "player" => (Box::new(UnimplementedTurret), ActiveController::Player),
        "idle" => (Box::new(IdleTurret), ActiveController::Player),
        other => {
            eprintln!("Unknown turret controller '{other}'. Valid options: default, player, idle.");
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> GameConfig {
    let Some(path) = path else {
        return GameConfig::default();
    };
    match GameConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            rocket,
            turret,
            output,
        } => cmd_run(config.as_deref(), rocket.as_deref(), turret.as_deref(), output),

        Commands::Validate { config } => cmd_validate(&config),

        Commands::Batch {
            games,
            seed,
            config,
        } => batch::cmd_batch(&load_config(config.as_deref()), games, seed),
    }
}

fn cmd_run(
    config_path: Option<&Path>,
    rocket_name: Option<&str>,
    turret_name: Option<&str>,
    output: Option<PathBuf>,
) {
    let mut config = load_config(config_path);

    let rocket: Box<dyn RocketController> = match rocket_name {
        Some(name) => {
            let (rocket, active) = resolve_rocket(name);
            config.controllers.rocket_active_controller = active;
            rocket
        }
        None => Box::new(UnimplementedRocket),
    };
    let turret: Box<dyn TurretController> = match turret_name {
        Some(name) => {
            let (turret, active) = resolve_turret(name);
            config.controllers.turret_active_controller = active;
            turret
        }
        None => Box::new(UnimplementedTurret),
    };

    let replay = match run_game(&config, rocket, turret) {
        Ok(replay) => replay,
        Err(e) => {
            eprintln!("Game aborted: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Game: {} rocket vs {} turret",
        replay.rocket_controller, replay.turret_controller
    );

    let result = &replay.result;
    let metrics = analyze(&replay);

    println!();
    println!("=== Game Result ===");
    println!("Winner:     {:?}", result.winner);
    println!("Cause:      {}", result.cause);
    println!("Final tick: {} ({:.1}s)", result.final_tick, result.final_time);
    println!();
    println!("--- Metrics ---");
    println!("  Shots fired:          {}", metrics.shots_fired);
    if let Some(t) = metrics.time_to_first_shot {
        println!("  First shot at:        {:.1}s", t);
    }
    println!("  Closest to turret:    {:.2}m", metrics.closest_approach_to_turret);
    if let Some(miss) = metrics.closest_projectile_miss {
        println!("  Closest projectile:   {:.2}m", miss);
    }
    println!("  Distance travelled:   {:.1}m", metrics.rocket_distance_travelled);

    if let Some(path) = output {
        match serde_json::to_string_pretty(&replay) {
            Ok(json) => match std::fs::write(&path, json) {
                Ok(()) => println!("\nReplay written to {}", path.display()),
                Err(e) => eprintln!("\nFailed to write replay: {}", e),
            },
            Err(e) => eprintln!("\nFailed to serialize replay: {}", e),
        }
    }
}

fn cmd_validate(path: &Path) {
    match GameConfig::load(path) {
        Ok(config) => {
            let obstacles = config.environment.obstacles.as_ref().map_or(0, Vec::len);
            println!("{} is valid", path.display());
            println!(
                "  Arena {}x{}m, {} obstacle(s), {:.1}s at {}s per tick",
                config.environment.width,
                config.environment.height,
                obstacles,
                config.time.max_game_time,
                config.time.timestep,
            );
        }
        Err(e) => {
            eprintln!("{} is invalid: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
