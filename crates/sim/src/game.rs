use strike_shared::*;
use thiserror::Error;

use crate::arena::{can_turret_fire, projectile_location};
use crate::controller::{RocketController, TurretController};
use crate::movement::move_objects;
use crate::result::Referee;
use crate::sandbox::{RocketSandbox, Sandbox, Side, TickReport, TurretSandbox};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("{side} controller failed: {message}")]
    ControllerFault { side: Side, message: String },
    #[error("invalid game state: {0}")]
    InvalidState(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    Finished(Cause),
}

/// Owns the world and both sandboxed controllers, advancing one tick per `step`.
pub struct Game {
    world: World,
    sandbox: Sandbox,
    referee: Referee,
    tick: u32,
    last_report: Option<TickReport>,
}

impl Game {
    /// Built-in strategies on both sides.
    pub fn new(
        parameters: Parameters,
        history: History,
        rocket_settings: ControllerSettings,
        turret_settings: ControllerSettings,
    ) -> Result<Self, GameError> {
        Self::from_sandbox(
            World::new(parameters, history),
            Sandbox::with_settings(rocket_settings, turret_settings),
        )
    }

    /// Player strategies in the player slots; the settings choose which side uses them.
    pub fn with_controllers(
        parameters: Parameters,
        history: History,
        rocket: Box<dyn RocketController>,
        rocket_settings: ControllerSettings,
        turret: Box<dyn TurretController>,
        turret_settings: ControllerSettings,
    ) -> Result<Self, GameError> {
        Self::from_sandbox(
            World::new(parameters, history),
            Sandbox::new(
                RocketSandbox::new(rocket, rocket_settings),
                TurretSandbox::new(turret, turret_settings),
            ),
        )
    }

    pub fn from_config(
        config: &GameConfig,
        rocket: Box<dyn RocketController>,
        turret: Box<dyn TurretController>,
    ) -> Result<Self, GameError> {
        Self::with_controllers(
            config.parameters(),
            config.history(),
            rocket,
            config.rocket_settings(),
            turret,
            config.turret_settings(),
        )
    }

    fn from_sandbox(world: World, sandbox: Sandbox) -> Result<Self, GameError> {
        check_history(&world.history)?;
        Ok(Self {
            world,
            sandbox,
            referee: Referee::new(),
            tick: 0,
            last_report: None,
        })
    }

    /// Advance one tick.
    ///
    /// 1. Consult both controllers through the sandbox
    /// 2. End the game on any integrity failure, before anything moves
    /// 3. Move the rocket, projectiles and turret
    /// 4. Check bounds, collisions and the clock
    pub fn step(&mut self) -> Result<StepOutcome, GameError> {
        if let Some(cause) = self.referee.cause() {
            return Ok(StepOutcome::Finished(cause));
        }

        let report = self.sandbox.process_inputs(&mut self.world)?;
        let integrity = self.referee.check_controllers(&report);
        self.last_report = Some(report);
        if let Some(cause) = integrity {
            return Ok(StepOutcome::Finished(cause));
        }

        move_objects(&mut self.world);
        self.tick += 1;

        Ok(match self.referee.check_world(&self.world) {
            Some(cause) => StepOutcome::Finished(cause),
            None => StepOutcome::Running,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn cause(&self) -> Option<Cause> {
        self.referee.cause()
    }

    pub fn winner(&self) -> Option<Winner> {
        self.referee.winner()
    }

    /// Ticks integrated so far.
    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    pub fn rocket_controller(&self) -> &str {
        self.sandbox.rocket.name()
    }

    pub fn turret_controller(&self) -> &str {
        self.sandbox.turret.name()
    }

    pub fn frame(&self) -> Frame {
        let world = &self.world;
        let rocket = world.history.rocket.location();
        let projectiles = world
            .history
            .active_projectiles()
            .map(|p| {
                let location = projectile_location(world, p);
                ProjectileSnapshot {
                    x: location.x,
                    y: location.y,
                    angle: p.firing_angle,
                }
            })
            .collect();

        Frame {
            tick: self.tick,
            time: world.history.time,
            rocket_x: rocket.x,
            rocket_y: rocket.y,
            rocket_angle: world.history.rocket.angle(),
            rocket_inputs: world.history.rocket.last_inputs(),
            turret_angle: world.history.turret.angle(),
            turret_ready: can_turret_fire(world),
            projectiles,
        }
    }

    /// Upper bound on ticks: the clock check ends every game well before this.
    pub fn tick_limit(&self) -> u32 {
        let time = &self.world.parameters.time;
        (time.max_game_time / time.timestep).ceil() as u32 + 2
    }
}

fn check_history(history: &History) -> Result<(), GameError> {
    let rocket = &history.rocket;
    if rocket.locations.is_empty() || rocket.angles.is_empty() {
        return Err(GameError::InvalidState("rocket history has no starting pose".into()));
    }
    if rocket.locations.len() != rocket.angles.len() {
        return Err(GameError::InvalidState(format!(
            "rocket history has {} locations but {} angles",
            rocket.locations.len(),
            rocket.angles.len()
        )));
    }
    if history.turret.angles.is_empty() {
        return Err(GameError::InvalidState("turret history has no starting angle".into()));
    }
    Ok(())
}

/// Run a game from a configuration to completion.
pub fn run_game(
    config: &GameConfig,
    rocket: Box<dyn RocketController>,
    turret: Box<dyn TurretController>,
) -> Result<Replay, GameError> {
    let mut game = Game::from_config(config, rocket, turret)?;
    let limit = game.tick_limit();
    let mut frames = vec![game.frame()];

    let cause = loop {
        let outcome = game.step()?;

        if let StepOutcome::Finished(cause) = outcome {
            if frames.last().map(|f| f.tick) != Some(game.tick()) {
                frames.push(game.frame());
            }
            break cause;
        }

        if game.tick() % FRAME_INTERVAL == 0 {
            frames.push(game.frame());
        }

        if game.tick() >= limit {
            return Err(GameError::InvalidState(format!(
                "no result after {limit} ticks"
            )));
        }
    };

    log::debug!("game finished after {} ticks: {cause}", game.tick());

    Ok(Replay {
        rocket_controller: game.rocket_controller().to_string(),
        turret_controller: game.turret_controller().to_string(),
        parameters: game.world().parameters.clone(),
        frames,
        shot_times: game.world().history.turret.when_fired.clone(),
        result: GameResult {
            cause,
            winner: cause.winner(),
            description: cause.description().to_string(),
            final_tick: game.tick(),
            final_time: game.world().history.time,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{IdleRocket, IdleTurret};

    fn idle_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.controllers.rocket_active_controller = ActiveController::Player;
        config.controllers.turret_active_controller = ActiveController::Player;
        config
    }

    #[test]
    fn test_idle_game_runs_out_the_clock() {
        let mut config = idle_config();
        config.time.max_game_time = 2.0;
        let replay = run_game(&config, Box::new(IdleRocket), Box::new(IdleTurret)).unwrap();

        assert_eq!(replay.result.cause, Cause::GameTimeExceeded);
        assert_eq!(replay.result.winner, Winner::Draw);
        assert_eq!(replay.rocket_controller, "idle");
        assert_eq!(replay.frames.first().map(|f| f.tick), Some(0));
        assert_eq!(replay.frames.last().map(|f| f.tick), Some(replay.result.final_tick));
        assert!(replay.result.final_time > 1.9 - 1e-9);
    }

    #[test]
    fn test_default_game_finishes() {
        let replay = run_game(
            &GameConfig::default(),
            Box::new(IdleRocket),
            Box::new(IdleTurret),
        )
        .unwrap();
        assert_eq!(replay.rocket_controller, "default");
        assert!(replay.result.final_tick > 0);
        assert!(!replay.frames.is_empty());
    }

    #[test]
    fn test_step_after_finish_does_not_advance() {
        let mut config = idle_config();
        config.time.max_game_time = 0.5;
        let mut game =
            Game::from_config(&config, Box::new(IdleRocket), Box::new(IdleTurret)).unwrap();

        let cause = loop {
            if let StepOutcome::Finished(cause) = game.step().unwrap() {
                break cause;
            }
        };
        let tick = game.tick();
        let time = game.world().history.time;

        assert_eq!(game.step().unwrap(), StepOutcome::Finished(cause));
        assert_eq!(game.tick(), tick);
        assert_eq!(game.world().history.time, time);
        assert_eq!(game.cause(), Some(cause));
    }

    #[test]
    fn test_empty_history_is_rejected() {
        let config = GameConfig::default();
        let mut history = config.history();
        history.rocket.locations.clear();
        let result = Game::new(
            config.parameters(),
            history,
            config.rocket_settings(),
            config.turret_settings(),
        );
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_frame_reflects_world() {
        let config = idle_config();
        let mut game =
            Game::from_config(&config, Box::new(IdleRocket), Box::new(IdleTurret)).unwrap();
        let frame = game.frame();
        assert_eq!(frame.tick, 0);
        assert_eq!((frame.rocket_x, frame.rocket_y), (-80.0, 50.0));
        assert!(frame.rocket_inputs.is_none());
        assert!(frame.turret_ready);

        game.step().unwrap();
        let frame = game.frame();
        assert_eq!(frame.tick, 1);
        assert_eq!(frame.rocket_inputs, Some(RocketInputs::none()));
        assert!(game.last_report().is_some_and(|r| r.committed));
    }
}
