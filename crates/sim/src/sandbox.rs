use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use strike_shared::*;

use crate::arena::can_turret_fire;
use crate::controller::{
    ControllerError, RocketController, TurretController, UnimplementedRocket, UnimplementedTurret,
};
use crate::controllers::{DefaultRocket, DefaultTurret};
use crate::game::GameError;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Rocket,
    Turret,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Rocket => write!(f, "rocket"),
            Side::Turret => write!(f, "turret"),
        }
    }
}

/// What happened when one side's controller was consulted this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideReport {
    /// Returned error or panic message.
    pub fault: Option<String>,
    /// `None` when the controller was not called.
    pub execution_time: Option<Duration>,
    /// Over the per-tick budget (only when the check is enabled).
    pub time_exceeded: bool,
    pub tampered: bool,
    /// `None` when validation was skipped.
    pub inputs_valid: Option<bool>,
}

impl SideReport {
    pub fn was_invoked(&self) -> bool {
        self.execution_time.is_some()
    }

    /// Error, tampering or overrun: the call itself cannot be trusted.
    pub fn integrity_failed(&self) -> bool {
        self.fault.is_some() || self.tampered || self.time_exceeded
    }

    pub fn is_clean(&self) -> bool {
        !self.integrity_failed() && self.inputs_valid == Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub rocket: SideReport,
    pub turret: SideReport,
    pub committed: bool,
}

// ---------------------------------------------------------------------------
// Supervised call
// ---------------------------------------------------------------------------

struct Supervised<T> {
    report: SideReport,
    outcome: Option<Result<T, ControllerError>>,
}

/// Run one controller call with fault isolation.
///
/// 1. Call under `catch_unwind`, timing it with a wall clock
/// 2. Compare the world with the pre-call snapshot; roll back any change
/// 3. Flag a call that ran longer than one timestep
///
/// The call cannot be preempted; an overrun is only detected once it returns.
fn supervise<T>(
    side: Side,
    world: &mut World,
    snapshot: &World,
    settings: &ControllerSettings,
    call: impl FnOnce(&mut World) -> Result<T, ControllerError>,
) -> Supervised<T> {
    let start = Instant::now();
    let result = catch_unwind(AssertUnwindSafe(|| call(world)));
    let elapsed = start.elapsed();

    let mut report = SideReport {
        execution_time: Some(elapsed),
        ..SideReport::default()
    };

    let outcome = match result {
        Ok(Ok(inputs)) => Some(Ok(inputs)),
        Ok(Err(ControllerError::Malformed(message))) => {
            log::warn!("{side} controller returned malformed inputs: {message}");
            Some(Err(ControllerError::Malformed(message)))
        }
        Ok(Err(ControllerError::Failed(message))) => {
            log::warn!("{side} controller error: {message}");
            report.fault = Some(message);
            None
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("{side} controller panicked: {message}");
            report.fault = Some(message);
            None
        }
    };

    if *world != *snapshot {
        report.tampered = true;
        log::warn!("{side} controller modified the game state");
        if world.parameters != snapshot.parameters {
            log::debug!("parameters before: {:?}", snapshot.parameters);
            log::debug!("parameters after: {:?}", world.parameters);
        }
        if world.history != snapshot.history {
            log::debug!("history before: {:?}", snapshot.history);
            log::debug!("history after: {:?}", world.history);
        }
        *world = snapshot.clone();
    }

    if settings.check_execution_time && elapsed.as_secs_f64() > world.parameters.time.timestep {
        report.time_exceeded = true;
        log::warn!("{side} controller took {:.3}s", elapsed.as_secs_f64());
    }

    Supervised { report, outcome }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "controller panicked".to_string()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn are_rocket_inputs_valid(inputs: &RocketInputs, parameters: &Parameters) -> bool {
    Engine::ALL.iter().all(|&engine| {
        let force = inputs.force(engine);
        force.is_finite() && float_in_range(force, 0.0, parameters.rocket.max_force(engine))
    })
}

pub fn are_turret_inputs_valid(inputs: &TurretInputs, world: &World) -> bool {
    let max = world.parameters.turret.max_rotation_speed;
    inputs.rotation_velocity.is_finite()
        && float_in_range(inputs.rotation_velocity, -max, max)
        && (!inputs.fire || can_turret_fire(world))
}

// ---------------------------------------------------------------------------
// Per-side meta-controllers
// ---------------------------------------------------------------------------

/// The rocket's default and player strategies, with the one selected by
/// `settings.active` consulted each tick.
pub struct RocketSandbox {
    default: Box<dyn RocketController>,
    player: Box<dyn RocketController>,
    settings: ControllerSettings,
}

impl RocketSandbox {
    pub fn new(player: Box<dyn RocketController>, settings: ControllerSettings) -> Self {
        Self::with_default(Box::new(DefaultRocket::new()), player, settings)
    }

    pub fn with_default(
        default: Box<dyn RocketController>,
        player: Box<dyn RocketController>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            default,
            player,
            settings,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn name(&self) -> &str {
        match self.settings.active {
            ActiveController::Default => self.default.name(),
            ActiveController::Player => self.player.name(),
        }
    }

    fn process(
        &mut self,
        world: &mut World,
        snapshot: &World,
    ) -> (SideReport, Option<RocketInputs>) {
        let Self {
            default,
            player,
            settings,
        } = self;

        let supervised = supervise(Side::Rocket, world, snapshot, settings, |world| {
            let inputs = match settings.active {
                ActiveController::Player => player.calc_inputs(world)?,
                ActiveController::Default => None,
            };
            match inputs {
                Some(inputs) => Ok(inputs),
                None => Ok(default.calc_inputs(world)?.unwrap_or_default()),
            }
        });

        let mut report = supervised.report;
        if report.integrity_failed() {
            return (report, None);
        }

        match supervised.outcome {
            Some(Ok(inputs)) => {
                let valid = are_rocket_inputs_valid(&inputs, &world.parameters);
                if !valid {
                    log::warn!("rocket inputs out of range: {inputs:?}");
                }
                report.inputs_valid = Some(valid);
                (report, valid.then_some(inputs))
            }
            _ => {
                report.inputs_valid = Some(false);
                (report, None)
            }
        }
    }
}

pub struct TurretSandbox {
    default: Box<dyn TurretController>,
    player: Box<dyn TurretController>,
    settings: ControllerSettings,
}

impl TurretSandbox {
    pub fn new(player: Box<dyn TurretController>, settings: ControllerSettings) -> Self {
        Self::with_default(Box::new(DefaultTurret), player, settings)
    }

    pub fn with_default(
        default: Box<dyn TurretController>,
        player: Box<dyn TurretController>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            default,
            player,
            settings,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn name(&self) -> &str {
        match self.settings.active {
            ActiveController::Default => self.default.name(),
            ActiveController::Player => self.player.name(),
        }
    }

    fn process(
        &mut self,
        world: &mut World,
        snapshot: &World,
    ) -> (SideReport, Option<TurretInputs>) {
        let Self {
            default,
            player,
            settings,
        } = self;

        let supervised = supervise(Side::Turret, world, snapshot, settings, |world| {
            let inputs = match settings.active {
                ActiveController::Player => player.calc_inputs(world)?,
                ActiveController::Default => None,
            };
            match inputs {
                Some(inputs) => Ok(inputs),
                None => Ok(default.calc_inputs(world)?.unwrap_or_default()),
            }
        });

        let mut report = supervised.report;
        if report.integrity_failed() {
            return (report, None);
        }

        match supervised.outcome {
            Some(Ok(inputs)) => {
                let valid = are_turret_inputs_valid(&inputs, world);
                if !valid {
                    log::warn!("turret inputs invalid: {inputs:?}");
                }
                report.inputs_valid = Some(valid);
                (report, valid.then_some(inputs))
            }
            _ => {
                report.inputs_valid = Some(false);
                (report, None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Both sides
// ---------------------------------------------------------------------------

/// Consults both sides and commits their inputs together or not at all.
pub struct Sandbox {
    pub rocket: RocketSandbox,
    pub turret: TurretSandbox,
}

impl Sandbox {
    pub fn new(rocket: RocketSandbox, turret: TurretSandbox) -> Self {
        Self { rocket, turret }
    }

    /// Built-in strategies on both sides, with placeholder player slots.
    pub fn with_settings(rocket: ControllerSettings, turret: ControllerSettings) -> Self {
        Self::new(
            RocketSandbox::new(Box::new(UnimplementedRocket), rocket),
            TurretSandbox::new(Box::new(UnimplementedTurret), turret),
        )
    }

    /// One tick of the controller protocol.
    ///
    /// The rocket is consulted first; if its call cannot be trusted the
    /// turret is not called at all. Inputs reach the history only when both
    /// sides come back clean.
    pub fn process_inputs(&mut self, world: &mut World) -> Result<TickReport, GameError> {
        let snapshot = world.clone();

        let (rocket, rocket_inputs) = self.rocket.process(world, &snapshot);
        raise_if_requested(Side::Rocket, &rocket, self.rocket.settings())?;

        let (turret, turret_inputs) = if rocket.integrity_failed() {
            (SideReport::default(), None)
        } else {
            let (turret, inputs) = self.turret.process(world, &snapshot);
            raise_if_requested(Side::Turret, &turret, self.turret.settings())?;
            (turret, inputs)
        };

        let committed = match (rocket_inputs, turret_inputs) {
            (Some(r), Some(t)) => {
                commit(world, &r, &t);
                true
            }
            _ => false,
        };

        Ok(TickReport {
            rocket,
            turret,
            committed,
        })
    }
}

fn raise_if_requested(
    side: Side,
    report: &SideReport,
    settings: &ControllerSettings,
) -> Result<(), GameError> {
    match &report.fault {
        Some(message) if settings.raise_errors => Err(GameError::ControllerFault {
            side,
            message: message.clone(),
        }),
        _ => Ok(()),
    }
}

fn commit(world: &mut World, rocket: &RocketInputs, turret: &TurretInputs) {
    let history = &mut world.history;
    history.rocket.push_inputs(rocket);
    history.turret.rotation_velocities.push(turret.rotation_velocity);
    if turret.fire {
        history.turret.when_fired.push(history.time);
    }
}
