use serde::{Deserialize, Serialize};

use crate::vector::Coordinate;

// ---------------------------------------------------------------------------
// Parameters (fixed for the whole game)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub location: Coordinate,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentParameters {
    pub width: f64,
    pub height: f64,
    pub obstacles: Vec<Obstacle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeParameters {
    pub timestep: f64,
    pub max_game_time: f64,
}

/// The rocket is a zero-width beam with one main engine at the tail and four
/// thrusters mounted perpendicular to the axis at the nose and tail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocketParameters {
    pub mass: f64,
    pub length: f64,
    pub max_main_engine_force: f64,
    pub max_thruster_force: f64,
}

impl RocketParameters {
    /// Effective collision radius.
    pub fn target_radius(&self) -> f64 {
        self.length / 2.0
    }

    /// Moment of inertia of a uniform beam about its centre.
    pub fn moment_of_inertia(&self) -> f64 {
        self.mass * self.length * self.length / 12.0
    }

    /// All thrusters sit at the very nose or tail.
    pub fn thruster_moment_arm(&self) -> f64 {
        self.length / 2.0
    }

    pub fn max_force(&self, engine: Engine) -> f64 {
        match engine {
            Engine::Main => self.max_main_engine_force,
            _ => self.max_thruster_force,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurretParameters {
    pub radius: f64,
    pub location: Coordinate,
    pub max_rotation_speed: f64,
    pub projectile_speed: f64,
    pub min_firing_interval: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub environment: EnvironmentParameters,
    pub time: TimeParameters,
    pub rocket: RocketParameters,
    pub turret: TurretParameters,
}

impl Parameters {
    pub fn new(
        environment: EnvironmentParameters,
        time: TimeParameters,
        rocket: RocketParameters,
        turret: TurretParameters,
    ) -> Self {
        Self {
            environment,
            time,
            rocket,
            turret,
        }
    }
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    Main,
    LeftFront,
    LeftRear,
    RightFront,
    RightRear,
}

impl Engine {
    pub const ALL: [Engine; 5] = [
        Engine::Main,
        Engine::LeftFront,
        Engine::LeftRear,
        Engine::RightFront,
        Engine::RightRear,
    ];

    pub const THRUSTERS: [Engine; 4] = [
        Engine::LeftFront,
        Engine::LeftRear,
        Engine::RightFront,
        Engine::RightRear,
    ];

    /// Sign of the lateral force relative to the rocket axis: left thrusters
    /// push the rocket toward its right (+1), right thrusters toward its left (-1).
    pub fn lateral_direction(&self) -> f64 {
        match self {
            Engine::Main => 0.0,
            Engine::LeftFront | Engine::LeftRear => 1.0,
            Engine::RightFront | Engine::RightRear => -1.0,
        }
    }

    /// Sign of the moment about the centre of mass (+1 anticlockwise).
    pub fn rotation_direction(&self) -> f64 {
        match self {
            Engine::Main => 0.0,
            Engine::LeftFront | Engine::RightRear => -1.0,
            Engine::RightFront | Engine::LeftRear => 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller inputs
// ---------------------------------------------------------------------------

/// Engine forces in Newtons, in `Engine::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RocketInputs {
    pub main: f64,
    pub left_front: f64,
    pub left_rear: f64,
    pub right_front: f64,
    pub right_rear: f64,
}

impl RocketInputs {
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from raw controller output; `None` unless exactly five values.
    pub fn from_slice(raw: &[f64]) -> Option<Self> {
        match *raw {
            [main, left_front, left_rear, right_front, right_rear] => Some(Self {
                main,
                left_front,
                left_rear,
                right_front,
                right_rear,
            }),
            _ => None,
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [
            self.main,
            self.left_front,
            self.left_rear,
            self.right_front,
            self.right_rear,
        ]
    }

    pub fn force(&self, engine: Engine) -> f64 {
        match engine {
            Engine::Main => self.main,
            Engine::LeftFront => self.left_front,
            Engine::LeftRear => self.left_rear,
            Engine::RightFront => self.right_front,
            Engine::RightRear => self.right_rear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TurretInputs {
    /// Radians per second, positive anticlockwise.
    pub rotation_velocity: f64,
    pub fire: bool,
}

impl TurretInputs {
    pub fn none() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// History (the only mutable world state)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketHistory {
    pub locations: Vec<Coordinate>,
    pub angles: Vec<f64>,
    pub main_engine_forces: Vec<f64>,
    pub left_front_thruster_forces: Vec<f64>,
    pub left_rear_thruster_forces: Vec<f64>,
    pub right_front_thruster_forces: Vec<f64>,
    pub right_rear_thruster_forces: Vec<f64>,
}

impl RocketHistory {
    pub fn new(location: Coordinate, angle: f64) -> Self {
        Self {
            locations: vec![location],
            angles: vec![angle],
            main_engine_forces: Vec::new(),
            left_front_thruster_forces: Vec::new(),
            left_rear_thruster_forces: Vec::new(),
            right_front_thruster_forces: Vec::new(),
            right_rear_thruster_forces: Vec::new(),
        }
    }

    pub fn location(&self) -> Coordinate {
        self.locations.last().copied().unwrap_or(Coordinate::ZERO)
    }

    pub fn angle(&self) -> f64 {
        self.angles.last().copied().unwrap_or(0.0)
    }

    fn forces(&self, engine: Engine) -> &Vec<f64> {
        match engine {
            Engine::Main => &self.main_engine_forces,
            Engine::LeftFront => &self.left_front_thruster_forces,
            Engine::LeftRear => &self.left_rear_thruster_forces,
            Engine::RightFront => &self.right_front_thruster_forces,
            Engine::RightRear => &self.right_rear_thruster_forces,
        }
    }

    /// Most recently committed force for an engine (0 before the first commit).
    pub fn engine_force(&self, engine: Engine) -> f64 {
        self.forces(engine).last().copied().unwrap_or(0.0)
    }

    pub fn last_inputs(&self) -> Option<RocketInputs> {
        if self.main_engine_forces.is_empty() {
            return None;
        }
        Some(RocketInputs {
            main: self.engine_force(Engine::Main),
            left_front: self.engine_force(Engine::LeftFront),
            left_rear: self.engine_force(Engine::LeftRear),
            right_front: self.engine_force(Engine::RightFront),
            right_rear: self.engine_force(Engine::RightRear),
        })
    }

    pub fn push_inputs(&mut self, inputs: &RocketInputs) {
        self.main_engine_forces.push(inputs.main);
        self.left_front_thruster_forces.push(inputs.left_front);
        self.left_rear_thruster_forces.push(inputs.left_rear);
        self.right_front_thruster_forces.push(inputs.right_front);
        self.right_rear_thruster_forces.push(inputs.right_rear);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurretHistory {
    pub angles: Vec<f64>,
    pub rotation_velocities: Vec<f64>,
    /// Sparse: one entry per shot.
    pub when_fired: Vec<f64>,
}

impl TurretHistory {
    pub fn new(angle: f64) -> Self {
        Self {
            angles: vec![angle],
            rotation_velocities: Vec::new(),
            when_fired: Vec::new(),
        }
    }

    pub fn angle(&self) -> f64 {
        self.angles.last().copied().unwrap_or(0.0)
    }

    pub fn rotation_velocity(&self) -> f64 {
        self.rotation_velocities.last().copied().unwrap_or(0.0)
    }

    pub fn last_fired(&self) -> Option<f64> {
        self.when_fired.last().copied()
    }
}

/// A fired projectile. Its location is derived from the launch angle and
/// time rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileRecord {
    pub firing_angle: f64,
    pub launch_time: f64,
    pub on_board: bool,
    /// End of the tick in which the projectile left the arena or hit an obstacle.
    #[serde(default)]
    pub retired_at: Option<f64>,
}

impl ProjectileRecord {
    pub fn new(firing_angle: f64, launch_time: f64) -> Self {
        Self {
            firing_angle,
            launch_time,
            on_board: true,
            retired_at: None,
        }
    }

    /// Once off board, a projectile never returns. The first retirement time sticks.
    pub fn take_off_board(&mut self, time: f64) {
        self.on_board = false;
        self.retired_at.get_or_insert(time);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub rocket: RocketHistory,
    pub turret: TurretHistory,
    pub projectiles: Vec<ProjectileRecord>,
    pub time: f64,
}

impl History {
    pub fn new(rocket_location: Coordinate, rocket_angle: f64, turret_angle: f64) -> Self {
        Self {
            rocket: RocketHistory::new(rocket_location, rocket_angle),
            turret: TurretHistory::new(turret_angle),
            projectiles: Vec::new(),
            time: 0.0,
        }
    }

    pub fn active_projectiles(&self) -> impl Iterator<Item = &ProjectileRecord> {
        self.projectiles.iter().filter(|p| p.on_board)
    }
}

/// Everything a controller can see: the fixed parameters and the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub parameters: Parameters,
    pub history: History,
}

impl World {
    pub fn new(parameters: Parameters, history: History) -> Self {
        Self {
            parameters,
            history,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Rocket,
    Turret,
    Draw,
}

/// Why the game ended. Set once, never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cause {
    RocketError,
    TurretError,
    BothError,
    RocketTimeExceeded,
    TurretTimeExceeded,
    BothTimeExceeded,
    RocketTampered,
    TurretTampered,
    RocketInputInvalid,
    TurretInputInvalid,
    BothInputInvalid,
    RocketOutOfBounds,
    RocketHitObstacle,
    ProjectileHitRocket,
    RocketHitTurret,
    BothDestroyed,
    GameTimeExceeded,
}

impl Cause {
    pub fn winner(&self) -> Winner {
        match self {
            Cause::RocketError
            | Cause::RocketTimeExceeded
            | Cause::RocketTampered
            | Cause::RocketInputInvalid
            | Cause::RocketOutOfBounds
            | Cause::RocketHitObstacle
            | Cause::ProjectileHitRocket => Winner::Turret,
            Cause::TurretError
            | Cause::TurretTimeExceeded
            | Cause::TurretTampered
            | Cause::TurretInputInvalid
            | Cause::RocketHitTurret => Winner::Rocket,
            Cause::BothError
            | Cause::BothTimeExceeded
            | Cause::BothInputInvalid
            | Cause::BothDestroyed
            | Cause::GameTimeExceeded => Winner::Draw,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Cause::RocketError => "the rocket controller raised an error",
            Cause::TurretError => "the turret controller raised an error",
            Cause::BothError => "both controllers raised errors",
            Cause::RocketTimeExceeded => "the rocket controller exceeded its time budget",
            Cause::TurretTimeExceeded => "the turret controller exceeded its time budget",
            Cause::BothTimeExceeded => "both controllers exceeded their time budget",
            Cause::RocketTampered => "the rocket controller modified the game state",
            Cause::TurretTampered => "the turret controller modified the game state",
            Cause::RocketInputInvalid => "the rocket controller returned invalid inputs",
            Cause::TurretInputInvalid => "the turret controller returned invalid inputs",
            Cause::BothInputInvalid => "both controllers returned invalid inputs",
            Cause::RocketOutOfBounds => "the rocket has gone out of bounds",
            Cause::RocketHitObstacle => "the rocket has struck an obstacle",
            Cause::ProjectileHitRocket => "a projectile has hit the rocket",
            Cause::RocketHitTurret => "the rocket has hit the turret",
            Cause::BothDestroyed => "the rocket and turret have destroyed each other",
            Cause::GameTimeExceeded => "game time exceeded",
        }
    }
}

impl std::fmt::Display for Cause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.winner() {
            Winner::Rocket => "ROCKET WIN",
            Winner::Turret => "TURRET WIN",
            Winner::Draw => "DRAW",
        };
        write!(f, "{}: {}", prefix, self.description())
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

/// Read-only view of one tick, for renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u32,
    pub time: f64,
    pub rocket_x: f64,
    pub rocket_y: f64,
    pub rocket_angle: f64,
    pub rocket_inputs: Option<RocketInputs>,
    pub turret_angle: f64,
    pub turret_ready: bool,
    pub projectiles: Vec<ProjectileSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub cause: Cause,
    pub winner: Winner,
    pub description: String,
    pub final_tick: u32,
    pub final_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    pub rocket_controller: String,
    pub turret_controller: String,
    pub parameters: Parameters,
    pub frames: Vec<Frame>,
    /// Time of every shot the turret took, in order.
    #[serde(default)]
    pub shot_times: Vec<f64>,
    pub result: GameResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rocket_derived_properties() {
        let rocket = RocketParameters {
            mass: 100.0,
            length: 6.0,
            max_main_engine_force: 100.0,
            max_thruster_force: 20.0,
        };
        assert_eq!(rocket.target_radius(), 3.0);
        assert!((rocket.moment_of_inertia() - 300.0).abs() < 1e-9);
        assert_eq!(rocket.max_force(Engine::Main), 100.0);
        assert_eq!(rocket.max_force(Engine::RightRear), 20.0);
    }

    #[test]
    fn test_rocket_inputs_from_slice_requires_five_values() {
        assert!(RocketInputs::from_slice(&[1.0, 2.0, 3.0, 4.0]).is_none());
        assert!(RocketInputs::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).is_none());
        let inputs = RocketInputs::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(inputs.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(inputs.force(Engine::RightFront), 4.0);
    }

    #[test]
    fn test_history_push_and_last_inputs() {
        let mut history = History::new(Coordinate::new(1.0, 2.0), 0.5, -0.5);
        assert!(history.rocket.last_inputs().is_none());
        assert_eq!(history.turret.last_fired(), None);

        let inputs = RocketInputs {
            main: 10.0,
            left_front: 1.0,
            ..RocketInputs::none()
        };
        history.rocket.push_inputs(&inputs);
        assert_eq!(history.rocket.last_inputs(), Some(inputs));
        assert_eq!(history.rocket.engine_force(Engine::LeftFront), 1.0);
        assert_eq!(history.rocket.location(), Coordinate::new(1.0, 2.0));
    }

    #[test]
    fn test_thruster_signs() {
        assert_eq!(Engine::LeftFront.rotation_direction(), -1.0);
        assert_eq!(Engine::RightRear.rotation_direction(), -1.0);
        assert_eq!(Engine::RightFront.rotation_direction(), 1.0);
        assert_eq!(Engine::LeftRear.rotation_direction(), 1.0);
        assert_eq!(Engine::LeftRear.lateral_direction(), 1.0);
        assert_eq!(Engine::RightFront.lateral_direction(), -1.0);
    }

    #[test]
    fn test_cause_winner_mapping() {
        assert_eq!(Cause::ProjectileHitRocket.winner(), Winner::Turret);
        assert_eq!(Cause::RocketHitTurret.winner(), Winner::Rocket);
        assert_eq!(Cause::BothDestroyed.winner(), Winner::Draw);
        assert_eq!(Cause::GameTimeExceeded.winner(), Winner::Draw);
        assert_eq!(Cause::TurretTampered.winner(), Winner::Rocket);
        assert_eq!(Cause::RocketInputInvalid.winner(), Winner::Turret);
    }

    #[test]
    fn test_projectile_deactivation_is_sticky() {
        let mut p = ProjectileRecord::new(0.0, 0.0);
        p.take_off_board(1.0);
        p.take_off_board(2.0);
        assert!(!p.on_board);
        assert_eq!(p.retired_at, Some(1.0));
    }
}
