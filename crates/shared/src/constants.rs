// Arena
pub const DEFAULT_WIDTH: f64 = 200.0;
pub const DEFAULT_HEIGHT: f64 = 200.0;

// Time
pub const DEFAULT_TIMESTEP: f64 = 0.1;
pub const DEFAULT_MAX_GAME_TIME: f64 = 120.0;

// Rocket
pub const DEFAULT_ROCKET_MASS: f64 = 100.0;
pub const DEFAULT_ROCKET_LENGTH: f64 = 5.0;
pub const DEFAULT_MAX_MAIN_ENGINE_FORCE: f64 = 100.0;
pub const DEFAULT_MAX_THRUSTER_FORCE: f64 = 20.0;
pub const DEFAULT_ROCKET_START: [f64; 2] = [-80.0, 50.0];
pub const DEFAULT_ROCKET_START_ANGLE: f64 = 0.0;

// Turret
pub const DEFAULT_TURRET_RADIUS: f64 = 5.0;
pub const DEFAULT_TURRET_LOCATION: [f64; 2] = [0.0, 0.0];
pub const DEFAULT_TURRET_START_ANGLE: f64 = 0.0;
pub const DEFAULT_MAX_ROTATION_SPEED: f64 = 1.0;
pub const DEFAULT_PROJECTILE_SPEED: f64 = 45.0;
pub const DEFAULT_MIN_FIRING_INTERVAL: f64 = 3.0;

// Float comparison tolerances
pub const REL_TOLERANCE: f64 = 1e-9;
pub const ABS_TOLERANCE: f64 = 0.0;

// Distance below which two constant-velocity paths count as intersecting
// when validating a firing solution.
pub const INTERCEPT_TOLERANCE: f64 = 1e-6;

// Replay recording
pub const FRAME_INTERVAL: u32 = 1;
