use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::types::*;
use crate::vector::{Coordinate, CoordinateExt};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid game configuration: {0}")]
    Invalid(String),
}

/// Which of the two strategies a side runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveController {
    #[default]
    Default,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSettings {
    pub active: ActiveController,
    /// Surface controller faults to the caller instead of ending the game.
    pub raise_errors: bool,
    pub check_execution_time: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            active: ActiveController::Default,
            raise_errors: false,
            check_execution_time: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllersConfig {
    pub rocket_active_controller: ActiveController,
    pub turret_active_controller: ActiveController,
    #[serde(default)]
    pub rocket_raise_errors: bool,
    #[serde(default)]
    pub turret_raise_errors: bool,
    #[serde(default = "default_true")]
    pub rocket_check_execution_time: bool,
    #[serde(default = "default_true")]
    pub turret_check_execution_time: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleConfig {
    pub location: [f64; 2],
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub width: f64,
    pub height: f64,
    pub obstacles: Option<Vec<ObstacleConfig>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketConfig {
    pub mass: f64,
    pub length: f64,
    pub max_main_engine_force: f64,
    pub max_thruster_force: f64,
    pub start_location: [f64; 2],
    pub start_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurretConfig {
    pub radius: f64,
    pub location: [f64; 2],
    pub start_angle: f64,
    pub max_rotation_speed: f64,
    pub projectile_speed: f64,
    pub min_firing_interval: f64,
}

/// On-disk game description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub controllers: ControllersConfig,
    pub environment: EnvironmentConfig,
    pub time: TimeParameters,
    pub rocket: RocketConfig,
    pub turret: TurretConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            controllers: ControllersConfig {
                rocket_active_controller: ActiveController::Default,
                turret_active_controller: ActiveController::Default,
                rocket_raise_errors: false,
                turret_raise_errors: false,
                rocket_check_execution_time: true,
                turret_check_execution_time: true,
            },
            environment: EnvironmentConfig {
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
                obstacles: None,
            },
            time: TimeParameters {
                timestep: DEFAULT_TIMESTEP,
                max_game_time: DEFAULT_MAX_GAME_TIME,
            },
            rocket: RocketConfig {
                mass: DEFAULT_ROCKET_MASS,
                length: DEFAULT_ROCKET_LENGTH,
                max_main_engine_force: DEFAULT_MAX_MAIN_ENGINE_FORCE,
                max_thruster_force: DEFAULT_MAX_THRUSTER_FORCE,
                start_location: DEFAULT_ROCKET_START,
                start_angle: DEFAULT_ROCKET_START_ANGLE,
            },
            turret: TurretConfig {
                radius: DEFAULT_TURRET_RADIUS,
                location: DEFAULT_TURRET_LOCATION,
                start_angle: DEFAULT_TURRET_START_ANGLE,
                max_rotation_speed: DEFAULT_MAX_ROTATION_SPEED,
                projectile_speed: DEFAULT_PROJECTILE_SPEED,
                min_firing_interval: DEFAULT_MIN_FIRING_INTERVAL,
            },
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every value is in range and the starting layout is not already terminal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let env = &self.environment;
        require_positive("environment.width", env.width)?;
        require_positive("environment.height", env.height)?;

        if let Some(obstacles) = &env.obstacles {
            for (i, obstacle) in obstacles.iter().enumerate() {
                let name = format!("environment.obstacles[{i}].location");
                require_location(&name, obstacle.location, env)?;
                require_positive(&format!("environment.obstacles[{i}].radius"), obstacle.radius)?;
            }
        }

        require_positive("time.timestep", self.time.timestep)?;
        require_positive("time.max_game_time", self.time.max_game_time)?;

        let rocket = &self.rocket;
        require_positive("rocket.mass", rocket.mass)?;
        require_positive("rocket.length", rocket.length)?;
        require_positive("rocket.max_main_engine_force", rocket.max_main_engine_force)?;
        require_positive("rocket.max_thruster_force", rocket.max_thruster_force)?;
        require_location("rocket.start_location", rocket.start_location, env)?;
        require_angle("rocket.start_angle", rocket.start_angle)?;

        let turret = &self.turret;
        require_location("turret.location", turret.location, env)?;
        require_angle("turret.start_angle", turret.start_angle)?;
        require_positive("turret.radius", turret.radius)?;
        require_positive("turret.max_rotation_speed", turret.max_rotation_speed)?;
        require_positive("turret.projectile_speed", turret.projectile_speed)?;
        require_positive("turret.min_firing_interval", turret.min_firing_interval)?;

        if self.time.max_game_time <= self.time.timestep {
            return Err(ConfigError::Invalid(
                "max_game_time must be longer than one timestep".into(),
            ));
        }

        let rocket_start = Coordinate::from(rocket.start_location);
        let turret_location = Coordinate::from(turret.location);
        let rocket_radius = rocket.length / 2.0;

        if rocket_start.distance_to(turret_location) <= turret.radius + rocket_radius {
            return Err(ConfigError::Invalid(
                "rocket starts in contact with the turret".into(),
            ));
        }

        for obstacle in env.obstacles.iter().flatten() {
            let location = Coordinate::from(obstacle.location);
            if rocket_start.distance_to(location) <= obstacle.radius + rocket_radius {
                return Err(ConfigError::Invalid(
                    "rocket starts in contact with an obstacle".into(),
                ));
            }
            if turret_location.distance_to(location) <= obstacle.radius + turret.radius {
                return Err(ConfigError::Invalid(
                    "turret is in contact with an obstacle".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn parameters(&self) -> Parameters {
        let obstacles = self
            .environment
            .obstacles
            .iter()
            .flatten()
            .map(|o| Obstacle {
                location: Coordinate::from(o.location),
                radius: o.radius,
            })
            .collect();

        Parameters::new(
            EnvironmentParameters {
                width: self.environment.width,
                height: self.environment.height,
                obstacles,
            },
            self.time,
            RocketParameters {
                mass: self.rocket.mass,
                length: self.rocket.length,
                max_main_engine_force: self.rocket.max_main_engine_force,
                max_thruster_force: self.rocket.max_thruster_force,
            },
            TurretParameters {
                radius: self.turret.radius,
                location: Coordinate::from(self.turret.location),
                max_rotation_speed: self.turret.max_rotation_speed,
                projectile_speed: self.turret.projectile_speed,
                min_firing_interval: self.turret.min_firing_interval,
            },
        )
    }

    pub fn history(&self) -> History {
        History::new(
            Coordinate::from(self.rocket.start_location),
            self.rocket.start_angle,
            self.turret.start_angle,
        )
    }

    pub fn world(&self) -> World {
        World::new(self.parameters(), self.history())
    }

    pub fn rocket_settings(&self) -> ControllerSettings {
        ControllerSettings {
            active: self.controllers.rocket_active_controller,
            raise_errors: self.controllers.rocket_raise_errors,
            check_execution_time: self.controllers.rocket_check_execution_time,
        }
    }

    pub fn turret_settings(&self) -> ControllerSettings {
        ControllerSettings {
            active: self.controllers.turret_active_controller,
            raise_errors: self.controllers.turret_raise_errors,
            check_execution_time: self.controllers.turret_check_execution_time,
        }
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be a positive number, got {value}")))
    }
}

fn require_angle(name: &str, angle: f64) -> Result<(), ConfigError> {
    if angle > -PI && angle <= PI {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be in (-pi, pi], got {angle}")))
    }
}

fn require_location(
    name: &str,
    location: [f64; 2],
    env: &EnvironmentConfig,
) -> Result<(), ConfigError> {
    let [x, y] = location;
    let within = x.is_finite()
        && y.is_finite()
        && (-env.width / 2.0..=env.width / 2.0).contains(&x)
        && (-env.height / 2.0..=env.height / 2.0).contains(&y);
    if within {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} ({x}, {y}) is outside the arena")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"{
        "controllers": {
            "rocket_active_controller": "default",
            "turret_active_controller": "player",
            "rocket_raise_errors": false,
            "turret_raise_errors": true
        },
        "environment": {
            "width": 200.0,
            "height": 100.0,
            "obstacles": [{"location": [30.0, 20.0], "radius": 8.0}]
        },
        "time": {"timestep": 0.05, "max_game_time": 60.0},
        "rocket": {
            "mass": 100.0,
            "length": 5.0,
            "max_main_engine_force": 100.0,
            "max_thruster_force": 20.0,
            "start_location": [-80.0, 40.0],
            "start_angle": 0.0
        },
        "turret": {
            "radius": 5.0,
            "location": [0.0, 0.0],
            "start_angle": 3.141592653589793,
            "max_rotation_speed": 1.0,
            "projectile_speed": 45.0,
            "min_firing_interval": 3.0
        }
    }"#;

    #[test]
    fn test_default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_parse_example() {
        let config = GameConfig::from_json_str(EXAMPLE).unwrap();
        let world = config.world();
        assert_eq!(world.parameters.environment.obstacles.len(), 1);
        assert_eq!(world.parameters.environment.height, 100.0);
        assert_eq!(world.history.rocket.location(), Coordinate::new(-80.0, 40.0));
        assert_eq!(config.turret_settings().active, ActiveController::Player);
        assert!(config.turret_settings().raise_errors);
        assert!(config.rocket_settings().check_execution_time);
    }

    #[test]
    fn test_null_obstacles_accepted() {
        let json = EXAMPLE.replace(r#"[{"location": [30.0, 20.0], "radius": 8.0}]"#, "null");
        let config = GameConfig::from_json_str(&json).unwrap();
        assert!(config.parameters().environment.obstacles.is_empty());
    }

    #[test]
    fn test_rejects_rocket_touching_turret() {
        let mut config = GameConfig::default();
        config.rocket.start_location = [4.0, 0.0];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_out_of_bounds_start() {
        let mut config = GameConfig::default();
        config.rocket.start_location = [150.0, 0.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_angle_and_time() {
        let mut config = GameConfig::default();
        config.turret.start_angle = -PI;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.time.max_game_time = config.time.timestep;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_turret_inside_obstacle() {
        let mut config = GameConfig::default();
        config.environment.obstacles = Some(vec![ObstacleConfig {
            location: [3.0, 0.0],
            radius: 4.0,
        }]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            GameConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
