use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use strike_shared::*;

/// Placement tries per object before giving up on a layout.
const MAX_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOptions {
    pub max_obstacles: usize,
    pub min_obstacle_radius: f64,
    pub max_obstacle_radius: f64,
    /// Clear space kept between the rocket start and the turret edge.
    pub min_turret_clearance: f64,
    /// Clear space kept between obstacles and every other object.
    pub clearance: f64,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            max_obstacles: 3,
            min_obstacle_radius: 3.0,
            max_obstacle_radius: 12.0,
            min_turret_clearance: 40.0,
            clearance: 5.0,
        }
    }
}

/// Randomize the layout of `base` deterministically from `seed`.
///
/// The rocket start pose, turret start angle and obstacles are replaced;
/// everything else is kept. The result always passes `GameConfig::validate`.
pub fn random_config(
    base: &GameConfig,
    seed: u64,
    options: &ScenarioOptions,
) -> Result<GameConfig, ConfigError> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut config = base.clone();

    let half_w = config.environment.width / 2.0;
    let half_h = config.environment.height / 2.0;
    let turret = Coordinate::from(config.turret.location);
    let turret_radius = config.turret.radius;
    let rocket_radius = config.rocket.length / 2.0;

    let mut obstacles: Vec<ObstacleConfig> = Vec::new();
    let count = rng.random_range(0..=options.max_obstacles);
    for _ in 0..count {
        let radius = rng.random_range(options.min_obstacle_radius..=options.max_obstacle_radius);
        let placed = (0..MAX_ATTEMPTS).find_map(|_| {
            let location = random_point(&mut rng, half_w - radius, half_h - radius)?;
            let clear_of_turret =
                location.distance_to(turret) > turret_radius + radius + options.clearance;
            let clear_of_others = obstacles.iter().all(|o| {
                let gap = o.radius + radius + options.clearance;
                location.distance_to(Coordinate::from(o.location)) > gap
            });
            (clear_of_turret && clear_of_others).then_some(location)
        });

        match placed {
            Some(location) => obstacles.push(ObstacleConfig {
                location: location.to_array(),
                radius,
            }),
            None => log::debug!("seed {seed}: no room for obstacle of radius {radius:.1}"),
        }
    }

    let margin = rocket_radius + options.clearance;
    let rocket_start = (0..MAX_ATTEMPTS)
        .find_map(|_| {
            let location = random_point(&mut rng, half_w - margin, half_h - margin)?;
            let clear_of_turret = location.distance_to(turret)
                > turret_radius + rocket_radius + options.min_turret_clearance;
            let clear_of_obstacles = obstacles.iter().all(|o| {
                location.distance_to(Coordinate::from(o.location)) > o.radius + margin
            });
            (clear_of_turret && clear_of_obstacles).then_some(location)
        })
        .ok_or_else(|| {
            ConfigError::Invalid(format!("seed {seed}: no room to place the rocket"))
        })?;

    config.rocket.start_location = rocket_start.to_array();
    config.rocket.start_angle = random_angle(&mut rng);
    config.turret.start_angle = random_angle(&mut rng);
    config.environment.obstacles = (!obstacles.is_empty()).then_some(obstacles);

    config.validate()?;
    Ok(config)
}

fn random_point(rng: &mut Pcg64, half_w: f64, half_h: f64) -> Option<Coordinate> {
    if half_w <= 0.0 || half_h <= 0.0 {
        return None;
    }
    Some(Coordinate::new(
        rng.random_range(-half_w..=half_w),
        rng.random_range(-half_h..=half_h),
    ))
}

fn random_angle(rng: &mut Pcg64) -> f64 {
    normalize_angle(rng.random_range(-PI..PI))
}
