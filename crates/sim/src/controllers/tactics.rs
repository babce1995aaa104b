use strike_shared::*;

use crate::arena::{projectile_location, projectile_velocity};
use crate::intercept::{aim_angle, solve_intercept, Aim};
use crate::physics::{rocket_angular_velocity, rocket_velocity};

/// A projectile in flight as the rocket sees it.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileTrack {
    pub location: Coordinate,
    pub velocity: Coordinate,
    pub firing_angle: f64,
}

/// Situational picture derived from the world, shared by the default controllers.
#[derive(Debug, Clone)]
pub struct Situation {
    pub rocket: Coordinate,
    pub rocket_velocity: Coordinate,
    pub rocket_heading: f64,
    pub rocket_angular_velocity: f64,
    pub rocket_radius: f64,

    pub turret: Coordinate,
    pub turret_radius: f64,
    pub turret_angle: f64,

    /// Centre to centre
    pub distance_to_turret: f64,
    /// Absolute angle from the rocket to the turret
    pub angle_to_turret: f64,

    pub projectiles: Vec<ProjectileTrack>,
}

pub fn read_situation(world: &World) -> Situation {
    let rocket = world.history.rocket.location();
    let turret = world.parameters.turret.location;

    let projectiles = world
        .history
        .active_projectiles()
        .map(|p| ProjectileTrack {
            location: projectile_location(world, p),
            velocity: projectile_velocity(&world.parameters, p),
            firing_angle: p.firing_angle,
        })
        .collect();

    Situation {
        rocket,
        rocket_velocity: rocket_velocity(world),
        rocket_heading: world.history.rocket.angle(),
        rocket_angular_velocity: rocket_angular_velocity(world),
        rocket_radius: world.parameters.rocket.target_radius(),
        turret,
        turret_radius: world.parameters.turret.radius,
        turret_angle: world.history.turret.angle(),
        distance_to_turret: rocket.distance_to(turret),
        angle_to_turret: rocket.bearing_to(turret),
        projectiles,
    }
}

/// Intercept angle for the rocket's current position and velocity.
pub fn intercept_angle(world: &World) -> Option<f64> {
    solve_intercept(
        world.parameters.turret.location,
        world.history.rocket.location(),
        rocket_velocity(world),
        world.parameters.turret.projectile_speed,
    )
}

pub fn aim(world: &World) -> Aim {
    aim_angle(
        world.parameters.turret.location,
        world.history.rocket.location(),
        rocket_velocity(world),
        world.parameters.turret.projectile_speed,
    )
}

/// 1.0 when the turret can fire, falling to 0.0 just after a shot.
pub fn recharge_fraction(world: &World) -> f64 {
    match world.history.turret.last_fired() {
        None => 1.0,
        Some(last) => {
            let elapsed = world.history.time - last;
            (elapsed / world.parameters.turret.min_firing_interval).min(1.0)
        }
    }
}

/// Perpendicular distance from `point` to the line through `origin` at `angle`.
pub fn distance_from_line(point: Coordinate, origin: Coordinate, angle: f64) -> f64 {
    let direction = Coordinate::from_polar(1.0, angle);
    direction.perp_dot(point - origin).abs()
}

/// +1.0 if `point` lies to the left of the directed line, -1.0 otherwise.
pub fn side_of_line(point: Coordinate, origin: Coordinate, angle: f64) -> f64 {
    let direction = Coordinate::from_polar(1.0, angle);
    if direction.perp_dot(point - origin) >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_situation_at_start() {
        let world = GameConfig::default().world();
        let s = read_situation(&world);
        assert_eq!(s.rocket, Coordinate::new(-80.0, 50.0));
        assert_eq!(s.rocket_velocity, Coordinate::ZERO);
        assert!((s.distance_to_turret - (80.0f64.hypot(50.0))).abs() < 1e-9);
        assert!((s.angle_to_turret - (-50.0f64).atan2(80.0)).abs() < 1e-12);
        assert!(s.projectiles.is_empty());
    }

    #[test]
    fn test_line_geometry() {
        let origin = Coordinate::ZERO;
        let above = Coordinate::new(5.0, 3.0);
        assert!((distance_from_line(above, origin, 0.0) - 3.0).abs() < 1e-12);
        assert_eq!(side_of_line(above, origin, 0.0), 1.0);
        // Same point, line pointing the other way.
        assert_eq!(side_of_line(above, origin, PI), -1.0);
        assert!((distance_from_line(above, origin, FRAC_PI_2) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_recharge_fraction() {
        let mut world = GameConfig::default().world();
        assert_eq!(recharge_fraction(&world), 1.0);
        world.history.turret.when_fired.push(0.0);
        world.history.time = 1.5;
        assert!((recharge_fraction(&world) - 0.5).abs() < 1e-12);
        world.history.time = 10.0;
        assert_eq!(recharge_fraction(&world), 1.0);
    }
}
