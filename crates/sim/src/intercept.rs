use std::f64::consts::PI;

use strike_shared::{normalize_angle, Coordinate, CoordinateExt, INTERCEPT_TOLERANCE};

use crate::relative::RelativeObjects;

/// Where the turret should point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aim {
    /// Leads the rocket: a shot fired now meets it.
    Intercept(f64),
    /// No intercept exists; point at the rocket's current position.
    Track(f64),
}

impl Aim {
    pub fn angle(&self) -> f64 {
        match *self {
            Aim::Intercept(angle) | Aim::Track(angle) => angle,
        }
    }
}

/// Firing angle at which a projectile launched now from `turret` meets a
/// rocket holding its current velocity.
///
/// The projectile meets the rocket when the relative velocity is parallel to
/// the rocket-from-turret offset. Crossing the two gives
/// `a sin(theta) + b cos(theta) = c`, solved as `R sin(theta + beta) = c`.
/// Of the two roots only one is causal; `None` when neither is.
pub fn solve_intercept(
    turret: Coordinate,
    rocket: Coordinate,
    rocket_velocity: Coordinate,
    projectile_speed: f64,
) -> Option<f64> {
    let d = turret - rocket;
    let a = -d.x * projectile_speed;
    let b = d.y * projectile_speed;
    let c = d.y * rocket_velocity.x - d.x * rocket_velocity.y;

    let r = a.hypot(b);
    if r == 0.0 {
        return None;
    }

    let ratio = c / r;
    if !ratio.is_finite() || ratio.abs() > 1.0 {
        // Rocket outruns the projectile along this line of sight.
        return None;
    }

    let m = ratio.asin();
    let beta = b.atan2(a);

    [normalize_angle(m - beta), normalize_angle(PI - m - beta)]
        .into_iter()
        .find(|&theta| {
            will_firing_angle_hit(turret, rocket, rocket_velocity, projectile_speed, theta)
        })
}

/// Would a shot fired now at `theta` meet the rocket at some future time?
pub fn will_firing_angle_hit(
    turret: Coordinate,
    rocket: Coordinate,
    rocket_velocity: Coordinate,
    projectile_speed: f64,
    theta: f64,
) -> bool {
    RelativeObjects::new(turret, rocket)
        .with_velocities(Coordinate::from_polar(projectile_speed, theta), rocket_velocity)
        .first_time_within(INTERCEPT_TOLERANCE)
        .is_some()
}

pub fn aim_angle(
    turret: Coordinate,
    rocket: Coordinate,
    rocket_velocity: Coordinate,
    projectile_speed: f64,
) -> Aim {
    match solve_intercept(turret, rocket, rocket_velocity, projectile_speed) {
        Some(theta) => Aim::Intercept(theta),
        None => Aim::Track(turret.bearing_to(rocket)),
    }
}
