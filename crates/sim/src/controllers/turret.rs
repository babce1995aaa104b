use strike_shared::*;

use crate::arena::{can_turret_fire, is_within_bounds};
use crate::controller::{ControllerError, TurretController};
use crate::controllers::tactics::aim;
use crate::physics::rocket_velocity;
use crate::relative::RelativeObjects;

/// Built-in turret: turns toward the intercept angle (or straight at the
/// rocket when no intercept exists) and fires when a shot along the current
/// barrel would connect.
pub struct DefaultTurret;

impl TurretController for DefaultTurret {
    fn name(&self) -> &str {
        "default"
    }

    fn calc_inputs(&mut self, world: &mut World) -> Result<Option<TurretInputs>, ControllerError> {
        let world = &*world;
        Ok(Some(TurretInputs {
            rotation_velocity: rotation_velocity(world),
            fire: can_turret_fire(world) && will_shot_hit(world),
        }))
    }
}

/// Full speed toward the aim, easing off on the last tick so it does not overshoot.
fn rotation_velocity(world: &World) -> f64 {
    let delta = normalize_angle(aim(world).angle() - world.history.turret.angle());
    let dt = world.parameters.time.timestep;
    let speed = world.parameters.turret.max_rotation_speed.min(delta.abs() / dt);

    if delta >= 0.0 {
        speed
    } else {
        -speed
    }
}

/// A shot along the barrel passes within half the target radius of the
/// rocket, inside the arena, before it would strike any obstacle.
fn will_shot_hit(world: &World) -> bool {
    let parameters = &world.parameters;
    let turret = parameters.turret.location;
    let shot_velocity = Coordinate::from_polar(
        parameters.turret.projectile_speed,
        world.history.turret.angle(),
    );

    let approach = RelativeObjects::new(world.history.rocket.location(), turret)
        .with_velocities(rocket_velocity(world), shot_velocity)
        .closest_approach();

    let (rocket_at, shot_at) = approach.locations;
    let connects = approach.time > 0.0
        && approach.distance <= parameters.rocket.target_radius() / 2.0
        && is_within_bounds(parameters, rocket_at)
        && is_within_bounds(parameters, shot_at);
    if !connects {
        return false;
    }

    !parameters.environment.obstacles.iter().any(|obstacle| {
        RelativeObjects::new(obstacle.location, turret)
            .with_velocities(Coordinate::ZERO, shot_velocity)
            .first_time_within(obstacle.radius)
            .is_some_and(|contact| contact.time < approach.time)
    })
}
