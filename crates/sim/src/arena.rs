use strike_shared::*;

use crate::physics::rocket_velocity;
use crate::relative::{Crossings, RelativeObjects};

pub fn is_within_bounds(parameters: &Parameters, location: Coordinate) -> bool {
    let w = parameters.environment.width;
    let h = parameters.environment.height;

    (-w / 2.0..=w / 2.0).contains(&location.x) && (-h / 2.0..=h / 2.0).contains(&location.y)
}

pub fn is_rocket_within_bounds(world: &World) -> bool {
    is_within_bounds(&world.parameters, world.history.rocket.location())
}

/// Does a circle of `extra_radius` at `location` touch any obstacle?
pub fn has_hit_obstacle(parameters: &Parameters, location: Coordinate, extra_radius: f64) -> bool {
    parameters
        .environment
        .obstacles
        .iter()
        .any(|o| o.location.distance_to(location) <= o.radius + extra_radius)
}

pub fn has_rocket_hit_obstacle(world: &World) -> bool {
    has_hit_obstacle(
        &world.parameters,
        world.history.rocket.location(),
        world.parameters.rocket.target_radius(),
    )
}

/// The minimum firing interval has elapsed since the last shot (or there was none).
pub fn can_turret_fire(world: &World) -> bool {
    match world.history.turret.last_fired() {
        None => true,
        Some(last) => {
            let elapsed = world.history.time - last;
            let interval = world.parameters.turret.min_firing_interval;
            elapsed >= interval || is_close(elapsed, interval)
        }
    }
}

pub fn does_rocket_impact_turret(world: &World) -> bool {
    let reach = world.parameters.rocket.target_radius() + world.parameters.turret.radius;
    world
        .history
        .rocket
        .location()
        .distance_to(world.parameters.turret.location)
        <= reach
}

pub fn projectile_velocity(parameters: &Parameters, projectile: &ProjectileRecord) -> Coordinate {
    Coordinate::from_polar(parameters.turret.projectile_speed, projectile.firing_angle)
}

/// Location at `time`; a projectile sits at the turret until its launch time.
pub fn projectile_location_at(
    parameters: &Parameters,
    projectile: &ProjectileRecord,
    time: f64,
) -> Coordinate {
    let flight = (time - projectile.launch_time).max(0.0);
    parameters.turret.location + projectile_velocity(parameters, projectile) * flight
}

pub fn projectile_location(world: &World, projectile: &ProjectileRecord) -> Coordinate {
    projectile_location_at(&world.parameters, projectile, world.history.time)
}

pub fn active_projectile_locations(world: &World) -> Vec<Coordinate> {
    world
        .history
        .active_projectiles()
        .map(|p| projectile_location(world, p))
        .collect()
}

/// Has any projectile struck the rocket?
///
/// Checks the current separation of on-board projectiles and also sweeps the
/// tick just integrated, so a fast projectile cannot pass through the rocket
/// between samples. Projectiles retired at the end of that tick are swept too.
/// The sweep never starts before a projectile's launch and only counts
/// contacts inside the arena.
pub fn does_projectile_impact_rocket(world: &World) -> bool {
    let target_radius = world.parameters.rocket.target_radius();
    let rocket = world.history.rocket.location();
    let now = world.history.time;

    world.history.projectiles.iter().any(|p| {
        if p.on_board {
            projectile_location(world, p).distance_to(rocket) <= target_radius
                || swept_contact(world, p, target_radius)
        } else {
            p.retired_at.is_some_and(|t| is_close(t, now)) && swept_contact(world, p, target_radius)
        }
    })
}

fn swept_contact(world: &World, projectile: &ProjectileRecord, target_radius: f64) -> bool {
    let parameters = &world.parameters;
    let locations = &world.history.rocket.locations;
    let [.., rocket_previous, _] = locations.as_slice() else {
        return false;
    };

    let now = world.history.time;
    let previous = now - parameters.time.timestep;
    let start = previous.max(projectile.launch_time);
    let window = now - start;
    if window <= 0.0 {
        return false;
    }

    let rocket_v = rocket_velocity(world);
    let projectile_v = projectile_velocity(parameters, projectile);
    let objects = RelativeObjects::new(
        *rocket_previous + rocket_v * (start - previous),
        projectile_location_at(parameters, projectile, start),
    )
    .with_velocities(rocket_v, projectile_v);

    let contact = match objects.times_within(target_radius) {
        Crossings::Inside { .. } => 0.0,
        Crossings::Ahead { enter, .. } if enter <= window => enter,
        Crossings::Touching { time } if time <= window => time,
        _ => return false,
    };

    is_within_bounds(parameters, objects.locations(contact).1)
}

pub fn is_game_time_exceeded(world: &World) -> bool {
    world.history.time > world.parameters.time.max_game_time - world.parameters.time.timestep
}
