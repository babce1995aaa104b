use std::f64::consts::FRAC_PI_2;

use strike_shared::*;

// Only positions and angles are stored. Rates are reconstructed by finite
// differences of the trailing history entries and are zero until enough
// samples exist.

pub fn rocket_velocity(world: &World) -> Coordinate {
    let locations = &world.history.rocket.locations;
    let dt = world.parameters.time.timestep;

    match locations.as_slice() {
        [.., previous, current] => (*current - *previous) / dt,
        _ => Coordinate::ZERO,
    }
}

pub fn rocket_acceleration(world: &World) -> Coordinate {
    let locations = &world.history.rocket.locations;
    let dt = world.parameters.time.timestep;

    match locations.as_slice() {
        [.., p0, p1, p2] => {
            let v1 = (*p2 - *p1) / dt;
            let v0 = (*p1 - *p0) / dt;
            (v1 - v0) / dt
        }
        _ => Coordinate::ZERO,
    }
}

/// Angle differences are wrapped so crossing the +-PI seam reads as a small turn.
pub fn rocket_angular_velocity(world: &World) -> f64 {
    let angles = &world.history.rocket.angles;
    let dt = world.parameters.time.timestep;

    match angles.as_slice() {
        [.., previous, current] => normalize_angle(current - previous) / dt,
        _ => 0.0,
    }
}

pub fn rocket_angular_acceleration(world: &World) -> f64 {
    let angles = &world.history.rocket.angles;
    let dt = world.parameters.time.timestep;

    match angles.as_slice() {
        [.., a0, a1, a2] => {
            let w1 = normalize_angle(a2 - a1) / dt;
            let w0 = normalize_angle(a1 - a0) / dt;
            (w1 - w0) / dt
        }
        _ => 0.0,
    }
}

/// Thrust along the current heading from the committed main engine force.
pub fn main_engine_acceleration(world: &World) -> Coordinate {
    let force = world.history.rocket.engine_force(Engine::Main);
    let heading = world.history.rocket.angle();

    Coordinate::from_polar(force, heading) / world.parameters.rocket.mass
}

/// Direction a thruster pushes the rocket: perpendicular to the axis, to the
/// right for the left-side pair and to the left for the right-side pair.
pub fn thruster_angle(world: &World, thruster: Engine) -> f64 {
    let heading = world.history.rocket.angle();
    normalize_angle(heading - thruster.lateral_direction() * FRAC_PI_2)
}

pub fn thruster_acceleration(world: &World, thruster: Engine) -> Coordinate {
    let force = world.history.rocket.engine_force(thruster);

    Coordinate::from_polar(force, thruster_angle(world, thruster)) / world.parameters.rocket.mass
}

pub fn thruster_angular_acceleration(world: &World, thruster: Engine) -> f64 {
    let rocket = &world.parameters.rocket;
    let torque = world.history.rocket.engine_force(thruster) * rocket.thruster_moment_arm();

    thruster.rotation_direction() * torque / rocket.moment_of_inertia()
}

/// Linear and angular acceleration from every committed engine force.
pub fn engine_accelerations(world: &World) -> (Coordinate, f64) {
    Engine::THRUSTERS.iter().fold(
        (main_engine_acceleration(world), 0.0),
        |(linear, angular), &thruster| {
            (
                linear + thruster_acceleration(world, thruster),
                angular + thruster_angular_acceleration(world, thruster),
            )
        },
    )
}
