use std::f64::consts::{FRAC_PI_2, PI};

use strike_shared::*;

use crate::arena::is_within_bounds;
use crate::controller::{ControllerError, RocketController};
use crate::controllers::tactics::{
    distance_from_line, intercept_angle, read_situation, recharge_fraction, side_of_line,
    Situation,
};
use crate::relative::RelativeObjects;

// Potential field weights
const TURRET_ATTRACTION: f64 = 40.0;
const EDGE_AVOIDANCE: f64 = 20.0;
const OBSTACLE_AVOIDANCE: f64 = 25.0;
const PROJECTILE_AVOIDANCE: f64 = 5.0;
const INTERSECTING_OBSTACLE_AVOIDANCE: f64 = 100.0;
const INTERSECTING_PROJECTILE_AVOIDANCE: f64 = 100.0;
const WITHIN_BUFFER_OBSTACLE_AVOIDANCE: f64 = 15.0;
const WITHIN_BUFFER_PROJECTILE_AVOIDANCE: f64 = 15.0;
const PROJECTILE_PATH_AVOIDANCE: f64 = 2.0;
const FIRING_PATH_AVOIDANCE: f64 = 4.0;

/// Weakest pull toward the turret, however far away it is.
const MIN_TURRET_PULL: f64 = 0.005;

/// Scales the field against the current velocity when choosing a thrust direction.
const DIRECTION_VELOCITY_RATIO: f64 = 140.0;

// PD heading control
const HEADING_P: f64 = 0.75;
const HEADING_D: f64 = -0.35;

/// Field strength used where the inverse-distance terms diverge.
const MAX_STRENGTH: f64 = 1e9;

/// Built-in rocket: steers along a potential field that pulls toward the
/// turret and pushes away from walls, obstacles, projectiles and the barrel
/// line, then splits the engine budget between turning and translating.
pub struct DefaultRocket {
    /// Multiple of the contact distance treated as dangerously close.
    pub safety_buffer: f64,
}

impl DefaultRocket {
    pub fn new() -> Self {
        Self { safety_buffer: 2.0 }
    }
}

impl Default for DefaultRocket {
    fn default() -> Self {
        Self::new()
    }
}

impl RocketController for DefaultRocket {
    fn name(&self) -> &str {
        "default"
    }

    fn calc_inputs(&mut self, world: &mut World) -> Result<Option<RocketInputs>, ControllerError> {
        let world = &*world;
        let situation = read_situation(world);
        let forces = self.engine_forces(world, &situation);
        Ok(Some(clamp_to_limits(forces, &world.parameters.rocket)))
    }
}

impl DefaultRocket {
    fn engine_forces(&self, world: &World, s: &Situation) -> [f64; 5] {
        let rocket = &world.parameters.rocket;
        let direction = self.field_direction(world, s);

        let thrust_direction = direction * DIRECTION_VELOCITY_RATIO - s.rocket_velocity;
        let relative_thrust_angle =
            normalize_angle(thrust_direction.polar_angle() - s.rocket_heading);

        // Turn toward the thrust direction.
        let control = HEADING_P * relative_thrust_angle + HEADING_D * s.rocket_angular_velocity;
        let turn = (control.abs() * rocket.max_thruster_force).min(rocket.max_thruster_force);
        let (clockwise, anticlockwise) = if control < 0.0 { (turn, 0.0) } else { (0.0, turn) };

        // Main, left-front, left-rear, right-front, right-rear
        let mut outputs = [0.0, clockwise, anticlockwise, anticlockwise, clockwise];
        let max_outputs = [
            rocket.max_main_engine_force,
            rocket.max_thruster_force,
            rocket.max_thruster_force,
            rocket.max_thruster_force,
            rocket.max_thruster_force,
        ];
        let remaining: Vec<f64> = max_outputs.iter().zip(outputs).map(|(m, o)| m - o).collect();

        if self.is_within_buffer(world, s) {
            // Get clear: spend what is left on a balanced lateral pair and the main engine.
            if !is_close(relative_thrust_angle, 0.0) && !is_close(relative_thrust_angle.abs(), PI) {
                let (i, j) = if relative_thrust_angle > 0.0 { (3, 4) } else { (1, 2) };
                let extra = remaining[i].min(remaining[j]);
                outputs[i] += extra;
                outputs[j] += extra;
            }
            if relative_thrust_angle.abs() < 3.0 * PI / 4.0 {
                outputs[0] = rocket.max_main_engine_force;
            }
            return outputs;
        }

        if relative_thrust_angle.abs() > FRAC_PI_2 {
            return outputs;
        }

        // Share of the translation each engine carries: the main engine along
        // the axis, one lateral pair across it.
        let left_active = relative_thrust_angle < 0.0;
        let lateral = relative_thrust_angle.sin().abs() / 2.0;
        let left = if left_active { lateral } else { 0.0 };
        let right = if left_active { 0.0 } else { lateral };
        let ratios = [relative_thrust_angle.cos(), left, left, right, right];

        let Some(scale) = max_outputs
            .iter()
            .zip(ratios)
            .filter(|(_, r)| *r > 0.0 && !is_close(*r, 0.0))
            .map(|(m, r)| m / r)
            .reduce(f64::min)
        else {
            return outputs;
        };
        let translation = ratios.map(|r| r * scale);

        if remaining.iter().any(|r| *r <= 0.0) {
            // No headroom left on some engine to translate with.
            return outputs;
        }
        let fill = translation
            .iter()
            .zip(&remaining)
            .map(|(t, r)| t / r)
            .fold(0.0, f64::max);
        if fill <= 0.0 {
            return outputs;
        }

        for (output, t) in outputs.iter_mut().zip(translation) {
            *output += t / fill;
        }
        outputs
    }

    fn field_direction(&self, world: &World, s: &Situation) -> Coordinate {
        turret_attraction(s) * TURRET_ATTRACTION
            + edge_avoidance(world, s) * EDGE_AVOIDANCE
            + obstacle_avoidance(world, s) * OBSTACLE_AVOIDANCE
            + projectile_avoidance(s) * PROJECTILE_AVOIDANCE
            + intersecting_obstacle_avoidance(world, s) * INTERSECTING_OBSTACLE_AVOIDANCE
            + intersecting_projectile_avoidance(world, s) * INTERSECTING_PROJECTILE_AVOIDANCE
            + self.within_buffer_obstacle_avoidance(world, s) * WITHIN_BUFFER_OBSTACLE_AVOIDANCE
            + self.within_buffer_projectile_avoidance(world, s) * WITHIN_BUFFER_PROJECTILE_AVOIDANCE
            + projectile_path_avoidance(s) * PROJECTILE_PATH_AVOIDANCE
            + firing_path_avoidance(world, s) * FIRING_PATH_AVOIDANCE
    }

    fn within_buffer_obstacle_avoidance(&self, world: &World, s: &Situation) -> Coordinate {
        let pushes = world.parameters.environment.obstacles.iter().filter_map(|obstacle| {
            let approach = RelativeObjects::new(s.rocket, obstacle.location)
                .with_velocities(s.rocket_velocity, Coordinate::ZERO)
                .closest_approach();
            let buffer = self.safety_buffer * (s.rocket_radius + obstacle.radius);
            let (rocket_at, _) = approach.locations;

            let near = approach.distance <= buffer;
            (near && is_within_bounds(&world.parameters, rocket_at)).then(|| {
                Coordinate::from_polar(
                    inverse(approach.distance),
                    obstacle.location.bearing_to(rocket_at),
                )
            })
        });
        average(pushes)
    }

    fn within_buffer_projectile_avoidance(&self, world: &World, s: &Situation) -> Coordinate {
        let pushes = s.projectiles.iter().filter_map(|p| {
            let approach = RelativeObjects::new(s.rocket, p.location)
                .with_velocities(s.rocket_velocity, p.velocity)
                .closest_approach();
            let buffer = self.safety_buffer * s.rocket_radius;
            let (rocket_at, projectile_at) = approach.locations;

            let in_play = is_within_bounds(&world.parameters, rocket_at)
                && is_within_bounds(&world.parameters, projectile_at);
            (approach.distance <= buffer && in_play).then(|| {
                let clearance = s.rocket.distance_to(p.location) - s.rocket_radius;
                Coordinate::from_polar(
                    inverse(approach.distance * clearance),
                    projectile_at.bearing_to(rocket_at),
                )
            })
        });
        average(pushes)
    }

    /// Close to a wall, or close to something on a collision course.
    fn is_within_buffer(&self, world: &World, s: &Situation) -> bool {
        let near_obstacle = world.parameters.environment.obstacles.iter().any(|obstacle| {
            let contact = s.rocket_radius + obstacle.radius;
            s.rocket.distance_to(obstacle.location) <= self.safety_buffer * contact
                && RelativeObjects::new(s.rocket, obstacle.location)
                    .with_velocities(s.rocket_velocity, Coordinate::ZERO)
                    .closest_approach()
                    .distance
                    <= contact
        });
        if near_obstacle {
            return true;
        }

        let threshold = self.safety_buffer * s.rocket_radius;
        let near_projectile = s.projectiles.iter().any(|p| {
            s.rocket.distance_to(p.location) <= threshold
                && RelativeObjects::new(s.rocket, p.location)
                    .with_velocities(s.rocket_velocity, p.velocity)
                    .closest_approach()
                    .distance
                    <= s.rocket_radius
        });
        if near_projectile {
            return true;
        }

        let env = &world.parameters.environment;
        env.width / 2.0 - s.rocket.x.abs() <= threshold
            || env.height / 2.0 - s.rocket.y.abs() <= threshold
    }
}

fn turret_attraction(s: &Situation) -> Coordinate {
    let strength = inverse(s.distance_to_turret - s.rocket_radius - s.turret_radius);
    Coordinate::from_polar(strength.max(MIN_TURRET_PULL), s.angle_to_turret)
}

/// Pushes off both walls along one axis.
fn edge_repulsion(position: f64, extent: f64) -> f64 {
    let near = extent / 2.0 + position;
    let far = extent / 2.0 - position;
    if near == 0.0 {
        return MAX_STRENGTH;
    }
    if far == 0.0 {
        return -MAX_STRENGTH;
    }
    inverse(near) - inverse(far)
}

fn edge_avoidance(world: &World, s: &Situation) -> Coordinate {
    let env = &world.parameters.environment;
    Coordinate::new(
        edge_repulsion(s.rocket.x, env.width),
        edge_repulsion(s.rocket.y, env.height),
    )
}

fn obstacle_avoidance(world: &World, s: &Situation) -> Coordinate {
    let pushes = world.parameters.environment.obstacles.iter().map(|obstacle| {
        let delta = s.rocket - obstacle.location;
        Coordinate::from_polar(
            inverse(delta.magnitude() - obstacle.radius - s.rocket_radius),
            delta.polar_angle(),
        )
    });
    average(pushes)
}

fn projectile_avoidance(s: &Situation) -> Coordinate {
    let pushes = s.projectiles.iter().map(|p| {
        let delta = s.rocket - p.location;
        Coordinate::from_polar(inverse(delta.magnitude() - s.rocket_radius), delta.polar_angle())
    });
    average(pushes)
}

/// Obstacles the current course runs into, weighted by how soon.
fn intersecting_obstacle_avoidance(world: &World, s: &Situation) -> Coordinate {
    let pushes = world.parameters.environment.obstacles.iter().filter_map(|obstacle| {
        let objects = RelativeObjects::new(s.rocket, obstacle.location)
            .with_velocities(s.rocket_velocity, Coordinate::ZERO);
        let approach = objects.closest_approach();
        let threshold = s.rocket_radius + obstacle.radius;
        let (rocket_at, _) = approach.locations;

        if approach.distance > threshold || !is_within_bounds(&world.parameters, rocket_at) {
            return None;
        }
        let to_contact = distance_to_contact(&objects, threshold, s.rocket);
        Some(Coordinate::from_polar(
            obstacle.radius * inverse(approach.distance * to_contact),
            obstacle.location.bearing_to(rocket_at),
        ))
    });
    average(pushes)
}

/// Projectiles on a collision course, weighted by how soon.
fn intersecting_projectile_avoidance(world: &World, s: &Situation) -> Coordinate {
    let pushes = s.projectiles.iter().filter_map(|p| {
        let objects = RelativeObjects::new(s.rocket, p.location)
            .with_velocities(s.rocket_velocity, p.velocity);
        let approach = objects.closest_approach();
        let (rocket_at, projectile_at) = approach.locations;

        let in_play = is_within_bounds(&world.parameters, rocket_at)
            && is_within_bounds(&world.parameters, projectile_at);
        if approach.distance > s.rocket_radius || !in_play {
            return None;
        }
        let to_contact = distance_to_contact(&objects, s.rocket_radius, s.rocket);
        Some(Coordinate::from_polar(
            inverse(approach.distance * to_contact),
            projectile_at.bearing_to(rocket_at),
        ))
    });
    average(pushes)
}

/// How far the rocket travels before coming within `threshold`; zero if it already is.
fn distance_to_contact(objects: &RelativeObjects, threshold: f64, rocket: Coordinate) -> f64 {
    objects
        .first_time_within(threshold)
        .map_or(0.0, |contact| rocket.distance_to(contact.locations.0))
}

/// Sidestep the lines projectiles are travelling along.
fn projectile_path_avoidance(s: &Situation) -> Coordinate {
    let pushes = s.projectiles.iter().map(|p| {
        let side = side_of_line(s.rocket, s.turret, p.firing_angle);
        let off_path = distance_from_line(s.rocket, s.turret, p.firing_angle);
        let clearance = s.rocket.distance_to(p.location) - s.rocket_radius;
        Coordinate::from_polar(
            inverse(off_path * clearance),
            normalize_angle(p.firing_angle + side * FRAC_PI_2),
        )
    });
    average(pushes)
}

/// Stay off the barrel line, more urgently when the turret is loaded and on target.
fn firing_path_avoidance(world: &World, s: &Situation) -> Coordinate {
    let alignment = match intercept_angle(world) {
        Some(intercept) => 1.0 - normalize_angle(intercept - s.turret_angle).abs() / PI,
        None => 0.0,
    };
    let urgency = alignment * recharge_fraction(world);

    let side = side_of_line(s.rocket, s.turret, s.turret_angle);
    let off_line = distance_from_line(s.rocket, s.turret, s.turret_angle);
    Coordinate::from_polar(
        urgency * inverse(off_line * s.distance_to_turret),
        normalize_angle(s.turret_angle + side * FRAC_PI_2),
    )
}

/// `1 / x`, bounded so a zero denominator does not poison the field.
fn inverse(x: f64) -> f64 {
    if x == 0.0 {
        MAX_STRENGTH
    } else {
        (1.0 / x).clamp(-MAX_STRENGTH, MAX_STRENGTH)
    }
}

fn average(vectors: impl Iterator<Item = Coordinate>) -> Coordinate {
    let (sum, count) = vectors.fold((Coordinate::ZERO, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        Coordinate::ZERO
    } else {
        sum / count as f64
    }
}

/// Keep every force inside its engine's range; anything non-finite becomes zero.
fn clamp_to_limits(forces: [f64; 5], rocket: &RocketParameters) -> RocketInputs {
    let clamped: Vec<f64> = Engine::ALL
        .iter()
        .zip(forces)
        .map(|(&engine, force)| {
            if force.is_finite() {
                force.clamp(0.0, rocket.max_force(engine))
            } else {
                0.0
            }
        })
        .collect();

    RocketInputs::from_slice(&clamped).unwrap_or_default()
}
