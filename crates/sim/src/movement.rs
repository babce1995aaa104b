use strike_shared::*;

use crate::arena::{has_hit_obstacle, is_within_bounds, projectile_location_at};
use crate::physics::{engine_accelerations, rocket_angular_velocity, rocket_velocity};

/// Advance the world by one tick using the most recently committed inputs.
///
/// Order matters: the rocket moves first, then projectiles are retired, a
/// shot recorded at the pre-advance time is launched, the turret turns and
/// finally the clock advances.
pub fn move_objects(world: &mut World) {
    move_rocket(world);
    mark_projectiles_off_board(world);

    if should_fire(world) {
        fire_projectile(world);
    }

    rotate_turret(world);
    world.history.time += world.parameters.time.timestep;
}

/// Semi-implicit Euler: velocities first, then positions with the new velocities.
fn move_rocket(world: &mut World) {
    let dt = world.parameters.time.timestep;
    let (acceleration, angular_acceleration) = engine_accelerations(world);

    let velocity = rocket_velocity(world) + acceleration * dt;
    let angular_velocity = rocket_angular_velocity(world) + angular_acceleration * dt;

    let rocket = &mut world.history.rocket;
    let location = rocket.location() + velocity * dt;
    let angle = normalize_angle(rocket.angle() + angular_velocity * dt);
    rocket.locations.push(location);
    rocket.angles.push(angle);
}

/// Projectile positions are derived from launch data, so advancing them is
/// implicit in the clock. Any that will have left the arena or entered an
/// obstacle by the end of this tick are retired for good, stamped with that
/// end-of-tick time so the hit check can still sweep their last stretch.
fn mark_projectiles_off_board(world: &mut World) {
    let end_of_tick = world.history.time + world.parameters.time.timestep;
    let retired: Vec<usize> = world
        .history
        .projectiles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.on_board)
        .filter(|(_, p)| {
            let location = projectile_location_at(&world.parameters, p, end_of_tick);
            !is_within_bounds(&world.parameters, location)
                || has_hit_obstacle(&world.parameters, location, 0.0)
        })
        .map(|(i, _)| i)
        .collect();

    for i in retired {
        world.history.projectiles[i].take_off_board(end_of_tick);
    }
}

/// A shot is recorded at the pre-advance time of the tick it is taken in.
fn should_fire(world: &World) -> bool {
    world
        .history
        .turret
        .last_fired()
        .is_some_and(|last| is_close(last, world.history.time))
}

fn fire_projectile(world: &mut World) {
    let projectile = ProjectileRecord::new(world.history.turret.angle(), world.history.time);
    log::debug!(
        "projectile launched at t={:.2} angle={:.3}",
        projectile.launch_time,
        projectile.firing_angle
    );
    world.history.projectiles.push(projectile);
}

fn rotate_turret(world: &mut World) {
    let dt = world.parameters.time.timestep;
    let turret = &mut world.history.turret;
    let angle = normalize_angle(turret.angle() + turret.rotation_velocity() * dt);
    turret.angles.push(angle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn world() -> World {
        GameConfig::default().world()
    }

    fn commit_turret(world: &mut World, inputs: TurretInputs) {
        let time = world.history.time;
        let turret = &mut world.history.turret;
        turret.rotation_velocities.push(inputs.rotation_velocity);
        if inputs.fire {
            turret.when_fired.push(time);
        }
    }

    fn tick(world: &mut World, rocket: RocketInputs, turret: TurretInputs) {
        world.history.rocket.push_inputs(&rocket);
        commit_turret(world, turret);
        move_objects(world);
    }

    #[test]
    fn test_idle_tick_grows_history_in_lockstep() {
        let mut world = world();
        tick(&mut world, RocketInputs::none(), TurretInputs::none());

        let h = &world.history;
        assert_eq!(h.rocket.locations.len(), 2);
        assert_eq!(h.rocket.angles.len(), 2);
        assert_eq!(h.turret.angles.len(), 2);
        assert_eq!(h.rocket.location(), Coordinate::new(-80.0, 50.0));
        assert!((h.time - 0.1).abs() < 1e-12);
        assert!(h.projectiles.is_empty());
    }

    #[test]
    fn test_main_engine_accelerates_from_rest() {
        let mut world = world();
        let full = RocketInputs { main: 100.0, ..RocketInputs::none() };

        // a = 1 m/s^2: v = 0.1 after one tick, p += 0.01
        tick(&mut world, full, TurretInputs::none());
        assert!((world.history.rocket.location().x - (-79.99)).abs() < 1e-9);

        // v = 0.2, p += 0.02
        tick(&mut world, full, TurretInputs::none());
        assert!((world.history.rocket.location().x - (-79.97)).abs() < 1e-9);
    }

    #[test]
    fn test_rocket_keeps_coasting() {
        let mut world = world();
        let burn = RocketInputs {
            main: 100.0,
            ..RocketInputs::none()
        };
        tick(&mut world, burn, TurretInputs::none());
        let after_burn = world.history.rocket.location();
        tick(&mut world, RocketInputs::none(), TurretInputs::none());
        let v = rocket_velocity(&world);
        assert!((v.x - 0.1).abs() < 1e-9);
        assert!(world.history.rocket.location().x > after_burn.x);
    }

    #[test]
    fn test_fire_launches_at_current_angle_and_time() {
        let mut world = world();
        world.history.turret.angles = vec![0.5];
        tick(&mut world, RocketInputs::none(), TurretInputs { rotation_velocity: 1.0, fire: true });

        let p = world.history.projectiles[0];
        assert_eq!(p.firing_angle, 0.5);
        assert_eq!(p.launch_time, 0.0);
        assert!(p.on_board);
        assert!((world.history.turret.angle() - 0.6).abs() < 1e-12);

        // No second launch on the next tick.
        tick(&mut world, RocketInputs::none(), TurretInputs::none());
        assert_eq!(world.history.projectiles.len(), 1);
    }

    #[test]
    fn test_turret_angle_wraps() {
        let mut world = world();
        world.history.turret.angles = vec![PI - 0.05];
        let turn = TurretInputs {
            rotation_velocity: 1.0,
            fire: false,
        };
        tick(&mut world, RocketInputs::none(), turn);
        let angle = world.history.turret.angle();
        assert!(angle < 0.0 && (angle - (-PI + 0.05)).abs() < 1e-9);
    }

    #[test]
    fn test_projectile_leaving_arena_is_retired() {
        let mut world = world();
        tick(&mut world, RocketInputs::none(), TurretInputs { rotation_velocity: 0.0, fire: true });

        // 100 m to the wall at 45 m/s: gone after 23 ticks.
        for _ in 0..30 {
            tick(&mut world, RocketInputs::none(), TurretInputs::none());
        }
        let retired = world.history.projectiles[0];
        assert!(!retired.on_board);
        // 100 / 45 = 2.22 s, so retired at the end of the tick ending at 2.3 s.
        assert!((retired.retired_at.unwrap() - 2.3).abs() < 1e-9);

        // Sticky.
        tick(&mut world, RocketInputs::none(), TurretInputs::none());
        assert_eq!(world.history.projectiles[0], retired);
    }

    #[test]
    fn test_projectile_entering_obstacle_is_retired() {
        let mut world = world();
        world.parameters.environment.obstacles.push(Obstacle {
            location: Coordinate::new(20.0, 0.0),
            radius: 5.0,
        });
        tick(&mut world, RocketInputs::none(), TurretInputs { rotation_velocity: 0.0, fire: true });
        for _ in 0..4 {
            tick(&mut world, RocketInputs::none(), TurretInputs::none());
        }
        // At t = 0.4 the shot is 18 m out, inside the obstacle.
        assert!(!world.history.projectiles[0].on_board);
    }
}
