use strike_shared::*;

use crate::arena::{
    does_projectile_impact_rocket, does_rocket_impact_turret, has_rocket_hit_obstacle,
    is_game_time_exceeded, is_rocket_within_bounds,
};
use crate::sandbox::TickReport;

/// Holds the terminal cause once one is found. The first cause set wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Referee {
    cause: Option<Cause>,
}

impl Referee {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cause(&self) -> Option<Cause> {
        self.cause
    }

    pub fn winner(&self) -> Option<Winner> {
        self.cause.map(|c| c.winner())
    }

    /// Judge the controller calls of one tick. Runs before movement.
    pub fn check_controllers(&mut self, report: &TickReport) -> Option<Cause> {
        if self.cause.is_none() {
            self.set(controller_cause(report));
        }
        self.cause
    }

    /// Judge the world after movement.
    pub fn check_world(&mut self, world: &World) -> Option<Cause> {
        if self.cause.is_none() {
            self.set(physical_cause(world));
        }
        self.cause
    }

    fn set(&mut self, cause: Option<Cause>) {
        if let Some(cause) = cause {
            log::info!("{cause}");
            self.cause = Some(cause);
        }
    }
}

/// Tampering outranks errors, which outrank overruns, which outrank invalid inputs.
pub fn controller_cause(report: &TickReport) -> Option<Cause> {
    let (rocket, turret) = (&report.rocket, &report.turret);

    if rocket.tampered {
        return Some(Cause::RocketTampered);
    }
    if turret.tampered {
        return Some(Cause::TurretTampered);
    }

    let pick = |r: bool, t: bool, both: Cause, rocket: Cause, turret: Cause| match (r, t) {
        (true, true) => Some(both),
        (true, false) => Some(rocket),
        (false, true) => Some(turret),
        (false, false) => None,
    };

    pick(
        rocket.fault.is_some(),
        turret.fault.is_some(),
        Cause::BothError,
        Cause::RocketError,
        Cause::TurretError,
    )
    .or_else(|| {
        pick(
            rocket.time_exceeded,
            turret.time_exceeded,
            Cause::BothTimeExceeded,
            Cause::RocketTimeExceeded,
            Cause::TurretTimeExceeded,
        )
    })
    .or_else(|| {
        pick(
            rocket.inputs_valid == Some(false),
            turret.inputs_valid == Some(false),
            Cause::BothInputInvalid,
            Cause::RocketInputInvalid,
            Cause::TurretInputInvalid,
        )
    })
}

pub fn physical_cause(world: &World) -> Option<Cause> {
    if !is_rocket_within_bounds(world) {
        return Some(Cause::RocketOutOfBounds);
    }
    if has_rocket_hit_obstacle(world) {
        return Some(Cause::RocketHitObstacle);
    }

    let hit_turret = does_rocket_impact_turret(world);
    let hit_by_projectile = does_projectile_impact_rocket(world);
    match (hit_turret, hit_by_projectile) {
        (true, true) => return Some(Cause::BothDestroyed),
        (true, false) => return Some(Cause::RocketHitTurret),
        (false, true) => return Some(Cause::ProjectileHitRocket),
        (false, false) => {}
    }

    is_game_time_exceeded(world).then_some(Cause::GameTimeExceeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::move_objects;
    use crate::sandbox::SideReport;

    fn clean() -> SideReport {
        SideReport {
            inputs_valid: Some(true),
            ..SideReport::default()
        }
    }

    fn report(rocket: SideReport, turret: SideReport) -> TickReport {
        TickReport {
            rocket,
            turret,
            committed: false,
        }
    }

    #[test]
    fn test_clean_tick_has_no_cause() {
        assert_eq!(controller_cause(&report(clean(), clean())), None);
    }

    #[test]
    fn test_tamper_outranks_everything() {
        let rocket = SideReport {
            fault: Some("x".into()),
            ..clean()
        };
        let turret = SideReport {
            tampered: true,
            ..clean()
        };
        assert_eq!(controller_cause(&report(rocket, turret)), Some(Cause::TurretTampered));

        let both = SideReport {
            tampered: true,
            ..clean()
        };
        assert_eq!(
            controller_cause(&report(both.clone(), both)),
            Some(Cause::RocketTampered)
        );
    }

    #[test]
    fn test_error_outranks_timeout_and_invalid() {
        let rocket = SideReport {
            time_exceeded: true,
            ..clean()
        };
        let turret = SideReport {
            fault: Some("boom".into()),
            inputs_valid: None,
            ..SideReport::default()
        };
        assert_eq!(controller_cause(&report(rocket, turret)), Some(Cause::TurretError));
    }

    #[test]
    fn test_both_sides() {
        let fault = SideReport {
            fault: Some("boom".into()),
            ..SideReport::default()
        };
        assert_eq!(
            controller_cause(&report(fault.clone(), fault)),
            Some(Cause::BothError)
        );

        let slow = SideReport {
            time_exceeded: true,
            ..clean()
        };
        assert_eq!(
            controller_cause(&report(slow.clone(), slow)),
            Some(Cause::BothTimeExceeded)
        );

        let invalid = SideReport {
            inputs_valid: Some(false),
            ..SideReport::default()
        };
        assert_eq!(
            controller_cause(&report(invalid.clone(), invalid.clone())),
            Some(Cause::BothInputInvalid)
        );
        assert_eq!(
            controller_cause(&report(clean(), invalid)),
            Some(Cause::TurretInputInvalid)
        );
    }

    #[test]
    fn test_skipped_turret_is_not_judged() {
        let rocket = SideReport {
            fault: Some("boom".into()),
            ..SideReport::default()
        };
        assert_eq!(
            controller_cause(&report(rocket, SideReport::default())),
            Some(Cause::RocketError)
        );
    }

    #[test]
    fn test_physical_priorities() {
        let mut world = GameConfig::default().world();
        assert_eq!(physical_cause(&world), None);

        world.history.rocket.locations.push(Coordinate::new(3.0, 0.0));
        assert_eq!(physical_cause(&world), Some(Cause::RocketHitTurret));

        world.history.rocket.locations.push(Coordinate::new(150.0, 0.0));
        assert_eq!(physical_cause(&world), Some(Cause::RocketOutOfBounds));

        world.parameters.environment.obstacles.push(Obstacle {
            location: Coordinate::new(50.0, 50.0),
            radius: 5.0,
        });
        world.history.rocket.locations.push(Coordinate::new(52.0, 52.0));
        assert_eq!(physical_cause(&world), Some(Cause::RocketHitObstacle));
    }

    #[test]
    fn test_projectile_and_turret_together_destroy_both() {
        let mut world = GameConfig::default().world();
        world.history.rocket.locations.push(Coordinate::new(7.0, 0.0));
        world.history.time = 0.1;
        world.history.projectiles.push(ProjectileRecord::new(0.0, 0.0));
        assert_eq!(physical_cause(&world), Some(Cause::BothDestroyed));
    }

    #[test]
    fn test_shot_leaving_arena_through_rocket_wins_for_turret() {
        let mut world = GameConfig::default().world();
        world.history.rocket.locations = vec![Coordinate::new(99.0, 0.0)];
        world.history.rocket.push_inputs(&RocketInputs::none());
        world.history.projectiles.push(ProjectileRecord::new(0.0, 0.0));
        world.history.time = 96.0 / 45.0;

        move_objects(&mut world);
        assert!(world.history.active_projectiles().next().is_none());
        assert_eq!(physical_cause(&world), Some(Cause::ProjectileHitRocket));
    }

    #[test]
    fn test_game_time() {
        let mut world = GameConfig::default().world();
        world.history.time = 119.95;
        assert_eq!(physical_cause(&world), Some(Cause::GameTimeExceeded));
        assert_eq!(Cause::GameTimeExceeded.winner(), Winner::Draw);
    }

    #[test]
    fn test_cause_is_set_once() {
        let mut referee = Referee::new();
        let mut world = GameConfig::default().world();
        world.history.rocket.locations.push(Coordinate::new(150.0, 0.0));
        assert_eq!(referee.check_world(&world), Some(Cause::RocketOutOfBounds));

        let turret = SideReport {
            tampered: true,
            ..clean()
        };
        assert_eq!(
            referee.check_controllers(&report(clean(), turret)),
            Some(Cause::RocketOutOfBounds)
        );
        assert_eq!(referee.winner(), Some(Winner::Turret));
    }
}
