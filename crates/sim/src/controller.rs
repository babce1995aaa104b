use strike_shared::{RocketInputs, TurretInputs, World};
use thiserror::Error;

/// A controller's own failure, as opposed to a rule violation the sandbox detects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("{0}")]
    Failed(String),
    /// Output that cannot be read as inputs at all, e.g. the wrong number of
    /// engine forces. Judged as invalid inputs rather than an error.
    #[error("malformed inputs: {0}")]
    Malformed(String),
}

/// Produces engine forces for the rocket each tick.
///
/// The world is handed over mutably, as live state is to a script; any change
/// is caught and rolled back by the sandbox and loses the game.
/// `Ok(None)` defers to the built-in rocket controller for this tick.
pub trait RocketController: Send {
    fn name(&self) -> &str;
    fn calc_inputs(&mut self, world: &mut World) -> Result<Option<RocketInputs>, ControllerError>;
}

/// Produces the turret's rotation velocity and fire decision each tick.
pub trait TurretController: Send {
    fn name(&self) -> &str;
    fn calc_inputs(&mut self, world: &mut World) -> Result<Option<TurretInputs>, ControllerError>;
}

/// Rocket that never fires an engine - useful for testing.
pub struct IdleRocket;

impl RocketController for IdleRocket {
    fn name(&self) -> &str {
        "idle"
    }

    fn calc_inputs(&mut self, _world: &mut World) -> Result<Option<RocketInputs>, ControllerError> {
        Ok(Some(RocketInputs::none()))
    }
}

/// Turret that holds still and never fires.
pub struct IdleTurret;

impl TurretController for IdleTurret {
    fn name(&self) -> &str {
        "idle"
    }

    fn calc_inputs(&mut self, _world: &mut World) -> Result<Option<TurretInputs>, ControllerError> {
        Ok(Some(TurretInputs::none()))
    }
}

/// Player slot with nothing written yet: defers to the default every tick.
pub struct UnimplementedRocket;

impl RocketController for UnimplementedRocket {
    fn name(&self) -> &str {
        "player"
    }

    fn calc_inputs(&mut self, _world: &mut World) -> Result<Option<RocketInputs>, ControllerError> {
        Ok(None)
    }
}

pub struct UnimplementedTurret;

impl TurretController for UnimplementedTurret {
    fn name(&self) -> &str {
        "player"
    }

    fn calc_inputs(&mut self, _world: &mut World) -> Result<Option<TurretInputs>, ControllerError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strike_shared::GameConfig;

    #[test]
    fn test_idle_controllers_produce_zero_inputs() {
        let mut world = GameConfig::default().world();
        assert_eq!(
            IdleRocket.calc_inputs(&mut world),
            Ok(Some(RocketInputs::none()))
        );
        assert_eq!(
            IdleTurret.calc_inputs(&mut world),
            Ok(Some(TurretInputs::none()))
        );
    }

    #[test]
    fn test_unimplemented_player_defers() {
        let mut world = GameConfig::default().world();
        assert_eq!(UnimplementedRocket.calc_inputs(&mut world), Ok(None));
        assert_eq!(UnimplementedTurret.calc_inputs(&mut world), Ok(None));
    }
}
