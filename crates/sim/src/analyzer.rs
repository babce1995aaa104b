use serde::{Deserialize, Serialize};
use strike_shared::*;

/// Summary numbers for one finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Shots the turret fired.
    pub shots_fired: u32,
    /// Seconds until the first shot, or None if the turret never fired.
    pub time_to_first_shot: Option<f64>,
    /// Smallest centre-to-centre distance between rocket and turret.
    pub closest_approach_to_turret: f64,
    /// Smallest distance between the rocket and any projectile in flight.
    pub closest_projectile_miss: Option<f64>,
    /// Path length flown by the rocket.
    pub rocket_distance_travelled: f64,
    /// Simulated seconds.
    pub duration: f64,
}

/// Analyze a replay and compute game metrics.
pub fn analyze(replay: &Replay) -> GameMetrics {
    let frames = &replay.frames;
    let turret = replay.parameters.turret.location;
    let rocket_at = |f: &Frame| Coordinate::new(f.rocket_x, f.rocket_y);

    // --- Shots ---
    let shots_fired = replay.shot_times.len() as u32;
    let time_to_first_shot = replay.shot_times.first().copied();

    // --- Distances ---
    let closest_approach_to_turret = frames
        .iter()
        .map(|f| rocket_at(f).distance_to(turret))
        .fold(f64::INFINITY, f64::min);

    let closest_projectile_miss = frames
        .iter()
        .flat_map(|f| {
            let rocket = rocket_at(f);
            f.projectiles
                .iter()
                .map(move |p| rocket.distance_to(Coordinate::new(p.x, p.y)))
        })
        .reduce(f64::min);

    let rocket_distance_travelled = frames
        .windows(2)
        .map(|pair| rocket_at(&pair[0]).distance_to(rocket_at(&pair[1])))
        .sum();

    GameMetrics {
        shots_fired,
        time_to_first_shot,
        closest_approach_to_turret,
        closest_projectile_miss,
        rocket_distance_travelled,
        duration: replay.result.final_time,
    }
}
