use std::collections::HashMap;

use rayon::prelude::*;

use strike_shared::*;
use strike_sim::analyzer::{self, GameMetrics};
use strike_sim::scenario::{random_config, ScenarioOptions};
use strike_sim::{run_game, UnimplementedRocket, UnimplementedTurret};

/// A single game job to be run in parallel.
struct GameJob {
    seed: u64,
    config: GameConfig,
}

struct JobResult {
    seed: u64,
    outcome: Result<(GameResult, GameMetrics), String>,
}

fn run_job(job: &GameJob) -> JobResult {
    let outcome = run_game(
        &job.config,
        Box::new(UnimplementedRocket),
        Box::new(UnimplementedTurret),
    )
    .map(|replay| (replay.result.clone(), analyzer::analyze(&replay)))
    .map_err(|e| e.to_string());

    JobResult {
        seed: job.seed,
        outcome,
    }
}

fn build_jobs(base: &GameConfig, games: u32, seed: u64) -> Vec<GameJob> {
    let options = ScenarioOptions::default();
    (0..games as u64)
        .filter_map(|i| {
            let seed = seed.wrapping_add(i);
            match random_config(base, seed, &options) {
                Ok(config) => Some(GameJob { seed, config }),
                Err(e) => {
                    log::warn!("skipping seed {seed}: {e}");
                    None
                }
            }
        })
        .collect()
}

pub fn cmd_batch(base: &GameConfig, games: u32, seed: u64) {
    let jobs = build_jobs(base, games, seed);
    println!(
        "=== Batch ===\nGames: {} | First seed: {} | Rocket: {:?} | Turret: {:?}",
        jobs.len(),
        seed,
        base.controllers.rocket_active_controller,
        base.controllers.turret_active_controller,
    );

    let start = std::time::Instant::now();
    let results: Vec<JobResult> = jobs.par_iter().map(run_job).collect();
    let elapsed = start.elapsed();

    let mut rocket_wins = 0u32;
    let mut turret_wins = 0u32;
    let mut draws = 0u32;
    let mut causes: HashMap<String, u32> = HashMap::new();
    let mut finished: Vec<&GameMetrics> = Vec::new();

    for r in &results {
        match &r.outcome {
            Ok((result, metrics)) => {
                match result.winner {
                    Winner::Rocket => rocket_wins += 1,
                    Winner::Turret => turret_wins += 1,
                    Winner::Draw => draws += 1,
                }
                *causes.entry(format!("{:?}", result.cause)).or_insert(0) += 1;
                finished.push(metrics);
            }
            Err(e) => eprintln!("Seed {} failed: {}", r.seed, e),
        }
    }

    println!("\n=== Results ({:.1}s) ===", elapsed.as_secs_f32());
    println!("Rocket wins: {rocket_wins}");
    println!("Turret wins: {turret_wins}");
    println!("Draws:       {draws}");

    println!();
    println!("{:<24} {:>6}", "Cause", "Games");
    println!("{:-<24} {:-<6}", "", "");
    let mut sorted: Vec<(&String, &u32)> = causes.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (cause, count) in sorted {
        println!("{:<24} {:>6}", cause, count);
    }

    if !finished.is_empty() {
        let n = finished.len() as f64;
        let mean_duration = finished.iter().map(|m| m.duration).sum::<f64>() / n;
        let mean_shots = finished.iter().map(|m| m.shots_fired as f64).sum::<f64>() / n;
        let mean_approach = finished
            .iter()
            .map(|m| m.closest_approach_to_turret)
            .sum::<f64>()
            / n;

        println!();
        println!("Mean duration:         {:.1}s", mean_duration);
        println!("Mean shots fired:      {:.2}", mean_shots);
        println!("Mean closest approach: {:.1}m", mean_approach);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_use_consecutive_seeds() {
        let jobs = build_jobs(&GameConfig::default(), 4, 10);
        let seeds: Vec<u64> = jobs.iter().map(|j| j.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12, 13]);
        assert_ne!(jobs[0].config, jobs[1].config);
    }

    #[test]
    fn test_job_runs_to_a_result() {
        let mut base = GameConfig::default();
        base.controllers.rocket_check_execution_time = false;
        base.controllers.turret_check_execution_time = false;
        base.time.max_game_time = 5.0;

        let jobs = build_jobs(&base, 1, 0);
        let result = run_job(&jobs[0]);
        let (game, metrics) = result.outcome.unwrap();
        assert!(game.final_time <= 5.0 + 1e-9);
        assert!((metrics.duration - game.final_time).abs() < 1e-12);
    }
}
