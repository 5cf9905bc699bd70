//! Flip Runner headless entry point
//!
//! Rolls out the scripted policies over a few fixed seeds, checks that each
//! recorded trace replays exactly, and prints a summary line per episode.
//! An optional first argument names a JSON config file.

use std::error::Error;

use flip_runner::consts::SEED_DEFAULT;
use flip_runner::{EpisodeSummary, HeuristicPolicy, Policy, RandomPolicy, SimConfig, Trace};

const DEMO_SEEDS: [u64; 4] = [SEED_DEFAULT, 1, 2, 3];
const MAX_STEPS: u64 = 10_000;

fn load_config() -> Result<SimConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            let config = SimConfig::from_json(&json)?;
            log::info!("Loaded config from {}", path);
            Ok(config)
        }
        None => Ok(SimConfig::default()),
    }
}

fn report(name: &str, summary: &EpisodeSummary) {
    let outcome = match (summary.terminated, summary.truncated, summary.death_cause) {
        (true, _, Some(cause)) => format!("died ({:?})", cause),
        (_, true, _) => "time limit".to_string(),
        _ => "step cap".to_string(),
    };
    println!(
        "{:<10} seed={:<6} steps={:<4} return={:<7.1} distance={:<8.1} grounded={:>5.1}% {}",
        name,
        summary.seed,
        summary.length,
        summary.total_reward,
        summary.distance,
        summary.grounded_ratio * 100.0,
        outcome
    );
}

fn rollout(
    name: &str,
    config: &SimConfig,
    seed: u64,
    policy: &mut dyn Policy,
) -> Result<(), Box<dyn Error>> {
    let (trace, summary) = Trace::record(config, Some(seed), policy, MAX_STEPS)?;

    let replayed = trace.replay(config)?;
    let matches = replayed.len() as u64 == summary.length
        && replayed.last().map(|s| s.info.distance) == Some(summary.distance);
    if !matches {
        log::warn!("Replay of {} seed={} diverged from the recording", name, seed);
    }

    report(name, &summary);
    log::debug!("Trace {}", trace.to_json()?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    log::info!("Flip Runner (headless) starting...");

    let config = load_config()?;
    config.validate()?;
    log::info!(
        "dt={:.4} frame_skip={} max_decisions={:?}",
        config.dt,
        config.frame_skip,
        config.max_decisions()
    );

    for seed in DEMO_SEEDS {
        rollout("heuristic", &config, seed, &mut HeuristicPolicy::new())?;
        rollout("random", &config, seed, &mut RandomPolicy::new(seed))?;
    }
    Ok(())
}
