//! Scripted controllers and episode rollouts
//!
//! Policies see only the [`Observation`], the same contract an external
//! controller gets.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::observation::{NO_CEILING, NO_FLOOR, ProbeFeatures};
use crate::sim::{Action, DeathCause, Observation, Session, SessionError};

/// Chooses one action per decision
pub trait Policy {
    fn act(&mut self, obs: &Observation) -> Action;
}

/// Flips away from trouble on the nearest probe.
///
/// Trouble in the lane the actor is held to is a spike or a missing surface.
/// The flip is only taken when the other lane at that probe is solid and clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPolicy {
    /// Which probe to look at (0 = nearest)
    pub probe: usize,
}

impl HeuristicPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane_clear(probe: &ProbeFeatures, bottom: bool) -> bool {
        if bottom {
            probe.floor != NO_FLOOR && probe.hazard_bottom == 0.0
        } else {
            probe.ceiling != NO_CEILING && probe.hazard_top == 0.0
        }
    }
}

impl Policy for HeuristicPolicy {
    fn act(&mut self, obs: &Observation) -> Action {
        let Some(probe) = obs.probes.get(self.probe) else {
            return Action::Noop;
        };
        let on_bottom = obs.gravity > 0.0;
        if !Self::lane_clear(probe, on_bottom) && Self::lane_clear(probe, !on_bottom) {
            Action::Flip
        } else {
            Action::Noop
        }
    }
}

/// Seeded coin-flip controller
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: Pcg32,
    flip_chance: f64,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            flip_chance: 0.5,
        }
    }

    pub fn with_flip_chance(mut self, chance: f64) -> Self {
        self.flip_chance = chance.clamp(0.0, 1.0);
        self
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _obs: &Observation) -> Action {
        if self.rng.random_bool(self.flip_chance) {
            Action::Flip
        } else {
            Action::Noop
        }
    }
}

/// Outcome of one rollout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub seed: u64,
    /// Decisions taken
    pub length: u64,
    pub total_reward: f64,
    pub distance: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub death_cause: Option<DeathCause>,
    /// Share of decisions that ended grounded
    pub grounded_ratio: f64,
    pub actions: Vec<u8>,
}

/// Reset `session` and drive it with `policy` until the episode ends or
/// `max_steps` decisions have been taken
pub fn run_episode<P: Policy + ?Sized>(
    session: &mut Session,
    policy: &mut P,
    seed: Option<u64>,
    max_steps: u64,
) -> Result<EpisodeSummary, SessionError> {
    let (mut obs, info) = session.reset(seed);
    let mut summary = EpisodeSummary {
        seed: info.seed,
        length: 0,
        total_reward: 0.0,
        distance: 0.0,
        terminated: false,
        truncated: false,
        death_cause: None,
        grounded_ratio: 0.0,
        actions: Vec::new(),
    };
    let mut grounded = 0u64;

    while summary.length < max_steps {
        let action = policy.act(&obs);
        let step = session.step(action.into())?;

        summary.actions.push(action.into());
        summary.length += 1;
        summary.total_reward += f64::from(step.reward);
        summary.distance = step.info.distance;
        grounded += u64::from(step.info.grounded);
        obs = step.observation;

        if step.terminated || step.truncated {
            summary.terminated = step.terminated;
            summary.truncated = step.truncated;
            summary.death_cause = step.info.death_cause;
            break;
        }
    }

    if summary.length > 0 {
        summary.grounded_ratio = grounded as f64 / summary.length as f64;
    }
    log::debug!(
        "Rollout seed={}: {} steps, return {:.1}, distance {:.1}",
        summary.seed,
        summary.length,
        summary.total_reward,
        summary.distance
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::consts::SEED_DEFAULT;

    fn obs(gravity: f32, probe: ProbeFeatures) -> Observation {
        Observation {
            y: 0.5,
            vy: 0.0,
            gravity,
            probes: [probe; 3],
        }
    }

    fn clear() -> ProbeFeatures {
        ProbeFeatures {
            ceiling: 0.22,
            floor: 0.78,
            hazard_top: 0.0,
            hazard_bottom: 0.0,
        }
    }

    #[test]
    fn test_heuristic_stays_on_clear_lane() {
        let mut policy = HeuristicPolicy::new();
        assert_eq!(policy.act(&obs(1.0, clear())), Action::Noop);
        assert_eq!(policy.act(&obs(-1.0, clear())), Action::Noop);
    }

    #[test]
    fn test_heuristic_flips_away_from_spike_and_gap() {
        let mut policy = HeuristicPolicy::new();
        let spiked = ProbeFeatures {
            hazard_bottom: 1.0,
            ..clear()
        };
        assert_eq!(policy.act(&obs(1.0, spiked)), Action::Flip);

        let no_ceiling = ProbeFeatures {
            ceiling: NO_CEILING,
            ..clear()
        };
        assert_eq!(policy.act(&obs(-1.0, no_ceiling)), Action::Flip);
    }

    #[test]
    fn test_heuristic_holds_when_both_lanes_bad() {
        let mut policy = HeuristicPolicy::new();
        let both = ProbeFeatures {
            hazard_bottom: 1.0,
            hazard_top: 1.0,
            ..clear()
        };
        assert_eq!(policy.act(&obs(1.0, both)), Action::Noop);
    }

    #[test]
    fn test_random_policy_is_seeded() {
        let o = obs(1.0, clear());
        let mut a = RandomPolicy::new(7);
        let mut b = RandomPolicy::new(7);
        let xs: Vec<Action> = (0..64).map(|_| a.act(&o)).collect();
        let ys: Vec<Action> = (0..64).map(|_| b.act(&o)).collect();
        assert_eq!(xs, ys);
        assert!(xs.contains(&Action::Flip));
        assert!(xs.contains(&Action::Noop));

        let mut never = RandomPolicy::new(7).with_flip_chance(0.0);
        assert!((0..64).all(|_| never.act(&o) == Action::Noop));
    }

    #[test]
    fn test_run_episode_summary() {
        let mut session = Session::new(SimConfig::default()).unwrap();
        let mut policy = RandomPolicy::new(3).with_flip_chance(0.0);
        let summary = run_episode(&mut session, &mut policy, Some(SEED_DEFAULT), 50).unwrap();

        assert_eq!(summary.seed, SEED_DEFAULT);
        assert_eq!(summary.length, 50);
        assert_eq!(summary.actions, vec![0; 50]);
        assert_eq!(summary.total_reward, 50.0);
        assert!(!summary.terminated && !summary.truncated);
        assert!(summary.grounded_ratio > 0.5);
        let cfg = session.config();
        assert_eq!(summary.distance, 200.0 * f64::from(cfg.dt) * f64::from(cfg.scroll_speed));
    }

    #[test]
    fn test_run_episode_stops_at_episode_end() {
        let cfg = SimConfig {
            time_limit_seconds: Some(2.0),
            ..SimConfig::default()
        };
        let mut session = Session::new(cfg).unwrap();
        let summary = run_episode(&mut session, &mut HeuristicPolicy::new(), Some(1), 10_000).unwrap();
        assert!(summary.length <= 30);
        assert!(summary.terminated || summary.truncated);
        assert_eq!(summary.actions.len() as u64, summary.length);
    }
}
