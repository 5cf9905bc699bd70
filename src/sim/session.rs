//! Decision-level stepper
//!
//! A [`Session`] owns one episode at a time. Each decision applies an optional
//! flip, then runs `frame_skip` fixed-dt sub-steps, stopping early on death.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::actor::Actor;
use super::level::Level;
use super::observation::{Observation, encode};
use crate::config::{ConfigError, SimConfig};

/// Controller input for one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    Noop = 0,
    Flip = 1,
}

impl TryFrom<u8> for Action {
    type Error = SessionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Noop),
            1 => Ok(Action::Flip),
            other => Err(SessionError::InvalidAction(other)),
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> u8 {
        action as u8
    }
}

/// Why an episode terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Hazard,
    OutOfBounds,
}

/// Episode lifecycle. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeStatus {
    Running,
    Terminated(DeathCause),
    /// Decision limit reached while alive
    Truncated,
}

impl EpisodeStatus {
    pub fn is_over(self) -> bool {
        !matches!(self, EpisodeStatus::Running)
    }

    pub fn death_cause(self) -> Option<DeathCause> {
        match self {
            EpisodeStatus::Terminated(cause) => Some(cause),
            _ => None,
        }
    }
}

/// Per-step metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub seed: u64,
    /// Cumulative scroll distance (pixels)
    pub distance: f64,
    /// Decisions taken so far
    pub decision: u64,
    pub grounded: bool,
    pub death_cause: Option<DeathCause>,
    /// A flip was performed at the start of this decision
    pub flipped: bool,
}

/// Result of one decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("invalid action {0}: expected 0 (noop) or 1 (flip)")]
    InvalidAction(u8),

    #[error("step called before reset")]
    NotReset,

    #[error("episode is over, call reset")]
    EpisodeOver,
}

#[derive(Debug, Clone)]
struct Episode {
    level: Level,
    actor: Actor,
    sub_steps: u64,
    decisions: u64,
    status: EpisodeStatus,
}

/// Owns the simulation state for one episode at a time
#[derive(Debug, Clone)]
pub struct Session {
    config: SimConfig,
    max_decisions: Option<u64>,
    flip_cooldown_ticks: u32,
    episode: Option<Episode>,
}

impl Session {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            max_decisions: config.max_decisions(),
            flip_cooldown_ticks: config.flip_cooldown_ticks(),
            config,
            episode: None,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Start a fresh episode. Without a seed one is drawn from entropy.
    pub fn reset(&mut self, seed: Option<u64>) -> (Observation, StepInfo) {
        let level = Level::new(&self.config, seed);
        let actor = Actor::spawn(&self.config);
        log::info!("Episode reset: seed={}", level.seed());

        let episode = self.episode.insert(Episode {
            level,
            actor,
            sub_steps: 0,
            decisions: 0,
            status: EpisodeStatus::Running,
        });
        let observation = observe(&self.config, episode);
        let info = info(&self.config, episode, false);
        (observation, info)
    }

    /// Advance one decision
    pub fn step(&mut self, action: u8) -> Result<Step, SessionError> {
        let action = Action::try_from(action)?;
        let config = &self.config;
        let episode = self.episode.as_mut().ok_or(SessionError::NotReset)?;
        if episode.status.is_over() {
            return Err(SessionError::EpisodeOver);
        }

        let flipped = action == Action::Flip && episode.actor.try_flip(self.flip_cooldown_ticks);
        if flipped {
            log::debug!(
                "Flip at decision {}: gravity {:?}",
                episode.decisions,
                episode.actor.gravity
            );
        }

        let mut death = None;
        for _ in 0..config.frame_skip {
            episode.level.tick();

            let actor = &mut episode.actor;
            let prev_y = actor.y;
            actor.integrate(config);
            actor.resolve(prev_y, episode.level.platforms(), config);
            episode.sub_steps += 1;

            death = if actor.hits_spike(episode.level.spike_triangles()) {
                Some(DeathCause::Hazard)
            } else if actor.is_out_of_bounds(config) {
                Some(DeathCause::OutOfBounds)
            } else {
                None
            };
            if death.is_some() {
                break;
            }
        }
        episode.decisions += 1;

        episode.status = match death {
            Some(cause) => EpisodeStatus::Terminated(cause),
            None if self
                .max_decisions
                .is_some_and(|limit| episode.decisions >= limit) =>
            {
                EpisodeStatus::Truncated
            }
            None => EpisodeStatus::Running,
        };

        let terminated = death.is_some();
        let truncated = episode.status == EpisodeStatus::Truncated;
        let reward = if terminated {
            config.reward_death
        } else {
            config.reward_alive
        };

        let info = info(config, episode, flipped);
        if episode.status.is_over() {
            log::info!(
                "Episode over: seed={} status={:?} distance={:.1} decisions={}",
                info.seed,
                episode.status,
                info.distance,
                info.decision
            );
        }

        Ok(Step {
            observation: observe(config, episode),
            reward,
            terminated,
            truncated,
            info,
        })
    }

    pub fn level(&self) -> Option<&Level> {
        self.episode.as_ref().map(|e| &e.level)
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.episode.as_ref().map(|e| &e.actor)
    }

    /// `None` before the first reset
    pub fn status(&self) -> Option<EpisodeStatus> {
        self.episode.as_ref().map(|e| e.status)
    }

    pub fn seed(&self) -> Option<u64> {
        self.episode.as_ref().map(|e| e.level.seed())
    }

    /// Observation of the current state without stepping
    pub fn observation(&self) -> Option<Observation> {
        self.episode.as_ref().map(|e| observe(&self.config, e))
    }
}

fn observe(config: &SimConfig, episode: &Episode) -> Observation {
    encode(
        config,
        &episode.actor,
        episode.level.platforms(),
        &episode.level.hazards(),
    )
}

fn info(config: &SimConfig, episode: &Episode, flipped: bool) -> StepInfo {
    StepInfo {
        seed: episode.level.seed(),
        distance: episode.sub_steps as f64 * f64::from(config.dt) * f64::from(config.scroll_speed),
        decision: episode.decisions,
        grounded: episode.actor.grounded,
        death_cause: episode.status.death_cause(),
        flipped,
    }
}
