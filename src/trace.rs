//! Recorded action traces
//!
//! A trace is the seed, the frame skip in effect and the action sequence.
//! That is enough to rebuild the whole trajectory bit for bit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, SimConfig};
use crate::policy::{EpisodeSummary, Policy, run_episode};
use crate::sim::{Session, SessionError, Step};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("replay failed at action {index}: {source}")]
    Replay {
        index: usize,
        #[source]
        source: SessionError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub seed: u64,
    pub frame_skip: u32,
    pub actions: Vec<u8>,
}

impl Trace {
    pub fn to_json(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, TraceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replay against `config` (its frame skip is overridden by the trace's).
    ///
    /// Returns every step taken. Replay stops early if the episode ends
    /// before the actions run out.
    pub fn replay(&self, config: &SimConfig) -> Result<Vec<Step>, TraceError> {
        let mut session = Session::new(config.clone().with_frame_skip(self.frame_skip))?;
        session.reset(Some(self.seed));

        let mut steps = Vec::with_capacity(self.actions.len());
        for (index, &action) in self.actions.iter().enumerate() {
            let step = session
                .step(action)
                .map_err(|source| TraceError::Replay { index, source })?;
            let over = step.terminated || step.truncated;
            steps.push(step);
            if over {
                break;
            }
        }
        log::debug!(
            "Replayed trace seed={}: {}/{} actions",
            self.seed,
            steps.len(),
            self.actions.len()
        );
        Ok(steps)
    }

    /// Roll out `policy` and record what it did
    pub fn record<P: Policy + ?Sized>(
        config: &SimConfig,
        seed: Option<u64>,
        policy: &mut P,
        max_steps: u64,
    ) -> Result<(Trace, EpisodeSummary), TraceError> {
        let mut session = Session::new(config.clone())?;
        let summary = run_episode(&mut session, policy, seed, max_steps)?;
        let trace = Trace {
            seed: summary.seed,
            frame_skip: config.frame_skip,
            actions: summary.actions.clone(),
        };
        Ok((trace, summary))
    }
}
