//! Flip Runner - a gravity-flip lane runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, obstacles, level, actor, session)
//! - `config`: Data-driven simulation tunables
//! - `trace`: Recorded action traces and exact replay
//! - `policy`: Scripted controllers and episode rollouts

pub mod config;
pub mod policy;
pub mod sim;
pub mod trace;

pub use config::{ConfigError, SimConfig};
pub use policy::{EpisodeSummary, HeuristicPolicy, Policy, RandomPolicy, run_episode};
pub use sim::{Action, DeathCause, EpisodeStatus, Observation, Session, SessionError, Step, StepInfo};
pub use trace::{Trace, TraceError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Physics sub-steps per external decision
    pub const FRAME_SKIP: u32 = 4;
    /// Episode time limit before truncation (seconds)
    pub const TIME_LIMIT_SECONDS: f32 = 30.0;

    /// Visible area (pixels, y grows downward)
    pub const SCREEN_WIDTH: f32 = 960.0;
    pub const SCREEN_HEIGHT: f32 = 540.0;

    /// Leftward scroll speed (pixels/s)
    pub const SCROLL_SPEED: f32 = 250.0;
    /// Gravity magnitude (pixels/s²), sign comes from the actor
    pub const GRAVITY: f32 = 1800.0;
    /// Vertical speed clamp (pixels/s)
    pub const MAX_VY: f32 = 1200.0;
    /// Minimum time between two flips (seconds)
    pub const FLIP_COOLDOWN_S: f32 = 0.18;
    /// How long the actor keeps following an oscillating support after contact (seconds)
    pub const SUPPORT_GRACE_S: f32 = 0.08;

    /// Actor defaults - fixed x, world scrolls left
    pub const ACTOR_X: f32 = 220.0;
    pub const ACTOR_W: f32 = 32.0;
    pub const ACTOR_H: f32 = 32.0;
    /// Horizontal inset applied to platforms during vertical resolution
    pub const SIDE_TOLERANCE: f32 = 2.0;
    /// Horizontal slack when re-snapping to a cached support
    pub const STICK_TOLERANCE: f32 = 8.0;
    /// Vertical distance beyond the screen at which the actor is lost
    pub const OOB_MARGIN: f32 = 80.0;

    /// Lane layout
    pub const PLATFORM_THICKNESS: f32 = 24.0;
    /// Underside of top-lane platforms
    pub const LANE_TOP_Y: f32 = 120.0;
    /// Top surface of bottom-lane platforms
    pub const LANE_BOTTOM_Y: f32 = SCREEN_HEIGHT - 120.0;

    /// Segment widths
    pub const SEGMENT_MIN_W: f32 = 160.0;
    pub const SEGMENT_MAX_W: f32 = 360.0;
    pub const GAP_MIN_W: f32 = 120.0;
    pub const GAP_MAX_W: f32 = 260.0;
    pub const GAP_CHANCE: f64 = 0.3;
    /// Chance that a flat pair moves the guaranteed lane to the other side
    pub const LANE_SWITCH_CHANCE: f64 = 0.25;

    /// Spawn corridor (static, hazard-free flat pairs from x = 0)
    pub const SAFE_CORRIDOR_W: f32 = SCREEN_WIDTH * 2.0;
    pub const CORRIDOR_SEGMENT_W: f32 = SCREEN_WIDTH / 3.0;
    /// Keep generated content this far right of the screen origin
    pub const GENERATE_AHEAD: f32 = SCREEN_WIDTH * 2.0;
    /// Platforms retire once their right edge is this far left of x = 0
    pub const RETIRE_MARGIN: f32 = 64.0;

    /// Oscillating platforms
    pub const OSCILLATION_CHANCE: f64 = 0.3;
    pub const OSCILLATION_AMPLITUDE_MIN: f32 = 30.0;
    pub const OSCILLATION_AMPLITUDE_MAX: f32 = 60.0;
    /// Angular speed range (radians/s)
    pub const OSCILLATION_SPEED_MIN: f32 = 1.0;
    pub const OSCILLATION_SPEED_MAX: f32 = 2.0;
    pub const MAX_CONSECUTIVE_OSCILLATING: u32 = 2;

    /// Spikes (chance is per platform off the guaranteed lane)
    pub const SPIKE_CHANCE: f64 = 0.35;
    pub const SPIKE_BASE: f32 = 28.0;
    pub const SPIKE_HEIGHT: f32 = 24.0;
    pub const SPIKE_EDGE_MARGIN: f32 = 12.0;
    pub const SPIKE_GAP: f32 = 24.0;
    pub const MAX_SPIKES_PER_PLATFORM: u32 = 3;

    /// Observation probes ahead of the actor (pixels)
    pub const PROBE_OFFSETS: [f32; 3] = [120.0, 240.0, 360.0];

    /// Rewards
    pub const REWARD_ALIVE: f32 = 1.0;
    pub const REWARD_DEATH: f32 = -1.0;

    /// Seed used by demos and scenario tests
    pub const SEED_DEFAULT: u64 = 12345;
}

/// Convert a duration in seconds to a whole number of fixed ticks (rounded up)
#[inline]
pub fn seconds_to_ticks(seconds: f32, dt: f32) -> u32 {
    if seconds <= 0.0 || dt <= 0.0 {
        return 0;
    }
    (seconds / dt).ceil() as u32
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}
