//! Simulation tunables
//!
//! Every knob the simulation reads lives in [`SimConfig`]. Defaults come from
//! [`crate::consts`]; a config can be round-tripped through JSON so experiment
//! harnesses can pin the exact settings of a run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::seconds_to_ticks;

/// Number of look-ahead probes in an observation
pub const PROBE_COUNT: usize = 3;

/// Upper bound on the segments needed to reach the corridor end or the
/// generation horizon
pub const MAX_SEGMENTS_AHEAD: f32 = 4096.0;

/// Rejected configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("{name} range is empty: min {min} >= max {max}")]
    EmptyRange {
        name: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{name} must be a probability in [0, 1], got {value}")]
    BadProbability { name: &'static str, value: f64 },

    #[error("frame_skip must be at least 1")]
    ZeroFrameSkip,

    #[error("oscillation amplitude {amplitude} exceeds the safe band limit {limit}")]
    UnsafeAmplitude { amplitude: f32, limit: f32 },

    #[error("segment width {width} cannot host a spike (needs {needed})")]
    SpikeDoesNotFit { width: f32, needed: f32 },

    #[error("max_consecutive_oscillating must be at least 1")]
    ZeroOscillationStreak,

    #[error("generate_ahead {value} does not cover the screen and probes (needs {needed})")]
    GenerateAheadTooShort { value: f32, needed: f32 },

    #[error("{name} needs {segments} segments, more than {max}")]
    TooManySegments {
        name: &'static str,
        segments: f32,
        max: f32,
    },

    #[error("segment width {width} leaves no time to switch lanes (needs {needed})")]
    LaneSwitchTooShort { width: f32, needed: f32 },

    #[error("lanes overlap: top lane at {top}, bottom lane at {bottom}")]
    LanesOverlap { top: f32, bottom: f32 },

    #[error("invalid config json: {0}")]
    Json(String),
}

/// All simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Timing ===
    /// Fixed physics timestep (seconds)
    pub dt: f32,
    /// Physics sub-steps per decision
    pub frame_skip: u32,
    /// Truncate episodes after this many seconds of simulated time (None = never)
    pub time_limit_seconds: Option<f32>,

    // === World ===
    pub screen_width: f32,
    pub screen_height: f32,
    pub scroll_speed: f32,
    pub gravity: f32,
    pub max_vy: f32,

    // === Actor ===
    pub actor_x: f32,
    pub actor_w: f32,
    pub actor_h: f32,
    pub flip_cooldown_s: f32,
    pub support_grace_s: f32,
    pub side_tolerance: f32,
    pub stick_tolerance: f32,
    pub oob_margin: f32,

    // === Lanes ===
    pub platform_thickness: f32,
    pub lane_top_y: f32,
    pub lane_bottom_y: f32,

    // === Generator ===
    pub segment_min_w: f32,
    pub segment_max_w: f32,
    pub gap_min_w: f32,
    pub gap_max_w: f32,
    pub gap_chance: f64,
    /// Chance that a flat pair is a clean two-lane switch point
    pub lane_switch_chance: f64,
    pub safe_corridor_width: f32,
    pub corridor_segment_width: f32,
    pub generate_ahead: f32,
    pub retire_margin: f32,
    pub oscillation_chance: f64,
    pub amplitude_min: f32,
    pub amplitude_max: f32,
    pub angular_speed_min: f32,
    pub angular_speed_max: f32,
    pub max_consecutive_oscillating: u32,

    // === Spikes ===
    /// Chance that a platform off the guaranteed lane carries spikes
    pub spike_chance: f64,
    pub spike_base: f32,
    pub spike_height: f32,
    pub spike_edge_margin: f32,
    pub spike_gap: f32,
    pub max_spikes_per_platform: u32,

    // === Observation ===
    pub probe_offsets: [f32; PROBE_COUNT],
    /// Half-width of the hazard window around each probe (None = derived from spike base)
    pub hazard_window: Option<f32>,

    // === Rewards ===
    pub reward_alive: f32,
    pub reward_death: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            frame_skip: FRAME_SKIP,
            time_limit_seconds: Some(TIME_LIMIT_SECONDS),

            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            scroll_speed: SCROLL_SPEED,
            gravity: GRAVITY,
            max_vy: MAX_VY,

            actor_x: ACTOR_X,
            actor_w: ACTOR_W,
            actor_h: ACTOR_H,
            flip_cooldown_s: FLIP_COOLDOWN_S,
            support_grace_s: SUPPORT_GRACE_S,
            side_tolerance: SIDE_TOLERANCE,
            stick_tolerance: STICK_TOLERANCE,
            oob_margin: OOB_MARGIN,

            platform_thickness: PLATFORM_THICKNESS,
            lane_top_y: LANE_TOP_Y,
            lane_bottom_y: LANE_BOTTOM_Y,

            segment_min_w: SEGMENT_MIN_W,
            segment_max_w: SEGMENT_MAX_W,
            gap_min_w: GAP_MIN_W,
            gap_max_w: GAP_MAX_W,
            gap_chance: GAP_CHANCE,
            lane_switch_chance: LANE_SWITCH_CHANCE,
            safe_corridor_width: SAFE_CORRIDOR_W,
            corridor_segment_width: CORRIDOR_SEGMENT_W,
            generate_ahead: GENERATE_AHEAD,
            retire_margin: RETIRE_MARGIN,
            oscillation_chance: OSCILLATION_CHANCE,
            amplitude_min: OSCILLATION_AMPLITUDE_MIN,
            amplitude_max: OSCILLATION_AMPLITUDE_MAX,
            angular_speed_min: OSCILLATION_SPEED_MIN,
            angular_speed_max: OSCILLATION_SPEED_MAX,
            max_consecutive_oscillating: MAX_CONSECUTIVE_OSCILLATING,

            spike_chance: SPIKE_CHANCE,
            spike_base: SPIKE_BASE,
            spike_height: SPIKE_HEIGHT,
            spike_edge_margin: SPIKE_EDGE_MARGIN,
            spike_gap: SPIKE_GAP,
            max_spikes_per_platform: MAX_SPIKES_PER_PLATFORM,

            probe_offsets: PROBE_OFFSETS,
            hazard_window: None,

            reward_alive: REWARD_ALIVE,
            reward_death: REWARD_DEATH,
        }
    }
}

impl SimConfig {
    /// Config with a different frame skip (replays pin the recorded value)
    pub fn with_frame_skip(mut self, frame_skip: u32) -> Self {
        self.frame_skip = frame_skip;
        self
    }

    /// Flip cooldown in whole ticks
    pub fn flip_cooldown_ticks(&self) -> u32 {
        seconds_to_ticks(self.flip_cooldown_s, self.dt)
    }

    /// Support grace period in whole ticks
    pub fn support_grace_ticks(&self) -> u32 {
        seconds_to_ticks(self.support_grace_s, self.dt)
    }

    /// Decision count at which a living episode is truncated
    pub fn max_decisions(&self) -> Option<u64> {
        self.time_limit_seconds.map(|secs| {
            let ticks = (secs / self.dt).round() as u64;
            (ticks / u64::from(self.frame_skip.max(1))).max(1)
        })
    }

    /// Scroll distance covered by one physics tick
    pub fn scroll_per_tick(&self) -> f32 {
        self.scroll_speed * self.dt
    }

    /// Top edge of a top-lane platform at rest
    pub fn top_lane_rect_y(&self) -> f32 {
        self.lane_top_y - self.platform_thickness
    }

    /// Top edge of a bottom-lane platform at rest
    pub fn bottom_lane_rect_y(&self) -> f32 {
        self.lane_bottom_y
    }

    /// Largest amplitude whose travel envelope stays out of the opposite lane's
    /// safe band: the space an actor standing on that lane occupies, plus one
    /// actor height of clearance.
    pub fn max_safe_amplitude(&self) -> f32 {
        let lane_gap = self.lane_bottom_y - self.lane_top_y;
        (lane_gap - 2.0 * self.actor_h).max(0.0)
    }

    /// Scroll distance a lane switch needs: one decision of latency, the climb
    /// clear of spike height and the actor's own width
    pub fn lane_switch_run(&self) -> f32 {
        let climb = (2.0 * self.spike_height / self.gravity).sqrt() * self.scroll_speed;
        let latency = self.scroll_per_tick() * self.frame_skip as f32;
        self.actor_w + self.side_tolerance + climb + latency
    }

    /// Smallest `generate_ahead` that keeps the screen and every probe over
    /// generated content
    pub fn min_generate_ahead(&self) -> f32 {
        let reach = self
            .probe_offsets
            .iter()
            .fold(0.0f32, |acc, &o| acc.max(o));
        let sight = self.actor_x + self.actor_w + reach + self.hazard_window();
        self.screen_width.max(sight)
    }

    /// Half-width of the hazard window around each probe
    pub fn hazard_window(&self) -> f32 {
        self.hazard_window
            .unwrap_or_else(|| (self.spike_base / 2.0).max(16.0))
            .max(0.0)
    }

    /// Check every invariant the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_skip == 0 {
            return Err(ConfigError::ZeroFrameSkip);
        }
        if self.max_consecutive_oscillating == 0 {
            return Err(ConfigError::ZeroOscillationStreak);
        }

        let positives = [
            ("dt", self.dt),
            ("screen_width", self.screen_width),
            ("screen_height", self.screen_height),
            ("scroll_speed", self.scroll_speed),
            ("gravity", self.gravity),
            ("max_vy", self.max_vy),
            ("actor_w", self.actor_w),
            ("actor_h", self.actor_h),
            ("platform_thickness", self.platform_thickness),
            ("corridor_segment_width", self.corridor_segment_width),
            ("spike_base", self.spike_base),
            ("spike_height", self.spike_height),
        ];
        for (name, value) in positives {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if let Some(limit) = self.time_limit_seconds {
            if !(limit > 0.0) {
                return Err(ConfigError::NotPositive {
                    name: "time_limit_seconds",
                    value: limit,
                });
            }
        }

        let non_negatives = [
            ("flip_cooldown_s", self.flip_cooldown_s),
            ("support_grace_s", self.support_grace_s),
            ("side_tolerance", self.side_tolerance),
            ("stick_tolerance", self.stick_tolerance),
            ("oob_margin", self.oob_margin),
            ("retire_margin", self.retire_margin),
            ("spike_edge_margin", self.spike_edge_margin),
            ("spike_gap", self.spike_gap),
            ("amplitude_min", self.amplitude_min),
            ("angular_speed_min", self.angular_speed_min),
            ("safe_corridor_width", self.safe_corridor_width),
        ];
        for (name, value) in non_negatives {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }

        let ranges = [
            ("segment width", self.segment_min_w, self.segment_max_w),
            ("gap width", self.gap_min_w, self.gap_max_w),
            ("amplitude", self.amplitude_min, self.amplitude_max),
            (
                "angular speed",
                self.angular_speed_min,
                self.angular_speed_max,
            ),
        ];
        for (name, min, max) in ranges {
            if !(min < max) {
                return Err(ConfigError::EmptyRange { name, min, max });
            }
        }
        if !(self.segment_min_w > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "segment_min_w",
                value: self.segment_min_w,
            });
        }
        if !(self.gap_min_w > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "gap_min_w",
                value: self.gap_min_w,
            });
        }

        for (name, value) in [
            ("gap_chance", self.gap_chance),
            ("lane_switch_chance", self.lane_switch_chance),
            ("oscillation_chance", self.oscillation_chance),
            ("spike_chance", self.spike_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::BadProbability { name, value });
            }
        }

        if self.lane_top_y >= self.lane_bottom_y {
            return Err(ConfigError::LanesOverlap {
                top: self.lane_top_y,
                bottom: self.lane_bottom_y,
            });
        }

        let limit = self.max_safe_amplitude();
        if self.amplitude_max > limit {
            return Err(ConfigError::UnsafeAmplitude {
                amplitude: self.amplitude_max,
                limit,
            });
        }

        let needed = 2.0 * self.spike_edge_margin + self.spike_base;
        if self.max_spikes_per_platform > 0 && self.segment_min_w < needed {
            return Err(ConfigError::SpikeDoesNotFit {
                width: self.segment_min_w,
                needed,
            });
        }

        let needed = self.lane_switch_run();
        if self.segment_min_w < needed {
            return Err(ConfigError::LaneSwitchTooShort {
                width: self.segment_min_w,
                needed,
            });
        }

        let needed = self.min_generate_ahead();
        if !(self.generate_ahead >= needed) {
            return Err(ConfigError::GenerateAheadTooShort {
                value: self.generate_ahead,
                needed,
            });
        }

        let shortest = self.segment_min_w.min(self.gap_min_w);
        for (name, segments) in [
            (
                "safe_corridor_width",
                self.safe_corridor_width / self.corridor_segment_width,
            ),
            ("generate_ahead", self.generate_ahead / shortest),
        ] {
            if !(segments <= MAX_SEGMENTS_AHEAD) {
                return Err(ConfigError::TooManySegments {
                    name,
                    segments,
                    max: MAX_SEGMENTS_AHEAD,
                });
            }
        }

        Ok(())
    }

    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Json(e.to_string()))
    }
}
