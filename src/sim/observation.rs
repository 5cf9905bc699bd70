//! Fixed-layout observation vector
//!
//! Layout (15 x f32, stable):
//! - 0: vertical position, top edge over usable travel, in [0, 1]
//! - 1: vertical velocity over `max_vy`, in [-1, 1]
//! - 2: gravity sign (+1 down, -1 up)
//! - then per probe: ceiling y, floor y, top-lane hazard, bottom-lane hazard

use bytemuck::{Pod, Zeroable};

use super::actor::Actor;
use super::obstacle::{Hazard, Lane, Platform};
use crate::clamp01;
use crate::config::{PROBE_COUNT, SimConfig};

/// Floats per probe
pub const PROBE_DIM: usize = 4;
/// Total observation length
pub const OBS_DIM: usize = 3 + PROBE_COUNT * PROBE_DIM;

/// Ceiling value when no top-lane platform covers a probe
pub const NO_CEILING: f32 = 0.0;
/// Floor value when no bottom-lane platform covers a probe
pub const NO_FLOOR: f32 = 1.0;

/// Look-ahead features sampled at one probe x
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ProbeFeatures {
    /// Nearest top-lane underside over screen height
    pub ceiling: f32,
    /// Nearest bottom-lane top over screen height
    pub floor: f32,
    pub hazard_top: f32,
    pub hazard_bottom: f32,
}

/// Observation handed to controllers
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Observation {
    pub y: f32,
    pub vy: f32,
    pub gravity: f32,
    pub probes: [ProbeFeatures; PROBE_COUNT],
}

impl Observation {
    pub fn as_array(&self) -> &[f32; OBS_DIM] {
        bytemuck::cast_ref(self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn from_array(values: [f32; OBS_DIM]) -> Self {
        bytemuck::cast(values)
    }
}

fn flag(set: bool) -> f32 {
    if set { 1.0 } else { 0.0 }
}

/// Encode the world as seen from the actor.
///
/// Pure: the same inputs always produce the same bits.
pub fn encode(
    config: &SimConfig,
    actor: &Actor,
    platforms: &[Platform],
    hazards: &[Hazard],
) -> Observation {
    let height = config.screen_height.max(1.0);
    let travel = (config.screen_height - actor.h).max(1.0);
    let max_vy = config.max_vy.max(1.0);
    let window = config.hazard_window().max(0.0);

    let probes = config.probe_offsets.map(|offset| {
        let px = actor.x + offset;
        let covers = |p: &&Platform| p.rect.left() <= px && px < p.rect.right();

        let ceiling = platforms
            .iter()
            .filter(|p| p.lane == Lane::Top)
            .filter(covers)
            .map(|p| p.rect.bottom())
            .reduce(f32::max)
            .map_or(NO_CEILING, |y| clamp01(y / height));

        let floor = platforms
            .iter()
            .filter(|p| p.lane == Lane::Bottom)
            .filter(covers)
            .map(|p| p.rect.top())
            .reduce(f32::min)
            .map_or(NO_FLOOR, |y| clamp01(y / height));

        let near = |lane: Lane| {
            hazards
                .iter()
                .any(|h| h.lane == lane && (h.world_x - px).abs() <= window)
        };

        ProbeFeatures {
            ceiling,
            floor,
            hazard_top: flag(near(Lane::Top)),
            hazard_bottom: flag(near(Lane::Bottom)),
        }
    });

    Observation {
        y: clamp01(actor.y / travel),
        vy: actor.vy.clamp(-max_vy, max_vy) / max_vy,
        gravity: actor.gravity.sign(),
        probes,
    }
}
