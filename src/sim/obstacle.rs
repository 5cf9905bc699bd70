//! Platforms, spikes, and the hazard view handed to observers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Rect, Triangle};

/// One of the two horizontal bands platforms are anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Top,
    Bottom,
}

impl Lane {
    pub fn opposite(self) -> Lane {
        match self {
            Lane::Top => Lane::Bottom,
            Lane::Bottom => Lane::Top,
        }
    }
}

/// Sine-law vertical motion around an anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillation {
    /// Peak displacement from the anchor (pixels)
    pub amplitude: f32,
    /// Radians per second
    pub angular_speed: f32,
    /// Current phase (radians)
    pub phase: f32,
    /// Rect top at zero phase
    pub anchor_y: f32,
}

impl Oscillation {
    /// Rect top for the current phase
    pub fn y(&self) -> f32 {
        self.anchor_y + self.amplitude * self.phase.sin()
    }

    /// Lowest and highest rect top this motion can reach
    pub fn envelope(&self) -> (f32, f32) {
        (
            self.anchor_y - self.amplitude.abs(),
            self.anchor_y + self.amplitude.abs(),
        )
    }
}

/// Platform motion model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlatformKind {
    Static,
    Oscillating(Oscillation),
}

/// A scrolling rectangular platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Allocated in generation order; never reused within a level
    pub id: u32,
    pub lane: Lane,
    pub rect: Rect,
    pub kind: PlatformKind,
    /// Vertical displacement applied by the most recent tick
    pub last_dy: f32,
}

impl Platform {
    pub fn new_static(id: u32, lane: Lane, rect: Rect) -> Self {
        Self {
            id,
            lane,
            rect,
            kind: PlatformKind::Static,
            last_dy: 0.0,
        }
    }

    /// Oscillating platform; the rect is placed at the motion's current phase
    pub fn new_oscillating(id: u32, lane: Lane, rect: Rect, oscillation: Oscillation) -> Self {
        Self {
            id,
            lane,
            rect: rect.with_y(oscillation.y()),
            kind: PlatformKind::Oscillating(oscillation),
            last_dy: 0.0,
        }
    }

    pub fn is_oscillating(&self) -> bool {
        matches!(self.kind, PlatformKind::Oscillating(_))
    }

    /// Advance one tick: scroll left, then follow the sine law if oscillating
    pub fn tick(&mut self, scroll_dx: f32, dt: f32) {
        self.rect.x -= scroll_dx;

        if let PlatformKind::Oscillating(ref mut osc) = self.kind {
            let old_y = self.rect.y;
            self.rect.y = osc.y();
            osc.phase += osc.angular_speed * dt;
            self.last_dy = self.rect.y - old_y;
        }
    }

    /// True once the right edge has scrolled past the retirement margin
    pub fn is_retired(&self, retire_margin: f32) -> bool {
        self.rect.right() < -retire_margin
    }

    /// The surface an actor in the lane gap stands on: top for bottom-lane
    /// platforms, underside for top-lane ones
    pub fn lane_surface_y(&self) -> f32 {
        match self.lane {
            Lane::Top => self.rect.bottom(),
            Lane::Bottom => self.rect.top(),
        }
    }

    /// Vertical extent of the rect over the platform's whole motion
    pub fn travel_envelope(&self) -> (f32, f32) {
        match self.kind {
            PlatformKind::Static => (self.rect.top(), self.rect.bottom()),
            PlatformKind::Oscillating(osc) => {
                let (lo, hi) = osc.envelope();
                (lo, hi + self.rect.h)
            }
        }
    }
}

/// Triangular hazard attached to a platform.
///
/// Only the offset within the parent is stored; world vertices are derived
/// from the parent's current rect so spikes ride along with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    pub platform_id: u32,
    pub lane: Lane,
    /// Base center, measured from the parent's left edge
    pub local_x: f32,
    pub base: f32,
    pub height: f32,
}

impl Spike {
    /// World-space triangle: bottom-lane spikes point up from the platform
    /// top, top-lane spikes point down from the platform underside
    pub fn triangle(&self, parent: &Platform) -> Triangle {
        let cx = parent.rect.left() + self.local_x;
        let half = self.base / 2.0;
        match self.lane {
            Lane::Bottom => {
                let y = parent.rect.top();
                Triangle::new(
                    Vec2::new(cx - half, y),
                    Vec2::new(cx + half, y),
                    Vec2::new(cx, y - self.height),
                )
            }
            Lane::Top => {
                let y = parent.rect.bottom();
                Triangle::new(
                    Vec2::new(cx - half, y),
                    Vec2::new(cx + half, y),
                    Vec2::new(cx, y + self.height),
                )
            }
        }
    }

    pub fn hazard(&self, parent: &Platform) -> Hazard {
        Hazard {
            lane: self.lane,
            world_x: parent.rect.left() + self.local_x,
        }
    }
}

/// Observer view of a spike: which lane, and where its center is right now
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub lane: Lane,
    pub world_x: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn bottom_platform() -> Platform {
        Platform::new_static(1, Lane::Bottom, Rect::new(100.0, 420.0, 200.0, 24.0))
    }

    #[test]
    fn test_static_platform_scrolls() {
        let mut p = bottom_platform();
        p.tick(5.0, 1.0 / 60.0);
        assert_eq!(p.rect.x, 95.0);
        assert_eq!(p.rect.y, 420.0);
        assert_eq!(p.last_dy, 0.0);
    }

    #[test]
    fn test_oscillating_platform_follows_sine() {
        let osc = Oscillation {
            amplitude: 50.0,
            angular_speed: FRAC_PI_2,
            phase: 0.0,
            anchor_y: 420.0,
        };
        let mut p = Platform::new_oscillating(2, Lane::Bottom, Rect::new(0.0, 0.0, 100.0, 24.0), osc);
        assert_eq!(p.rect.y, 420.0);

        // First tick samples phase 0, then advances the phase by π/2 over 1 s
        p.tick(0.0, 1.0);
        assert_eq!(p.rect.y, 420.0);
        p.tick(0.0, 1.0);
        assert!((p.rect.y - 470.0).abs() < 1e-3);
        assert!((p.last_dy - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_retirement_margin() {
        let mut p = Platform::new_static(3, Lane::Top, Rect::new(-100.0, 96.0, 50.0, 24.0));
        assert!(!p.is_retired(64.0));
        p.tick(20.0, 1.0 / 60.0);
        assert!(p.is_retired(64.0));
    }

    #[test]
    fn test_spike_triangles_are_flush_with_lane_surface() {
        let bottom = bottom_platform();
        let spike = Spike {
            platform_id: bottom.id,
            lane: Lane::Bottom,
            local_x: 50.0,
            base: 28.0,
            height: 24.0,
        };
        let tri = spike.triangle(&bottom);
        assert_eq!(tri.a, Vec2::new(136.0, 420.0));
        assert_eq!(tri.b, Vec2::new(164.0, 420.0));
        assert_eq!(tri.c, Vec2::new(150.0, 396.0));

        let top = Platform::new_static(4, Lane::Top, Rect::new(0.0, 96.0, 200.0, 24.0));
        let down = Spike {
            platform_id: top.id,
            lane: Lane::Top,
            ..spike
        };
        let tri = down.triangle(&top);
        assert_eq!(tri.a.y, 120.0);
        assert_eq!(tri.c.y, 144.0);
        assert_eq!(down.hazard(&top).world_x, 50.0);
    }

    #[test]
    fn test_spike_rides_parent() {
        let mut p = bottom_platform();
        let spike = Spike {
            platform_id: p.id,
            lane: Lane::Bottom,
            local_x: 10.0,
            base: 28.0,
            height: 24.0,
        };
        let before = spike.hazard(&p).world_x;
        p.tick(4.0, 1.0 / 60.0);
        assert_eq!(spike.hazard(&p).world_x, before - 4.0);
    }

    #[test]
    fn test_travel_envelope() {
        let osc = Oscillation {
            amplitude: 30.0,
            angular_speed: 1.0,
            phase: 1.0,
            anchor_y: 96.0,
        };
        let p = Platform::new_oscillating(5, Lane::Top, Rect::new(0.0, 96.0, 100.0, 24.0), osc);
        assert_eq!(p.travel_envelope(), (66.0, 150.0));
        assert_eq!(Lane::Top.opposite(), Lane::Bottom);
    }
}
