//! Actor physics and the swept vertical collision resolver
//!
//! The actor never moves horizontally, so resolution is vertical only. Each
//! tick the actor's leading edge is swept from its previous to its current
//! position and tested against every platform's surface, measured in that
//! platform's own frame (its previous surface for the "before" sample, its
//! current one for the "after" sample). A platform rising into the actor and
//! an actor falling onto a platform are the same crossing.

use serde::{Deserialize, Serialize};

use super::geometry::{Rect, Triangle, rect_intersects_triangle};
use super::level::find_platform;
use super::obstacle::Platform;
use crate::config::SimConfig;

/// Slack on the "before" sample, absorbs float error in reconstructed surfaces
const SURFACE_EPSILON: f32 = 0.01;
/// The leading edge snaps onto a surface it ends within this distance of
const SNAP_TOLERANCE: f32 = 1.0;

/// Direction gravity pulls the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gravity {
    Down,
    Up,
}

impl Gravity {
    /// +1 down, -1 up (screen y grows downward)
    pub fn sign(self) -> f32 {
        match self {
            Gravity::Down => 1.0,
            Gravity::Up => -1.0,
        }
    }

    pub fn flipped(self) -> Gravity {
        match self {
            Gravity::Down => Gravity::Up,
            Gravity::Up => Gravity::Down,
        }
    }

    /// The platform face the actor lands on when falling this way
    pub fn landing_face(self) -> Face {
        match self {
            Gravity::Down => Face::Floor,
            Gravity::Up => Face::Ceiling,
        }
    }
}

/// Platform face touched by the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Face {
    /// Platform top, actor's bottom edge rests on it
    Floor,
    /// Platform underside, actor's top edge rests against it
    Ceiling,
}

/// Cached contact with an oscillating platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportContact {
    pub platform_id: u32,
    pub face: Face,
    /// Ticks left during which a missed sweep may re-snap to this platform
    pub grace_ticks: u32,
}

/// The player-controlled body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Fixed horizontal center
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub vy: f32,
    pub w: f32,
    pub h: f32,
    pub gravity: Gravity,
    pub grounded: bool,
    pub flip_cooldown_ticks: u32,
    pub support: Option<SupportContact>,
}

impl Actor {
    /// Fresh actor centered vertically, gravity down, airborne
    pub fn spawn(config: &SimConfig) -> Self {
        Self {
            x: config.actor_x,
            y: config.screen_height / 2.0 - config.actor_h / 2.0,
            vy: 0.0,
            w: config.actor_w,
            h: config.actor_h,
            gravity: Gravity::Down,
            grounded: false,
            flip_cooldown_ticks: 0,
            support: None,
        }
    }

    /// Collision rectangle with its top edge at `y`
    pub fn rect_at(&self, y: f32) -> Rect {
        Rect::new(self.x - self.w / 2.0, y, self.w, self.h)
    }

    pub fn rect(&self) -> Rect {
        self.rect_at(self.y)
    }

    pub fn can_flip(&self) -> bool {
        self.grounded && self.flip_cooldown_ticks == 0
    }

    /// Flip gravity if grounded and off cooldown. Returns true if performed.
    pub fn try_flip(&mut self, cooldown_ticks: u32) -> bool {
        if !self.can_flip() {
            return false;
        }
        self.gravity = self.gravity.flipped();
        self.vy = 0.0;
        self.grounded = false;
        self.support = None;
        self.flip_cooldown_ticks = cooldown_ticks;
        true
    }

    /// Integrate one tick of signed gravity
    pub fn integrate(&mut self, config: &SimConfig) {
        let dt = config.dt;
        self.flip_cooldown_ticks = self.flip_cooldown_ticks.saturating_sub(1);

        self.vy += self.gravity.sign() * config.gravity * dt;
        self.vy = self.vy.clamp(-config.max_vy, config.max_vy);
        self.y += self.vy * dt;
    }

    /// Resolve platform contact after [`Actor::integrate`].
    ///
    /// `prev_y` is the top edge before integration. Returns the new grounded flag.
    pub fn resolve(&mut self, prev_y: f32, platforms: &[Platform], config: &SimConfig) -> bool {
        // Leading edge follows the actor's own motion, not the platform's
        let face = if self.y > prev_y {
            Face::Floor
        } else if self.y < prev_y {
            Face::Ceiling
        } else {
            self.gravity.landing_face()
        };

        // Ride the cached support: carry its displacement into this tick
        if let Some(support) = self.support {
            if let Some(p) = find_platform(platforms, support.platform_id) {
                self.y += p.last_dy;
            }
        }

        if let Some((platform, surface)) = self.swept_contact(prev_y, face, platforms, config) {
            self.land(platform, face, surface, config);
            return true;
        }

        if self.resnap_to_support(platforms, config) {
            return true;
        }

        self.grounded = false;
        self.support = None;
        false
    }

    /// First surface of `face` crossed by the leading edge this tick
    fn swept_contact<'a>(
        &self,
        prev_y: f32,
        face: Face,
        platforms: &'a [Platform],
        config: &SimConfig,
    ) -> Option<(&'a Platform, f32)> {
        let before = self.rect_at(prev_y);
        let now = self.rect();

        let crossings = platforms.iter().filter_map(|p| {
            let inner = p.rect.inset_x(config.side_tolerance);
            if !now.overlaps_x(&inner) {
                return None;
            }
            match face {
                Face::Floor => {
                    let surface = inner.top();
                    let was = surface - p.last_dy;
                    (before.bottom() <= was + SURFACE_EPSILON
                        && now.bottom() >= surface - SNAP_TOLERANCE)
                        .then_some((p, surface))
                }
                Face::Ceiling => {
                    let surface = inner.bottom();
                    let was = surface - p.last_dy;
                    (before.top() >= was - SURFACE_EPSILON
                        && now.top() <= surface + SNAP_TOLERANCE)
                        .then_some((p, surface))
                }
            }
        });

        match face {
            Face::Floor => crossings.min_by(|a, b| a.1.total_cmp(&b.1)),
            Face::Ceiling => crossings.max_by(|a, b| a.1.total_cmp(&b.1)),
        }
    }

    fn land(&mut self, platform: &Platform, face: Face, surface: f32, config: &SimConfig) {
        self.snap_to(face, surface);
        self.support = platform.is_oscillating().then(|| SupportContact {
            platform_id: platform.id,
            face,
            grace_ticks: config.support_grace_ticks(),
        });
    }

    fn snap_to(&mut self, face: Face, surface: f32) {
        self.y = match face {
            Face::Floor => surface - self.h,
            Face::Ceiling => surface,
        };
        self.vy = 0.0;
        self.grounded = true;
    }

    /// While grace remains, stay on the last support even though this tick's
    /// sweep missed it (the platform edge scrolled just past the actor)
    fn resnap_to_support(&mut self, platforms: &[Platform], config: &SimConfig) -> bool {
        let Some(mut support) = self.support else {
            return false;
        };
        if support.grace_ticks == 0 {
            return false;
        }
        let Some(platform) = find_platform(platforms, support.platform_id) else {
            return false;
        };

        let inner = platform.rect.inset_x(config.side_tolerance);
        let now = self.rect();
        let slack = config.stick_tolerance;
        if now.right() < inner.left() - slack || now.left() > inner.right() + slack {
            return false;
        }

        let surface = match support.face {
            Face::Floor => inner.top(),
            Face::Ceiling => inner.bottom(),
        };
        self.snap_to(support.face, surface);
        support.grace_ticks -= 1;
        self.support = Some(support);
        true
    }

    /// Exact overlap against spike triangles (bounding boxes pre-filter)
    pub fn hits_spike<I>(&self, spikes: I) -> bool
    where
        I: IntoIterator<Item = Triangle>,
    {
        let rect = self.rect();
        spikes
            .into_iter()
            .any(|tri| rect.overlaps(&tri.aabb()) && rect_intersects_triangle(&rect, &tri))
    }

    /// Left the playfield vertically
    pub fn is_out_of_bounds(&self, config: &SimConfig) -> bool {
        self.y < -config.oob_margin || self.y > config.screen_height + config.oob_margin
    }
}
