//! Deterministic simulation module
//!
//! All runner logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by platform ID)
//! - No rendering or input dependencies

pub mod actor;
pub mod geometry;
pub mod level;
pub mod observation;
pub mod obstacle;
pub mod session;

pub use actor::{Actor, Face, Gravity, SupportContact};
pub use geometry::{Rect, Triangle, point_in_triangle, rect_intersects_triangle, segments_intersect};
pub use level::{Level, Segment};
pub use observation::{OBS_DIM, Observation, ProbeFeatures, encode};
pub use obstacle::{Hazard, Lane, Oscillation, Platform, PlatformKind, Spike};
pub use session::{Action, DeathCause, EpisodeStatus, Session, SessionError, Step, StepInfo};
