//! Endless two-lane level generation
//!
//! The level is a ribbon of segments appended at a frontier that scrolls left
//! with everything else. One lane at a time is the guaranteed lane: its
//! platforms are static, spike-free and at lane height, so standing on it is
//! always survivable. Generation guarantees, in construction order:
//!
//! - the guaranteed lane only moves at a lane-switch pair, where both lanes are
//!   static and clean, and two switch pairs never follow each other;
//! - after a pair containing an oscillating platform, the next pair keeps at
//!   least one lane static;
//! - no more than `max_consecutive_oscillating` pairs in a row oscillate;
//! - oscillation envelopes stay clear of the opposite lane's safe band;
//! - spikes go on at most one lane of a pair, and never on the spawn corridor
//!   or on the guaranteed lane;
//! - a gap opens the lane off the guaranteed one and is never followed by
//!   another gap.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{Rect, Triangle};
use super::obstacle::{Hazard, Lane, Oscillation, Platform, Spike};
use crate::config::SimConfig;

/// Rejection-sampling attempts per spike before giving up on it
const MAX_PLACEMENT_ATTEMPTS: u32 = 8;

/// A generated stretch of level, as reported by [`Level::generate_segment`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// One platform per lane, equal width
    FlatPair {
        x: f32,
        width: f32,
        top_oscillating: bool,
        bottom_oscillating: bool,
        /// Lane whose platform received spikes, if any
        spiked_lane: Option<Lane>,
        /// Guaranteed lane once this pair has been passed
        safe_lane: Lane,
        /// Both lanes static and clean; the guaranteed lane flips here
        lane_switch: bool,
    },
    /// One lane left open with no platform.
    ///
    /// The other lane is the guaranteed lane and stays solid, static and
    /// spike-free: a gap open on both lanes could only be crossed by flipping
    /// mid-air, and flips need ground contact.
    Gap { x: f32, width: f32, open_lane: Lane },
}

impl Segment {
    pub fn width(&self) -> f32 {
        match *self {
            Segment::FlatPair { width, .. } | Segment::Gap { width, .. } => width,
        }
    }

    pub fn has_oscillating(&self) -> bool {
        match *self {
            Segment::FlatPair {
                top_oscillating,
                bottom_oscillating,
                ..
            } => top_oscillating || bottom_oscillating,
            Segment::Gap { .. } => false,
        }
    }

    /// Guaranteed lane at the end of this segment
    pub fn safe_lane(&self) -> Lane {
        match *self {
            Segment::FlatPair { safe_lane, .. } => safe_lane,
            Segment::Gap { open_lane, .. } => open_lane.opposite(),
        }
    }
}

/// Look up a platform by id. Platforms are kept in id order.
pub fn find_platform(platforms: &[Platform], id: u32) -> Option<&Platform> {
    platforms
        .binary_search_by_key(&id, |p| p.id)
        .ok()
        .map(|i| &platforms[i])
}

/// Live level content and its generator state
#[derive(Debug, Clone)]
pub struct Level {
    config: SimConfig,
    seed: u64,
    rng: Pcg32,
    /// Sorted by id (append order, retirement keeps order)
    platforms: Vec<Platform>,
    spikes: Vec<Spike>,
    /// World x where the next segment starts
    frontier_x: f32,
    next_id: u32,
    /// Lane kept static and spike-free
    safe_lane: Lane,
    /// Consecutive flat pairs containing an oscillating platform
    oscillating_streak: u32,
    last_was_gap: bool,
    last_was_switch: bool,
    segments_generated: u64,
}

impl Level {
    /// Build a level. Without a seed, one is drawn from process entropy.
    pub fn new(config: &SimConfig, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        let mut level = Self {
            config: config.clone(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            platforms: Vec::new(),
            spikes: Vec::new(),
            frontier_x: 0.0,
            next_id: 1,
            safe_lane: Lane::Bottom,
            oscillating_streak: 0,
            last_was_gap: false,
            last_was_switch: false,
            segments_generated: 0,
        };

        level.build_corridor();
        let corridor_platforms = level.platforms.len();
        level.fill();

        log::info!(
            "Level seed={}: corridor {} platforms up to x={}, {} platforms live",
            seed,
            corridor_platforms,
            level.config.safe_corridor_width,
            level.platforms.len()
        );
        level
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn spikes(&self) -> &[Spike] {
        &self.spikes
    }

    pub fn frontier_x(&self) -> f32 {
        self.frontier_x
    }

    /// Guaranteed lane at the frontier
    pub fn safe_lane(&self) -> Lane {
        self.safe_lane
    }

    pub fn platform(&self, id: u32) -> Option<&Platform> {
        find_platform(&self.platforms, id)
    }

    /// Hazard view of every live spike
    pub fn hazards(&self) -> Vec<Hazard> {
        self.spikes
            .iter()
            .filter_map(|s| self.platform(s.platform_id).map(|p| s.hazard(p)))
            .collect()
    }

    /// World-space triangles of every live spike
    pub fn spike_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.spikes
            .iter()
            .filter_map(|s| self.platform(s.platform_id).map(|p| s.triangle(p)))
    }

    /// Advance one physics tick: scroll, retire, and extend the frontier
    pub fn tick(&mut self) {
        let dx = self.config.scroll_per_tick();
        let dt = self.config.dt;

        for platform in &mut self.platforms {
            platform.tick(dx, dt);
        }
        self.frontier_x -= dx;

        let margin = self.config.retire_margin;
        let before = self.platforms.len();
        self.platforms.retain(|p| !p.is_retired(margin));
        if self.platforms.len() != before {
            let platforms = &self.platforms;
            self.spikes
                .retain(|s| find_platform(platforms, s.platform_id).is_some());
        }

        self.fill();
    }

    /// Generate segments until the frontier is far enough ahead
    fn fill(&mut self) {
        while self.frontier_x < self.config.generate_ahead {
            self.generate_segment();
        }
    }

    /// Append one segment at the frontier
    pub fn generate_segment(&mut self) -> Segment {
        let gap = !self.last_was_gap && self.rng.random_bool(self.config.gap_chance);
        let segment = if gap {
            self.push_gap()
        } else if !self.last_was_switch && self.rng.random_bool(self.config.lane_switch_chance) {
            self.push_lane_switch()
        } else {
            self.push_flat_pair()
        };

        self.segments_generated += 1;
        log::debug!("segment {}: {:?}", self.segments_generated, segment);
        segment
    }

    /// Static, hazard-free pairs under and ahead of the spawn point
    fn build_corridor(&mut self) {
        let w = self.config.corridor_segment_width;
        while self.frontier_x < self.config.safe_corridor_width {
            let x = self.frontier_x;
            let top = self.make_static(Lane::Top, x, w);
            let bottom = self.make_static(Lane::Bottom, x, w);
            self.platforms.push(top);
            self.platforms.push(bottom);
            self.frontier_x += w;
        }
    }

    fn segment_width(&mut self) -> f32 {
        self.rng
            .random_range(self.config.segment_min_w..self.config.segment_max_w)
    }

    /// Pair whose guaranteed lane stays put; the other lane may oscillate or
    /// carry spikes
    fn push_flat_pair(&mut self) -> Segment {
        let x = self.frontier_x;
        let width = self.segment_width();
        let safe_lane = self.safe_lane;
        let open_lane = safe_lane.opposite();
        let oscillating = self.choose_oscillation();

        let (top_oscillating, bottom_oscillating) = match open_lane {
            Lane::Top => (oscillating, false),
            Lane::Bottom => (false, oscillating),
        };
        // Ids are handed out top first to keep the list sorted
        let top = self.make_platform(Lane::Top, x, width, top_oscillating);
        let bottom = self.make_platform(Lane::Bottom, x, width, bottom_oscillating);
        self.platforms.push(top);
        self.platforms.push(bottom);

        let spiked_lane = if self.rng.random_bool(self.config.spike_chance) {
            let index = match open_lane {
                Lane::Top => self.platforms.len() - 2,
                Lane::Bottom => self.platforms.len() - 1,
            };
            (self.attach_spikes(index) > 0).then_some(open_lane)
        } else {
            None
        };
        assert!(
            spiked_lane != Some(safe_lane),
            "generator spiked the guaranteed lane"
        );

        self.frontier_x += width;
        self.last_was_gap = false;
        self.last_was_switch = false;

        Segment::FlatPair {
            x,
            width,
            top_oscillating,
            bottom_oscillating,
            spiked_lane,
            safe_lane,
            lane_switch: false,
        }
    }

    /// Clean static pair that hands the guaranteed lane to the other side
    fn push_lane_switch(&mut self) -> Segment {
        let x = self.frontier_x;
        let width = self.segment_width();
        let top = self.make_static(Lane::Top, x, width);
        let bottom = self.make_static(Lane::Bottom, x, width);
        self.platforms.push(top);
        self.platforms.push(bottom);

        self.frontier_x += width;
        self.safe_lane = self.safe_lane.opposite();
        self.oscillating_streak = 0;
        self.last_was_gap = false;
        self.last_was_switch = true;

        Segment::FlatPair {
            x,
            width,
            top_oscillating: false,
            bottom_oscillating: false,
            spiked_lane: None,
            safe_lane: self.safe_lane,
            lane_switch: true,
        }
    }

    fn push_gap(&mut self) -> Segment {
        let x = self.frontier_x;
        let width = self
            .rng
            .random_range(self.config.gap_min_w..self.config.gap_max_w);
        let open_lane = self.safe_lane.opposite();

        let solid = self.make_static(self.safe_lane, x, width);
        self.platforms.push(solid);

        self.frontier_x += width;
        self.oscillating_streak = 0;
        self.last_was_gap = true;
        self.last_was_switch = false;

        Segment::Gap {
            x,
            width,
            open_lane,
        }
    }

    /// Decide whether the lane off the guaranteed one oscillates and update
    /// the streak
    fn choose_oscillation(&mut self) -> bool {
        let capped = self.oscillating_streak >= self.config.max_consecutive_oscillating;
        let oscillating = !capped && self.rng.random_bool(self.config.oscillation_chance);
        assert!(
            !(oscillating && capped),
            "generator exceeded the oscillating streak cap"
        );

        self.oscillating_streak = if oscillating { self.oscillating_streak + 1 } else { 0 };
        oscillating
    }

    fn next_platform_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn lane_rect(&self, lane: Lane, x: f32, width: f32) -> Rect {
        let y = match lane {
            Lane::Top => self.config.top_lane_rect_y(),
            Lane::Bottom => self.config.bottom_lane_rect_y(),
        };
        Rect::new(x, y, width, self.config.platform_thickness)
    }

    fn make_static(&mut self, lane: Lane, x: f32, width: f32) -> Platform {
        let rect = self.lane_rect(lane, x, width);
        Platform::new_static(self.next_platform_id(), lane, rect)
    }

    fn make_platform(&mut self, lane: Lane, x: f32, width: f32, oscillating: bool) -> Platform {
        if !oscillating {
            return self.make_static(lane, x, width);
        }

        let rect = self.lane_rect(lane, x, width);
        let amplitude = self
            .rng
            .random_range(self.config.amplitude_min..self.config.amplitude_max)
            .min(self.config.max_safe_amplitude());
        let angular_speed = self
            .rng
            .random_range(self.config.angular_speed_min..self.config.angular_speed_max);
        let phase = self.rng.random_range(0.0..TAU);
        let oscillation = Oscillation {
            amplitude,
            angular_speed,
            phase,
            anchor_y: rect.y,
        };
        Platform::new_oscillating(self.next_platform_id(), lane, rect, oscillation)
    }

    /// Place spikes on the platform at `index`; returns how many were placed
    fn attach_spikes(&mut self, index: usize) -> usize {
        let cfg = &self.config;
        let (platform_id, lane, width) = {
            let p = &self.platforms[index];
            (p.id, p.lane, p.rect.w)
        };
        if cfg.max_spikes_per_platform == 0 {
            return 0;
        }

        let half = cfg.spike_base / 2.0;
        let lo = cfg.spike_edge_margin + half;
        let hi = width - cfg.spike_edge_margin - half;
        if hi < lo {
            return 0;
        }

        let min_spacing = cfg.spike_base + cfg.spike_gap;
        let (base, height) = (cfg.spike_base, cfg.spike_height);
        let count = self.rng.random_range(1..=cfg.max_spikes_per_platform);

        let mut centers: Vec<f32> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            for _ in 0..MAX_PLACEMENT_ATTEMPTS {
                let cx = self.rng.random_range(lo..=hi);
                if centers.iter().all(|&c| (c - cx).abs() >= min_spacing) {
                    centers.push(cx);
                    break;
                }
            }
        }
        centers.sort_by(f32::total_cmp);

        self.spikes.extend(centers.iter().map(|&local_x| Spike {
            platform_id,
            lane,
            local_x,
            base,
            height,
        }));
        centers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> SimConfig {
        SimConfig::default()
    }

    #[test]
    fn test_same_seed_same_level() {
        let mut a = Level::new(&config(), Some(777));
        let mut b = Level::new(&config(), Some(777));
        let seq_a: Vec<Segment> = (0..300).map(|_| a.generate_segment()).collect();
        let seq_b: Vec<Segment> = (0..300).map(|_| b.generate_segment()).collect();
        assert_eq!(seq_a, seq_b);
        assert_eq!(a.platforms(), b.platforms());
        assert_eq!(a.spikes(), b.spikes());
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = Level::new(&config(), Some(1));
        let mut b = Level::new(&config(), Some(2));
        let seq_a: Vec<Segment> = (0..50).map(|_| a.generate_segment()).collect();
        let seq_b: Vec<Segment> = (0..50).map(|_| b.generate_segment()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn test_entropy_seed_is_reported_and_reproducible() {
        let a = Level::new(&config(), None);
        let b = Level::new(&config(), Some(a.seed()));
        assert_eq!(a.platforms(), b.platforms());
        assert_eq!(a.spikes(), b.spikes());
    }

    #[test]
    fn test_corridor_is_static_and_hazard_free() {
        let cfg = config();
        let level = Level::new(&cfg, Some(12345));
        let corridor: Vec<&Platform> = level
            .platforms()
            .iter()
            .filter(|p| p.rect.left() < cfg.safe_corridor_width)
            .collect();

        assert_eq!(corridor.len(), 12);
        assert!(corridor.iter().all(|p| !p.is_oscillating()));
        for p in &corridor {
            assert!(level.spikes().iter().all(|s| s.platform_id != p.id));
        }
        assert!(level.frontier_x() >= cfg.generate_ahead);
    }

    #[test]
    fn test_feasibility_over_ten_thousand_pairs() {
        let cfg = config();
        let limit = cfg.max_safe_amplitude();
        let top_band_floor = cfg.lane_top_y + 2.0 * cfg.actor_h;
        let bottom_band_ceiling = cfg.lane_bottom_y - 2.0 * cfg.actor_h;
        assert!(cfg.lane_top_y + limit <= bottom_band_ceiling + 1e-3);

        let mut pairs = 0;
        let mut seed = 0u64;
        while pairs < 10_000 {
            let mut level = Level::new(&cfg, Some(seed));
            let mut prev_oscillating = false;
            let mut streak = 0;
            let mut prev_was_gap = false;

            for _ in 0..1_000 {
                let segment = level.generate_segment();
                match segment {
                    Segment::FlatPair {
                        top_oscillating,
                        bottom_oscillating,
                        ..
                    } => {
                        pairs += 1;
                        assert!(
                            !(prev_oscillating && top_oscillating && bottom_oscillating),
                            "seed {seed}: both lanes oscillate after an oscillating pair"
                        );
                        let any = top_oscillating || bottom_oscillating;
                        streak = if any { streak + 1 } else { 0 };
                        assert!(streak <= cfg.max_consecutive_oscillating);
                        prev_oscillating = any;
                        prev_was_gap = false;
                    }
                    Segment::Gap { .. } => {
                        assert!(!prev_was_gap, "seed {seed}: two gaps in a row");
                        streak = 0;
                        prev_was_gap = true;
                    }
                }
            }

            for p in level.platforms().iter().filter(|p| p.is_oscillating()) {
                let (top, bottom) = p.travel_envelope();
                match p.lane {
                    Lane::Top => assert!(bottom <= bottom_band_ceiling),
                    Lane::Bottom => assert!(top >= top_band_floor),
                }
            }
            seed += 1;
        }
    }

    #[test]
    fn test_guaranteed_lane_over_ten_thousand_segments() {
        let cfg = config();
        let rest_y = |lane: Lane| match lane {
            Lane::Top => cfg.top_lane_rect_y(),
            Lane::Bottom => cfg.bottom_lane_rect_y(),
        };

        let mut segments = 0;
        let mut switches = 0;
        let mut gaps = 0;
        let mut seed = 0u64;
        while segments < 10_000 {
            let mut level = Level::new(&cfg, Some(seed));
            let mut safe = level.safe_lane();
            let mut prev_switch = false;

            for _ in 0..500 {
                let before = level.platforms().len();
                let segment = level.generate_segment();
                let added = &level.platforms()[before..];
                let clean = |p: &Platform| {
                    !p.is_oscillating()
                        && p.rect.y == rest_y(p.lane)
                        && level.spikes().iter().all(|s| s.platform_id != p.id)
                };

                match segment {
                    Segment::FlatPair {
                        lane_switch: true,
                        safe_lane,
                        spiked_lane,
                        ..
                    } => {
                        assert!(!prev_switch, "seed {seed}: two lane switches in a row");
                        assert_eq!(added.len(), 2);
                        assert!(added.iter().all(|p| clean(p)), "seed {seed}: dirty switch");
                        assert_eq!(spiked_lane, None);
                        assert_eq!(safe_lane, safe.opposite());
                        switches += 1;
                    }
                    Segment::FlatPair {
                        safe_lane,
                        spiked_lane,
                        ..
                    } => {
                        assert_eq!(safe_lane, safe);
                        assert_eq!(added.len(), 2);
                        let guaranteed: Vec<&Platform> =
                            added.iter().filter(|p| p.lane == safe).collect();
                        assert_eq!(guaranteed.len(), 1);
                        assert!(clean(guaranteed[0]), "seed {seed}: guaranteed lane hazard");
                        assert_ne!(spiked_lane, Some(safe));
                    }
                    Segment::Gap { open_lane, .. } => {
                        assert_eq!(open_lane, safe.opposite());
                        assert_eq!(added.len(), 1);
                        assert_eq!(added[0].lane, safe);
                        assert!(clean(&added[0]), "seed {seed}: gap floor hazard");
                        gaps += 1;
                    }
                }

                prev_switch = matches!(segment, Segment::FlatPair { lane_switch: true, .. });
                safe = segment.safe_lane();
                assert_eq!(safe, level.safe_lane());
                segments += 1;
            }
            seed += 1;
        }
        assert!(switches > 100 && gaps > 100);
    }

    #[test]
    fn test_spike_chance_applies_per_platform() {
        let always = SimConfig {
            spike_chance: 1.0,
            gap_chance: 0.0,
            lane_switch_chance: 0.0,
            ..config()
        };
        let mut level = Level::new(&always, Some(8));
        for _ in 0..200 {
            match level.generate_segment() {
                Segment::FlatPair {
                    spiked_lane,
                    safe_lane,
                    ..
                } => assert_eq!(spiked_lane, Some(safe_lane.opposite())),
                other => panic!("unexpected segment {other:?}"),
            }
        }

        let never = SimConfig {
            spike_chance: 0.0,
            ..config()
        };
        let mut level = Level::new(&never, Some(8));
        for _ in 0..200 {
            level.generate_segment();
        }
        assert!(level.spikes().is_empty());
    }

    #[test]
    fn test_spike_placement_rules() {
        let cfg = config();
        let mut level = Level::new(&cfg, Some(4242));
        for _ in 0..2_000 {
            level.generate_segment();
        }

        let mut by_platform: HashMap<u32, Vec<&Spike>> = HashMap::new();
        for spike in level.spikes() {
            by_platform.entry(spike.platform_id).or_default().push(spike);
        }
        assert!(!by_platform.is_empty());

        for (id, spikes) in &by_platform {
            let parent = level.platform(*id).expect("spike parent is live");
            assert!(spikes.len() <= cfg.max_spikes_per_platform as usize);
            for s in spikes {
                assert_eq!(s.lane, parent.lane);
                assert!(s.local_x - s.base / 2.0 >= cfg.spike_edge_margin - 1e-3);
                assert!(s.local_x + s.base / 2.0 <= parent.rect.w - cfg.spike_edge_margin + 1e-3);
            }
            for (i, a) in spikes.iter().enumerate() {
                for b in &spikes[i + 1..] {
                    assert!((a.local_x - b.local_x).abs() >= cfg.spike_base + cfg.spike_gap);
                }
            }
        }

        // Pair partners share x; never both spiked
        for pair in level.platforms().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.rect.x == b.rect.x && a.lane != b.lane {
                assert!(!(by_platform.contains_key(&a.id) && by_platform.contains_key(&b.id)));
            }
        }
    }

    #[test]
    fn test_gap_leaves_one_solid_static_lane() {
        let mut level = Level::new(&config(), Some(99));
        let mut seen_gap = false;
        for _ in 0..500 {
            let before = level.platforms().len();
            if let Segment::Gap { open_lane, x, .. } = level.generate_segment() {
                seen_gap = true;
                let added = &level.platforms()[before..];
                assert_eq!(added.len(), 1);
                assert_eq!(added[0].lane, open_lane.opposite());
                assert_eq!(added[0].rect.x, x);
                assert!(!added[0].is_oscillating());
                assert!(level.spikes().iter().all(|s| s.platform_id != added[0].id));
            }
        }
        assert!(seen_gap);
    }

    #[test]
    fn test_tick_scrolls_retires_and_extends() {
        let cfg = config();
        let mut level = Level::new(&cfg, Some(2024));
        let first_id = level.platforms()[0].id;
        for _ in 0..3_000 {
            level.tick();
            assert!(level.frontier_x() >= cfg.generate_ahead);
        }

        assert!(level.platform(first_id).is_none());
        assert!(
            level
                .platforms()
                .iter()
                .all(|p| !p.is_retired(cfg.retire_margin))
        );
        assert!(
            level
                .spikes()
                .iter()
                .all(|s| level.platform(s.platform_id).is_some())
        );
        assert!(level.platforms().windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(level.hazards().len(), level.spikes().len());
        assert_eq!(level.spike_triangles().count(), level.spikes().len());
    }
}
