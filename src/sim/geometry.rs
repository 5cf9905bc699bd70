//! Rectangle and triangle geometry for collision tests
//!
//! Screen coordinates: x grows right, y grows down. All containment tests are
//! strict, so shapes that merely touch along an edge do not collide. A spike
//! sitting flush on the platform the actor stands on must not kill it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Below this magnitude a denominator is treated as zero
const EPSILON: f32 = 1e-6;

/// Axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Corners in clockwise order starting top-left
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.left(), self.top()),
            Vec2::new(self.right(), self.top()),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.left(), self.bottom()),
        ]
    }

    /// Edges as (start, end) pairs, following [`Rect::corners`]
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let c = self.corners();
        [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]
    }

    /// Strict interior test (points on the border are outside)
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x > self.left() && p.x < self.right() && p.y > self.top() && p.y < self.bottom()
    }

    /// Open-interval overlap (touching rects do not overlap)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Horizontal spans overlap (open interval)
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.left() < other.right() && other.left() < self.right()
    }

    /// Shrink horizontally by `inset` on each side (never below zero width)
    pub fn inset_x(&self, inset: f32) -> Rect {
        let inset = inset.min(self.w / 2.0).max(0.0);
        Rect::new(self.x + inset, self.y, self.w - 2.0 * inset, self.h)
    }

    /// Same rect moved to a new top edge
    pub fn with_y(&self, y: f32) -> Rect {
        Rect { y, ..*self }
    }
}

/// A triangle given by three vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec2,
    pub b: Vec2,
    pub c: Vec2,
}

impl Triangle {
    pub fn new(a: Vec2, b: Vec2, c: Vec2) -> Self {
        Self { a, b, c }
    }

    pub fn vertices(&self) -> [Vec2; 3] {
        [self.a, self.b, self.c]
    }

    pub fn edges(&self) -> [(Vec2, Vec2); 3] {
        [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
    }

    /// Bounding box, used as a cheap pre-filter
    pub fn aabb(&self) -> Rect {
        let min = self.a.min(self.b).min(self.c);
        let max = self.a.max(self.b).max(self.c);
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        point_in_triangle(p, self.a, self.b, self.c)
    }
}

#[inline]
fn cross(u: Vec2, v: Vec2) -> f32 {
    u.x * v.y - u.y * v.x
}

/// Barycentric point-in-triangle test.
///
/// Points on an edge are outside. Degenerate triangles (near-zero area)
/// contain nothing.
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let denom = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if denom.abs() < EPSILON {
        return false;
    }

    let u = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / denom;
    let v = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / denom;
    let w = 1.0 - u - v;

    u > 0.0 && v > 0.0 && w > 0.0
}

/// Proper intersection of segments p1-p2 and q1-q2.
///
/// With r = p2 - p1 and s = q2 - q1, solve p1 + t·r = q1 + u·s. Parallel
/// (and collinear) segments never intersect, and contact at an endpoint does
/// not count.
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = cross(r, s);
    if denom.abs() < EPSILON {
        return false;
    }

    let qp = q1 - p1;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;

    t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0
}

/// Exact rectangle vs triangle overlap.
///
/// Bounding-box overlap alone reports hits on clipped corners where the
/// shapes are actually apart; this test only reports real overlap.
pub fn rect_intersects_triangle(rect: &Rect, tri: &Triangle) -> bool {
    if rect
        .corners()
        .iter()
        .any(|&corner| tri.contains_point(corner))
    {
        return true;
    }

    if tri.vertices().iter().any(|&v| rect.contains_point(v)) {
        return true;
    }

    rect.edges().iter().any(|&(r1, r2)| {
        tri.edges()
            .iter()
            .any(|&(t1, t2)| segments_intersect(r1, r2, t1, t2))
    })
}
