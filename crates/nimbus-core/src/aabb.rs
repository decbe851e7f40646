//! Axis-aligned bounding boxes with half-open interval semantics.
//!
//! A box covers `[x, x + width) × [y, y + height)`. Two boxes that only share
//! an edge therefore do not intersect, which keeps adjacent quadrants from
//! double-counting objects. A zero-extent span is treated as a single point
//! `p`, which lies in `[a, b)` when `a <= p < b`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Returns `true` if the half-open span `[a0, a1)` overlaps `[b0, b1)`.
///
/// Zero-length spans are points: a point overlaps a span when it lies inside
/// the span's half-open range, and two points overlap only when equal.
#[inline]
pub fn spans_overlap(a0: f32, a1: f32, b0: f32, b1: f32) -> bool {
    match (a1 > a0, b1 > b0) {
        (true, true) => a0 < b1 && b0 < a1,
        (false, true) => b0 <= a0 && a0 < b1,
        (true, false) => a0 <= b0 && b0 < a1,
        (false, false) => a0 == b0,
    }
}

/// Returns `true` if the span `[inner0, inner1)` lies inside `[outer0, outer1)`.
#[inline]
fn span_contains(outer0: f32, outer1: f32, inner0: f32, inner1: f32) -> bool {
    if inner1 > inner0 {
        inner0 >= outer0 && inner1 <= outer1
    } else {
        inner0 >= outer0 && inner0 < outer1
    }
}

/// An axis-aligned rectangle `{x, y, width, height}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum x coordinate.
    pub x: f32,
    /// Minimum y coordinate.
    pub y: f32,
    /// Extent along x. Never negative.
    pub width: f32,
    /// Extent along y. Never negative.
    pub height: f32,
}

impl Aabb {
    /// Create a box from its minimum corner and extents.
    ///
    /// Negative extents are clamped to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Create a box of the given extents centered on `center`.
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width * 0.5,
            center.y - height * 0.5,
            width,
            height,
        )
    }

    /// The square that bounds a circle of radius `r` around `center`.
    pub fn around_circle(center: Vec2, r: f32) -> Self {
        let r = r.max(0.0);
        Self::new(center.x - r, center.y - r, r * 2.0, r * 2.0)
    }

    /// A zero-extent box at `point`.
    pub fn point(point: Vec2) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    /// Maximum x coordinate (exclusive).
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Maximum y coordinate (exclusive).
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Minimum corner.
    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Returns `true` if every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Exact half-open intersection test.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        spans_overlap(self.x, self.right(), other.x, other.right())
            && spans_overlap(self.y, self.bottom(), other.y, other.bottom())
    }

    /// Returns `true` if `other` lies entirely inside this box.
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        span_contains(self.x, self.right(), other.x, other.right())
            && span_contains(self.y, self.bottom(), other.y, other.bottom())
    }

    /// Returns `true` if `point` lies inside this box (half-open).
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.contains(&Aabb::point(point))
    }

    /// Grow the box by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Split into four equal quadrants.
    ///
    /// Order: `[min-x/min-y, max-x/min-y, min-x/max-y, max-x/max-y]`.
    pub fn quadrants(&self) -> [Aabb; 4] {
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        let mid_x = self.x + hw;
        let mid_y = self.y + hh;
        [
            Aabb::new(self.x, self.y, hw, hh),
            Aabb::new(mid_x, self.y, self.right() - mid_x, hh),
            Aabb::new(self.x, mid_y, hw, self.bottom() - mid_y),
            Aabb::new(mid_x, mid_y, self.right() - mid_x, self.bottom() - mid_y),
        ]
    }

    /// Squared distance from this box's center to `point`.
    #[inline]
    pub fn center_distance_squared(&self, point: Vec2) -> f32 {
        self.center().distance_squared(point)
    }
}
