//! Kernel-agnostic 2D geometry: points, vectors, axis-aligned bounds.
//!
//! Every CAM primitive, tessellated ring, and offset result is built from
//! these. Nothing here knows about polarity, winding hierarchy, or curve
//! registration — that's `cam-geometry`'s job.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point or free vector in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z-component of the 3D cross product of two planar vectors; positive
    /// when `other` is counter-clockwise from `self`.
    pub fn cross(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 1e-10 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            *self
        }
    }

    /// The vector rotated 90 degrees counter-clockwise.
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn from_polar(center: Point, radius: f64, angle: f64) -> Self {
        Self::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// An axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.extend(p);
        }
        Some(bbox)
    }

    pub fn extend(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            Point::new(self.min.x - margin, self.min.y - margin),
            Point::new(self.max.x + margin, self.max.y + margin),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Largest absolute coordinate magnitude reachable within this box,
    /// used by the coordinate-bounds validator (spec P9).
    pub fn max_abs_coordinate(&self) -> f64 {
        [self.min.x, self.min.y, self.max.x, self.max.y]
            .into_iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

/// Signed area of a closed ring via the shoelace formula. Positive for
/// counter-clockwise rings, negative for clockwise.
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Winding direction of a ring, derived from its signed area (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Winding {
    CounterClockwise,
    Clockwise,
}

impl Winding {
    pub fn of(ring: &[Point]) -> Self {
        if signed_area(ring) >= 0.0 {
            Winding::CounterClockwise
        } else {
            Winding::Clockwise
        }
    }

    pub fn is_ccw(self) -> bool {
        matches!(self, Winding::CounterClockwise)
    }
}

/// Reverse `ring` in place if it does not match `target` winding.
pub fn normalize_winding(ring: &mut Vec<Point>, target: Winding) {
    if Winding::of(ring) != target {
        ring.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccw_square_has_positive_area() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!(signed_area(&ring) > 0.0);
        assert_eq!(Winding::of(&ring), Winding::CounterClockwise);
    }

    #[test]
    fn cw_square_has_negative_area() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        ];
        assert!(signed_area(&ring) < 0.0);
        assert_eq!(Winding::of(&ring), Winding::Clockwise);
    }

    #[test]
    fn normalize_winding_reverses_when_needed() {
        let mut ring = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        ];
        normalize_winding(&mut ring, Winding::CounterClockwise);
        assert_eq!(Winding::of(&ring), Winding::CounterClockwise);
    }

    #[test]
    fn perpendicular_is_90_degrees_ccw() {
        let v = Point::new(1.0, 0.0);
        let p = v.perpendicular();
        assert!((p.x - 0.0).abs() < 1e-10);
        assert!((p.y - 1.0).abs() < 1e-10);
    }

    #[test]
    fn bounding_box_from_points() {
        let pts = vec![Point::new(-1.0, 2.0), Point::new(3.0, -4.0)];
        let bbox = BoundingBox::from_points(pts).unwrap();
        assert_eq!(bbox.min, Point::new(-1.0, -4.0));
        assert_eq!(bbox.max, Point::new(3.0, 2.0));
    }
}
