//! 2D geometric primitives for track geometry and beam casting.
//!
//! Everything here is exact parametric geometry: segment intersection rejects
//! parameters outside the segments, and parallel or collinear pairs count as
//! no intersection. Two intersection flavors exist because the callers need
//! different endpoint semantics: beam casting and collision detection treat an
//! endpoint touch as a hit ([`Edge::intersection`]), while the checkpoint
//! triangulation must ignore the endpoint contacts its connecting segments
//! have with the boundary by construction ([`Edge::crosses`]).

use serde::{Deserialize, Serialize};

/// A 2D point or direction with `f64` components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// 2D cross product (the z component of the 3D cross product).
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Angle of the direction from `from` to `to`, in degrees within [0, 360).
///
/// Zero degrees points along +x and angles grow counterclockwise.
#[must_use]
pub fn direction_angle(from: Vec2, to: Vec2) -> f64 {
    (to.y - from.y)
        .atan2(to.x - from.x)
        .to_degrees()
        .rem_euclid(360.0)
}

/// A directed line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: Vec2,
    pub b: Vec2,
}

impl Edge {
    /// Create a new segment from `a` to `b`.
    #[must_use]
    pub const fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    /// Segment length.
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// Intersection parameters `(t, u)` along `self` and `other`.
    ///
    /// `None` for parallel or collinear segments.
    fn parameters(&self, other: &Edge) -> Option<(f64, f64)> {
        let d1 = self.b - self.a;
        let d2 = other.b - other.a;
        let denom = d1.cross(d2);
        if denom == 0.0 {
            return None;
        }
        let diff = other.a - self.a;
        Some((diff.cross(d2) / denom, diff.cross(d1) / denom))
    }

    /// Intersection point of two segments, endpoints included.
    ///
    /// Returns `None` when the segments miss each other, and for parallel or
    /// collinear pairs.
    #[must_use]
    pub fn intersection(&self, other: &Edge) -> Option<Vec2> {
        let (t, u) = self.parameters(other)?;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(self.a + (self.b - self.a) * t)
        } else {
            None
        }
    }

    /// Whether two segments properly cross, endpoints excluded.
    ///
    /// Segments that merely touch at an endpoint do not cross.
    #[must_use]
    pub fn crosses(&self, other: &Edge) -> bool {
        match self.parameters(other) {
            Some((t, u)) => t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0,
            None => false,
        }
    }
}

/// A triangle given by its three corner points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle(pub [Vec2; 3]);

impl Triangle {
    /// Whether `point` lies inside the triangle, boundary included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let [a, b, c] = self.0;
        let d1 = half_plane(point, a, b);
        let d2 = half_plane(point, b, c);
        let d3 = half_plane(point, c, a);

        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        !(has_neg && has_pos)
    }

    /// Whether any of `points` lies inside the triangle.
    #[must_use]
    pub fn contains_any(&self, points: &[Vec2]) -> bool {
        points.iter().any(|&p| self.contains(p))
    }

    /// The three boundary segments.
    #[must_use]
    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.0;
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// Arithmetic mean of the corner points.
    #[must_use]
    pub fn centroid(&self) -> Vec2 {
        let [a, b, c] = self.0;
        Vec2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }

    /// Whether the interiors of two triangles overlap.
    ///
    /// Triangles that only share an edge or corner do not overlap, so adjacent
    /// checkpoint triangles report `false`.
    #[must_use]
    pub fn overlaps(&self, other: &Triangle) -> bool {
        for mine in &self.edges() {
            for theirs in &other.edges() {
                if mine.crosses(theirs) {
                    return true;
                }
            }
        }
        self.contains_interior(other.centroid()) || other.contains_interior(self.centroid())
    }

    /// Whether `point` lies strictly inside the triangle, boundary excluded.
    fn contains_interior(&self, point: Vec2) -> bool {
        let [a, b, c] = self.0;
        let d1 = half_plane(point, a, b);
        let d2 = half_plane(point, b, c);
        let d3 = half_plane(point, c, a);
        (d1 < 0.0 && d2 < 0.0 && d3 < 0.0) || (d1 > 0.0 && d2 > 0.0 && d3 > 0.0)
    }
}

/// Signed area test placing `point` relative to the directed line `a -> b`.
#[inline]
fn half_plane(point: Vec2, a: Vec2, b: Vec2) -> f64 {
    (point - b).cross(a - b)
}
