//! Ray-beam perception over track boundary edges.
//!
//! Each agent carries a fixed fan of beams at angular offsets relative to its
//! heading. Every tick a beam is cast up to its reach and shortened to the
//! nearest boundary hit; the normalized lengths are the network's input
//! vector, so `1.0` means "nothing in sight" and values near `0.0` mean a
//! wall is close.

use serde::{Deserialize, Serialize};

use crate::math::{Edge, Vec2};
use crate::track::Track;

/// Default beam offsets in degrees relative to the heading: left, front-left,
/// front, front-right, right.
pub const DEFAULT_OFFSETS: [f64; 5] = [270.0, 315.0, 0.0, 45.0, 90.0];

/// A fixed fan of distance-sensing beams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFan {
    offsets: Vec<f64>,
    reach: f64,
}

impl SensorFan {
    /// A fan with the given offsets (degrees relative to heading) and reach.
    #[must_use]
    pub fn new(offsets: Vec<f64>, reach: f64) -> Self {
        Self { offsets, reach }
    }

    /// The default five-beam fan with the given reach.
    #[must_use]
    pub fn with_reach(reach: f64) -> Self {
        Self::new(DEFAULT_OFFSETS.to_vec(), reach)
    }

    /// The default fan sized for a track: reach is `reach_ratio` of the
    /// track's bounding-box scale.
    #[must_use]
    pub fn for_track(track: &Track, reach_ratio: f64) -> Self {
        Self::with_reach(track.scale() * reach_ratio)
    }

    /// Number of beams, which is also the length of every reading vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the fan has no beams.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Maximum beam length.
    #[must_use]
    pub fn reach(&self) -> f64 {
        self.reach
    }

    /// Beam offsets in degrees relative to the heading.
    #[must_use]
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Cast every beam and collect the readings.
    ///
    /// `heading` is in degrees; readings are ordered like the offsets.
    #[must_use]
    pub fn cast(&self, center: Vec2, heading: f64, edges: &[Edge]) -> Vec<f64> {
        let mut readings = Vec::with_capacity(self.offsets.len());
        self.cast_into(center, heading, edges, &mut readings);
        readings
    }

    /// Cast every beam, writing the readings into a reused buffer.
    ///
    /// This is the allocation-free version for the per-tick hot path; the
    /// buffer is cleared first.
    pub fn cast_into(&self, center: Vec2, heading: f64, edges: &[Edge], readings: &mut Vec<f64>) {
        readings.clear();
        for offset in &self.offsets {
            readings.push(self.cast_beam(center, heading + offset, edges));
        }
    }

    /// Normalized distance to the nearest edge along one beam direction;
    /// `1.0` when nothing intersects within reach.
    fn cast_beam(&self, center: Vec2, angle: f64, edges: &[Edge]) -> f64 {
        let radians = angle.to_radians();
        let end = Vec2::new(
            center.x + radians.cos() * self.reach,
            center.y + radians.sin() * self.reach,
        );
        let beam = Edge::new(center, end);

        let mut reading = 1.0_f64;
        for edge in edges {
            if let Some(point) = beam.intersection(edge) {
                let normalized = center.distance(point) / self.reach;
                if normalized < reading {
                    reading = normalized;
                }
            }
        }
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_beam_reads_half_reach() {
        // One boundary edge 10 units ahead, perpendicular to the heading,
        // with a reach of 20: the front sensor reads exactly 0.5.
        let fan = SensorFan::with_reach(20.0);
        let wall = [Edge::new(Vec2::new(10.0, -20.0), Vec2::new(10.0, 20.0))];

        let readings = fan.cast(Vec2::new(0.0, 0.0), 0.0, &wall);
        assert_eq!(readings.len(), 5);

        // Offsets are [left, front-left, front, front-right, right].
        assert!((readings[2] - 0.5).abs() < 1e-9);
        // The diagonal beams hit the same wall farther away.
        let diagonal = std::f64::consts::FRAC_1_SQRT_2;
        assert!((readings[1] - diagonal).abs() < 1e-9);
        assert!((readings[3] - diagonal).abs() < 1e-9);
        // The side beams run parallel to the wall and see nothing.
        assert!((readings[0] - 1.0).abs() < 1e-12);
        assert!((readings[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_detection_reads_one() {
        let fan = SensorFan::with_reach(20.0);
        let wall = [Edge::new(Vec2::new(30.0, -20.0), Vec2::new(30.0, 20.0))];

        let readings = fan.cast(Vec2::new(0.0, 0.0), 0.0, &wall);
        for reading in readings {
            assert!((reading - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_nearest_edge_wins() {
        let fan = SensorFan::new(vec![0.0], 20.0);
        let walls = [
            Edge::new(Vec2::new(15.0, -20.0), Vec2::new(15.0, 20.0)),
            Edge::new(Vec2::new(5.0, -20.0), Vec2::new(5.0, 20.0)),
        ];

        let readings = fan.cast(Vec2::new(0.0, 0.0), 0.0, &walls);
        assert!((readings[0] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_heading_rotates_the_fan() {
        let fan = SensorFan::new(vec![0.0], 20.0);
        let wall = [Edge::new(Vec2::new(-20.0, 10.0), Vec2::new(20.0, 10.0))];

        // Facing +y, the front beam hits the horizontal wall 10 above.
        let readings = fan.cast(Vec2::new(0.0, 0.0), 90.0, &wall);
        assert!((readings[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reading_caps_at_one() {
        // An edge exactly at the beam tip still reads 1.0, never more.
        let fan = SensorFan::new(vec![0.0], 20.0);
        let wall = [Edge::new(Vec2::new(20.0, -5.0), Vec2::new(20.0, 5.0))];

        let readings = fan.cast(Vec2::new(0.0, 0.0), 0.0, &wall);
        assert!(readings[0] <= 1.0);
    }
}
