//! Track boundary model.
//!
//! A track is a closed sequence of directed boundary edges split by a `pivot`
//! index into the inner rail (`0..pivot`) and the outer rail, with two
//! designated edges at the tail: the blocking edge (second to last), which
//! stops the checkpoint triangulation from wrapping around the start, and the
//! finish line (last). This type is the serialization seam for persisted
//! tracks: loaders hand over the edge list and pivot, everything else reads
//! them through the accessors.

use serde::{Deserialize, Serialize};

use crate::math::{Edge, Vec2};

/// Error type for track validation and triangulation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// Not enough edges to form two rails and the two special edges.
    TooFewEdges {
        /// Number of edges supplied.
        count: usize,
    },
    /// The pivot does not split the edges into two non-empty rails.
    PivotOutOfRange {
        /// The supplied pivot.
        pivot: usize,
        /// Number of edges supplied.
        edges: usize,
    },
    /// The boundary admits no usable checkpoint partition.
    DegenerateGeometry {
        /// What failed during the build.
        detail: &'static str,
    },
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackError::TooFewEdges { count } => {
                write!(
                    f,
                    "track needs two boundary rails plus finish and blocking edges, got {} edges",
                    count
                )
            }
            TrackError::PivotOutOfRange { pivot, edges } => {
                write!(
                    f,
                    "pivot {} does not split {} edges into two boundary rails",
                    pivot, edges
                )
            }
            TrackError::DegenerateGeometry { detail } => {
                write!(f, "degenerate track geometry: {}", detail)
            }
        }
    }
}

impl std::error::Error for TrackError {}

/// A closed track boundary with its rail split and special edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    edges: Vec<Edge>,
    pivot: usize,
}

impl Track {
    /// Validate and wrap an ordered boundary-edge list.
    ///
    /// The inner rail occupies `edges[..pivot]`, the outer rail the rest up to
    /// the blocking edge and finish line at the tail.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::TooFewEdges`] or [`TrackError::PivotOutOfRange`]
    /// when the list cannot hold that layout.
    pub fn new(edges: Vec<Edge>, pivot: usize) -> Result<Self, TrackError> {
        if edges.len() < 4 {
            return Err(TrackError::TooFewEdges { count: edges.len() });
        }
        if pivot == 0 || pivot + 2 >= edges.len() {
            return Err(TrackError::PivotOutOfRange {
                pivot,
                edges: edges.len(),
            });
        }
        Ok(Self { edges, pivot })
    }

    /// All boundary edges, inner rail first.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Index separating the inner rail from the outer rail.
    #[must_use]
    pub fn pivot(&self) -> usize {
        self.pivot
    }

    /// The inner rail edges.
    #[must_use]
    pub fn inner(&self) -> &[Edge] {
        &self.edges[..self.pivot]
    }

    /// The outer rail edges, excluding the two special edges.
    #[must_use]
    pub fn outer(&self) -> &[Edge] {
        &self.edges[self.pivot..self.edges.len() - 2]
    }

    /// Both rails, excluding the two special edges.
    ///
    /// This is the solid part of the boundary: collision checks and beam
    /// casting use these, so vehicles pass freely over the finish line and
    /// the blocking edge.
    #[must_use]
    pub fn rail_edges(&self) -> &[Edge] {
        &self.edges[..self.edges.len() - 2]
    }

    /// The edge preventing checkpoint wraparound across the start.
    #[must_use]
    pub fn blocking_edge(&self) -> &Edge {
        &self.edges[self.edges.len() - 2]
    }

    /// The finish line.
    #[must_use]
    pub fn finish_line(&self) -> &Edge {
        &self.edges[self.edges.len() - 1]
    }

    /// Largest bounding-box dimension, used to scale beam reach.
    #[must_use]
    pub fn scale(&self) -> f64 {
        let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for edge in &self.edges {
            for point in [edge.a, edge.b] {
                min.x = min.x.min(point.x);
                min.y = min.y.min(point.y);
                max.x = max.x.max(point.x);
                max.y = max.y.max(point.y);
            }
        }
        (max.x - min.x).max(max.y - min.y)
    }

    /// Whether a closed footprint polygon touches any boundary edge.
    #[must_use]
    pub fn collides(&self, footprint: &[Vec2]) -> bool {
        if footprint.len() < 2 {
            return false;
        }
        for index in 0..footprint.len() {
            let side = Edge::new(footprint[index], footprint[(index + 1) % footprint.len()]);
            for edge in self.rail_edges() {
                if side.intersection(edge).is_some() {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Square ring with the rails starting at the start line: inner rail
    /// 35..75 by 30..70, outer rail 0..100, specials around x = 45..51.
    fn ring_track() -> Track {
        let p = |x: f64, y: f64| Vec2::new(x, y);
        let edges = vec![
            // inner rail (pivot = 5)
            Edge::new(p(50.0, 30.0), p(75.0, 30.0)),
            Edge::new(p(75.0, 30.0), p(75.0, 70.0)),
            Edge::new(p(75.0, 70.0), p(35.0, 70.0)),
            Edge::new(p(35.0, 70.0), p(35.0, 30.0)),
            Edge::new(p(35.0, 30.0), p(50.0, 30.0)),
            // outer rail
            Edge::new(p(50.0, 0.0), p(100.0, 0.0)),
            Edge::new(p(100.0, 0.0), p(100.0, 100.0)),
            Edge::new(p(100.0, 100.0), p(0.0, 100.0)),
            Edge::new(p(0.0, 100.0), p(0.0, 0.0)),
            Edge::new(p(0.0, 0.0), p(50.0, 0.0)),
            // blocking edge, then finish line
            Edge::new(p(45.0, 0.0), p(45.0, 30.0)),
            Edge::new(p(51.0, 0.0), p(51.0, 30.0)),
        ];
        Track::new(edges, 5).unwrap()
    }

    #[test]
    fn test_rail_and_special_edge_accessors() {
        let track = ring_track();
        assert_eq!(track.inner().len(), 5);
        assert_eq!(track.outer().len(), 5);
        assert_eq!(track.rail_edges().len(), 10);
        assert_eq!(track.blocking_edge().a, Vec2::new(45.0, 0.0));
        assert_eq!(track.finish_line().b, Vec2::new(51.0, 30.0));
    }

    #[test]
    fn test_scale_is_bounding_box_extent() {
        let track = ring_track();
        assert!((track.scale() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_layouts() {
        let edge = Edge::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0));

        assert_eq!(
            Track::new(vec![edge; 3], 1),
            Err(TrackError::TooFewEdges { count: 3 })
        );
        assert_eq!(
            Track::new(vec![edge; 6], 0),
            Err(TrackError::PivotOutOfRange { pivot: 0, edges: 6 })
        );
        assert_eq!(
            Track::new(vec![edge; 6], 4),
            Err(TrackError::PivotOutOfRange { pivot: 4, edges: 6 })
        );
    }

    #[test]
    fn test_collides() {
        let track = ring_track();

        // Square footprint inside the corridor, straddling the finish line:
        // the specials are not solid.
        let clear = [
            Vec2::new(48.0, 13.0),
            Vec2::new(52.0, 13.0),
            Vec2::new(52.0, 17.0),
            Vec2::new(48.0, 17.0),
        ];
        assert!(!track.collides(&clear));

        // Same footprint pushed across the inner rail.
        let hitting = [
            Vec2::new(48.0, 28.0),
            Vec2::new(52.0, 28.0),
            Vec2::new(52.0, 32.0),
            Vec2::new(48.0, 32.0),
        ];
        assert!(track.collides(&hitting));
    }

    #[test]
    fn test_serialization_round_trip() {
        let track = ring_track();
        let json = serde_json::to_string(&track).unwrap();
        let restored: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(track, restored);
    }
}
