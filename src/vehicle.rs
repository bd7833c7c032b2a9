//! Vehicle control seam and per-generation agent slots.
//!
//! Vehicle kinematics are supplied by the embedding application; this crate
//! only drives them. A [`VehicleBody`] turns network outputs into a new pose
//! and exposes the geometry the oracle and the sensors need. An [`Agent`]
//! pairs one body with its per-generation activity flags; agents live in a
//! flat arena indexed by population slot, and their fitness state lives in
//! the checkpoint map under the same index.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// One tick's control outputs, in network output order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Controls {
    /// Steering ratio, negative for one side and positive for the other.
    pub steer: f64,
    /// Forward drive ratio.
    pub throttle: f64,
    /// Braking ratio.
    pub brake: f64,
}

impl Controls {
    /// Number of control channels a network must produce.
    pub const COUNT: usize = 3;

    /// Build controls from a network's output vector.
    ///
    /// # Panics
    ///
    /// Panics if `outputs` does not hold exactly [`Controls::COUNT`] values;
    /// drivers validate network output counts before the first tick.
    #[must_use]
    pub fn from_outputs(outputs: &[f64]) -> Self {
        assert_eq!(
            outputs.len(),
            Self::COUNT,
            "control output mismatch: expected {}, got {}",
            Self::COUNT,
            outputs.len()
        );
        Self {
            steer: outputs[0],
            throttle: outputs[1],
            brake: outputs[2],
        }
    }
}

/// The vehicle-physics collaborator.
///
/// Implementations own pose and kinematics; the trait only promises the
/// queries the core needs: applying one tick of controls, and exposing the
/// footprint polygon, center and heading (in degrees) for fitness scoring,
/// collision checks and beam casting.
pub trait VehicleBody {
    /// Integrate one tick of controls over `dt` simulated seconds.
    fn apply_controls(&mut self, controls: Controls, dt: f64);

    /// The body polygon used for checkpoint and collision tests.
    fn footprint(&self) -> &[Vec2];

    /// The beam origin.
    fn center(&self) -> Vec2;

    /// Heading in degrees; 0 points along +x, growing counterclockwise.
    fn heading(&self) -> f64;
}

/// One population slot: a vehicle body plus its generation-scoped flags.
///
/// An agent stays active until it collides, leaves the track or is culled by
/// the stagnation rule; deactivation is permanent for the generation.
#[derive(Debug, Clone)]
pub struct Agent<V> {
    /// The vehicle body driven by this slot's network.
    pub body: V,
    active: bool,
    leader: bool,
}

impl<V: VehicleBody> Agent<V> {
    /// Wrap a freshly spawned body, active and unmarked.
    #[must_use]
    pub fn new(body: V) -> Self {
        Self {
            body,
            active: true,
            leader: false,
        }
    }

    /// Whether this agent still participates in the generation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Retire this agent for the rest of the generation.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Whether this agent currently wears the cosmetic leader flag.
    #[must_use]
    pub fn is_leader(&self) -> bool {
        self.leader
    }

    pub(crate) fn set_leader(&mut self) {
        self.leader = true;
    }

    pub(crate) fn clear_leader(&mut self) {
        self.leader = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Still {
        footprint: [Vec2; 1],
    }

    impl VehicleBody for Still {
        fn apply_controls(&mut self, _controls: Controls, _dt: f64) {}

        fn footprint(&self) -> &[Vec2] {
            &self.footprint
        }

        fn center(&self) -> Vec2 {
            self.footprint[0]
        }

        fn heading(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_controls_from_outputs() {
        let controls = Controls::from_outputs(&[-0.5, 1.0, 0.25]);
        assert!((controls.steer - -0.5).abs() < 1e-12);
        assert!((controls.throttle - 1.0).abs() < 1e-12);
        assert!((controls.brake - 0.25).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "control output mismatch")]
    fn test_controls_reject_wrong_width() {
        Controls::from_outputs(&[1.0, 2.0]);
    }

    #[test]
    fn test_agent_flags() {
        let mut agent = Agent::new(Still {
            footprint: [Vec2::new(0.0, 0.0)],
        });

        assert!(agent.is_active());
        assert!(!agent.is_leader());

        agent.set_leader();
        assert!(agent.is_leader());
        agent.clear_leader();
        assert!(!agent.is_leader());

        agent.deactivate();
        assert!(!agent.is_active());
    }
}
