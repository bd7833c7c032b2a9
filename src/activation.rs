//! Activation functions for the feed-forward controller networks.
//!
//! The set is closed by design: each layer of a network selects one of these
//! variants at configuration time and evaluation dispatches through a single
//! `match`, so a persisted topology always replays identically.

use serde::{Deserialize, Serialize};

/// Activation function applied to a layer's weighted sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Activation {
    /// Rectified Linear Unit: f(x) = max(0, x)
    ReLU,
    /// Leaky ReLU: `f(x) = x` if `x > 0` else `0.01x`
    #[default]
    LeakyReLU,
    /// Hyperbolic tangent: f(x) = tanh(x)
    Tanh,
}

impl Activation {
    /// All available activation functions.
    pub const ALL: [Self; 3] = [Self::ReLU, Self::LeakyReLU, Self::Tanh];

    /// Negative-side slope of [`Activation::LeakyReLU`].
    pub const LEAKY_SLOPE: f64 = 0.01;

    /// Apply this activation function to an input value.
    ///
    /// All activation functions propagate NaN consistently. Infinities produce
    /// the finite limit where one exists, keeping downstream sums stable.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        // Propagate NaN consistently across all activation functions
        if x.is_nan() {
            return f64::NAN;
        }

        match self {
            Self::ReLU => {
                if x == f64::NEG_INFINITY {
                    return 0.0;
                }
                x.max(0.0)
            }
            Self::LeakyReLU => {
                if x > 0.0 {
                    x
                } else {
                    Self::LEAKY_SLOPE * x
                }
            }
            Self::Tanh => {
                // Handle infinity: tanh(+inf) = 1, tanh(-inf) = -1
                if x == f64::INFINITY {
                    return 1.0;
                }
                if x == f64::NEG_INFINITY {
                    return -1.0;
                }
                x.tanh()
            }
        }
    }
}
