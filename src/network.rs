//! Feed-forward network evaluator over a fixed layered topology.
//!
//! A [`FeedForwardNetwork`] is a plain dense network: every computing layer
//! owns a weight matrix, a single scalar bias broadcast across its neurons,
//! and one activation function. All parameters live behind a flat buffer
//! ([`FeedForwardNetwork::get_parameters`] / [`set_parameters`](FeedForwardNetwork::set_parameters))
//! so a genome evolved elsewhere can be loaded in place without rebuilding
//! the network.
//!
//! The flat layout is fixed for the lifetime of the crate: for each computing
//! layer in order, the weight matrix row-major (per neuron, its input
//! weights), followed by that layer's bias scalar.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;

/// Topology description for a [`FeedForwardNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Number of input neurons.
    pub inputs: usize,
    /// Sizes of the hidden layers, in evaluation order.
    pub hidden: Vec<usize>,
    /// Number of output neurons.
    pub outputs: usize,
    /// One activation per computing layer (hidden layers, then the output
    /// layer), so `activations.len() == hidden.len() + 1`.
    pub activations: Vec<Activation>,
}

impl NetworkConfig {
    /// Create a config with the default activation on every layer.
    #[must_use]
    pub fn new(inputs: usize, hidden: Vec<usize>, outputs: usize) -> Self {
        let activations = vec![Activation::default(); hidden.len() + 1];
        Self {
            inputs,
            hidden,
            outputs,
            activations,
        }
    }

    /// Replace the per-layer activation list.
    #[must_use]
    pub fn with_activations(mut self, activations: Vec<Activation>) -> Self {
        self.activations = activations;
        self
    }

    /// Neuron counts of the computing layers, in evaluation order.
    fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = self.hidden.clone();
        sizes.push(self.outputs);
        sizes
    }
}

/// Error type for network construction and evaluation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The topology description is unusable.
    InvalidConfiguration {
        /// What was wrong with it.
        detail: &'static str,
    },
    /// A vector length does not match the configured topology.
    DimensionMismatch {
        /// The length the topology requires.
        expected: usize,
        /// The length that was supplied.
        got: usize,
    },
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::InvalidConfiguration { detail } => {
                write!(f, "invalid network configuration: {}", detail)
            }
            NetworkError::DimensionMismatch { expected, got } => {
                write!(f, "dimension mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for NetworkError {}

/// One computing layer: a weight matrix, a scalar bias and an activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Layer {
    inputs: usize,
    neurons: usize,
    /// Row-major: `weights[n * inputs..(n + 1) * inputs]` feeds neuron `n`.
    weights: Vec<f64>,
    bias: f64,
    activation: Activation,
}

/// A dense feed-forward network with in-place loadable parameters.
///
/// Evaluation is a pure function of the inputs and the current parameters:
/// no randomness, no normalization, no internal state survives a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedForwardNetwork {
    config: NetworkConfig,
    layers: Vec<Layer>,
    // Ping-pong scratch for evaluation; rebuilt on demand after deserialization.
    #[serde(skip)]
    current: Vec<f64>,
    #[serde(skip)]
    next: Vec<f64>,
}

impl FeedForwardNetwork {
    /// Build a zero-initialized network for the given topology.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidConfiguration`] when a layer is empty or
    /// the activation list does not cover every computing layer.
    pub fn new(config: NetworkConfig) -> Result<Self, NetworkError> {
        if config.inputs == 0 {
            return Err(NetworkError::InvalidConfiguration {
                detail: "network needs at least one input neuron",
            });
        }
        if config.outputs == 0 {
            return Err(NetworkError::InvalidConfiguration {
                detail: "network needs at least one output neuron",
            });
        }
        if config.hidden.iter().any(|&size| size == 0) {
            return Err(NetworkError::InvalidConfiguration {
                detail: "hidden layers must not be empty",
            });
        }
        if config.activations.len() != config.hidden.len() + 1 {
            return Err(NetworkError::InvalidConfiguration {
                detail: "one activation per computing layer is required",
            });
        }

        let mut layers = Vec::with_capacity(config.hidden.len() + 1);
        let mut inputs = config.inputs;
        for (&neurons, &activation) in config.layer_sizes().iter().zip(&config.activations) {
            layers.push(Layer {
                inputs,
                neurons,
                weights: vec![0.0; inputs * neurons],
                bias: 0.0,
                activation,
            });
            inputs = neurons;
        }

        Ok(Self {
            config,
            layers,
            current: Vec::new(),
            next: Vec::new(),
        })
    }

    /// Number of input neurons.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.config.inputs
    }

    /// Number of output neurons.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.config.outputs
    }

    /// The topology this network was built from.
    #[must_use]
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Total length of the flat parameter buffer.
    ///
    /// Fully determined by the topology: the sum over computing layers of
    /// `inputs * neurons + 1` (the trailing 1 is the layer's bias).
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.inputs * layer.neurons + 1)
            .sum()
    }

    /// Copy all parameters out as a flat buffer.
    ///
    /// The exact inverse of [`set_parameters`](Self::set_parameters).
    #[must_use]
    pub fn get_parameters(&self) -> Vec<f64> {
        let mut parameters = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            parameters.extend_from_slice(&layer.weights);
            parameters.push(layer.bias);
        }
        parameters
    }

    /// Load all parameters from a flat buffer, in place.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DimensionMismatch`] when the buffer length
    /// differs from [`parameter_count`](Self::parameter_count); the network is
    /// left unchanged in that case.
    pub fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), NetworkError> {
        let expected = self.parameter_count();
        if parameters.len() != expected {
            return Err(NetworkError::DimensionMismatch {
                expected,
                got: parameters.len(),
            });
        }

        let mut offset = 0;
        for layer in &mut self.layers {
            let weights = layer.inputs * layer.neurons;
            layer.weights.copy_from_slice(&parameters[offset..offset + weights]);
            layer.bias = parameters[offset + weights];
            offset += weights + 1;
        }
        Ok(())
    }

    /// Run a forward pass, writing the outputs into a provided buffer.
    ///
    /// This is the allocation-free version for the per-tick hot path.
    ///
    /// # Panics
    ///
    /// Panics if input or output length doesn't match the topology. Use
    /// [`evaluate`](Self::evaluate) for checked evaluation.
    pub fn evaluate_into(&mut self, inputs: &[f64], outputs: &mut [f64]) {
        assert_eq!(
            inputs.len(),
            self.config.inputs,
            "input length mismatch: expected {}, got {}",
            self.config.inputs,
            inputs.len()
        );
        assert_eq!(
            outputs.len(),
            self.config.outputs,
            "output length mismatch: expected {}, got {}",
            self.config.outputs,
            outputs.len()
        );

        self.current.clear();
        self.current.extend_from_slice(inputs);

        for layer in &self.layers {
            self.next.clear();
            for neuron in 0..layer.neurons {
                let row = &layer.weights[neuron * layer.inputs..(neuron + 1) * layer.inputs];
                let mut sum = layer.bias;
                for (weight, value) in row.iter().zip(&self.current) {
                    sum += weight * value;
                }
                self.next.push(layer.activation.apply(sum));
            }
            std::mem::swap(&mut self.current, &mut self.next);
        }

        outputs.copy_from_slice(&self.current);
    }

    /// Run a forward pass.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DimensionMismatch`] if the input length differs
    /// from the configured input-neuron count.
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        if inputs.len() != self.config.inputs {
            return Err(NetworkError::DimensionMismatch {
                expected: self.config.inputs,
                got: inputs.len(),
            });
        }
        let mut outputs = vec![0.0; self.config.outputs];
        self.evaluate_into(inputs, &mut outputs);
        Ok(outputs)
    }
}
