//! Training session driver: the synchronous per-tick simulation loop.
//!
//! A [`TrainingSession`] owns the per-generation arena of (agent, network)
//! pairs together with the genetic algorithm, checkpoint map and sensor fan,
//! and advances everything one tick at a time: perception, network
//! evaluation, controls, physics, collision, timers and the stagnation rule.
//! A generation transition happens only once every agent is inactive, which
//! is when the fitness vector is final; the next generation's genomes are
//! then loaded into the networks in place and fresh agents are spawned from
//! the prototype body.
//!
//! Everything is single-threaded and agent-index ordered, and all randomness
//! flows through the one generator handed to [`TrainingSession::new`], so a
//! fixed seed reproduces the entire run.

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::checkpoint::CheckpointMap;
use crate::evolution::{EvolutionConfig, EvolutionError, Fitness, FitnessVector, GeneticAlgorithm};
use crate::network::{FeedForwardNetwork, NetworkConfig, NetworkError};
use crate::sensor::SensorFan;
use crate::track::{Track, TrackError};
use crate::vehicle::{Agent, Controls, VehicleBody};

/// Driver-level knobs with the trainer's customary defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fraction of the maximum fitness an agent must gain between punishment
    /// rounds to stay alive.
    pub required_fitness_improvement: f64,
    /// Simulated seconds between punishment rounds.
    pub punish_interval: f64,
    /// Beam reach as a fraction of the track's bounding-box scale.
    pub beam_reach_ratio: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            required_fitness_improvement: 0.05,
            punish_interval: 3.0,
            beam_reach_ratio: 0.75,
        }
    }
}

/// Error type for session assembly failures.
///
/// Everything here surfaces before the first tick; per-tick conditions
/// (collision, stagnation) are steady-state outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The driver configuration is unusable.
    InvalidConfiguration {
        /// What was wrong with it.
        detail: &'static str,
    },
    /// The network's input layer does not match the sensor fan.
    SensorInputMismatch {
        /// Beams in the fan.
        sensors: usize,
        /// Input neurons in the network.
        inputs: usize,
    },
    /// The network's output layer does not match the vehicle controls.
    ControlOutputMismatch {
        /// Output neurons in the network.
        outputs: usize,
        /// Control channels a vehicle consumes.
        controls: usize,
    },
    /// The track failed validation or triangulation.
    Track(TrackError),
    /// The genetic algorithm rejected its configuration.
    Evolution(EvolutionError),
    /// The network rejected its configuration.
    Network(NetworkError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidConfiguration { detail } => {
                write!(f, "invalid session configuration: {}", detail)
            }
            SessionError::SensorInputMismatch { sensors, inputs } => {
                write!(
                    f,
                    "network input neurons ({}) mismatch the number of vehicle sensors ({})",
                    inputs, sensors
                )
            }
            SessionError::ControlOutputMismatch { outputs, controls } => {
                write!(
                    f,
                    "network output neurons ({}) mismatch the number of vehicle controls ({})",
                    outputs, controls
                )
            }
            SessionError::Track(error) => write!(f, "{}", error),
            SessionError::Evolution(error) => write!(f, "{}", error),
            SessionError::Network(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<TrackError> for SessionError {
    fn from(error: TrackError) -> Self {
        SessionError::Track(error)
    }
}

impl From<EvolutionError> for SessionError {
    fn from(error: EvolutionError) -> Self {
        SessionError::Evolution(error)
    }
}

impl From<NetworkError> for SessionError {
    fn from(error: NetworkError) -> Self {
        SessionError::Network(error)
    }
}

/// What one [`TrainingSession::tick`] accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Agents are still driving; the generation continues.
    Evaluating,
    /// Every agent went inactive and the next generation took over.
    GenerationAdvanced(usize),
    /// The generation cap was reached; further ticks are no-ops.
    Finished,
}

/// The coordinating driver for one evolutionary run on one track.
pub struct TrainingSession<V, R> {
    config: SessionConfig,
    track: Track,
    map: CheckpointMap,
    sensors: SensorFan,
    algorithm: GeneticAlgorithm,
    networks: Vec<FeedForwardNetwork>,
    agents: Vec<Agent<V>>,
    prototype: V,
    rng: R,
    punish_timer: f64,
    finished: bool,
    // Reused per-tick buffers.
    readings: Vec<f64>,
    outputs: Vec<f64>,
}

impl<V: VehicleBody + Clone, R: Rng> TrainingSession<V, R> {
    /// Assemble a session: triangulate the track, validate every dimension,
    /// seed the population and spawn the first generation of agents from the
    /// prototype body.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SensorInputMismatch`] or
    /// [`SessionError::ControlOutputMismatch`] when the network topology does
    /// not line up with the vehicle seam, and propagates track, network and
    /// evolution errors; all of this fails before any simulation tick.
    pub fn new(
        track: Track,
        network_config: NetworkConfig,
        evolution_config: EvolutionConfig,
        config: SessionConfig,
        prototype: V,
        mut rng: R,
    ) -> Result<Self, SessionError> {
        if !(0.0..=1.0).contains(&config.required_fitness_improvement) {
            return Err(SessionError::InvalidConfiguration {
                detail: "required fitness improvement must lie in [0, 1]",
            });
        }
        if config.punish_interval <= 0.0 {
            return Err(SessionError::InvalidConfiguration {
                detail: "punish interval must be positive",
            });
        }
        if config.beam_reach_ratio <= 0.0 {
            return Err(SessionError::InvalidConfiguration {
                detail: "beam reach ratio must be positive",
            });
        }

        let sensors = SensorFan::for_track(&track, config.beam_reach_ratio);
        let network = FeedForwardNetwork::new(network_config)?;
        if network.input_count() != sensors.len() {
            return Err(SessionError::SensorInputMismatch {
                sensors: sensors.len(),
                inputs: network.input_count(),
            });
        }
        if network.output_count() != Controls::COUNT {
            return Err(SessionError::ControlOutputMismatch {
                outputs: network.output_count(),
                controls: Controls::COUNT,
            });
        }

        let mut map = CheckpointMap::from_track(&track)?;
        let algorithm = GeneticAlgorithm::new(evolution_config, network.parameter_count(), &mut rng)?;
        let population = algorithm.population_size();
        map.init(population, config.required_fitness_improvement);

        let mut networks = vec![network; population];
        for (index, slot) in networks.iter_mut().enumerate() {
            slot.set_parameters(algorithm.individual(index)?)?;
        }
        let agents = (0..population)
            .map(|_| Agent::new(prototype.clone()))
            .collect();

        info!(
            "training session ready: population {}, {} checkpoints, {} sensors",
            population,
            map.max_fitness(),
            sensors.len()
        );

        let sensor_count = sensors.len();
        Ok(Self {
            config,
            track,
            map,
            sensors,
            algorithm,
            networks,
            agents,
            prototype,
            rng,
            punish_timer: 0.0,
            finished: false,
            readings: Vec::with_capacity(sensor_count),
            outputs: vec![0.0; Controls::COUNT],
        })
    }

    /// Advance the simulation by `dt` simulated seconds.
    ///
    /// Active agents are processed in index order: perception, network
    /// evaluation, controls, physics, then boundary collision. Once every
    /// agent is inactive the generation's fitness vector feeds the genetic
    /// algorithm and either the next generation spawns or the session
    /// finishes.
    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        if self.finished {
            return TickOutcome::Finished;
        }

        let mut activity = false;
        for index in 0..self.agents.len() {
            if !self.agents[index].is_active() {
                continue;
            }
            activity = true;

            let center = self.agents[index].body.center();
            let heading = self.agents[index].body.heading();
            self.sensors
                .cast_into(center, heading, self.track.rail_edges(), &mut self.readings);
            self.networks[index].evaluate_into(&self.readings, &mut self.outputs);

            let controls = Controls::from_outputs(&self.outputs);
            self.agents[index].body.apply_controls(controls, dt);

            if self.track.collides(self.agents[index].body.footprint()) {
                self.agents[index].deactivate();
            }
        }

        self.map.update_timers(dt);

        if !activity {
            return self.advance_generation();
        }

        self.punish_timer += dt;
        if self.punish_timer >= self.config.punish_interval {
            self.punish_timer = 0.0;
            self.map.punish(&mut self.agents);
        }
        TickOutcome::Evaluating
    }

    /// Consume the finished generation and start the next one, or finish.
    fn advance_generation(&mut self) -> TickOutcome {
        let fitness = self.map.iterate(&self.agents).clone();
        match self.algorithm.iterate(&fitness, &mut self.rng) {
            Ok(true) => {
                self.map.reset();
                for index in 0..self.networks.len() {
                    let genome = self
                        .algorithm
                        .individual(index)
                        .expect("slot index stays within the population");
                    self.networks[index]
                        .set_parameters(genome)
                        .expect("genome length equals the network parameter count");
                    self.agents[index] = Agent::new(self.prototype.clone());
                }
                self.punish_timer = 0.0;
                let generation = self.algorithm.generation();
                debug!("generation {} started", generation);
                TickOutcome::GenerationAdvanced(generation)
            }
            Ok(false) | Err(_) => {
                self.finished = true;
                info!(
                    "run finished after generation {}: highest fitness overall {}",
                    self.algorithm.generation(),
                    self.map.highest_fitness_overall()
                );
                TickOutcome::Finished
            }
        }
    }

    /// Rescore still-active agents and return the current leader's index.
    ///
    /// Purely informational, intended for a camera or viewport.
    pub fn mark_leader(&mut self) -> usize {
        self.map.mark_leader(&mut self.agents)
    }

    /// Index of the current generation.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.algorithm.generation()
    }

    /// Number of population slots.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.algorithm.population_size()
    }

    /// Number of agents still active in this generation.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|agent| agent.is_active()).count()
    }

    /// Per-agent fitness, in population order.
    #[must_use]
    pub fn fitness_vector(&self) -> &FitnessVector {
        self.map.fitness_vector()
    }

    /// Best fitness seen this generation.
    #[must_use]
    pub fn highest_fitness(&self) -> Fitness {
        self.map.highest_fitness()
    }

    /// Best fitness seen across the whole run; never decreases.
    #[must_use]
    pub fn highest_fitness_overall(&self) -> Fitness {
        self.map.highest_fitness_overall()
    }

    /// Simulated seconds until the next punishment round.
    #[must_use]
    pub fn stagnation_countdown(&self) -> f64 {
        (self.config.punish_interval - self.punish_timer).max(0.0)
    }

    /// Whether the generation cap has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The network in slot 0, where elitism places the best genome after
    /// every generation advance; this is the one worth persisting.
    #[must_use]
    pub fn best_network(&self) -> &FeedForwardNetwork {
        &self.networks[0]
    }

    /// The agent arena, in population order.
    #[must_use]
    pub fn agents(&self) -> &[Agent<V>] {
        &self.agents
    }

    /// The track this session runs on.
    #[must_use]
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// The sensor fan agents perceive with.
    #[must_use]
    pub fn sensors(&self) -> &SensorFan {
        &self.sensors
    }
}
