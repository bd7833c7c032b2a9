//! # Raceline
//!
//! A neuroevolution engine for track-following vehicle controllers.
//!
//! Raceline evolves fixed-topology feed-forward networks with a genetic
//! algorithm and scores each candidate by how far its vehicle progresses
//! along a track, measured against an ordered sequence of triangular
//! checkpoint zones built once from the track boundary.
//!
//! ## Features
//!
//! - **Flat genomes**: network parameters live in a single flat buffer,
//!   loadable in place from a genome without rebuilding the network
//! - **Greedy track triangulation**: the boundary is partitioned once into
//!   ordered checkpoint triangles that double as the fitness oracle
//! - **Stagnation pressure**: agents that fail to gain a required fraction of
//!   the track within a punishment interval are culled early
//! - **Beam perception**: a fixed fan of rays against the boundary produces
//!   the network's normalized input vector
//! - **Seed determinism**: all randomness flows through one caller-supplied
//!   generator, so a fixed seed reproduces the full evolutionary trajectory
//!
//! ## Quick Start
//!
//! ```rust
//! use raceline::{EvolutionConfig, FeedForwardNetwork, GeneticAlgorithm, NetworkConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! // A controller reading 5 sensors and producing steer/throttle/brake.
//! let mut network = FeedForwardNetwork::new(NetworkConfig::new(5, vec![4], 3)).unwrap();
//!
//! // Evolve genomes of exactly that parameter count.
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut algorithm = GeneticAlgorithm::new(
//!     EvolutionConfig::default(),
//!     network.parameter_count(),
//!     &mut rng,
//! )
//! .unwrap();
//!
//! // Load a genome and drive the network.
//! network.set_parameters(algorithm.individual(0).unwrap()).unwrap();
//! let outputs = network.evaluate(&[0.2, 0.4, 1.0, 0.4, 0.2]).unwrap();
//! assert_eq!(outputs.len(), 3);
//!
//! // Hand back one fitness value per individual to breed the next generation.
//! let fitness = vec![1; algorithm.population_size()];
//! assert!(algorithm.iterate(&fitness, &mut rng).unwrap());
//! ```
//!
//! For the full loop — perception, evaluation, physics, collision, fitness
//! and stagnation — assemble a [`TrainingSession`] with a [`Track`] and a
//! [`VehicleBody`] implementation and drive [`TrainingSession::tick`] until
//! it reports [`TickOutcome::Finished`].
//!
//! ## Architecture
//!
//! The simulation is single-threaded and synchronous. One tick processes
//! every active agent in index order (perception → network → physics →
//! collision), and a generation transition happens only once every agent has
//! gone inactive, so no two generations ever mix. Per-agent fitness state is
//! indexed by population slot inside the checkpoint map rather than referenced
//! from the agents, and each agent is paired 1:1 with its network in a flat
//! arena that is rebuilt at every generation boundary.

pub mod activation;
pub mod checkpoint;
pub mod evolution;
pub mod math;
pub mod network;
pub mod sensor;
pub mod simulation;
pub mod track;
pub mod vehicle;

// Re-exports for convenience
pub use activation::Activation;
pub use checkpoint::{CheckpointMap, StagnationTimer};
pub use evolution::{
    EvolutionConfig, EvolutionError, Fitness, FitnessVector, GeneticAlgorithm, Genome,
};
pub use math::{direction_angle, Edge, Triangle, Vec2};
pub use network::{FeedForwardNetwork, NetworkConfig, NetworkError};
pub use sensor::{SensorFan, DEFAULT_OFFSETS};
pub use simulation::{SessionConfig, SessionError, TickOutcome, TrainingSession};
pub use track::{Track, TrackError};
pub use vehicle::{Agent, Controls, VehicleBody};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_genome_network_interchange() {
        let mut network = FeedForwardNetwork::new(NetworkConfig::new(5, vec![4], 3)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let algorithm = GeneticAlgorithm::new(
            EvolutionConfig::default(),
            network.parameter_count(),
            &mut rng,
        )
        .unwrap();

        for index in 0..algorithm.population_size() {
            let genome = algorithm.individual(index).unwrap();
            network.set_parameters(genome).unwrap();
            assert_eq!(network.get_parameters(), genome);
        }
    }

    #[test]
    fn test_genome_length_mismatch_is_rejected_by_network() {
        let mut network = FeedForwardNetwork::new(NetworkConfig::new(5, vec![4], 3)).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let algorithm =
            GeneticAlgorithm::new(EvolutionConfig::default(), 7, &mut rng).unwrap();

        let genome = algorithm.individual(0).unwrap();
        assert!(network.set_parameters(genome).is_err());
    }
}
