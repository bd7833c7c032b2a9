//! Genetic algorithm over flat real-valued parameter genomes.
//!
//! A [`GeneticAlgorithm`] owns the current generation's genomes exclusively;
//! callers read individuals out to load networks and hand a fitness vector
//! back in to advance. Every stochastic operation draws from a caller-supplied
//! [`Rng`], so a fixed seed reproduces the full evolutionary trajectory.
//!
//! Gene values are quantized to a configured number of steps across the gene
//! range, both at seeding time and when mutation replaces a gene, which keeps
//! genomes reproducible under fixed-point comparison.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Flat parameter vector encoding one network's weights and biases.
pub type Genome = Vec<f64>;

/// Objective value of one individual: checkpoints reached plus a time bonus.
pub type Fitness = u64;

/// One fitness value per individual, in population order.
pub type FitnessVector = Vec<Fitness>;

/// Configuration for a [`GeneticAlgorithm`] run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Number of genomes per generation.
    pub population_size: usize,
    /// Number of generations to evaluate before the run reports finished.
    pub max_generations: usize,
    /// Probability that a child is produced by crossover rather than copied
    /// from a single parent.
    pub crossover_probability: f64,
    /// Per-gene probability of replacement with a fresh quantized draw.
    pub mutation_probability: f64,
    /// Decay the effective mutation probability linearly to zero over the run.
    pub decrease_mutation_over_generations: bool,
    /// Cut genomes at a single random point instead of a per-gene mask.
    pub single_point_crossover: bool,
    /// Number of quantization steps across `gene_range`.
    pub precision: u32,
    /// Inclusive value range genes are drawn from.
    pub gene_range: (f64, f64),
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            max_generations: 60,
            crossover_probability: 0.5,
            mutation_probability: 0.05,
            decrease_mutation_over_generations: false,
            single_point_crossover: false,
            precision: 1000,
            gene_range: (-1.0, 1.0),
        }
    }
}

/// Error type for genetic algorithm failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvolutionError {
    /// The run parameters are unusable; reconfigure and reinitialize.
    InvalidConfiguration {
        /// What was wrong with them.
        detail: &'static str,
    },
    /// A fitness or genome vector length does not match the population.
    DimensionMismatch {
        /// The length this run requires.
        expected: usize,
        /// The length that was supplied.
        got: usize,
    },
    /// An individual index beyond the population was requested.
    IndexOutOfRange {
        /// The requested index.
        requested: usize,
        /// The population size.
        size: usize,
    },
    /// The generation cap was reached; the run cannot be driven further.
    AlreadyFinished,
}

impl std::fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvolutionError::InvalidConfiguration { detail } => {
                write!(f, "invalid evolution configuration: {}", detail)
            }
            EvolutionError::DimensionMismatch { expected, got } => {
                write!(f, "dimension mismatch: expected {}, got {}", expected, got)
            }
            EvolutionError::IndexOutOfRange { requested, size } => {
                write!(
                    f,
                    "individual {} out of range for population of {}",
                    requested, size
                )
            }
            EvolutionError::AlreadyFinished => {
                write!(f, "the run already reached its generation cap")
            }
        }
    }
}

impl std::error::Error for EvolutionError {}

/// A generational genetic algorithm with elitism, roulette selection,
/// configurable crossover and quantized mutation.
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    config: EvolutionConfig,
    genome_length: usize,
    population: Vec<Genome>,
    generation: usize,
    finished: bool,
}

impl GeneticAlgorithm {
    /// Seed a fresh population of uniformly drawn, quantized genomes.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::InvalidConfiguration`] when the population is
    /// smaller than 2, the genome length is 0, a probability falls outside
    /// [0, 1], the precision is 0, the gene range is empty or the generation
    /// cap is 0.
    pub fn new<R: Rng>(
        config: EvolutionConfig,
        genome_length: usize,
        rng: &mut R,
    ) -> Result<Self, EvolutionError> {
        validate(&config, genome_length)?;

        let population = (0..config.population_size)
            .map(|_| {
                (0..genome_length)
                    .map(|_| random_gene(&config, rng))
                    .collect()
            })
            .collect();

        Ok(Self {
            config,
            genome_length,
            population,
            generation: 0,
            finished: false,
        })
    }

    /// Index of the current generation, starting at 0 for the seeded one.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Number of genomes per generation.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.config.population_size
    }

    /// Length of every genome in this run.
    #[must_use]
    pub fn genome_length(&self) -> usize {
        self.genome_length
    }

    /// The run parameters.
    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Whether the generation cap has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The genome at `index` in the current generation.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::IndexOutOfRange`] if `index` is beyond the
    /// population.
    pub fn individual(&self, index: usize) -> Result<&[f64], EvolutionError> {
        self.population
            .get(index)
            .map(Vec::as_slice)
            .ok_or(EvolutionError::IndexOutOfRange {
                requested: index,
                size: self.config.population_size,
            })
    }

    /// Overwrite the genome at `index`, e.g. to plant a pre-trained network
    /// into the seeded generation.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::IndexOutOfRange`] for a bad index and
    /// [`EvolutionError::DimensionMismatch`] for a bad genome length.
    pub fn set_individual(&mut self, index: usize, genes: &[f64]) -> Result<(), EvolutionError> {
        if genes.len() != self.genome_length {
            return Err(EvolutionError::DimensionMismatch {
                expected: self.genome_length,
                got: genes.len(),
            });
        }
        let size = self.config.population_size;
        let slot = self
            .population
            .get_mut(index)
            .ok_or(EvolutionError::IndexOutOfRange {
                requested: index,
                size,
            })?;
        slot.copy_from_slice(genes);
        Ok(())
    }

    /// Consume the outgoing generation's fitness vector and breed the next
    /// generation.
    ///
    /// Returns `Ok(true)` after advancing, or `Ok(false)` — leaving the
    /// population untouched — once the generation cap is reached; a run
    /// evaluates exactly `max_generations` populations. Callers must stop
    /// driving the run after `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::DimensionMismatch`] when the fitness vector
    /// length differs from the population size (the population is left
    /// unchanged) and [`EvolutionError::AlreadyFinished`] when called again
    /// after the cap was reported.
    pub fn iterate<R: Rng>(
        &mut self,
        fitness: &[Fitness],
        rng: &mut R,
    ) -> Result<bool, EvolutionError> {
        if self.finished {
            return Err(EvolutionError::AlreadyFinished);
        }
        if fitness.len() != self.config.population_size {
            return Err(EvolutionError::DimensionMismatch {
                expected: self.config.population_size,
                got: fitness.len(),
            });
        }
        if self.generation + 1 >= self.config.max_generations {
            self.finished = true;
            return Ok(false);
        }

        let elite = fittest_index(fitness);
        let total: Fitness = fitness.iter().sum();
        let mutation_probability = self.effective_mutation_probability();

        let mut next = Vec::with_capacity(self.config.population_size);
        next.push(self.population[elite].clone());
        while next.len() < self.config.population_size {
            let first = self.select(fitness, total, rng);
            let second = self.select(fitness, total, rng);
            let mut child = self.breed(first, second, rng);
            self.mutate(&mut child, mutation_probability, rng);
            next.push(child);
        }

        self.population = next;
        self.generation += 1;
        debug!(
            "generation {} bred from elite {} (fitness {})",
            self.generation, elite, fitness[elite]
        );
        Ok(true)
    }

    /// Fitness-proportional parent selection.
    ///
    /// A zero-fitness genome has zero selection probability unless every
    /// fitness is zero, in which case selection degrades to uniform.
    fn select<'a, R: Rng>(
        &'a self,
        fitness: &[Fitness],
        total: Fitness,
        rng: &mut R,
    ) -> &'a Genome {
        if total == 0 {
            return &self.population[rng.random_range(0..self.population.len())];
        }

        let mut ticket = rng.random_range(0..total);
        for (index, &value) in fitness.iter().enumerate() {
            if ticket < value {
                return &self.population[index];
            }
            ticket -= value;
        }
        // A ticket below the fitness total always lands on some individual.
        &self.population[self.population.len() - 1]
    }

    /// Produce one child genome from two parents.
    fn breed<R: Rng>(&self, first: &[f64], second: &[f64], rng: &mut R) -> Genome {
        if rng.random::<f64>() < self.config.crossover_probability {
            if self.config.single_point_crossover {
                if self.genome_length < 2 {
                    return first.to_vec();
                }
                let cut = rng.random_range(1..self.genome_length);
                let mut child = Vec::with_capacity(self.genome_length);
                child.extend_from_slice(&first[..cut]);
                child.extend_from_slice(&second[cut..]);
                child
            } else {
                first
                    .iter()
                    .zip(second)
                    .map(|(&a, &b)| if rng.random::<bool>() { a } else { b })
                    .collect()
            }
        } else if rng.random::<bool>() {
            first.to_vec()
        } else {
            second.to_vec()
        }
    }

    /// Perturb a child's genes in place.
    fn mutate<R: Rng>(&self, genome: &mut Genome, probability: f64, rng: &mut R) {
        for gene in genome {
            if rng.random::<f64>() < probability {
                *gene = random_gene(&self.config, rng);
            }
        }
    }

    /// Mutation probability for the outgoing generation, after decay.
    fn effective_mutation_probability(&self) -> f64 {
        if !self.config.decrease_mutation_over_generations {
            return self.config.mutation_probability;
        }
        let progress = self.generation as f64 / self.config.max_generations as f64;
        (self.config.mutation_probability * (1.0 - progress)).max(0.0)
    }
}

/// Index of the highest fitness; the lowest index wins ties.
fn fittest_index(fitness: &[Fitness]) -> usize {
    let mut best = 0;
    for (index, &value) in fitness.iter().enumerate().skip(1) {
        if value > fitness[best] {
            best = index;
        }
    }
    best
}

/// Uniform draw from the gene range, quantized to the configured precision.
fn random_gene<R: Rng>(config: &EvolutionConfig, rng: &mut R) -> f64 {
    let steps = rng.random_range(0..=config.precision);
    let (low, high) = config.gene_range;
    low + (f64::from(steps) / f64::from(config.precision)) * (high - low)
}

fn validate(config: &EvolutionConfig, genome_length: usize) -> Result<(), EvolutionError> {
    if config.population_size < 2 {
        return Err(EvolutionError::InvalidConfiguration {
            detail: "population size must be at least 2",
        });
    }
    if genome_length == 0 {
        return Err(EvolutionError::InvalidConfiguration {
            detail: "genome length must not be 0",
        });
    }
    if config.max_generations == 0 {
        return Err(EvolutionError::InvalidConfiguration {
            detail: "at least one generation must be evaluated",
        });
    }
    if !(0.0..=1.0).contains(&config.crossover_probability) {
        return Err(EvolutionError::InvalidConfiguration {
            detail: "crossover probability must lie in [0, 1]",
        });
    }
    if !(0.0..=1.0).contains(&config.mutation_probability) {
        return Err(EvolutionError::InvalidConfiguration {
            detail: "mutation probability must lie in [0, 1]",
        });
    }
    if config.precision == 0 {
        return Err(EvolutionError::InvalidConfiguration {
            detail: "precision must be at least 1",
        });
    }
    if config.gene_range.0 >= config.gene_range.1 {
        return Err(EvolutionError::InvalidConfiguration {
            detail: "gene range must be non-empty",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn test_config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 10,
            max_generations: 20,
            ..EvolutionConfig::default()
        }
    }

    #[test]
    fn test_seeding_is_quantized_within_range() {
        let mut rng = test_rng();
        let ga = GeneticAlgorithm::new(test_config(), 5, &mut rng).unwrap();

        // precision 1000 over [-1, 1]: every gene is a multiple of 0.002.
        for index in 0..ga.population_size() {
            for &gene in ga.individual(index).unwrap() {
                assert!((-1.0..=1.0).contains(&gene));
                let steps = (gene + 1.0) / 0.002;
                assert!(
                    (steps - steps.round()).abs() < 1e-9,
                    "gene {} is not a multiple of 0.002",
                    gene
                );
            }
        }
    }

    #[test]
    fn test_invalid_configurations() {
        let mut rng = test_rng();

        let too_small = EvolutionConfig {
            population_size: 1,
            ..EvolutionConfig::default()
        };
        assert!(GeneticAlgorithm::new(too_small, 5, &mut rng).is_err());

        assert!(GeneticAlgorithm::new(EvolutionConfig::default(), 0, &mut rng).is_err());

        let bad_probability = EvolutionConfig {
            mutation_probability: 1.5,
            ..EvolutionConfig::default()
        };
        assert!(GeneticAlgorithm::new(bad_probability, 5, &mut rng).is_err());

        let empty_range = EvolutionConfig {
            gene_range: (1.0, 1.0),
            ..EvolutionConfig::default()
        };
        assert!(GeneticAlgorithm::new(empty_range, 5, &mut rng).is_err());
    }

    #[test]
    fn test_elitism_carries_dominant_genome_to_slot_zero() {
        let mut rng = test_rng();
        let mut ga = GeneticAlgorithm::new(test_config(), 5, &mut rng).unwrap();

        let dominant = ga.individual(3).unwrap().to_vec();
        let mut fitness = vec![1; ga.population_size()];
        fitness[3] = 50;

        assert!(ga.iterate(&fitness, &mut rng).unwrap());
        assert_eq!(ga.individual(0).unwrap(), dominant.as_slice());
    }

    #[test]
    fn test_elitism_tie_break_prefers_lowest_index() {
        let mut rng = test_rng();
        let mut ga = GeneticAlgorithm::new(test_config(), 5, &mut rng).unwrap();

        let expected = ga.individual(2).unwrap().to_vec();
        let mut fitness = vec![0; ga.population_size()];
        fitness[2] = 7;
        fitness[6] = 7;

        assert!(ga.iterate(&fitness, &mut rng).unwrap());
        assert_eq!(ga.individual(0).unwrap(), expected.as_slice());
    }

    #[test]
    fn test_mismatched_fitness_vector_leaves_population_unchanged() {
        let mut rng = test_rng();
        let mut ga = GeneticAlgorithm::new(test_config(), 5, &mut rng).unwrap();

        let before: Vec<Genome> = (0..ga.population_size())
            .map(|i| ga.individual(i).unwrap().to_vec())
            .collect();

        let result = ga.iterate(&[1, 2, 3], &mut rng);
        assert_eq!(
            result,
            Err(EvolutionError::DimensionMismatch {
                expected: 10,
                got: 3,
            })
        );
        assert_eq!(ga.generation(), 0);
        for (i, genome) in before.iter().enumerate() {
            assert_eq!(ga.individual(i).unwrap(), genome.as_slice());
        }
    }

    #[test]
    fn test_all_zero_fitness_degrades_to_uniform_selection() {
        let mut rng = test_rng();
        let mut ga = GeneticAlgorithm::new(test_config(), 5, &mut rng).unwrap();

        let fitness = vec![0; ga.population_size()];
        assert!(ga.iterate(&fitness, &mut rng).unwrap());
        assert_eq!(ga.generation(), 1);
        assert_eq!(ga.population_size(), 10);
    }

    #[test]
    fn test_generation_cap_then_already_finished() {
        let mut rng = test_rng();
        let config = EvolutionConfig {
            population_size: 4,
            max_generations: 2,
            ..EvolutionConfig::default()
        };
        let mut ga = GeneticAlgorithm::new(config, 5, &mut rng).unwrap();
        let fitness = vec![1; 4];

        assert!(ga.iterate(&fitness, &mut rng).unwrap());
        assert!(!ga.iterate(&fitness, &mut rng).unwrap());
        assert!(ga.is_finished());
        assert_eq!(
            ga.iterate(&fitness, &mut rng),
            Err(EvolutionError::AlreadyFinished)
        );
    }

    #[test]
    fn test_individual_index_out_of_range() {
        let mut rng = test_rng();
        let ga = GeneticAlgorithm::new(test_config(), 5, &mut rng).unwrap();
        assert_eq!(
            ga.individual(10).err(),
            Some(EvolutionError::IndexOutOfRange {
                requested: 10,
                size: 10,
            })
        );
    }

    #[test]
    fn test_set_individual() {
        let mut rng = test_rng();
        let mut ga = GeneticAlgorithm::new(test_config(), 5, &mut rng).unwrap();

        let genes = [0.5, -0.5, 0.25, 0.0, 1.0];
        ga.set_individual(0, &genes).unwrap();
        assert_eq!(ga.individual(0).unwrap(), genes);

        assert_eq!(
            ga.set_individual(0, &[1.0]),
            Err(EvolutionError::DimensionMismatch {
                expected: 5,
                got: 1,
            })
        );
    }

    #[test]
    fn test_mutation_decay_is_monotonic_and_floored() {
        let mut rng = test_rng();
        let config = EvolutionConfig {
            population_size: 4,
            max_generations: 10,
            decrease_mutation_over_generations: true,
            mutation_probability: 0.8,
            ..EvolutionConfig::default()
        };
        let mut ga = GeneticAlgorithm::new(config, 5, &mut rng).unwrap();
        let fitness = vec![1; 4];

        let mut previous = ga.effective_mutation_probability();
        while ga.iterate(&fitness, &mut rng).unwrap() {
            let current = ga.effective_mutation_probability();
            assert!(current <= previous);
            assert!(current >= 0.0);
            previous = current;
        }
    }

    #[test]
    fn test_single_point_crossover_produces_valid_children() {
        let mut rng = test_rng();
        let config = EvolutionConfig {
            population_size: 6,
            crossover_probability: 1.0,
            single_point_crossover: true,
            mutation_probability: 0.0,
            ..test_config()
        };
        let mut ga = GeneticAlgorithm::new(config, 8, &mut rng).unwrap();

        let fitness: FitnessVector = (1..=6).collect();
        assert!(ga.iterate(&fitness, &mut rng).unwrap());
        for i in 0..ga.population_size() {
            assert_eq!(ga.individual(i).unwrap().len(), 8);
        }
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);
        let mut ga_a = GeneticAlgorithm::new(test_config(), 6, &mut rng_a).unwrap();
        let mut ga_b = GeneticAlgorithm::new(test_config(), 6, &mut rng_b).unwrap();

        let fitness: FitnessVector = (0..10).map(|i| i * i).collect();
        ga_a.iterate(&fitness, &mut rng_a).unwrap();
        ga_b.iterate(&fitness, &mut rng_b).unwrap();

        for i in 0..ga_a.population_size() {
            assert_eq!(ga_a.individual(i).unwrap(), ga_b.individual(i).unwrap());
        }
    }
}
