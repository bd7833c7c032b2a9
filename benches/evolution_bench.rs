//! Benchmarks for raceline.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use raceline::{
    CheckpointMap, Edge, EvolutionConfig, FeedForwardNetwork, GeneticAlgorithm, NetworkConfig,
    SensorFan, Track, Vec2,
};

/// Square ring with the rails starting at the start line.
fn ring_track() -> Track {
    let p = |x: f64, y: f64| Vec2::new(x, y);
    let edges = vec![
        Edge::new(p(50.0, 30.0), p(75.0, 30.0)),
        Edge::new(p(75.0, 30.0), p(75.0, 70.0)),
        Edge::new(p(75.0, 70.0), p(35.0, 70.0)),
        Edge::new(p(35.0, 70.0), p(35.0, 30.0)),
        Edge::new(p(35.0, 30.0), p(50.0, 30.0)),
        Edge::new(p(50.0, 0.0), p(100.0, 0.0)),
        Edge::new(p(100.0, 0.0), p(100.0, 100.0)),
        Edge::new(p(100.0, 100.0), p(0.0, 100.0)),
        Edge::new(p(0.0, 100.0), p(0.0, 0.0)),
        Edge::new(p(0.0, 0.0), p(50.0, 0.0)),
        Edge::new(p(45.0, 0.0), p(45.0, 30.0)),
        Edge::new(p(51.0, 0.0), p(51.0, 30.0)),
    ];
    Track::new(edges, 5).unwrap()
}

fn bench_network_evaluation(c: &mut Criterion) {
    let mut network = FeedForwardNetwork::new(NetworkConfig::new(5, vec![8, 8], 3)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let parameters: Vec<f64> = (0..network.parameter_count())
        .map(|_| rng.random_range(-1.0..1.0))
        .collect();
    network.set_parameters(&parameters).unwrap();

    let inputs = [0.2, 0.4, 1.0, 0.4, 0.2];
    let mut outputs = [0.0; 3];

    c.bench_function("network_evaluate", |b| {
        b.iter(|| {
            network.evaluate_into(black_box(&inputs), &mut outputs);
            black_box(outputs);
        });
    });
}

fn bench_evolution_iterate(c: &mut Criterion) {
    let config = EvolutionConfig {
        population_size: 30,
        max_generations: usize::MAX,
        ..EvolutionConfig::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut algorithm = GeneticAlgorithm::new(config, 120, &mut rng).unwrap();

    let fitness: Vec<u64> = (0..30).map(|i| i * i).collect();

    c.bench_function("evolution_iterate", |b| {
        b.iter(|| {
            algorithm.iterate(black_box(&fitness), &mut rng).unwrap();
        });
    });
}

fn bench_checkpoint_build(c: &mut Criterion) {
    let track = ring_track();

    c.bench_function("checkpoint_map_build", |b| {
        b.iter(|| {
            black_box(CheckpointMap::from_track(&track).unwrap());
        });
    });
}

fn bench_fitness_calculation(c: &mut Criterion) {
    let track = ring_track();
    let map = CheckpointMap::from_track(&track).unwrap();

    let footprint = [
        Vec2::new(83.0, 48.0),
        Vec2::new(87.0, 48.0),
        Vec2::new(87.0, 52.0),
        Vec2::new(83.0, 52.0),
    ];

    c.bench_function("calculate_fitness", |b| {
        b.iter(|| {
            black_box(map.calculate_fitness(black_box(&footprint)));
        });
    });
}

fn bench_beam_casting(c: &mut Criterion) {
    let track = ring_track();
    let fan = SensorFan::for_track(&track, 0.75);
    let mut readings = Vec::with_capacity(fan.len());

    c.bench_function("sensor_fan_cast", |b| {
        b.iter(|| {
            fan.cast_into(
                black_box(Vec2::new(55.0, 15.0)),
                black_box(0.0),
                track.rail_edges(),
                &mut readings,
            );
            black_box(&readings);
        });
    });
}

criterion_group!(
    benches,
    bench_network_evaluation,
    bench_evolution_iterate,
    bench_checkpoint_build,
    bench_fitness_calculation,
    bench_beam_casting,
);
criterion_main!(benches);
