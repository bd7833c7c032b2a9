//! End-to-end training demo on a square ring track.
//!
//! Evolves feed-forward controllers for a minimal kinematic vehicle until the
//! generation cap is reached, printing per-generation progress.
//!
//! Run with: `cargo run --example training`

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use raceline::{
    Controls, Edge, EvolutionConfig, NetworkConfig, SessionConfig, TickOutcome, Track,
    TrainingSession, Vec2, VehicleBody,
};

/// Square ring with the rails starting at the start line: inner rail 35..75 by 30..70,
/// outer rail 0..100.
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
    Track::new(edges, 5).expect("the demo track layout is valid")
}

/// Minimal kinematic vehicle: integrates steer/throttle/brake over a
/// rectangular footprint and always creeps forward at a floor speed.
#[derive(Debug, Clone)]
struct DemoVehicle {
    center: Vec2,
    heading: f64,
    speed: f64,
    footprint: [Vec2; 4],
}

impl DemoVehicle {
    const MIN_SPEED: f64 = 2.0;
    const MAX_SPEED: f64 = 20.0;
    const STEER_RATE: f64 = 90.0;
    const DRIVE_RATE: f64 = 30.0;

    fn spawn() -> Self {
        let mut vehicle = Self {
            center: Vec2::new(55.0, 15.0),
            heading: 0.0,
            speed: Self::MIN_SPEED,
            footprint: [Vec2::default(); 4],
        };
        vehicle.refresh_footprint();
        vehicle
    }

    fn refresh_footprint(&mut self) {
        let (sin, cos) = self.heading.to_radians().sin_cos();
        let corners = [(2.0, 1.0), (2.0, -1.0), (-2.0, -1.0), (-2.0, 1.0)];
        for (slot, (dx, dy)) in self.footprint.iter_mut().zip(corners) {
            *slot = Vec2::new(
                self.center.x + dx * cos - dy * sin,
                self.center.y + dx * sin + dy * cos,
            );
        }
    }
}

impl VehicleBody for DemoVehicle {
    fn apply_controls(&mut self, controls: Controls, dt: f64) {
        self.heading += controls.steer.clamp(-1.0, 1.0) * Self::STEER_RATE * dt;
        let drive = controls.throttle.clamp(0.0, 1.0) - controls.brake.clamp(0.0, 1.0);
        self.speed =
            (self.speed + drive * Self::DRIVE_RATE * dt).clamp(Self::MIN_SPEED, Self::MAX_SPEED);
        let (sin, cos) = self.heading.to_radians().sin_cos();
        self.center = self.center + Vec2::new(cos, sin) * (self.speed * dt);
        self.refresh_footprint();
    }

    fn footprint(&self) -> &[Vec2] {
        &self.footprint
    }

    fn center(&self) -> Vec2 {
        self.center
    }

    fn heading(&self) -> f64 {
        self.heading
    }
}

fn main() {
    println!("Raceline Training Demo");
    println!("======================\n");

    let evolution = EvolutionConfig {
        population_size: 20,
        max_generations: 30,
        crossover_probability: 0.5,
        mutation_probability: 0.05,
        ..EvolutionConfig::default()
    };
    let seed = 42;

    // The ring has few checkpoints, so demand a fifth of the track per
    // punishment round; agents that stall or merely circle in place are
    // culled instead of keeping the generation alive.
    let session_config = SessionConfig {
        required_fitness_improvement: 0.2,
        ..SessionConfig::default()
    };

    let mut session = TrainingSession::new(
        ring_track(),
        NetworkConfig::new(5, vec![6], 3),
        evolution,
        session_config,
        DemoVehicle::spawn(),
        ChaCha8Rng::seed_from_u64(seed),
    )
    .expect("the demo configuration is consistent");

    println!("Population: {}", session.population_size());
    println!("Sensors: {}", session.sensors().len());
    println!("Seed: {}\n", seed);

    let dt = 1.0 / 60.0;
    loop {
        match session.tick(dt) {
            TickOutcome::Evaluating => {}
            TickOutcome::GenerationAdvanced(generation) => {
                println!(
                    "Gen {:3}: highest fitness overall {:4}",
                    generation,
                    session.highest_fitness_overall()
                );
            }
            TickOutcome::Finished => break,
        }
    }

    println!("\nTraining Complete!");
    println!("==================");
    println!("Generations: {}", session.generation() + 1);
    println!("Highest fitness overall: {}", session.highest_fitness_overall());
    println!(
        "Champion parameters: {}",
        session.best_network().parameter_count()
    );
}
