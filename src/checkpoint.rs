//! Track triangulation and the checkpoint fitness oracle.
//!
//! A [`CheckpointMap`] is built once per track. The build connects every inner
//! rail point to the outer rail with the shortest non-conflicting segments,
//! sorts each point's accepted segments by their angle relative to the local
//! boundary direction, and fans them into triangles that cover the track
//! surface in driving order. The first two triangles land on the start/finish
//! discontinuity and are dropped, so checkpoint 0 is the first zone that
//! counts toward progress.
//!
//! At runtime the map is the fitness oracle for one generation of agents:
//! fitness is the index of the furthest checkpoint an agent's footprint
//! touches, with a time bonus at generation end, and per-agent stagnation
//! timers drive the required-improvement elimination rule.

use log::{debug, info};

use crate::evolution::{Fitness, FitnessVector};
use crate::math::{direction_angle, Edge, Triangle, Vec2};
use crate::track::{Track, TrackError};
use crate::vehicle::{Agent, VehicleBody};

/// Accumulates the simulated seconds an agent has been on track.
#[derive(Debug, Clone, Copy, Default)]
pub struct StagnationTimer {
    value: f64,
}

impl StagnationTimer {
    /// A timer at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt` simulated seconds.
    pub fn update(&mut self, dt: f64) {
        self.value += dt;
    }

    /// Rewind to zero.
    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    /// Accumulated simulated seconds.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// An ordered triangular partition of the track plus per-agent fitness state.
#[derive(Debug, Clone)]
pub struct CheckpointMap {
    checkpoints: Vec<Triangle>,
    fitness: FitnessVector,
    previous_fitness: FitnessVector,
    timers: Vec<StagnationTimer>,
    highest_fitness: Fitness,
    highest_fitness_overall: Fitness,
    required_improvement: f64,
}

impl CheckpointMap {
    /// Triangulate a track into an ordered checkpoint sequence.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::DegenerateGeometry`] when an inner point accepts
    /// no connecting segment or the boundary yields no checkpoints; no partial
    /// map is returned.
    pub fn from_track(track: &Track) -> Result<Self, TrackError> {
        let checkpoints = triangulate(track)?;
        info!(
            "triangulated track into {} checkpoints across {} inner points",
            checkpoints.len(),
            track.pivot()
        );
        Ok(Self {
            checkpoints,
            fitness: Vec::new(),
            previous_fitness: Vec::new(),
            timers: Vec::new(),
            highest_fitness: 0,
            highest_fitness_overall: 0,
            required_improvement: 0.0,
        })
    }

    /// Allocate per-agent fitness state for a generation of `population`
    /// agents and set the stagnation margin.
    pub fn init(&mut self, population: usize, required_improvement: f64) {
        self.fitness = vec![0; population];
        self.previous_fitness = vec![0; population];
        self.timers = vec![StagnationTimer::new(); population];
        self.required_improvement = required_improvement;
        self.highest_fitness = 0;
        self.highest_fitness_overall = 0;
    }

    /// Zero all per-agent fitness state and timers without reallocating.
    ///
    /// Used between generations; the overall best is monotonic across the run
    /// and survives the reset.
    pub fn reset(&mut self) {
        self.highest_fitness = 0;
        for value in &mut self.fitness {
            *value = 0;
        }
        for value in &mut self.previous_fitness {
            *value = 0;
        }
        for timer in &mut self.timers {
            timer.reset();
        }
    }

    /// The ordered checkpoint triangles.
    #[must_use]
    pub fn checkpoints(&self) -> &[Triangle] {
        &self.checkpoints
    }

    /// Number of checkpoints, which is also the highest reachable base
    /// fitness.
    #[must_use]
    pub fn max_fitness(&self) -> Fitness {
        self.checkpoints.len() as Fitness
    }

    /// Progress count for a footprint: the highest `i + 1` whose checkpoint
    /// triangle contains any footprint vertex, or 0 off every checkpoint.
    #[must_use]
    pub fn calculate_fitness(&self, footprint: &[Vec2]) -> Fitness {
        let mut fitness = 0;
        for (index, checkpoint) in self.checkpoints.iter().enumerate() {
            if checkpoint.contains_any(footprint) {
                fitness = (index + 1) as Fitness;
            }
        }
        fitness
    }

    /// Score a finished generation: base fitness plus the time bonus
    /// `max_fitness / elapsed`, rewarding agents that progressed quickly.
    ///
    /// Updates the highest fitness of this generation and the monotonic
    /// overall best.
    ///
    /// # Panics
    ///
    /// Panics if `agents` does not match the population passed to
    /// [`init`](Self::init).
    pub fn iterate<V: VehicleBody>(&mut self, agents: &[Agent<V>]) -> &FitnessVector {
        assert_eq!(
            agents.len(),
            self.fitness.len(),
            "agent count mismatch: init the map with the population size first"
        );

        let max_fitness = self.max_fitness();
        for (index, agent) in agents.iter().enumerate() {
            let base = self.calculate_fitness(agent.body.footprint());
            self.fitness[index] = base + time_bonus(max_fitness, self.timers[index].value());
        }
        self.track_highest();
        &self.fitness
    }

    /// Rescore still-active agents (inactive agents score 0) and flag the
    /// current leader.
    ///
    /// Purely informational; intended to drive a camera or viewport. Returns
    /// the leader's index, the lowest index winning ties.
    ///
    /// # Panics
    ///
    /// Panics if `agents` does not match the population passed to
    /// [`init`](Self::init).
    pub fn mark_leader<V: VehicleBody>(&mut self, agents: &mut [Agent<V>]) -> usize {
        assert_eq!(
            agents.len(),
            self.fitness.len(),
            "agent count mismatch: init the map with the population size first"
        );

        for (index, agent) in agents.iter_mut().enumerate() {
            agent.clear_leader();
            if !agent.is_active() {
                self.fitness[index] = 0;
                continue;
            }
            let fitness = self.calculate_fitness(agent.body.footprint());
            self.fitness[index] = fitness;
        }
        self.track_highest();

        let leader = fittest_index(&self.fitness);
        agents[leader].set_leader();
        leader
    }

    /// Apply the stagnation rule to every active agent: those that failed to
    /// gain `required_improvement * max_fitness` over their previous snapshot
    /// are deactivated for the rest of the generation; the snapshot is updated
    /// either way.
    ///
    /// Returns the number of agents still active afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `agents` does not match the population passed to
    /// [`init`](Self::init).
    pub fn punish<V: VehicleBody>(&mut self, agents: &mut [Agent<V>]) -> usize {
        assert_eq!(
            agents.len(),
            self.fitness.len(),
            "agent count mismatch: init the map with the population size first"
        );

        let margin = (self.max_fitness() as f64 * self.required_improvement) as Fitness;
        for (index, agent) in agents.iter_mut().enumerate() {
            if !agent.is_active() {
                continue;
            }
            let current = self.calculate_fitness(agent.body.footprint());
            self.fitness[index] = current;
            if self.previous_fitness[index] + margin > current {
                agent.deactivate();
            }
            self.previous_fitness[index] = current;
        }

        let active = agents.iter().filter(|agent| agent.is_active()).count();
        debug!(
            "stagnation check left {} of {} agents active",
            active,
            agents.len()
        );
        active
    }

    /// Advance every agent's stagnation timer by `dt` simulated seconds.
    ///
    /// Called once per tick regardless of agent activity.
    pub fn update_timers(&mut self, dt: f64) {
        for timer in &mut self.timers {
            timer.update(dt);
        }
    }

    /// Fitness of every agent, in population order.
    #[must_use]
    pub fn fitness_vector(&self) -> &FitnessVector {
        &self.fitness
    }

    /// Best fitness seen this generation.
    #[must_use]
    pub fn highest_fitness(&self) -> Fitness {
        self.highest_fitness
    }

    /// Best fitness seen across all generations; never decreases.
    #[must_use]
    pub fn highest_fitness_overall(&self) -> Fitness {
        self.highest_fitness_overall
    }

    fn track_highest(&mut self) {
        let highest = self.fitness.iter().copied().max().unwrap_or(0);
        self.highest_fitness = highest;
        if self.highest_fitness_overall < highest {
            self.highest_fitness_overall = highest;
        }
    }
}

/// Time bonus for a finished agent; zero before the timer first advances.
fn time_bonus(max_fitness: Fitness, elapsed: f64) -> Fitness {
    if elapsed > 0.0 {
        (max_fitness as f64 / elapsed) as Fitness
    } else {
        0
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

/// Candidate connecting segments per inner point: `(outer edge index, length)`
/// sorted by length descending so the shortest pops off the back first.
fn gather_candidates(edges: &[Edge], pivot: usize) -> Vec<Vec<(usize, f64)>> {
    let mut pools = Vec::with_capacity(pivot);
    for i in 0..pivot {
        let mut pool = Vec::new();
        for j in pivot..edges.len() {
            let link = Edge::new(edges[i].a, edges[j].a);
            let blocked = edges
                .iter()
                .enumerate()
                .any(|(k, edge)| k != i && k != j && link.crosses(edge));
            if !blocked {
                pool.push((j, link.length()));
            }
        }
        pool.sort_by(|a, b| b.1.total_cmp(&a.1));
        pools.push(pool);
    }
    pools
}

/// One inner point's accepted connecting segments with their sort keys.
type Fan = Vec<(Edge, f64)>;

/// Greedily accept the shortest non-conflicting candidate per inner point,
/// round-robin, until every pool is exhausted; then key each fan's edges by
/// their angle relative to the local boundary direction and sort ascending.
fn accept_fan_edges(
    edges: &[Edge],
    pivot: usize,
    mut pools: Vec<Vec<(usize, f64)>>,
) -> Result<Vec<Fan>, TrackError> {
    let mut fans: Vec<Fan> = vec![Vec::new(); pivot];

    let mut open = true;
    while open {
        open = false;
        for i in 0..pivot {
            let Some((j, _)) = pools[i].pop() else {
                continue;
            };
            open = true;

            let link = Edge::new(edges[i].a, edges[j].a);
            let conflicts = fans
                .iter()
                .flatten()
                .any(|(accepted, _)| accepted.crosses(&link));
            if !conflicts {
                let angle = direction_angle(link.a, link.b);
                fans[i].push((link, angle));
            }
        }
    }

    for i in 0..pivot {
        if fans[i].is_empty() {
            return Err(TrackError::DegenerateGeometry {
                detail: "an inner boundary point accepts no connecting segment",
            });
        }

        // Key each edge by how far it has swept, in the direction of travel,
        // from the backward boundary direction at this point (the preceding
        // inner edge, reversed). Sorting ascending makes consecutive fan
        // edges tile the corridor and leaves the last edge pointing at the
        // next inner point's region.
        let previous = if i == 0 { &edges[pivot - 1] } else { &edges[i - 1] };
        let base = direction_angle(previous.b, previous.a);
        for entry in &mut fans[i] {
            entry.1 = (entry.1 - base).rem_euclid(360.0);
        }
        fans[i].sort_by(|a, b| a.1.total_cmp(&b.1));
    }

    Ok(fans)
}

/// Convert sorted fans into triangles: consecutive fan edges share the inner
/// point as apex, and each fan's closing triangle reaches to the next fan's
/// inner point, wrapping to the first fan at the end.
fn fan_triangles(fans: &[Fan]) -> Vec<Triangle> {
    let mut triangles = Vec::new();
    for (i, fan) in fans.iter().enumerate() {
        let last = fan.len() - 1;
        for j in 0..last {
            triangles.push(Triangle([fan[j].0.a, fan[j].0.b, fan[j + 1].0.b]));
        }
        let next_inner = fans[(i + 1) % fans.len()][0].0.a;
        triangles.push(Triangle([fan[last].0.a, fan[last].0.b, next_inner]));
    }
    triangles
}

fn triangulate(track: &Track) -> Result<Vec<Triangle>, TrackError> {
    let edges = track.edges();
    let pivot = track.pivot();

    let pools = gather_candidates(edges, pivot);
    let fans = accept_fan_edges(edges, pivot, pools)?;
    let mut triangles = fan_triangles(&fans);

    // The first two triangles sit on the start/finish discontinuity and must
    // not count toward progress.
    if triangles.len() <= 2 {
        return Err(TrackError::DegenerateGeometry {
            detail: "boundary yields no checkpoints",
        });
    }
    triangles.drain(..2);
    Ok(triangles)
}
