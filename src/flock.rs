/*
 * Flock Module
 *
 * The Flock owns a population of boids and the parameters that drive it.
 * One call to step() advances every boid once, in population order, updating
 * each in place: a boid later in the sequence already sees the new positions
 * and velocities of the boids before it.
 *
 * Neighbour lookups go through a NeighborQuery provider chosen by the
 * parameters: a linear scan by default, or a KD-tree rebuilt at the start of
 * every tick.
 */

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::boid::{Boid, Kind};
use crate::error::ConfigError;
use crate::kdtree::KdTree;
use crate::params::{NeighborSearch, SimulationParams};
use crate::sight::{rebuild_index, Entry, IndexedScan, LinearScan, NeighborQuery, Perception};
use crate::vector::Vector2;

pub struct Flock {
    boids: Vec<Boid>,
    params: SimulationParams,
    rng: StdRng,
    // Reused between ticks when the KD-tree provider is selected
    index: KdTree<Entry>,
}

impl Flock {
    // Create `params.num_boids` random boids
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        Self::build(params, StdRng::from_entropy())
    }

    // Same as new() but reproducible
    pub fn with_seed(params: SimulationParams, seed: u64) -> Result<Self, ConfigError> {
        Self::build(params, StdRng::seed_from_u64(seed))
    }

    // Start from an explicit population; num_boids is taken from its length
    pub fn from_boids(boids: Vec<Boid>, params: SimulationParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let params = SimulationParams {
            num_boids: boids.len(),
            ..params
        };
        Ok(Self {
            boids,
            params,
            rng: StdRng::from_entropy(),
            index: KdTree::new(),
        })
    }

    fn build(params: SimulationParams, mut rng: StdRng) -> Result<Self, ConfigError> {
        params.validate()?;
        let boids = (0..params.num_boids)
            .map(|_| Boid::random(&mut rng, params.max_speed, Kind::Normal))
            .collect();
        debug!(num_boids = params.num_boids, "flock created");
        Ok(Self {
            boids,
            params,
            rng,
            index: KdTree::new(),
        })
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    /// Replaces the parameters after validating them. A changed `num_boids`
    /// resizes the population. On error nothing changes.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), ConfigError> {
        params.validate()?;
        let changes = params.diff(&self.params);
        if !changes.any() {
            return Ok(());
        }

        debug!(?changes, "flock parameters replaced");
        self.params = params;
        if changes.num_boids {
            self.resize(params.num_boids);
        }
        if changes.neighbor_search && params.neighbor_search == NeighborSearch::Linear {
            self.index.clear();
        }
        Ok(())
    }

    // Edit a copy of the parameters and commit it if it validates
    pub fn update_params<F>(&mut self, edit: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut SimulationParams),
    {
        let mut params = self.params;
        edit(&mut params);
        self.set_params(params)
    }

    // Append a normal boid, at a random position if none is given
    pub fn add(&mut self, position: Option<Vector2>) {
        self.add_kind(position, Kind::Normal);
    }

    pub fn add_predator(&mut self, position: Option<Vector2>) {
        self.add_kind(position, Kind::Predator);
    }

    pub fn add_kind(&mut self, position: Option<Vector2>, kind: Kind) {
        let max_speed = self.params.max_speed;
        let boid = match position {
            Some(position) => Boid::at(&mut self.rng, position, max_speed, kind),
            None => Boid::random(&mut self.rng, max_speed, kind),
        };
        self.boids.push(boid);
        self.params.num_boids = self.boids.len();
        debug!(?kind, num_boids = self.boids.len(), "boid added");
    }

    // Grow with random boids or drop boids from the end
    pub fn resize(&mut self, size: usize) {
        let max_speed = self.params.max_speed;
        let rng = &mut self.rng;
        self.boids
            .resize_with(size, || Boid::random(rng, max_speed, Kind::Normal));
        self.params.num_boids = size;
        debug!(num_boids = size, "flock resized");
    }

    // Advance every boid by one tick
    pub fn step(&mut self) {
        let params = self.params;
        trace!(
            num_boids = self.boids.len(),
            search = ?params.neighbor_search,
            "flock step"
        );

        match params.neighbor_search {
            NeighborSearch::Linear => {
                let mut scan = LinearScan::new(params.boundary);
                advance(&mut self.boids, &params, &mut scan);
            }
            NeighborSearch::KdTree => {
                // Positions in the tree are never updated in place, so it is
                // refilled before any query of this tick
                rebuild_index(&mut self.index, &self.boids, params.boundary);
                let mut scan = IndexedScan::new(&self.index, params.boundary);
                advance(&mut self.boids, &params, &mut scan);
            }
        }
    }
}

// One sequential, in-place pass over the population
fn advance<Q: NeighborQuery>(boids: &mut [Boid], params: &SimulationParams, query: &mut Q) {
    let reach = params.perception_radius();

    for i in 0..boids.len() {
        let candidates = query.candidates(boids, i, reach);
        let perception = Perception::new(&candidates, params.field_of_view);

        let boid = &mut boids[i];
        let before = boid.position;
        boid.flock(&perception, params);
        boid.update(params);
        query.moved(before, boid.position);
    }
}
