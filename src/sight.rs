/*
 * Sight Module
 *
 * Neighbour queries for the steering rules. A query provider gathers every
 * other boid within a radius (Euclidean in bounce mode, toroidal in wrap
 * mode); Perception then narrows that list to one rule's radius and the
 * field-of-view cone around the observer's current heading.
 *
 * Providers:
 * - LinearScan:  checks every boid, O(n) per query
 * - IndexedScan: prunes with a KD-tree built at the start of the tick
 *
 * Both return the same neighbours in population order, so a flock behaves
 * identically whichever provider drives it.
 */

use std::f64::consts::{PI, TAU};

use crate::boid::{Boid, Kind};
use crate::kdtree::{Axis, KdTree, Point};
use crate::params::BoundaryMode;
use crate::vector::Vector2;
use crate::WORLD_SIZE;

// Widening applied to indexed searches so rounding never drops a candidate
const SEARCH_MARGIN: f64 = 1e-9;

// Another boid as seen from an observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    // Minimum-image position in wrap mode, actual position otherwise
    pub position: Vector2,
    pub velocity: Vector2,
    pub kind: Kind,
    pub distance: f64,
    pub bearing: f64,
}

impl Neighbor {
    pub fn observe(observer: &Boid, index: usize, other: &Boid, boundary: BoundaryMode) -> Self {
        let offset = offset(observer.position, other.position, boundary);
        Self {
            index,
            position: observer.position + offset,
            velocity: other.velocity,
            kind: other.kind,
            distance: offset.norm(),
            bearing: offset.angle(),
        }
    }

    pub fn is_predator(&self) -> bool {
        self.kind == Kind::Predator
    }
}

// Offset from `from` to `to` under the given boundary topology
pub fn offset(from: Vector2, to: Vector2, boundary: BoundaryMode) -> Vector2 {
    match boundary {
        BoundaryMode::Wrap => from.toroidal_delta(to, WORLD_SIZE, WORLD_SIZE),
        BoundaryMode::Bounce => to - from,
    }
}

pub fn distance(from: Vector2, to: Vector2, boundary: BoundaryMode) -> f64 {
    offset(from, to, boundary).norm()
}

// Signed angle from `heading` to `bearing`, in [-π, π]
pub fn angular_offset(bearing: f64, heading: f64) -> f64 {
    let delta = (bearing - heading).rem_euclid(TAU);
    if delta > PI {
        delta - TAU
    } else {
        delta
    }
}

/// A candidate list together with the field of view used to filter it.
pub struct Perception<'a> {
    neighbors: &'a [Neighbor],
    field_of_view: f64,
}

impl<'a> Perception<'a> {
    pub fn new(neighbors: &'a [Neighbor], field_of_view: f64) -> Self {
        Self {
            neighbors,
            field_of_view,
        }
    }

    // Neighbours closer than `radius` whose bearing lies in the cone around `heading`
    pub fn in_sight(&self, heading: f64, radius: f64) -> impl Iterator<Item = &'a Neighbor> + '_ {
        let half_fov = self.field_of_view / 2.0;
        let neighbors = self.neighbors;
        neighbors.iter().filter(move |n| {
            // A neighbour on top of the observer has no bearing; it is always seen
            n.distance < radius
                && (n.distance == 0.0 || angular_offset(n.bearing, heading).abs() <= half_fov)
        })
    }
}

pub trait NeighborQuery {
    /// Every boid other than `observer` closer than `radius`, in population order.
    fn candidates(&self, boids: &[Boid], observer: usize, radius: f64) -> Vec<Neighbor>;

    /// Called after a boid has been moved during the tick.
    fn moved(&mut self, _from: Vector2, _to: Vector2) {}
}

pub struct LinearScan {
    boundary: BoundaryMode,
}

impl LinearScan {
    pub fn new(boundary: BoundaryMode) -> Self {
        Self { boundary }
    }
}

impl NeighborQuery for LinearScan {
    fn candidates(&self, boids: &[Boid], observer: usize, radius: f64) -> Vec<Neighbor> {
        let me = &boids[observer];
        boids
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != observer)
            .map(|(i, other)| Neighbor::observe(me, i, other, self.boundary))
            .filter(|n| n.distance < radius)
            .collect()
    }
}

// A boid's tick-start position as stored in the index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub index: usize,
    pub position: Vector2,
}

impl Point for Entry {
    fn coord(&self, axis: Axis) -> f64 {
        self.position.coord(axis)
    }
}

// Fill `tree` with every boid's current position
pub fn rebuild_index(tree: &mut KdTree<Entry>, boids: &[Boid], boundary: BoundaryMode) {
    tree.clear();
    for (index, boid) in boids.iter().enumerate() {
        let mut position = boid.position;
        if boundary == BoundaryMode::Wrap {
            position.wrap_unit();
        }
        tree.insert(Entry { index, position });
    }
}

/// Radius queries against a tree built from tick-start positions.
///
/// Boids move while the tick runs, so every search is widened by the largest
/// displacement seen so far and the result is re-checked against current
/// positions. In wrap mode the nine periodic images of the query point are
/// searched.
pub struct IndexedScan<'a> {
    tree: &'a KdTree<Entry>,
    boundary: BoundaryMode,
    slack: f64,
}

impl<'a> IndexedScan<'a> {
    pub fn new(tree: &'a KdTree<Entry>, boundary: BoundaryMode) -> Self {
        Self {
            tree,
            boundary,
            slack: 0.0,
        }
    }

    pub fn slack(&self) -> f64 {
        self.slack
    }
}

impl NeighborQuery for IndexedScan<'_> {
    fn candidates(&self, boids: &[Boid], observer: usize, radius: f64) -> Vec<Neighbor> {
        let me = &boids[observer];
        let reach = radius + self.slack + SEARCH_MARGIN;

        let mut indices: Vec<usize> = match self.boundary {
            BoundaryMode::Bounce => self
                .tree
                .search(me.position, reach)
                .into_iter()
                .map(|entry| entry.index)
                .collect(),
            BoundaryMode::Wrap => {
                let mut center = me.position;
                center.wrap_unit();
                let mut found = Vec::new();
                for dx in [-WORLD_SIZE, 0.0, WORLD_SIZE] {
                    for dy in [-WORLD_SIZE, 0.0, WORLD_SIZE] {
                        let image = center + Vector2::new(dx, dy);
                        found.extend(self.tree.search(image, reach).into_iter().map(|entry| entry.index));
                    }
                }
                found
            }
        };
        indices.sort_unstable();
        indices.dedup();

        indices
            .into_iter()
            .filter(|&i| i != observer)
            .map(|i| Neighbor::observe(me, i, &boids[i], self.boundary))
            .filter(|n| n.distance < radius)
            .collect()
    }

    fn moved(&mut self, from: Vector2, to: Vector2) {
        self.slack = self.slack.max(distance(from, to, self.boundary));
    }
}
