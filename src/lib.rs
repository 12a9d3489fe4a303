/*
 * Boid Flocking Core - Module Definitions
 *
 * This file defines the module structure of the flocking core: vector math,
 * the boid steering rules, neighbour queries, the KD-tree index and the
 * flock driver. Rendering lives outside the library (see the optional
 * viewer binary).
 */

// Re-export key components for easier access
pub use boid::{Boid, Kind};
pub use error::ConfigError;
pub use flock::Flock;
pub use kdtree::{Axis, KdTree, Point};
pub use params::{BoundaryMode, NeighborSearch, SimulationParams};
pub use sight::{IndexedScan, LinearScan, Neighbor, NeighborQuery, Perception};
pub use vector::Vector2;

// Define modules
pub mod boid;
pub mod error;
pub mod flock;
pub mod kdtree;
pub mod params;
pub mod sight;
pub mod vector;

// Constants
// Boids live in the unit square
pub const WORLD_SIZE: f64 = 1.0;
