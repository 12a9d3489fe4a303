/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that contains all the
 * tunable parameters for a flock. Parameters are a plain record: a Flock
 * validates them when they are set and the stepping loop trusts them from
 * then on. They can be loaded from TOML, and a diff against a previous
 * record tells the flock what has to be rebuilt.
 */

use std::f64::consts::TAU;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// How boids behave at the edges of the unit square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    // Opposite edges are adjacent
    Wrap,
    // Boids are pushed back within a speed-dependent margin of each edge
    #[default]
    Bounce,
}

// Which neighbour query provider drives a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSearch {
    #[default]
    Linear,
    KdTree,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub num_boids: usize,

    // Steer towards the centre of nearby boids
    pub cohesion_weight: f64,
    pub cohesion_radius: f64,

    // Steer away from boids that are too close
    pub separation_weight: f64,
    pub separation_radius: f64,

    // Match the velocity of nearby boids
    pub alignment_weight: f64,
    pub alignment_radius: f64,

    // Turn away from nearby predators
    pub fear_weight: f64,
    pub fear_radius: f64,

    // Radians; 2π means a boid sees all around itself
    pub field_of_view: f64,
    pub max_speed: f64,
    pub boundary: BoundaryMode,
    pub neighbor_search: NeighborSearch,

    // Positions remembered per boid for drawing trails; 0 disables
    pub tail_length: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_boids: 100,
            cohesion_weight: 0.05,
            cohesion_radius: 0.075,
            separation_weight: 0.05,
            separation_radius: 0.025,
            alignment_weight: 0.05,
            alignment_radius: 0.050,
            fear_weight: 0.05,
            fear_radius: 0.075,
            field_of_view: 210.0_f64.to_radians(),
            max_speed: 0.001,
            boundary: BoundaryMode::Bounce,
            neighbor_search: NeighborSearch::Linear,
            tail_length: 20,
        }
    }
}

// What changed between two parameter records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamChanges {
    pub num_boids: bool,
    pub steering: bool,
    pub boundary: bool,
    pub neighbor_search: bool,
    pub tail_length: bool,
}

impl ParamChanges {
    pub fn any(&self) -> bool {
        self.num_boids || self.steering || self.boundary || self.neighbor_search || self.tail_length
    }
}

impl SimulationParams {
    // Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radii = [
            ("cohesion_radius", self.cohesion_radius),
            ("separation_radius", self.separation_radius),
            ("alignment_radius", self.alignment_radius),
            ("fear_radius", self.fear_radius),
        ];
        for (field, value) in radii {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRadius { field, value });
            }
        }

        let weights = [
            ("cohesion_weight", self.cohesion_weight),
            ("separation_weight", self.separation_weight),
            ("alignment_weight", self.alignment_weight),
            ("fear_weight", self.fear_weight),
        ];
        for (field, value) in weights {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight { field, value });
            }
        }

        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(ConfigError::InvalidMaxSpeed(self.max_speed));
        }

        if !(0.0..=TAU).contains(&self.field_of_view) {
            return Err(ConfigError::InvalidFieldOfView(self.field_of_view));
        }

        Ok(())
    }

    // Parse and validate a TOML document; missing fields take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let params: SimulationParams = toml::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    // Widest radius any steering rule looks at
    pub fn perception_radius(&self) -> f64 {
        self.cohesion_radius
            .max(self.separation_radius)
            .max(self.alignment_radius)
            .max(self.fear_radius)
    }

    pub fn diff(&self, previous: &SimulationParams) -> ParamChanges {
        ParamChanges {
            num_boids: self.num_boids != previous.num_boids,
            steering: self.cohesion_weight != previous.cohesion_weight
                || self.cohesion_radius != previous.cohesion_radius
                || self.separation_weight != previous.separation_weight
                || self.separation_radius != previous.separation_radius
                || self.alignment_weight != previous.alignment_weight
                || self.alignment_radius != previous.alignment_radius
                || self.fear_weight != previous.fear_weight
                || self.fear_radius != previous.fear_radius
                || self.field_of_view != previous.field_of_view
                || self.max_speed != previous.max_speed,
            boundary: self.boundary != previous.boundary,
            neighbor_search: self.neighbor_search != previous.neighbor_search,
            tail_length: self.tail_length != previous.tail_length,
        }
    }
}
