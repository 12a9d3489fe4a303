/*
 * Error Module
 *
 * Errors raised at the configuration boundary. The stepping loop itself
 * never fails: parameters are validated when they are set, and degenerate
 * neighbour sets are defined as no-ops.
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative radius (got {value})")]
    InvalidRadius { field: &'static str, value: f64 },

    #[error("{field} must be finite (got {value})")]
    NonFiniteWeight { field: &'static str, value: f64 },

    #[error("max_speed must be finite and greater than zero (got {0})")]
    InvalidMaxSpeed(f64),

    #[error("field_of_view must lie within [0, 2π] radians (got {0})")]
    InvalidFieldOfView(f64),

    #[error("failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse parameters: {0}")]
    Parse(#[from] toml::de::Error),
}
