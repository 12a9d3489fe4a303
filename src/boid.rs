/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each boid follows four rules, applied in this order:
 * 1. Cohesion: Steer towards the average position of neighbors
 * 2. Separation: Steer away from neighbors that are too close
 * 3. Alignment: Steer towards the average velocity of neighbors
 * 4. Fear: Turn away from nearby predators
 *
 * Each rule only sees neighbors inside its own radius and inside the field
 * of view around the boid's heading at the moment the rule runs, so a rule
 * observes the velocity left behind by the rules before it.
 */

use std::collections::VecDeque;

use rand::Rng;

use crate::params::{BoundaryMode, SimulationParams};
use crate::sight::Perception;
use crate::vector::Vector2;
use crate::WORLD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kind {
    #[default]
    Normal,
    Predator,
}

#[derive(Debug, Clone)]
pub struct Boid {
    pub position: Vector2,
    pub velocity: Vector2,
    pub kind: Kind,
    // Past positions, oldest first
    tail: VecDeque<Vector2>,
}

impl Boid {
    pub fn new(position: Vector2, velocity: Vector2, kind: Kind) -> Self {
        Self {
            position,
            velocity,
            kind,
            tail: VecDeque::new(),
        }
    }

    // Random position in the unit square, random velocity up to max_speed per axis
    pub fn random<R: Rng + ?Sized>(rng: &mut R, max_speed: f64, kind: Kind) -> Self {
        let position = Vector2::random(rng, WORLD_SIZE, 0.0);
        Self::at(rng, position, max_speed, kind)
    }

    pub fn at<R: Rng + ?Sized>(rng: &mut R, position: Vector2, max_speed: f64, kind: Kind) -> Self {
        let velocity = Vector2::random(rng, max_speed * 2.0, -max_speed);
        Self::new(position, velocity, kind)
    }

    pub fn heading(&self) -> f64 {
        self.velocity.angle()
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    pub fn is_predator(&self) -> bool {
        self.kind == Kind::Predator
    }

    pub fn tail(&self) -> impl Iterator<Item = &Vector2> {
        self.tail.iter()
    }

    // Fly toward the centre of the visible group
    pub fn cohesion(&self, perception: &Perception, radius: f64, weight: f64) -> Vector2 {
        let (sum, count) = perception
            .in_sight(self.heading(), radius)
            .fold((Vector2::ZERO, 0usize), |(sum, count), n| (sum + n.position, count + 1));

        if count == 0 {
            return Vector2::ZERO;
        }

        let center = sum / count as f64;
        (center - self.position) * weight
    }

    // Keep some distance from close neighbours; not averaged, so crowds push harder
    pub fn separation(&self, perception: &Perception, radius: f64, weight: f64) -> Vector2 {
        let away: Vector2 = perception
            .in_sight(self.heading(), radius)
            .map(|n| self.position - n.position)
            .sum();

        away * weight
    }

    // Match the average velocity of the visible group
    pub fn alignment(&self, perception: &Perception, radius: f64, weight: f64) -> Vector2 {
        let (sum, count) = perception
            .in_sight(self.heading(), radius)
            .fold((Vector2::ZERO, 0usize), |(sum, count), n| (sum + n.velocity, count + 1));

        if count == 0 {
            return Vector2::ZERO;
        }

        (sum / count as f64 - self.velocity) * weight
    }

    /// Angle by which the boid's position should be rotated to flee the
    /// visible predators, or `None` when no predator is in range.
    pub fn fear(&self, perception: &Perception, radius: f64, weight: f64) -> Option<f64> {
        let (sum, count) = perception
            .in_sight(self.heading(), radius)
            .filter(|n| n.is_predator())
            .fold((Vector2::ZERO, 0usize), |(sum, count), n| (sum + n.position, count + 1));

        if count == 0 {
            return None;
        }

        let mut direction = sum / count as f64 - self.position;
        direction.normalize();
        Some(direction.angle() * weight)
    }

    // Apply the four rules in order
    pub fn flock(&mut self, perception: &Perception, params: &SimulationParams) {
        let cohesion = self.cohesion(perception, params.cohesion_radius, params.cohesion_weight);
        self.velocity += cohesion;

        let separation = self.separation(perception, params.separation_radius, params.separation_weight);
        self.velocity += separation;

        let alignment = self.alignment(perception, params.alignment_radius, params.alignment_weight);
        self.velocity += alignment;

        // Fear turns the position about the origin, not the velocity
        if let Some(turn) = self.fear(perception, params.fear_radius, params.fear_weight) {
            self.position.rotate(turn);
        }
    }

    // Push back from any edge closer than a margin that grows with speed
    pub fn bounce(&mut self) {
        let speed = self.speed();
        let margin = speed * 5.0;
        let turn_factor = speed / 5.0;

        if self.position.x < margin {
            self.velocity.x += turn_factor;
        }
        if self.position.y < margin {
            self.velocity.y += turn_factor;
        }
        if self.position.x > WORLD_SIZE - margin {
            self.velocity.x -= turn_factor;
        }
        if self.position.y > WORLD_SIZE - margin {
            self.velocity.y -= turn_factor;
        }
    }

    // Re-enter from the opposite edge
    pub fn wrap(&mut self) {
        self.position.wrap_unit();
    }

    // Boundary handling, speed clamp and integration for one tick
    pub fn update(&mut self, params: &SimulationParams) {
        if params.boundary == BoundaryMode::Bounce {
            self.bounce();
        }

        self.velocity.limit(params.max_speed);
        self.remember(params.tail_length);
        self.position += self.velocity;

        if params.boundary == BoundaryMode::Wrap {
            self.wrap();
        }
    }

    fn remember(&mut self, capacity: usize) {
        self.tail.push_back(self.position);
        while self.tail.len() > capacity {
            self.tail.pop_front();
        }
    }
}
