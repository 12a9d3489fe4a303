/*
 * Vector Module
 *
 * This module defines Vector2, the 2D vector used for boid positions and
 * velocities. Arithmetic operators return new values; scale, normalize, limit
 * and rotate mutate in place and return `&mut Self` so they can be chained.
 *
 * Two distinct angle operations exist:
 * - angle():       heading of the vector itself
 * - angle_to(p):   bearing from this point towards another point
 */

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use rand::Rng;

// Norms at or below this are treated as zero by normalize()
pub const NORM_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    // Each component uniform in [offset, offset + max)
    pub fn random<R: Rng + ?Sized>(rng: &mut R, max: f64, offset: f64) -> Self {
        Self::new(
            rng.gen::<f64>() * max + offset,
            rng.gen::<f64>() * max + offset,
        )
    }

    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    pub fn norm_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn scale(&mut self, factor: f64) -> &mut Self {
        self.x *= factor;
        self.y *= factor;
        self
    }

    pub fn normalize(&mut self) -> &mut Self {
        let magnitude = self.norm();
        if magnitude > NORM_EPSILON {
            *self /= magnitude;
        }
        self
    }

    // Scale down to `max` length if longer, otherwise leave unchanged
    pub fn limit(&mut self, max: f64) -> &mut Self {
        let magnitude = self.norm();
        if magnitude > max {
            self.scale(max / magnitude);
        }
        self
    }

    // Rotate about the origin by `theta` radians
    pub fn rotate(&mut self, theta: f64) -> &mut Self {
        let (sin, cos) = theta.sin_cos();
        *self = Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos);
        self
    }

    // Reduce each component into [0, 1)
    pub fn wrap_unit(&mut self) -> &mut Self {
        self.x = wrap_coordinate(self.x);
        self.y = wrap_coordinate(self.y);
        self
    }

    pub fn distance(&self, other: Vector2) -> f64 {
        (other - *self).norm()
    }

    pub fn distance_squared(&self, other: Vector2) -> f64 {
        (other - *self).norm_squared()
    }

    /// Signed minimum-image offset from `self` to `other` in a periodic
    /// domain of the given extents.
    pub fn toroidal_delta(&self, other: Vector2, width: f64, height: f64) -> Vector2 {
        Vector2::new(
            minimum_image(other.x - self.x, width),
            minimum_image(other.y - self.y, height),
        )
    }

    /// Distance in a wrap-around domain: per axis, a raw delta longer than
    /// half the extent is replaced by `extent - |delta|`.
    pub fn toroidal_distance(&self, other: Vector2, width: f64, height: f64) -> f64 {
        self.toroidal_delta(other, width, height).norm()
    }

    // Heading of the vector itself
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    // Bearing from this point towards `other`
    pub fn angle_to(&self, other: Vector2) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }
}

fn minimum_image(delta: f64, extent: f64) -> f64 {
    let half = extent / 2.0;
    if delta.abs() <= half {
        return delta;
    }
    let reduced = delta.rem_euclid(extent);
    if reduced > half {
        reduced - extent
    } else {
        reduced
    }
}

fn wrap_coordinate(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    // rem_euclid rounds tiny negatives up to exactly 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul for Vector2 {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }
}

impl Div for Vector2 {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        Self::new(self.x / other.x, self.y / other.y)
    }
}

impl Add<f64> for Vector2 {
    type Output = Self;

    fn add(self, scalar: f64) -> Self {
        Self::new(self.x + scalar, self.y + scalar)
    }
}

impl Sub<f64> for Vector2 {
    type Output = Self;

    fn sub(self, scalar: f64) -> Self {
        Self::new(self.x - scalar, self.y - scalar)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        Self::new(self.x / scalar, self.y / scalar)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl AddAssign<f64> for Vector2 {
    fn add_assign(&mut self, scalar: f64) {
        self.x += scalar;
        self.y += scalar;
    }
}

impl SubAssign<f64> for Vector2 {
    fn sub_assign(&mut self, scalar: f64) {
        self.x -= scalar;
        self.y -= scalar;
    }
}

impl MulAssign<f64> for Vector2 {
    fn mul_assign(&mut self, scalar: f64) {
        self.x *= scalar;
        self.y *= scalar;
    }
}

impl DivAssign<f64> for Vector2 {
    fn div_assign(&mut self, scalar: f64) {
        self.x /= scalar;
        self.y /= scalar;
    }
}

impl std::iter::Sum for Vector2 {
    fn sum<I: Iterator<Item = Vector2>>(iter: I) -> Self {
        iter.fold(Vector2::ZERO, |acc, v| acc + v)
    }
}
