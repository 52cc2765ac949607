//! Roadmap node coordinates.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// A point in grid-pixel coordinates (x = column, y = row).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphNode {
    pub x: f64,
    pub y: f64,
}

impl GraphNode {
    /// Create a new node
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared length as a vector from the origin
    #[inline]
    pub fn square_magnitude(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Length as a vector from the origin
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.square_magnitude().sqrt()
    }

    /// Unit vector in the same direction. A zero vector stays zero.
    #[inline]
    pub fn unit(&self) -> GraphNode {
        let len = self.magnitude();
        if len > 0.0 {
            GraphNode::new(self.x / len, self.y / len)
        } else {
            *self
        }
    }

    /// Squared distance (avoids sqrt)
    #[inline]
    pub fn distance_squared(&self, other: &GraphNode) -> f64 {
        (*self - *other).square_magnitude()
    }

    /// Euclidean distance to another node
    #[inline]
    pub fn distance(&self, other: &GraphNode) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Both coordinates are finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for GraphNode {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        GraphNode::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for GraphNode {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for GraphNode {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        GraphNode::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for GraphNode {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        GraphNode::new(self.x * scalar, self.y * scalar)
    }
}

impl From<(f64, f64)> for GraphNode {
    fn from((x, y): (f64, f64)) -> Self {
        GraphNode::new(x, y)
    }
}
