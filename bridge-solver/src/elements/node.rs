//! Girder-line nodes

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A point of the frame model (ft). X runs along the girder, Y is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Node {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Node on the girder axis at station `x`
    pub fn at_station(x: f64) -> Self {
        Self { x, ..Self::default() }
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        (other.position() - self.position()).norm()
    }
}
