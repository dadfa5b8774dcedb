//! Distributed loads on members

use serde::{Deserialize, Serialize};

/// A uniform line load over the full length of a member, in global axes
/// (kip/ft). Girder dead loads are vertical, so `wy` carries nearly everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributedLoad {
    /// Intensity in global X
    #[serde(default)]
    pub wx: f64,
    /// Intensity in global Y (negative = downward)
    #[serde(default)]
    pub wy: f64,
    /// Intensity in global Z
    #[serde(default)]
    pub wz: f64,
}

impl DistributedLoad {
    /// Create a uniform downward load (negative global Y)
    pub fn uniform_downward(w: f64) -> Self {
        Self {
            wy: -w.abs(),
            ..Self::default()
        }
    }

    /// Components as [wx, wy, wz]
    pub fn as_array(&self) -> [f64; 3] {
        [self.wx, self.wy, self.wz]
    }

    /// Scale the load by a factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            wx: self.wx * factor,
            wy: self.wy * factor,
            wz: self.wz * factor,
        }
    }

    /// Sum of two loads on the same member
    pub fn combined(&self, other: &DistributedLoad) -> Self {
        Self {
            wx: self.wx + other.wx,
            wy: self.wy + other.wy,
            wz: self.wz + other.wz,
        }
    }

    /// Get the total vertical force from this load over a member of `length`
    pub fn total_vertical(&self, length: f64) -> f64 {
        self.wy * length
    }
}
