//! Node loads - forces and moments applied directly to nodes

use serde::{Deserialize, Serialize};

/// A load applied directly to a node (kip, kip-ft, global axes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    /// Force in X direction
    pub fx: f64,
    /// Force in Y direction (negative = downward)
    pub fy: f64,
    /// Force in Z direction
    pub fz: f64,
    /// Moment about X axis
    pub mx: f64,
    /// Moment about Y axis
    pub my: f64,
    /// Moment about Z axis
    pub mz: f64,
}

impl NodeLoad {
    /// Create a new node load with all components
    pub fn new(fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64) -> Self {
        Self {
            fx,
            fy,
            fz,
            mx,
            my,
            mz,
        }
    }

    /// Vertical force (positive up)
    pub fn fy(value: f64) -> Self {
        Self {
            fy: value,
            ..Self::default()
        }
    }

    /// Downward load of the given magnitude
    pub fn downward(magnitude: f64) -> Self {
        Self::fy(-magnitude.abs())
    }

    /// In-plane axial force and moment, the pair a tendon anchorage produces
    pub fn axial_and_moment(fx: f64, mz: f64) -> Self {
        Self {
            fx,
            mz,
            ..Self::default()
        }
    }

    /// Get the load as an array [FX, FY, FZ, MX, MY, MZ]
    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    /// Scale the load by a factor
    pub fn scaled(&self, factor: f64) -> Self {
        let a = self.as_array().map(|v| v * factor);
        Self::new(a[0], a[1], a[2], a[3], a[4], a[5])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downward_is_negative_y() {
        assert_eq!(NodeLoad::downward(5.0).fy, -5.0);
        assert_eq!(NodeLoad::downward(-5.0).fy, -5.0);
        assert_eq!(NodeLoad::axial_and_moment(3.0, 2.0).scaled(2.0).as_array(), [6.0, 0.0, 0.0, 0.0, 0.0, 4.0]);
    }
}
