//! Frame section properties

use serde::{Deserialize, Serialize};

/// Stiffness properties of a frame member in frame-model units (ft², ft⁴).
/// Girder shapes convert their inch properties with
/// [`GirderShape::frame_section`](crate::girder::GirderShape::frame_section).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub a: f64,
    /// Out-of-plane bending
    pub iy: f64,
    /// Vertical bending of the girder
    pub iz: f64,
    /// Torsion constant
    pub j: f64,
    /// Vertical shear area, read by shear-flexible members only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avy: Option<f64>,
}

impl Section {
    pub fn new(a: f64, iy: f64, iz: f64, j: f64) -> Self {
        Self { a, iy, iz, j, avy: None }
    }

    /// Solid rectangle, `depth` vertical
    pub fn rectangular(width: f64, depth: f64) -> Self {
        let (long, short) = (width.max(depth), width.min(depth));
        Self {
            a: width * depth,
            iy: depth * width.powi(3) / 12.0,
            iz: width * depth.powi(3) / 12.0,
            // Saint-Venant approximation for a solid rectangle
            j: long * short.powi(3) * (1.0 / 3.0 - 0.21 * short / long),
            avy: Some(width * depth * 5.0 / 6.0),
        }
    }

    pub fn with_shear_area(self, avy: f64) -> Self {
        Self { avy: Some(avy), ..self }
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::rectangular(1.0, 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle() {
        let s = Section::rectangular(1.5, 4.0);
        assert_relative_eq!(s.a, 6.0);
        assert_relative_eq!(s.iz, 8.0);
        assert!(s.iz > s.iy);
        assert_relative_eq!(s.avy.unwrap(), 5.0);
        assert_relative_eq!(s.with_shear_area(2.0).avy.unwrap(), 2.0);
    }
}
