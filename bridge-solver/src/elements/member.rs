//! Member element - girder segment between two nodes

use serde::{Deserialize, Serialize};

use super::{Material, Section};
use crate::math::{self, Mat12};

/// Element formulation. The solver only ever asks an element for its local
/// stiffness, so new formulations slot in here without touching assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Classical Euler-Bernoulli frame element
    #[default]
    EulerBernoulli,
    /// Frame element with vertical shear deformation (Timoshenko)
    ShearFlexible,
}

impl ElementKind {
    /// 12x12 local stiffness matrix for this formulation
    pub fn local_stiffness(&self, material: &Material, section: &Section, length: f64) -> Mat12 {
        let phi_z = match (self, section.avy) {
            (ElementKind::ShearFlexible, Some(avy)) if avy > 0.0 => {
                12.0 * material.e * section.iz / (material.g * avy * length * length)
            }
            _ => 0.0,
        };
        math::member_local_stiffness(
            material.e,
            material.g,
            section.a,
            section.iy,
            section.iz,
            section.j,
            length,
            phi_z,
        )
    }
}

/// A 3D frame member of the girder line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Name of the i-node (start)
    pub i_node: String,
    /// Name of the j-node (end)
    pub j_node: String,
    /// Name of the material
    pub material: String,
    /// Name of the section
    pub section: String,
    /// Rotation about longitudinal axis (radians)
    #[serde(default)]
    pub rotation: f64,
    /// Element formulation
    #[serde(default)]
    pub kind: ElementKind,
}

impl Member {
    /// Create a new member
    pub fn new(i_node: &str, j_node: &str, material: &str, section: &str) -> Self {
        Self {
            i_node: i_node.to_string(),
            j_node: j_node.to_string(),
            material: material.to_string(),
            section: section.to_string(),
            rotation: 0.0,
            kind: ElementKind::EulerBernoulli,
        }
    }

    /// Set member rotation about its longitudinal axis
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the element formulation
    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Local end forces of a solved member
/// [Fx_i, Fy_i, Fz_i, Mx_i, My_i, Mz_i, Fx_j, Fy_j, Fz_j, Mx_j, My_j, Mz_j]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberEndForces {
    pub forces: [f64; 12],
    pub length: f64,
    /// Uniform load in local y carried between the ends (negative = downward)
    pub wy: f64,
}

impl MemberEndForces {
    /// Axial force, positive in tension
    pub fn axial(&self) -> f64 {
        -self.forces[0]
    }

    /// Vertical shear at distance x from the i-node (left segment convention)
    pub fn shear(&self, x: f64) -> f64 {
        self.forces[1] + self.wy * x
    }

    /// Sagging-positive bending moment at distance x from the i-node
    pub fn moment(&self, x: f64) -> f64 {
        -self.forces[5] + self.forces[1] * x + self.wy * x * x / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_member_creation() {
        let member = Member::new("N1", "N2", "Concrete", "Girder");
        assert_eq!(member.i_node, "N1");
        assert_eq!(member.j_node, "N2");
        assert_eq!(member.kind, ElementKind::EulerBernoulli);
    }

    #[test]
    fn test_shear_flexible_is_softer() {
        let mat = Material::isotropic(4.0e5, 0.2, 0.15);
        let sec = Section::rectangular(1.0, 4.0);
        let eb = ElementKind::EulerBernoulli.local_stiffness(&mat, &sec, 8.0);
        let sf = ElementKind::ShearFlexible.local_stiffness(&mat, &sec, 8.0);
        assert!(sf[(1, 1)] < eb[(1, 1)]);
        assert_relative_eq!(sf[(0, 0)], eb[(0, 0)]);
    }

    #[test]
    fn test_simple_span_end_forces() {
        // 10 ft simple span, 2 k/ft downward: R = 10, M_mid = 25
        let f = MemberEndForces {
            forces: [0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0],
            length: 10.0,
            wy: -2.0,
        };
        assert_relative_eq!(f.moment(5.0), 25.0);
        assert_relative_eq!(f.shear(0.0), 10.0);
        assert_relative_eq!(f.shear(10.0), -10.0);
    }
}
