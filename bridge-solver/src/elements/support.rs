//! Bearings and other nodal restraints

use serde::{Deserialize, Serialize};

/// Nodal degree of freedom, in assembly order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dof {
    Dx,
    Dy,
    Dz,
    Rx,
    Ry,
    Rz,
}

impl Dof {
    pub const ALL: [Dof; 6] = [Dof::Dx, Dof::Dy, Dof::Dz, Dof::Rx, Dof::Ry, Dof::Rz];

    /// Offset of this DOF within a node's block of six
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Restraint at a node
///
/// A girder line bends in the XY plane only, so the bearing presets also hold
/// the transverse translation and torsion, which a line model cannot resist
/// any other way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Support {
    /// Restraint flags indexed by [`Dof::index`]
    pub restraints: [bool; 6],
    /// Imposed vertical displacement (ft), negative for settlement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<f64>,
    /// Imposed rotation about Z (rad)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imposed_rotation: Option<f64>,
}

impl Support {
    fn restraining(dofs: &[Dof]) -> Self {
        let mut support = Self::default();
        for &dof in dofs {
            support.restraints[dof.index()] = true;
        }
        support
    }

    /// Built-in end: every DOF held
    pub fn fixed() -> Self {
        Self::restraining(&Dof::ALL)
    }

    /// Fixed bearing: translations and torsion held, free to rotate in bending
    pub fn pinned() -> Self {
        Self::restraining(&[Dof::Dx, Dof::Dy, Dof::Dz, Dof::Rx])
    }

    /// Expansion bearing: as [`Support::pinned`] but free to slide along the girder
    pub fn roller() -> Self {
        Self::restraining(&[Dof::Dy, Dof::Dz, Dof::Rx])
    }

    /// Impose a vertical displacement at this bearing
    pub fn with_settlement(mut self, dy: f64) -> Self {
        self.settlement = Some(dy);
        self.restraints[Dof::Dy.index()] = true;
        self
    }

    /// Impose a rotation about Z at this bearing
    pub fn with_imposed_rotation(mut self, rz: f64) -> Self {
        self.imposed_rotation = Some(rz);
        self.restraints[Dof::Rz.index()] = true;
        self
    }

    pub fn restrains(&self, dof: Dof) -> bool {
        self.restraints[dof.index()]
    }

    /// Prescribed value of every restrained DOF, zero unless imposed
    pub fn prescribed(&self) -> impl Iterator<Item = (Dof, f64)> + '_ {
        Dof::ALL.into_iter().filter(|&d| self.restrains(d)).map(|d| {
            let value = match d {
                Dof::Dy => self.settlement,
                Dof::Rz => self.imposed_rotation,
                _ => None,
            };
            (d, value.unwrap_or(0.0))
        })
    }

    pub fn is_supported(&self) -> bool {
        self.restraints.iter().any(|&r| r)
    }

    pub fn num_restrained(&self) -> usize {
        self.restraints.iter().filter(|&&r| r).count()
    }
}
