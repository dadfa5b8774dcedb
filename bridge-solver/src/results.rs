//! Result types for static girder-line solves

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::elements::MemberEndForces;
use crate::error::{BridgeError, BridgeResult};
use crate::model::GirderLayout;

/// Displacement results at a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplacement {
    /// Displacement in X direction
    pub dx: f64,
    /// Displacement in Y direction
    pub dy: f64,
    /// Displacement in Z direction
    pub dz: f64,
    /// Rotation about X axis
    pub rx: f64,
    /// Rotation about Y axis
    pub ry: f64,
    /// Rotation about Z axis
    pub rz: f64,
}

impl NodeDisplacement {
    /// Create from array [DX, DY, DZ, RX, RY, RZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
            rx: arr[3],
            ry: arr[4],
            rz: arr[5],
        }
    }
}

/// Reaction forces at a supported node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    /// Reaction force in X direction
    pub fx: f64,
    /// Reaction force in Y direction (positive up)
    pub fy: f64,
    /// Reaction force in Z direction
    pub fz: f64,
    /// Reaction moment about X axis
    pub mx: f64,
    /// Reaction moment about Y axis
    pub my: f64,
    /// Reaction moment about Z axis
    pub mz: f64,
}

impl Reactions {
    /// Create from array [FX, FY, FZ, MX, MY, MZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            fx: arr[0],
            fy: arr[1],
            fz: arr[2],
            mx: arr[3],
            my: arr[4],
            mz: arr[5],
        }
    }
}

/// Displacements, member end forces and reactions from one load set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Solution {
    /// Name of the load set that produced this solution
    pub load_set: String,
    pub displacements: BTreeMap<String, NodeDisplacement>,
    pub member_forces: BTreeMap<String, MemberEndForces>,
    pub reactions: BTreeMap<String, Reactions>,
}

impl Solution {
    /// Displacement of a node
    pub fn node_displacement(&self, node: &str) -> BridgeResult<NodeDisplacement> {
        self.displacements
            .get(node)
            .copied()
            .ok_or_else(|| BridgeError::NodeNotFound(node.to_string()))
    }

    /// Local end forces of a member
    pub fn member_forces(&self, member: &str) -> BridgeResult<&MemberEndForces> {
        self.member_forces
            .get(member)
            .ok_or_else(|| BridgeError::MemberNotFound(member.to_string()))
    }

    /// Reactions at a supported node (zero for unsupported nodes)
    pub fn reactions(&self, node: &str) -> Reactions {
        self.reactions.get(node).copied().unwrap_or_default()
    }

    /// Sum of vertical reactions
    pub fn total_vertical_reaction(&self) -> f64 {
        self.reactions.values().map(|r| r.fy).sum()
    }

    /// End forces of the member reaching node `k` of a girder line from the
    /// left (from the right for the first node), the local position of the
    /// node on that member, and the sign that turns local shear into
    /// left-to-right shear.
    fn at_girder_node(&self, layout: &GirderLayout, k: usize) -> BridgeResult<(&MemberEndForces, f64, f64)> {
        let (e, node_is_right_end) = if k == 0 { (0, false) } else { (k - 1, true) };
        let name = layout
            .members
            .get(e)
            .ok_or_else(|| BridgeError::InvalidInput(format!("girder line has no node {k}")))?;
        let forces = self.member_forces(name)?;
        let forward = layout.forward[e];
        let x = if node_is_right_end == forward { forces.length } else { 0.0 };
        let sign = if forward { 1.0 } else { -1.0 };
        Ok((forces, x, sign))
    }

    /// Sagging-positive moment at node `k` of a girder line
    pub fn girder_moment(&self, layout: &GirderLayout, k: usize) -> BridgeResult<f64> {
        let (f, x, _) = self.at_girder_node(layout, k)?;
        Ok(f.moment(x))
    }

    /// Shear just left of node `k` (just right of the first node)
    pub fn girder_shear(&self, layout: &GirderLayout, k: usize) -> BridgeResult<f64> {
        let (f, x, sign) = self.at_girder_node(layout, k)?;
        Ok(sign * f.shear(x))
    }

    /// Axial force at node `k`, tension positive
    pub fn girder_axial(&self, layout: &GirderLayout, k: usize) -> BridgeResult<f64> {
        let (f, _, _) = self.at_girder_node(layout, k)?;
        Ok(f.axial())
    }
}
