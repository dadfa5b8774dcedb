//! Bridge model - the structural model container
//!
//! A `BridgeModel` holds named nodes, members, supports, materials and
//! sections. It is built once per analysis and treated as read-only while
//! solving; geometry edits go through `with_*` methods that return a new model.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::elements::{Dof, Material, Member, Node, Section, Support};
use crate::error::{BridgeError, BridgeResult};

/// Minimum number of restrained DOFs that can suppress the six rigid-body modes
const MIN_RESTRAINED_DOFS: usize = 6;

/// Members shorter than this (ft) are rejected as zero-length
const MIN_MEMBER_LENGTH: f64 = 1e-9;

/// The 3D frame model of a girder line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeModel {
    /// Nodes in the model
    pub nodes: BTreeMap<String, Node>,
    /// Materials in the model
    pub materials: BTreeMap<String, Material>,
    /// Sections in the model
    pub sections: BTreeMap<String, Section>,
    /// Members (frame elements) in the model
    pub members: BTreeMap<String, Member>,
    /// Support conditions at nodes
    pub supports: BTreeMap<String, Support>,
}

impl BridgeModel {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the model
    pub fn add_node(&mut self, name: &str, node: Node) -> BridgeResult<()> {
        if self.nodes.contains_key(name) {
            return Err(BridgeError::DuplicateName(name.to_string()));
        }
        self.nodes.insert(name.to_string(), node);
        Ok(())
    }

    /// Add a material to the model
    pub fn add_material(&mut self, name: &str, material: Material) -> BridgeResult<()> {
        if self.materials.contains_key(name) {
            return Err(BridgeError::DuplicateName(name.to_string()));
        }
        self.materials.insert(name.to_string(), material);
        Ok(())
    }

    /// Add a section to the model
    pub fn add_section(&mut self, name: &str, section: Section) -> BridgeResult<()> {
        if self.sections.contains_key(name) {
            return Err(BridgeError::DuplicateName(name.to_string()));
        }
        self.sections.insert(name.to_string(), section);
        Ok(())
    }

    /// Add a member to the model
    pub fn add_member(&mut self, name: &str, member: Member) -> BridgeResult<()> {
        if !self.nodes.contains_key(&member.i_node) {
            return Err(BridgeError::NodeNotFound(member.i_node.clone()));
        }
        if !self.nodes.contains_key(&member.j_node) {
            return Err(BridgeError::NodeNotFound(member.j_node.clone()));
        }
        if !self.materials.contains_key(&member.material) {
            return Err(BridgeError::MaterialNotFound(member.material.clone()));
        }
        if !self.sections.contains_key(&member.section) {
            return Err(BridgeError::SectionNotFound(member.section.clone()));
        }
        if self.members.contains_key(name) {
            return Err(BridgeError::DuplicateName(name.to_string()));
        }

        self.members.insert(name.to_string(), member);
        Ok(())
    }

    /// Add a support condition
    pub fn add_support(&mut self, node_name: &str, support: Support) -> BridgeResult<()> {
        if !self.nodes.contains_key(node_name) {
            return Err(BridgeError::NodeNotFound(node_name.to_string()));
        }
        self.supports.insert(node_name.to_string(), support);
        Ok(())
    }

    /// Look up a node
    pub fn node(&self, name: &str) -> BridgeResult<&Node> {
        self.nodes
            .get(name)
            .ok_or_else(|| BridgeError::NodeNotFound(name.to_string()))
    }

    /// Look up a member
    pub fn member(&self, name: &str) -> BridgeResult<&Member> {
        self.members
            .get(name)
            .ok_or_else(|| BridgeError::MemberNotFound(name.to_string()))
    }

    /// Look up a material
    pub fn material(&self, name: &str) -> BridgeResult<&Material> {
        self.materials
            .get(name)
            .ok_or_else(|| BridgeError::MaterialNotFound(name.to_string()))
    }

    /// Look up a section
    pub fn section(&self, name: &str) -> BridgeResult<&Section> {
        self.sections
            .get(name)
            .ok_or_else(|| BridgeError::SectionNotFound(name.to_string()))
    }

    /// Length of a member
    pub fn member_length(&self, name: &str) -> BridgeResult<f64> {
        let member = self.member(name)?;
        Ok(self.node(&member.i_node)?.distance_to(self.node(&member.j_node)?))
    }

    /// A copy of this model with one section replaced
    pub fn with_section(&self, name: &str, section: Section) -> BridgeResult<Self> {
        self.with_sections([(name, section)])
    }

    /// A copy of this model with several sections replaced
    pub fn with_sections<'a, I>(&self, sections: I) -> BridgeResult<Self>
    where
        I: IntoIterator<Item = (&'a str, Section)>,
    {
        let mut model = self.clone();
        for (name, section) in sections {
            let slot = model
                .sections
                .get_mut(name)
                .ok_or_else(|| BridgeError::SectionNotFound(name.to_string()))?;
            *slot = section;
        }
        Ok(model)
    }

    /// A copy of this model with one material replaced
    pub fn with_material(&self, name: &str, material: Material) -> BridgeResult<Self> {
        let mut model = self.clone();
        let slot = model
            .materials
            .get_mut(name)
            .ok_or_else(|| BridgeError::MaterialNotFound(name.to_string()))?;
        *slot = material;
        Ok(model)
    }

    /// Check that the model can be assembled and solved.
    ///
    /// Everything reported here is an `InvalidGeometry` error and is raised
    /// before any matrix is built.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.members.is_empty() {
            return Err(BridgeError::InvalidGeometry("model has no members".into()));
        }

        for (name, member) in &self.members {
            for node in [&member.i_node, &member.j_node] {
                if !self.nodes.contains_key(node) {
                    return Err(BridgeError::InvalidGeometry(format!(
                        "member '{name}' references missing node '{node}'"
                    )));
                }
            }
            if !self.materials.contains_key(&member.material) {
                return Err(BridgeError::InvalidGeometry(format!(
                    "member '{name}' references missing material '{}'",
                    member.material
                )));
            }
            if !self.sections.contains_key(&member.section) {
                return Err(BridgeError::InvalidGeometry(format!(
                    "member '{name}' references missing section '{}'",
                    member.section
                )));
            }
            if self.member_length(name)? < MIN_MEMBER_LENGTH {
                return Err(BridgeError::InvalidGeometry(format!(
                    "member '{name}' has zero length"
                )));
            }
        }

        let connected: BTreeSet<&str> = self
            .members
            .values()
            .flat_map(|m| [m.i_node.as_str(), m.j_node.as_str()])
            .collect();
        if let Some(dangling) = self.nodes.keys().find(|n| !connected.contains(n.as_str())) {
            return Err(BridgeError::InvalidGeometry(format!(
                "node '{dangling}' is not connected to any member"
            )));
        }

        for node in self.supports.keys() {
            if !self.nodes.contains_key(node) {
                return Err(BridgeError::InvalidGeometry(format!(
                    "support at missing node '{node}'"
                )));
            }
        }

        let supported: Vec<&Support> = self.supports.values().filter(|s| s.is_supported()).collect();
        if supported.is_empty() {
            return Err(BridgeError::InvalidGeometry(
                "structure has no supports and is kinematically unstable".into(),
            ));
        }

        let restrained: usize = supported.iter().map(|s| s.num_restrained()).sum();
        if restrained < MIN_RESTRAINED_DOFS {
            return Err(BridgeError::InvalidGeometry(format!(
                "only {restrained} restrained DOFs; at least {MIN_RESTRAINED_DOFS} are needed for stability"
            )));
        }

        Ok(())
    }

    /// Ordered view of the model as a single girder line along global X
    pub fn layout(&self) -> BridgeResult<GirderLayout> {
        GirderLayout::from_model(self)
    }
}

/// A girder line read off a model: nodes ordered by station along X and the
/// member joining each consecutive pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GirderLayout {
    /// Node names in station order
    pub nodes: Vec<String>,
    /// Station (X coordinate) of each node
    pub stations: Vec<f64>,
    /// `members[k]` joins `nodes[k]` and `nodes[k + 1]`
    pub members: Vec<String>,
    /// Whether `members[k]` runs from `nodes[k]` to `nodes[k + 1]` (true) or the
    /// other way round
    pub forward: Vec<bool>,
    /// Indices into `nodes` of the vertically supported nodes
    pub supports: Vec<usize>,
}

impl GirderLayout {
    /// Build the layout, requiring the members to form one chain along X
    pub fn from_model(model: &BridgeModel) -> BridgeResult<Self> {
        let mut ordered: Vec<(&String, &Node)> = model.nodes.iter().collect();
        ordered.sort_by(|a, b| a.1.x.total_cmp(&b.1.x).then_with(|| a.0.cmp(b.0)));

        if ordered.len() < 2 {
            return Err(BridgeError::InvalidGeometry(
                "a girder line needs at least two nodes".into(),
            ));
        }

        let (y0, z0) = (ordered[0].1.y, ordered[0].1.z);
        if ordered
            .iter()
            .any(|(_, n)| (n.y - y0).abs() > 1e-9 || (n.z - z0).abs() > 1e-9)
        {
            return Err(BridgeError::InvalidGeometry(
                "girder line nodes must lie on one line parallel to X".into(),
            ));
        }

        let index: BTreeMap<&str, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.as_str(), i))
            .collect();

        let mut members = vec![None; ordered.len() - 1];
        let mut forward = vec![true; ordered.len() - 1];
        for (name, member) in &model.members {
            let lookup = |node: &str| {
                index
                    .get(node)
                    .copied()
                    .ok_or_else(|| BridgeError::NodeNotFound(node.to_string()))
            };
            let i = lookup(&member.i_node)?;
            let j = lookup(&member.j_node)?;
            let (lo, hi) = (i.min(j), i.max(j));
            if hi != lo + 1 || members[lo].is_some() {
                return Err(BridgeError::InvalidGeometry(format!(
                    "member '{name}' does not join consecutive girder-line nodes"
                )));
            }
            members[lo] = Some(name.clone());
            forward[lo] = i < j;
        }

        let members = members
            .into_iter()
            .enumerate()
            .map(|(k, m)| {
                m.ok_or_else(|| {
                    BridgeError::InvalidGeometry(format!(
                        "girder line is interrupted after node '{}'",
                        ordered[k].0
                    ))
                })
            })
            .collect::<BridgeResult<Vec<_>>>()?;

        let supports = ordered
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| model.supports.get(*name).is_some_and(|s| s.restrains(Dof::Dy)))
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            nodes: ordered.iter().map(|(n, _)| (*n).clone()).collect(),
            stations: ordered.iter().map(|(_, n)| n.x).collect(),
            members,
            forward,
            supports,
        })
    }

    /// Start and end station of the girder line
    pub fn extent(&self) -> (f64, f64) {
        (self.stations[0], self.stations[self.stations.len() - 1])
    }

    /// Total length of the girder line
    pub fn length(&self) -> f64 {
        let (a, b) = self.extent();
        b - a
    }

    /// Span lengths between consecutive vertical supports
    pub fn spans(&self) -> Vec<f64> {
        self.supports
            .windows(2)
            .map(|w| self.stations[w[1]] - self.stations[w[0]])
            .collect()
    }

    /// Index of the node nearest to a station
    pub fn nearest_node(&self, station: f64) -> usize {
        let k = self.stations.partition_point(|&s| s < station);
        match k {
            0 => 0,
            k if k >= self.stations.len() => self.stations.len() - 1,
            k => {
                if (self.stations[k] - station).abs() < (station - self.stations[k - 1]).abs() {
                    k
                } else {
                    k - 1
                }
            }
        }
    }

    /// Index of the span containing a station (interior supports belong to the
    /// span on their right)
    pub fn span_index(&self, station: f64) -> Option<usize> {
        let n_spans = self.supports.len().saturating_sub(1);
        (0..n_spans).find(|&s| {
            let a = self.stations[self.supports[s]];
            let b = self.stations[self.supports[s + 1]];
            station >= a - 1e-9 && (station < b - 1e-9 || (s + 1 == n_spans && station <= b + 1e-9))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_model() -> BridgeModel {
        let mut model = BridgeModel::new();
        model.add_node("N1", Node::at_station(0.0)).unwrap();
        model.add_node("N2", Node::at_station(10.0)).unwrap();
        model.add_material("Concrete", Material::default()).unwrap();
        model.add_section("Girder", Section::rectangular(1.0, 3.0)).unwrap();
        model
            .add_member("E1", Member::new("N1", "N2", "Concrete", "Girder"))
            .unwrap();
        model
    }

    #[test]
    fn test_zero_supports_is_invalid_geometry() {
        let model = two_node_model();
        let err = model.validate().unwrap_err();
        assert!(matches!(err, BridgeError::InvalidGeometry(_)));
    }

    #[test]
    fn test_too_few_restraints_is_invalid_geometry() {
        let mut model = two_node_model();
        model.add_support("N1", Support::roller()).unwrap();
        assert!(matches!(model.validate(), Err(BridgeError::InvalidGeometry(_))));

        model.add_support("N2", Support::pinned()).unwrap();
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_dangling_node_and_zero_length() {
        let mut model = two_node_model();
        model.add_support("N1", Support::fixed()).unwrap();
        model.add_node("N3", Node::at_station(20.0)).unwrap();
        assert!(matches!(model.validate(), Err(BridgeError::InvalidGeometry(_))));

        let mut model = two_node_model();
        model.add_support("N1", Support::fixed()).unwrap();
        model.add_node("N0", Node::at_station(0.0)).unwrap();
        model
            .add_member("E0", Member::new("N0", "N1", "Concrete", "Girder"))
            .unwrap();
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("zero length"));
    }

    #[test]
    fn test_duplicate_and_missing_references() {
        let mut model = two_node_model();
        assert!(matches!(
            model.add_node("N1", Node::default()),
            Err(BridgeError::DuplicateName(_))
        ));
        assert!(matches!(
            model.add_member("E2", Member::new("N1", "N9", "Concrete", "Girder")),
            Err(BridgeError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_with_section_returns_new_model() {
        let model = two_node_model();
        let stiffer = model
            .with_section("Girder", Section::rectangular(1.0, 4.0))
            .unwrap();
        assert_ne!(model.sections["Girder"], stiffer.sections["Girder"]);
        assert!(model.with_section("Missing", Section::default()).is_err());
    }

    #[test]
    fn test_layout_orders_nodes() {
        let mut model = two_node_model();
        model.add_node("A", Node::at_station(-5.0)).unwrap();
        model
            .add_member("E0", Member::new("N1", "A", "Concrete", "Girder"))
            .unwrap();
        model.add_support("A", Support::pinned()).unwrap();
        model.add_support("N2", Support::roller()).unwrap();

        let layout = model.layout().unwrap();
        assert_eq!(layout.nodes, vec!["A", "N1", "N2"]);
        assert_eq!(layout.members, vec!["E0", "E1"]);
        assert_eq!(layout.forward, vec![false, true]);
        assert_eq!(layout.spans(), vec![15.0]);
        assert_eq!(layout.nearest_node(6.0), 2);
        assert_eq!(layout.span_index(15.0), Some(0));
    }
}
