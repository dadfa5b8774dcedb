//! Named collections of loads solved together

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DistributedLoad, NodeLoad};

/// A set of node and member loads that is solved as one right-hand side.
///
/// Loads are keyed by node or member name; several loads on the same item
/// accumulate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSet {
    /// Name of the load set (e.g. "DC", "DW", "PS")
    pub name: String,
    /// Loads applied directly to nodes
    #[serde(default)]
    pub node_loads: BTreeMap<String, Vec<NodeLoad>>,
    /// Uniform loads along members
    #[serde(default)]
    pub member_loads: BTreeMap<String, Vec<DistributedLoad>>,
}

impl LoadSet {
    /// Create an empty load set
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a node load
    pub fn add_node_load(&mut self, node: &str, load: NodeLoad) {
        self.node_loads.entry(node.to_string()).or_default().push(load);
    }

    /// Add a uniform member load
    pub fn add_member_load(&mut self, member: &str, load: DistributedLoad) {
        self.member_loads
            .entry(member.to_string())
            .or_default()
            .push(load);
    }

    /// Builder form of [`LoadSet::add_member_load`]
    pub fn with_member_load(mut self, member: &str, load: DistributedLoad) -> Self {
        self.add_member_load(member, load);
        self
    }

    /// Builder form of [`LoadSet::add_node_load`]
    pub fn with_node_load(mut self, node: &str, load: NodeLoad) -> Self {
        self.add_node_load(node, load);
        self
    }

    /// Resultant node load at a node
    pub fn node_total(&self, node: &str) -> NodeLoad {
        self.node_loads
            .get(node)
            .map(|loads| {
                loads.iter().fold(NodeLoad::default(), |acc, l| {
                    let (a, b) = (acc.as_array(), l.as_array());
                    NodeLoad::new(a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3], a[4] + b[4], a[5] + b[5])
                })
            })
            .unwrap_or_default()
    }

    /// Resultant uniform load on a member
    pub fn member_total(&self, member: &str) -> DistributedLoad {
        self.member_loads
            .get(member)
            .map(|loads| {
                loads
                    .iter()
                    .fold(DistributedLoad::default(), |acc, l| acc.combined(l))
            })
            .unwrap_or_default()
    }

    /// True when the set carries no load at all
    pub fn is_empty(&self) -> bool {
        self.node_loads.values().all(|v| v.is_empty())
            && self.member_loads.values().all(|v| v.is_empty())
    }

    /// Scale every load by a factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            name: self.name.clone(),
            node_loads: self
                .node_loads
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().map(|l| l.scaled(factor)).collect()))
                .collect(),
            member_loads: self
                .member_loads
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().map(|l| l.scaled(factor)).collect()))
                .collect(),
        }
    }
}
