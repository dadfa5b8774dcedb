//! Girder-line model generation

use serde::{Deserialize, Serialize};

use crate::elements::{ElementKind, Material, Member, Node, Section, Support};
use crate::error::{BridgeError, BridgeResult};
use crate::model::BridgeModel;

/// Name of the girder material in generated models
pub const GIRDER_MATERIAL: &str = "girder";
/// Name of the girder section in generated models
pub const GIRDER_SECTION: &str = "girder";

/// Elements per span actually generated for a requested count: at least 2, even
pub fn even_elements_per_span(n: usize) -> usize {
    n.max(2).div_ceil(2).min(usize::MAX / 2) * 2
}

/// Elements a girder line of `spans` spans will have, or `InvalidInput` when
/// the count does not fit in a `usize`
pub fn planned_element_count(spans: usize, elements_per_span: usize) -> BridgeResult<usize> {
    spans
        .checked_mul(even_elements_per_span(elements_per_span))
        .ok_or_else(|| {
            BridgeError::InvalidInput(format!(
                "{spans} spans x {elements_per_span} elements per span is too large"
            ))
        })
}

/// Builds a multi-span girder line along global X, starting at station 0.
///
/// Nodes are named `N000`, `N001`, ... and members `E000`, ... in station
/// order. Each span is split into an even number of elements so that
/// mid-span is always a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GirderLineBuilder {
    spans: Vec<f64>,
    elements_per_span: usize,
    material: Material,
    section: Section,
    kind: ElementKind,
    supports: Option<Vec<Support>>,
}

impl GirderLineBuilder {
    /// Start a builder from span lengths (ft)
    pub fn new(spans: &[f64]) -> Self {
        Self {
            spans: spans.to_vec(),
            elements_per_span: 20,
            material: Material::default(),
            section: Section::default(),
            kind: ElementKind::EulerBernoulli,
            supports: None,
        }
    }

    /// Elements per span; odd counts are rounded up to the next even number
    pub fn elements_per_span(mut self, n: usize) -> Self {
        self.elements_per_span = even_elements_per_span(n);
        self
    }

    /// Girder material
    pub fn material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Girder section (frame-model units)
    pub fn section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    /// Element formulation for every member
    pub fn element_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    /// Explicit supports, one per span end (`spans.len() + 1` entries).
    ///
    /// Default: pinned at the first support, rollers elsewhere.
    pub fn supports(mut self, supports: Vec<Support>) -> Self {
        self.supports = Some(supports);
        self
    }

    /// Total number of elements the builder will generate
    pub fn element_count(&self) -> usize {
        self.spans.len() * self.elements_per_span
    }

    /// Generate the model
    pub fn build(&self) -> BridgeResult<BridgeModel> {
        if self.spans.is_empty() {
            return Err(BridgeError::InvalidGeometry("girder line has no spans".into()));
        }
        if let Some(bad) = self.spans.iter().find(|&&l| !(l > 0.0) || !l.is_finite()) {
            return Err(BridgeError::InvalidGeometry(format!(
                "span length {bad} must be positive"
            )));
        }

        let supports = match &self.supports {
            Some(s) if s.len() != self.spans.len() + 1 => {
                return Err(BridgeError::InvalidInput(format!(
                    "{} supports given for {} spans",
                    s.len(),
                    self.spans.len()
                )))
            }
            Some(s) => s.clone(),
            None => std::iter::once(Support::pinned())
                .chain(std::iter::repeat(Support::roller()).take(self.spans.len()))
                .collect(),
        };

        let n_elements = self.element_count();
        let width = (n_elements + 1).to_string().len().max(3);
        let node_name = |k: usize| format!("N{k:0width$}");
        let member_name = |k: usize| format!("E{k:0width$}");

        let mut model = BridgeModel::new();
        model.add_material(GIRDER_MATERIAL, self.material.clone())?;
        model.add_section(GIRDER_SECTION, self.section)?;

        let mut station = 0.0;
        let mut k = 0;
        model.add_node(&node_name(0), Node::at_station(0.0))?;
        model.add_support(&node_name(0), supports[0])?;

        for (s, &span) in self.spans.iter().enumerate() {
            let dx = span / self.elements_per_span as f64;
            for e in 1..=self.elements_per_span {
                k += 1;
                // Land exactly on the support station at the end of the span
                let x = if e == self.elements_per_span {
                    station + span
                } else {
                    station + dx * e as f64
                };
                model.add_node(&node_name(k), Node::at_station(x))?;
                model.add_member(
                    &member_name(k - 1),
                    Member::new(&node_name(k - 1), &node_name(k), GIRDER_MATERIAL, GIRDER_SECTION)
                        .with_kind(self.kind),
                )?;
            }
            station += span;
            model.add_support(&node_name(k), supports[s + 1])?;
        }

        log::debug!(
            "Generated girder line: {} spans, {} nodes, {} members",
            self.spans.len(),
            model.nodes.len(),
            model.members.len()
        );

        Ok(model)
    }
}
