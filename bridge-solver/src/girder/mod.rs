//! Precast girder definition and derived section data
//!
//! A [`GirderDefinition`] is the request-level description of one interior
//! girder line. [`GirderSystem`] resolves it against a catalog shape and
//! derives everything the stage manager and rating engine read: the frame
//! models for each stage, composite properties, loads, loss inputs and
//! capacities.

mod capacity;
mod composite;
mod prestress;
mod shapes;

pub use capacity::{
    beta1, negative_flexure, positive_flexure, shear_strength, FlexuralBehaviour,
    FlexuralStrength, ResistanceFactors, SectionCapacity, StrandSteel, Stirrups,
};
pub use composite::{CompositeSection, Deck, EffectiveWidth};
pub use prestress::{DebondGroup, PrestressLayout, PrestressResultant, StrandRow};
pub use shapes::{standard_shapes, GirderShape};

use serde::{Deserialize, Serialize};

use crate::builder::GirderLineBuilder;
use crate::elements::{ElementKind, Material, MaterialModel, Section};
use crate::error::{BridgeError, BridgeResult};
use crate::losses::{Environment, LossInput};
use crate::model::{BridgeModel, GirderLayout};

/// One girder line as described by an analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GirderDefinition {
    /// Span lengths (ft)
    pub spans: Vec<f64>,
    /// Catalog identifier of the girder shape
    pub shape: String,
    /// Girder spacing (ft)
    pub spacing: f64,
    /// Girder concrete
    pub concrete: Material,
    pub deck: Deck,
    pub strand: Material,
    pub prestress: Option<PrestressLayout>,
    /// Barrier load per girder (kip/ft), applied to the composite section
    pub barrier: f64,
    /// Wearing surface load per girder (kip/ft)
    pub overlay: f64,
    pub stirrups: Stirrups,
    pub resistance: ResistanceFactors,
    pub environment: Environment,
    pub elements_per_span: usize,
    pub element_kind: ElementKind,
}

impl Default for GirderDefinition {
    fn default() -> Self {
        Self {
            spans: vec![100.0],
            shape: "AASHTO-IV".to_string(),
            spacing: 8.0,
            concrete: Material::concrete(8.0, 6.0, 0.150),
            deck: Deck::default(),
            strand: Material::strand_270(),
            prestress: None,
            barrier: 0.0,
            overlay: 0.0,
            stirrups: Stirrups::default(),
            resistance: ResistanceFactors::default(),
            environment: Environment::default(),
            elements_per_span: 20,
            element_kind: ElementKind::EulerBernoulli,
        }
    }
}

/// Strand grade parameters (fpu, fpy, low relaxation)
fn strand_grade(strand: &Material) -> BridgeResult<(f64, f64, bool)> {
    match strand.model {
        MaterialModel::PrestressingSteel {
            fpu,
            fpy,
            low_relaxation,
        } => Ok((fpu, fpy, low_relaxation)),
        _ => Err(BridgeError::InvalidInput(
            "strand material must be prestressing steel".into(),
        )),
    }
}

/// A girder definition resolved against its shape
#[derive(Debug, Clone, PartialEq)]
pub struct GirderSystem {
    pub definition: GirderDefinition,
    pub shape: GirderShape,
    pub composite: CompositeSection,
    fc: f64,
    fci: f64,
    fpu: f64,
    fpy: f64,
    low_relaxation: bool,
}

impl GirderSystem {
    /// Check the definition and derive the composite section
    pub fn new(definition: GirderDefinition, shape: GirderShape) -> BridgeResult<Self> {
        if definition.spans.is_empty() {
            return Err(BridgeError::InvalidGeometry("girder line has no spans".into()));
        }
        if definition.spans.iter().any(|&l| !(l > 0.0) || !l.is_finite()) {
            return Err(BridgeError::InvalidGeometry("span lengths must be positive".into()));
        }
        let (fc, fci) = match definition.concrete.model {
            MaterialModel::Concrete { fc, fci } => (fc, fci),
            _ => {
                return Err(BridgeError::InvalidInput(
                    "girder material must be concrete".into(),
                ))
            }
        };
        let (fpu, fpy, low_relaxation) = strand_grade(&definition.strand)?;
        if let Some(ps) = &definition.prestress {
            ps.validate()?;
            if ps.jacking_stress > fpu {
                return Err(BridgeError::InvalidInput(format!(
                    "jacking stress {} exceeds fpu {fpu}",
                    ps.jacking_stress
                )));
            }
        }

        let shortest = definition.spans.iter().copied().fold(f64::INFINITY, f64::min);
        let composite = CompositeSection::compute(
            &shape,
            &definition.deck,
            shortest,
            definition.spacing,
            &definition.concrete,
            &definition.deck.material(),
        )?;

        Ok(Self {
            definition,
            shape,
            composite,
            fc,
            fci,
            fpu,
            fpy,
            low_relaxation,
        })
    }

    /// 28-day and transfer strengths of the girder concrete (ksi)
    pub fn concrete_strengths(&self) -> (f64, f64) {
        (self.fc, self.fci)
    }

    fn builder(&self, material: Material, section: Section) -> GirderLineBuilder {
        GirderLineBuilder::new(&self.definition.spans)
            .elements_per_span(self.definition.elements_per_span)
            .element_kind(self.definition.element_kind)
            .material(material)
            .section(section)
    }

    /// Number of elements the stage models will have
    pub fn element_count(&self) -> usize {
        self.builder(Material::default(), Section::default()).element_count()
    }

    /// Bare girder with its modulus at transfer
    pub fn transfer_model(&self) -> BridgeResult<BridgeModel> {
        self.builder(self.definition.concrete.at_transfer(), self.shape.frame_section())
            .build()
    }

    /// Bare girder carrying the wet deck
    pub fn non_composite_model(&self) -> BridgeResult<BridgeModel> {
        self.builder(self.definition.concrete.clone(), self.shape.frame_section())
            .build()
    }

    /// Girder acting with the hardened deck
    pub fn composite_model(&self) -> BridgeResult<BridgeModel> {
        self.builder(
            self.definition.concrete.clone(),
            self.composite.frame_section(&self.shape),
        )
        .build()
    }

    /// Girder self-weight (kip/ft)
    pub fn girder_weight(&self) -> f64 {
        self.shape.self_weight(self.definition.concrete.unit_weight)
    }

    /// Slab and haunch weight per girder (kip/ft)
    pub fn deck_weight(&self) -> f64 {
        self.definition
            .deck
            .weight(self.definition.spacing, self.shape.top_flange_width)
    }

    /// Longest span, where losses are evaluated
    pub fn loss_span(&self) -> f64 {
        self.definition.spans.iter().copied().fold(0.0, f64::max)
    }

    /// Loss input at mid-span of the longest span. The girder and deck
    /// moments are those of the precast piece acting as a simple span, which
    /// is how it carries both loads.
    pub fn loss_input(&self, environment: &Environment, transfer_age: f64, deck_age: f64) -> Option<LossInput> {
        let ps = self.definition.prestress.as_ref()?;
        if ps.strand_count() == 0 {
            return None;
        }
        let span = self.loss_span();
        let simple = |w: f64| w * span * span / 8.0;
        let input = LossInput {
            jacking_stress: ps.jacking_stress,
            strand_area: ps.effective_area(span / 2.0),
            area: self.shape.area,
            inertia: self.shape.inertia,
            eccentricity: self.shape.y_bottom - ps.effective_centroid_height(span / 2.0),
            girder_moment: simple(self.girder_weight()),
            deck_moment: simple(self.deck_weight()),
            transfer_age,
            deck_age,
            fci: self.fci,
            eci: self.definition.concrete.eci_ksi(),
            ep: self.definition.strand.e_ksi(),
            fpy: self.fpy,
            low_relaxation: self.low_relaxation,
            relative_humidity: 70.0,
            volume_to_surface: self.shape.volume_to_surface(),
        };
        Some(input.with_environment(environment))
    }

    /// Distance from a station to the nearer end of its precast piece (ft)
    pub fn distance_from_girder_end(&self, layout: &GirderLayout, station: f64) -> f64 {
        match layout.span_index(station) {
            Some(s) => {
                let a = layout.stations[layout.supports[s]];
                let b = layout.stations[layout.supports[s + 1]];
                (station - a).min(b - station).max(0.0)
            }
            None => 0.0,
        }
    }

    /// Factored resistances at a station
    pub fn capacity_at(&self, layout: &GirderLayout, station: f64) -> SectionCapacity {
        let phi = self.definition.resistance;
        let deck = &self.definition.deck;
        let distance = self.distance_from_girder_end(layout, station);

        let strand = match &self.definition.prestress {
            Some(ps) => StrandSteel {
                area: ps.effective_area(distance),
                height: ps.effective_centroid_height(distance),
                fpu: self.fpu,
                fpy: self.fpy,
            },
            None => StrandSteel {
                area: 0.0,
                height: 0.0,
                fpu: self.fpu,
                fpy: self.fpy,
            },
        };

        let flexure = positive_flexure(&self.shape, &self.composite, deck, &strand);
        let negative = negative_flexure(&self.shape, &self.composite, deck, self.fc);
        let shear = shear_strength(&self.shape, &self.composite, &flexure, &self.definition.stirrups, self.fc);

        SectionCapacity {
            positive_moment: phi.prestressed_flexure * flexure.nominal,
            negative_moment: phi.reinforced_flexure * negative,
            shear: phi.shear * shear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn system(spans: &[f64]) -> GirderSystem {
        let shape = standard_shapes().into_iter().find(|s| s.id == "AASHTO-IV").unwrap();
        let definition = GirderDefinition {
            spans: spans.to_vec(),
            prestress: Some(PrestressLayout::from_rows(&[(12, 2.0), (12, 4.0), (6, 6.0)])),
            ..GirderDefinition::default()
        };
        GirderSystem::new(definition, shape).unwrap()
    }

    #[test]
    fn test_stage_models_share_geometry() {
        let sys = system(&[80.0, 80.0]);
        let transfer = sys.transfer_model().unwrap();
        let composite = sys.composite_model().unwrap();
        assert_eq!(transfer.nodes, composite.nodes);
        assert!(transfer.materials["girder"].e < composite.materials["girder"].e);
        assert!(composite.sections["girder"].iz > transfer.sections["girder"].iz);
        assert_eq!(sys.element_count(), 40);
    }

    #[test]
    fn test_loss_input_and_weights() {
        let sys = system(&[60.0, 100.0]);
        assert_relative_eq!(sys.girder_weight(), 0.822, max_relative = 1e-3);
        // 8 ft x 8 in slab plus a 20 in x 1 in haunch at 0.150 kcf
        assert_relative_eq!(sys.deck_weight(), (8.0 * 8.0 / 12.0 + 20.0 / 144.0) * 0.150);

        let input = sys.loss_input(&Environment::default(), 1.0, 60.0).unwrap();
        assert_relative_eq!(input.girder_moment, sys.girder_weight() * 100.0 * 100.0 / 8.0);
        assert_relative_eq!(input.strand_area, 30.0 * 0.153, max_relative = 1e-12);
        assert!(input.eccentricity > 20.0);
    }

    #[test]
    fn test_capacity_drops_near_girder_end() {
        let sys = system(&[100.0]);
        let layout = sys.non_composite_model().unwrap().layout().unwrap();
        let mid = sys.capacity_at(&layout, 50.0);
        let end = sys.capacity_at(&layout, 0.0);
        assert!(mid.positive_moment > 0.0);
        assert_eq!(end.positive_moment, 0.0);
        assert!(mid.shear > 0.0);
    }

    #[test]
    fn test_non_concrete_girder_rejected() {
        let shape = standard_shapes().remove(0);
        let definition = GirderDefinition {
            concrete: Material::strand_270(),
            ..GirderDefinition::default()
        };
        assert!(GirderSystem::new(definition, shape).is_err());
    }
}
