//! Composite girder-deck section properties
//!
//! The deck is transformed into girder concrete by the modular ratio
//! n = E_deck / E_girder and combined with the girder by the parallel-axis
//! theorem. All lengths are inches.

use serde::{Deserialize, Serialize};

use super::GirderShape;
use crate::elements::{Material, Section};
use crate::error::{BridgeError, BridgeResult};
use crate::units::{in2_to_ft2, in4_to_ft4, IN_PER_FT};

/// Cast-in-place deck carried by one girder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deck {
    /// Structural slab thickness (in)
    pub thickness: f64,
    /// Haunch between girder top and slab soffit (in); carried as load only
    pub haunch: f64,
    /// Deck concrete strength (ksi)
    pub fc: f64,
    /// Deck concrete unit weight (kcf)
    pub unit_weight: f64,
    /// Longitudinal deck reinforcement per girder over the supports (in²)
    pub rebar_area: f64,
    /// Depth of that reinforcement below the deck top (in)
    pub rebar_depth: f64,
    /// Reinforcement yield strength (ksi)
    pub rebar_fy: f64,
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            thickness: 8.0,
            haunch: 1.0,
            fc: 4.0,
            unit_weight: 0.150,
            rebar_area: 0.0,
            rebar_depth: 2.5,
            rebar_fy: 60.0,
        }
    }
}

impl Deck {
    /// Deck concrete as a material
    pub fn material(&self) -> Material {
        Material::concrete(self.fc, self.fc, self.unit_weight)
    }

    /// Wet weight of slab and haunch per girder (kip/ft)
    pub fn weight(&self, spacing_ft: f64, top_flange_width: f64) -> f64 {
        let slab = spacing_ft * self.thickness / IN_PER_FT;
        let haunch = top_flange_width * self.haunch / (IN_PER_FT * IN_PER_FT);
        (slab + haunch) * self.unit_weight
    }
}

/// Effective flange width rule: the least of one quarter of the span,
/// twelve slab thicknesses plus the greater of the web width and half the
/// top flange, and the girder spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveWidth {
    pub quarter_span: f64,
    pub slab_rule: f64,
    pub spacing: f64,
}

impl EffectiveWidth {
    /// Candidate widths in inches for a span and spacing given in feet
    pub fn new(span_ft: f64, deck_thickness: f64, shape: &GirderShape, spacing_ft: f64) -> Self {
        Self {
            quarter_span: span_ft * IN_PER_FT / 4.0,
            slab_rule: 12.0 * deck_thickness + shape.web_width.max(shape.top_flange_width / 2.0),
            spacing: spacing_ft * IN_PER_FT,
        }
    }

    /// Governing (least) width
    pub fn width(&self) -> f64 {
        self.quarter_span.min(self.slab_rule).min(self.spacing)
    }
}

/// Transformed composite section, in girder-concrete units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeSection {
    pub effective_width: f64,
    /// E_deck / E_girder
    pub modular_ratio: f64,
    pub transformed_width: f64,
    pub area: f64,
    /// Centroid height above the girder bottom
    pub y_bottom: f64,
    pub inertia: f64,
    /// Girder depth
    pub girder_depth: f64,
    /// Height of the deck top above the girder bottom
    pub total_depth: f64,
}

impl CompositeSection {
    /// Compute the composite section of a girder and its deck
    pub fn compute(
        shape: &GirderShape,
        deck: &Deck,
        span_ft: f64,
        spacing_ft: f64,
        girder: &Material,
        deck_material: &Material,
    ) -> BridgeResult<Self> {
        if deck.thickness <= 0.0 || spacing_ft <= 0.0 || span_ft <= 0.0 {
            return Err(BridgeError::InvalidInput(
                "deck thickness, girder spacing and span must be positive".into(),
            ));
        }

        let effective_width = EffectiveWidth::new(span_ft, deck.thickness, shape, spacing_ft).width();
        let modular_ratio = deck_material.e / girder.e;
        let transformed_width = effective_width * modular_ratio;

        let deck_area = transformed_width * deck.thickness;
        let deck_y = shape.depth + deck.haunch + deck.thickness / 2.0;
        let deck_i = transformed_width * deck.thickness.powi(3) / 12.0;

        let area = shape.area + deck_area;
        let y_bottom = (shape.area * shape.y_bottom + deck_area * deck_y) / area;
        let inertia = shape.inertia
            + shape.area * (y_bottom - shape.y_bottom).powi(2)
            + deck_i
            + deck_area * (deck_y - y_bottom).powi(2);

        Ok(Self {
            effective_width,
            modular_ratio,
            transformed_width,
            area,
            y_bottom,
            inertia,
            girder_depth: shape.depth,
            total_depth: shape.depth + deck.haunch + deck.thickness,
        })
    }

    /// Distance from the centroid up to the girder top
    pub fn y_top_girder(&self) -> f64 {
        self.girder_depth - self.y_bottom
    }

    /// Distance from the centroid up to the deck top
    pub fn y_top_deck(&self) -> f64 {
        self.total_depth - self.y_bottom
    }

    /// Section modulus for the girder bottom (in³)
    pub fn s_bottom(&self) -> f64 {
        self.inertia / self.y_bottom
    }

    /// Section modulus for the girder top (in³)
    pub fn s_top_girder(&self) -> f64 {
        self.inertia / self.y_top_girder()
    }

    /// Transformed section modulus for the deck top (in³); deck stress is
    /// the modular ratio times M / S
    pub fn s_top_deck(&self) -> f64 {
        self.inertia / self.y_top_deck()
    }

    /// Frame section for the composite stages, keeping the girder's weak-axis
    /// and torsion stiffness
    pub fn frame_section(&self, shape: &GirderShape) -> Section {
        let girder = shape.frame_section();
        Section {
            a: in2_to_ft2(self.area),
            iz: in4_to_ft4(self.inertia),
            ..girder
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::girder::standard_shapes;
    use approx::assert_relative_eq;

    fn type_iv() -> GirderShape {
        standard_shapes().into_iter().find(|s| s.id == "AASHTO-IV").unwrap()
    }

    #[test]
    fn test_effective_width_takes_minimum() {
        let shape = type_iv();
        // 12 * 8 + max(8, 10) = 106 in governs over 8 ft spacing and L/4
        let w = EffectiveWidth::new(100.0, 8.0, &shape, 9.0);
        assert_relative_eq!(w.slab_rule, 106.0);
        assert_relative_eq!(w.width(), 106.0);

        // Short span: L/4 = 60 in
        assert_relative_eq!(EffectiveWidth::new(20.0, 8.0, &shape, 9.0).width(), 60.0);
        // Close spacing: 6 ft = 72 in
        assert_relative_eq!(EffectiveWidth::new(100.0, 8.0, &shape, 6.0).width(), 72.0);
    }

    #[test]
    fn test_composite_with_equal_moduli() {
        let shape = type_iv();
        let deck = Deck {
            haunch: 0.0,
            ..Deck::default()
        };
        let concrete = Material::concrete(8.0, 6.0, 0.150);
        let c = CompositeSection::compute(&shape, &deck, 100.0, 9.0, &concrete, &concrete).unwrap();

        assert_relative_eq!(c.modular_ratio, 1.0);
        let deck_area = 106.0 * 8.0;
        assert_relative_eq!(c.area, 789.0 + deck_area);
        let y = (789.0 * 24.73 + deck_area * 58.0) / (789.0 + deck_area);
        assert_relative_eq!(c.y_bottom, y, max_relative = 1e-12);
        assert!(c.inertia > 2.0 * shape.inertia);
        assert!(c.s_bottom() > shape.s_bottom());
    }

    #[test]
    fn test_softer_deck_reduces_section() {
        let shape = type_iv();
        let deck = Deck::default();
        let girder = Material::concrete(8.0, 6.0, 0.150);
        let full = CompositeSection::compute(&shape, &deck, 100.0, 9.0, &girder, &girder).unwrap();
        let real = CompositeSection::compute(&shape, &deck, 100.0, 9.0, &girder, &deck.material()).unwrap();
        assert_relative_eq!(real.modular_ratio, (4.0_f64 / 8.0).sqrt(), max_relative = 1e-12);
        assert!(real.inertia < full.inertia);
    }
}
