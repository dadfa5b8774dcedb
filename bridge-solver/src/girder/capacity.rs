//! Nominal and factored resistance of a composite prestressed girder
//!
//! Kip-inch units internally; moments are returned in kip-ft.

use serde::{Deserialize, Serialize};

use super::{CompositeSection, Deck, GirderShape};
use crate::units::IN_PER_FT;

/// Resistance factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResistanceFactors {
    pub prestressed_flexure: f64,
    pub reinforced_flexure: f64,
    pub shear: f64,
}

impl Default for ResistanceFactors {
    fn default() -> Self {
        Self {
            prestressed_flexure: 1.0,
            reinforced_flexure: 0.9,
            shear: 0.9,
        }
    }
}

/// Vertical shear reinforcement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stirrups {
    /// Area of one stirrup set (in²)
    pub area: f64,
    /// Spacing (in)
    pub spacing: f64,
    /// Yield strength (ksi)
    pub fy: f64,
}

impl Default for Stirrups {
    fn default() -> Self {
        // #4 double legs at 12 in
        Self {
            area: 0.40,
            spacing: 12.0,
            fy: 60.0,
        }
    }
}

/// Strand data needed for flexural strength
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrandSteel {
    /// Bonded strand area (in²)
    pub area: f64,
    /// Strand centroid height above the girder bottom (in)
    pub height: f64,
    pub fpu: f64,
    pub fpy: f64,
}

/// Compression block used for positive flexure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexuralBehaviour {
    Rectangular,
    Flanged,
}

/// Positive flexural strength details
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlexuralStrength {
    pub behaviour: FlexuralBehaviour,
    /// Neutral axis depth below the deck top (in)
    pub c: f64,
    /// Depth of the equivalent stress block (in)
    pub a: f64,
    /// Average strand stress at nominal resistance (ksi)
    pub fps: f64,
    /// Strand depth below the deck top (in)
    pub dp: f64,
    /// Nominal moment (kip-ft)
    pub nominal: f64,
}

/// Factored resistances at a section. Negative moment is reported as a
/// negative number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionCapacity {
    pub positive_moment: f64,
    pub negative_moment: f64,
    pub shear: f64,
}

/// Stress block factor
pub fn beta1(fc: f64) -> f64 {
    (0.85 - 0.05 * (fc - 4.0).max(0.0)).max(0.65)
}

/// Positive flexural strength with the deck in compression
pub fn positive_flexure(
    shape: &GirderShape,
    composite: &CompositeSection,
    deck: &Deck,
    strand: &StrandSteel,
) -> FlexuralStrength {
    let dp = composite.total_depth - strand.height;
    if strand.area <= 0.0 || dp <= 0.0 {
        return FlexuralStrength {
            behaviour: FlexuralBehaviour::Rectangular,
            c: 0.0,
            a: 0.0,
            fps: 0.0,
            dp,
            nominal: 0.0,
        };
    }

    let k = 2.0 * (1.04 - strand.fpy / strand.fpu);
    let b1 = beta1(deck.fc);
    let b = composite.effective_width;
    let hf = deck.thickness;
    let aps_fpu = strand.area * strand.fpu;

    let c_rect = aps_fpu / (0.85 * deck.fc * b1 * b + k * aps_fpu / dp);
    let (behaviour, c, flange_force) = if c_rect <= hf {
        (FlexuralBehaviour::Rectangular, c_rect, 0.0)
    } else {
        let bw = shape.top_flange_width;
        let overhang = 0.85 * deck.fc * (b - bw) * hf;
        let c = ((aps_fpu - overhang) / (0.85 * deck.fc * b1 * bw + k * aps_fpu / dp)).max(0.0);
        (FlexuralBehaviour::Flanged, c, overhang)
    };

    let a = b1 * c;
    let fps = strand.fpu * (1.0 - k * c / dp);
    let mut mn = strand.area * fps * (dp - a / 2.0);
    if behaviour == FlexuralBehaviour::Flanged {
        mn += flange_force * (a / 2.0 - hf / 2.0);
    }

    FlexuralStrength {
        behaviour,
        c,
        a,
        fps,
        dp,
        nominal: mn / IN_PER_FT,
    }
}

/// Negative nominal moment from deck reinforcement, bottom flange in
/// compression (kip-ft, negative)
pub fn negative_flexure(shape: &GirderShape, composite: &CompositeSection, deck: &Deck, girder_fc: f64) -> f64 {
    if deck.rebar_area <= 0.0 {
        return 0.0;
    }
    let d = composite.total_depth - deck.rebar_depth;
    let a = deck.rebar_area * deck.rebar_fy / (0.85 * girder_fc * shape.bottom_flange_width);
    -deck.rebar_area * deck.rebar_fy * (d - a / 2.0) / IN_PER_FT
}

/// Simplified nominal shear resistance (kip): concrete with β = 2 plus
/// stirrups, capped at 0.25 f'c b_v d_v
pub fn shear_strength(
    shape: &GirderShape,
    composite: &CompositeSection,
    flexure: &FlexuralStrength,
    stirrups: &Stirrups,
    girder_fc: f64,
) -> f64 {
    let h = composite.total_depth;
    let de = if flexure.dp > 0.0 { flexure.dp } else { h };
    let dv = (de - flexure.a / 2.0).max(0.9 * de).max(0.72 * h);
    let bv = shape.web_width;

    let vc = 0.0316 * 2.0 * girder_fc.sqrt() * bv * dv;
    let vs = if stirrups.spacing > 0.0 {
        stirrups.area * stirrups.fy * dv / stirrups.spacing
    } else {
        0.0
    };
    (vc + vs).min(0.25 * girder_fc * bv * dv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Material;
    use crate::girder::standard_shapes;
    use approx::assert_relative_eq;

    fn setup() -> (GirderShape, Deck, CompositeSection) {
        let shape = standard_shapes().into_iter().find(|s| s.id == "AASHTO-IV").unwrap();
        let deck = Deck::default();
        let girder = Material::concrete(8.0, 6.0, 0.150);
        let composite =
            CompositeSection::compute(&shape, &deck, 100.0, 8.0, &girder, &deck.material()).unwrap();
        (shape, deck, composite)
    }

    #[test]
    fn test_beta1() {
        assert_relative_eq!(beta1(4.0), 0.85);
        assert_relative_eq!(beta1(6.0), 0.75);
        assert_relative_eq!(beta1(10.0), 0.65);
    }

    #[test]
    fn test_rectangular_behaviour_in_deck() {
        let (shape, deck, composite) = setup();
        let strand = StrandSteel {
            area: 30.0 * 0.153,
            height: 4.0,
            fpu: 270.0,
            fpy: 243.0,
        };
        let f = positive_flexure(&shape, &composite, &deck, &strand);
        assert_eq!(f.behaviour, FlexuralBehaviour::Rectangular);
        assert!(f.c < deck.thickness);
        assert!(f.fps > 250.0 && f.fps < 270.0);

        // Lever arm bounds: Aps fps dp >= Mn >= Aps fps (dp - hf)
        let upper = strand.area * f.fps * f.dp / 12.0;
        assert!(f.nominal < upper);
        assert!(f.nominal > strand.area * f.fps * (f.dp - deck.thickness) / 12.0);
    }

    #[test]
    fn test_heavy_strand_goes_flanged() {
        let (shape, deck, composite) = setup();
        let narrow = CompositeSection {
            effective_width: 30.0,
            ..composite
        };
        let strand = StrandSteel {
            area: 60.0 * 0.153,
            height: 5.0,
            fpu: 270.0,
            fpy: 243.0,
        };
        let f = positive_flexure(&shape, &narrow, &deck, &strand);
        assert_eq!(f.behaviour, FlexuralBehaviour::Flanged);
        assert!(f.c > deck.thickness);
    }

    #[test]
    fn test_negative_flexure_and_shear() {
        let (shape, _, composite) = setup();
        let deck = Deck {
            rebar_area: 6.0,
            ..Deck::default()
        };
        let mn = negative_flexure(&shape, &composite, &deck, 8.0);
        assert!(mn < 0.0);
        let d = composite.total_depth - 2.5;
        assert!(-mn < 6.0 * 60.0 * d / 12.0);

        let strand = StrandSteel {
            area: 4.59,
            height: 4.0,
            fpu: 270.0,
            fpy: 243.0,
        };
        let f = positive_flexure(&shape, &composite, &deck, &strand);
        let vn = shear_strength(&shape, &composite, &f, &Stirrups::default(), 8.0);
        assert!(vn > 0.0);
        assert!(vn <= 0.25 * 8.0 * shape.web_width * composite.total_depth);
    }
}
