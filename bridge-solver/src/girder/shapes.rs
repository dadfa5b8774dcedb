//! Standard precast girder shapes
//!
//! Static reference data. Dimensions and properties are nominal catalog
//! values in inches.

use serde::{Deserialize, Serialize};

use crate::elements::Section;
use crate::units::{in2_to_ft2, in4_to_ft4};

/// Gross properties of a precast girder (inches)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GirderShape {
    pub id: String,
    pub name: String,
    /// Overall depth
    pub depth: f64,
    /// Gross area (in²)
    pub area: f64,
    /// Strong-axis moment of inertia (in⁴)
    pub inertia: f64,
    /// Centroid height above the bottom fibre
    pub y_bottom: f64,
    /// Weak-axis moment of inertia (in⁴)
    pub inertia_weak: f64,
    /// St. Venant torsional constant (in⁴)
    pub torsion: f64,
    pub top_flange_width: f64,
    pub bottom_flange_width: f64,
    pub web_width: f64,
    /// Perimeter exposed to drying
    pub perimeter: f64,
}

impl GirderShape {
    /// Distance from the centroid to the top fibre
    pub fn y_top(&self) -> f64 {
        self.depth - self.y_bottom
    }

    /// Section modulus for the bottom fibre (in³)
    pub fn s_bottom(&self) -> f64 {
        self.inertia / self.y_bottom
    }

    /// Section modulus for the top fibre (in³)
    pub fn s_top(&self) -> f64 {
        self.inertia / self.y_top()
    }

    /// Volume-to-surface ratio (in)
    pub fn volume_to_surface(&self) -> f64 {
        self.area / self.perimeter
    }

    /// Self-weight per foot for a unit weight in kcf
    pub fn self_weight(&self, unit_weight: f64) -> f64 {
        in2_to_ft2(self.area) * unit_weight
    }

    /// Frame section in model units, with the web as vertical shear area
    pub fn frame_section(&self) -> Section {
        Section::new(
            in2_to_ft2(self.area),
            in4_to_ft4(self.inertia_weak),
            in4_to_ft4(self.inertia),
            in4_to_ft4(self.torsion),
        )
        .with_shear_area(in2_to_ft2(self.web_width * self.depth))
    }
}

#[allow(clippy::too_many_arguments)]
fn shape(
    id: &str,
    name: &str,
    depth: f64,
    area: f64,
    inertia: f64,
    y_bottom: f64,
    inertia_weak: f64,
    torsion: f64,
    flanges: (f64, f64),
    web_width: f64,
    perimeter: f64,
) -> GirderShape {
    GirderShape {
        id: id.to_string(),
        name: name.to_string(),
        depth,
        area,
        inertia,
        y_bottom,
        inertia_weak,
        torsion,
        top_flange_width: flanges.0,
        bottom_flange_width: flanges.1,
        web_width,
        perimeter,
    }
}

/// AASHTO Type II-IV I-girders and a 72 in bulb-tee
pub fn standard_shapes() -> Vec<GirderShape> {
    vec![
        shape("AASHTO-II", "AASHTO Type II", 36.0, 369.0, 50_979.0, 15.83, 5_333.0, 4_500.0, (12.0, 18.0), 6.0, 114.0),
        shape("AASHTO-III", "AASHTO Type III", 45.0, 560.0, 125_390.0, 20.27, 12_217.0, 9_000.0, (16.0, 22.0), 7.0, 140.0),
        shape("AASHTO-IV", "AASHTO Type IV", 54.0, 789.0, 260_741.0, 24.73, 24_347.0, 15_000.0, (20.0, 26.0), 8.0, 164.0),
        shape("BT-72", "Bulb-Tee 72", 72.0, 767.0, 545_894.0, 36.60, 37_634.0, 14_000.0, (42.0, 26.0), 6.0, 220.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_type_iv_weight_and_moduli() {
        let shapes = standard_shapes();
        let iv = shapes.iter().find(|s| s.id == "AASHTO-IV").unwrap();
        assert_relative_eq!(iv.self_weight(0.150), 0.822, max_relative = 1e-3);
        assert_relative_eq!(iv.s_bottom(), 10_543.5, max_relative = 1e-3);
        assert!(iv.volume_to_surface() > 4.0);

        let section = iv.frame_section();
        assert_relative_eq!(section.iz, 260_741.0 / 20_736.0);
    }
}
