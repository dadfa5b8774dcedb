//! Unit conventions
//!
//! The frame model works in kip and foot (moduli in ksf, areas in ft², inertias
//! in ft⁴, moments in kip-ft). Cross-section, prestress and loss calculations
//! follow bridge practice and work in kip and inch (stresses in ksi). The
//! helpers here are the only place the two systems meet.

/// Inches per foot
pub const IN_PER_FT: f64 = 12.0;

/// ksi to ksf
pub const KSI_TO_KSF: f64 = 144.0;

/// Square inches to square feet
pub fn in2_to_ft2(a: f64) -> f64 {
    a / (IN_PER_FT * IN_PER_FT)
}

/// Inch⁴ to foot⁴
pub fn in4_to_ft4(i: f64) -> f64 {
    i / IN_PER_FT.powi(4)
}

/// Bending stress in ksi from a moment in kip-ft, a fibre distance in inches
/// and an inertia in in⁴
pub fn flexural_stress_ksi(moment_kip_ft: f64, y_in: f64, inertia_in4: f64) -> f64 {
    moment_kip_ft * IN_PER_FT * y_in / inertia_in4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert!((in2_to_ft2(144.0) - 1.0).abs() < 1e-12);
        assert!((in4_to_ft4(20736.0) - 1.0).abs() < 1e-12);
        // 100 kip-ft on a 10 in lever arm through I = 1200 in⁴
        assert!((flexural_stress_ksi(100.0, 10.0, 1200.0) - 10.0).abs() < 1e-12);
    }
}
