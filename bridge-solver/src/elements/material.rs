//! Material properties
//!
//! Moduli are stored in the frame-model units (ksf); the strength parameters of
//! concrete and strand are kept in ksi, the units the design equations use.

use serde::{Deserialize, Serialize};

use crate::units::KSI_TO_KSF;

/// Behaviour-specific data for a material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialModel {
    /// Linear elastic, no design parameters
    Generic,
    /// Concrete with 28-day and transfer strengths in ksi
    Concrete { fc: f64, fci: f64 },
    /// Prestressing strand, strengths in ksi
    PrestressingSteel {
        fpu: f64,
        fpy: f64,
        low_relaxation: bool,
    },
}

/// Material properties for structural analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Modulus of elasticity (ksf)
    pub e: f64,
    /// Shear modulus (ksf)
    pub g: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Unit weight (kcf)
    pub unit_weight: f64,
    /// Behaviour-specific parameters
    pub model: MaterialModel,
}

/// AASHTO concrete modulus in ksi: E = 33000 K1 wc^1.5 sqrt(f'c), wc in kcf
pub fn concrete_modulus_ksi(fc_ksi: f64, unit_weight_kcf: f64) -> f64 {
    33_000.0 * unit_weight_kcf.powf(1.5) * fc_ksi.sqrt()
}

impl Material {
    /// Create a new generic material
    pub fn new(e: f64, g: f64, nu: f64, unit_weight: f64) -> Self {
        Self {
            e,
            g,
            nu,
            unit_weight,
            model: MaterialModel::Generic,
        }
    }

    /// Create a new isotropic material from E and nu
    /// G is calculated as E / (2 * (1 + nu))
    pub fn isotropic(e: f64, nu: f64, unit_weight: f64) -> Self {
        let g = e / (2.0 * (1.0 + nu));
        Self::new(e, g, nu, unit_weight)
    }

    /// Normal-weight concrete from f'c and f'ci (ksi) and unit weight (kcf)
    pub fn concrete(fc: f64, fci: f64, unit_weight: f64) -> Self {
        let e = concrete_modulus_ksi(fc, unit_weight) * KSI_TO_KSF;
        Self {
            model: MaterialModel::Concrete { fc, fci },
            ..Self::isotropic(e, 0.2, unit_weight)
        }
    }

    /// Grade 270 low-relaxation strand
    pub fn strand_270() -> Self {
        let e = 28_500.0 * KSI_TO_KSF;
        Self {
            model: MaterialModel::PrestressingSteel {
                fpu: 270.0,
                fpy: 243.0,
                low_relaxation: true,
            },
            ..Self::isotropic(e, 0.3, 0.490)
        }
    }

    /// Modulus in ksi
    pub fn e_ksi(&self) -> f64 {
        self.e / KSI_TO_KSF
    }

    /// Modulus at transfer in ksi. Equal to `e_ksi` for anything but concrete.
    pub fn eci_ksi(&self) -> f64 {
        match self.model {
            MaterialModel::Concrete { fci, .. } => concrete_modulus_ksi(fci, self.unit_weight),
            _ => self.e_ksi(),
        }
    }

    /// The same material with its modulus at transfer
    pub fn at_transfer(&self) -> Self {
        Self {
            model: self.model,
            ..Self::isotropic(self.eci_ksi() * KSI_TO_KSF, self.nu, self.unit_weight)
        }
    }

    /// 28-day compressive strength (ksi), if this is concrete
    pub fn fc(&self) -> Option<f64> {
        match self.model {
            MaterialModel::Concrete { fc, .. } => Some(fc),
            _ => None,
        }
    }

    /// Compressive strength at transfer (ksi), if this is concrete
    pub fn fci(&self) -> Option<f64> {
        match self.model {
            MaterialModel::Concrete { fci, .. } => Some(fci),
            _ => None,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::concrete(8.0, 6.0, 0.150)
    }
}
