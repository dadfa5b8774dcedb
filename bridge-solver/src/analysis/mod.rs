//! Linear system assembly and solution

mod solver;

pub use solver::{ElementData, LinearSystem};

use serde::{Deserialize, Serialize};

use crate::math::DEFAULT_PIVOT_TOLERANCE;

/// Options for assembling and factorizing the global system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Penalty stiffness as a multiple of the largest diagonal stiffness term
    pub penalty_ratio: f64,
    /// Relative pivot size below which the matrix is reported singular
    pub pivot_tolerance: f64,
    /// Renumber nodes with reverse Cuthill-McKee before factorizing
    pub reorder: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            penalty_ratio: 1.0e10,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            reorder: true,
        }
    }
}

impl SolverOptions {
    /// Set the penalty ratio
    pub fn with_penalty_ratio(mut self, ratio: f64) -> Self {
        self.penalty_ratio = ratio;
        self
    }

    /// Set the relative pivot tolerance
    pub fn with_pivot_tolerance(mut self, tol: f64) -> Self {
        self.pivot_tolerance = tol;
        self
    }

    /// Keep the model's node order
    pub fn without_reordering(mut self) -> Self {
        self.reorder = false;
        self
    }
}
