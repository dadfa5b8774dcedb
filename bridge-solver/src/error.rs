//! Error types for the bridge solver

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for bridge analysis operations
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Node '{0}' not found in model")]
    NodeNotFound(String),

    #[error("Member '{0}' not found in model")]
    MemberNotFound(String),

    #[error("Material '{0}' not found in model")]
    MaterialNotFound(String),

    #[error("Section '{0}' not found in model")]
    SectionNotFound(String),

    #[error("Vehicle '{0}' not found in catalog")]
    VehicleNotFound(String),

    #[error("Girder shape '{0}' not found in catalog")]
    GirderNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Numerical failure during a solve. `context` names the stage, section or
    /// vehicle that was being processed.
    #[error("Singular stiffness matrix ({context})")]
    Singularity { context: String },

    #[error("Analysis cancelled during phase '{phase}'")]
    Cancelled { phase: String },

    #[error("Plan limit: {reason} (requested {requested:?}, allowed {allowed:?})")]
    PlanLimit {
        requested: crate::api::ExecutionTier,
        allowed: crate::api::ExecutionTier,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for bridge analysis operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Stable classification of an error, used by the API layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidGeometry,
    Singularity,
    Cancelled,
    PlanLimit,
    NotFound,
    InvalidInput,
}

impl BridgeError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::InvalidGeometry(_) => ErrorKind::InvalidGeometry,
            BridgeError::Singularity { .. } => ErrorKind::Singularity,
            BridgeError::Cancelled { .. } => ErrorKind::Cancelled,
            BridgeError::PlanLimit { .. } => ErrorKind::PlanLimit,
            BridgeError::NodeNotFound(_)
            | BridgeError::MemberNotFound(_)
            | BridgeError::MaterialNotFound(_)
            | BridgeError::SectionNotFound(_)
            | BridgeError::VehicleNotFound(_)
            | BridgeError::GirderNotFound(_) => ErrorKind::NotFound,
            BridgeError::DuplicateName(_)
            | BridgeError::InvalidInput(_)
            | BridgeError::Serialization(_) => ErrorKind::InvalidInput,
        }
    }

    /// Attach stage/section/vehicle context to a singularity.
    ///
    /// Other variants already carry their own context and pass through unchanged.
    pub fn in_context(self, context: &str) -> Self {
        match self {
            BridgeError::Singularity { context: inner } if inner.is_empty() => {
                BridgeError::Singularity {
                    context: context.to_string(),
                }
            }
            BridgeError::Singularity { context: inner } => BridgeError::Singularity {
                context: format!("{context}: {inner}"),
            },
            other => other,
        }
    }
}

/// Category of an out-of-range engineering value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    TensileStress,
    CompressiveStress,
    PrestressLoss,
    RatingFactor,
}

/// A value outside its expected engineering range.
///
/// Never fatal: collected next to otherwise valid results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitWarning {
    pub kind: LimitKind,
    /// Stage name, or "rating" for rating warnings
    pub stage: String,
    /// Section location (distance along the girder line)
    pub location: f64,
    /// Vehicle identifier when the warning comes from a rating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
    pub value: f64,
    pub limit: f64,
}

impl std::fmt::Display for LimitWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} at x = {:.3} during {}: {:.4} exceeds {:.4}",
            self.kind, self.location, self.stage, self.value, self.limit
        )?;
        if let Some(vehicle) = &self.vehicle {
            write!(f, " (vehicle {vehicle})")?;
        }
        Ok(())
    }
}
