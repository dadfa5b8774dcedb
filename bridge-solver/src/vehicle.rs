//! Rating vehicles and design load patterns

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Distance between two consecutive axles (ft). Fixed when `min == max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxleSpacing {
    pub min: f64,
    pub max: f64,
}

impl AxleSpacing {
    pub fn fixed(d: f64) -> Self {
        Self { min: d, max: d }
    }

    pub fn variable(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_variable(&self) -> bool {
        self.max > self.min
    }
}

/// Where a uniform lane load is placed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneLoadMode {
    /// Under the vehicle, from the first to the last axle
    #[default]
    Footprint,
    /// Over every part of the line where it increases the response
    AdverseRegions,
}

/// Uniform lane load (kip/ft)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneLoad {
    pub intensity: f64,
    #[serde(default)]
    pub mode: LaneLoadMode,
}

/// A vehicle or design load pattern. Axles are listed front to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    /// Axle loads (kip)
    pub axles: Vec<f64>,
    /// `spacings[k]` separates axle k and axle k + 1
    pub spacings: Vec<AxleSpacing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<LaneLoad>,
    /// Dynamic load allowance applied to axle loads
    #[serde(default = "default_impact")]
    pub impact: f64,
    /// Multiple presence factor
    #[serde(default = "default_presence")]
    pub multiple_presence: f64,
}

fn default_impact() -> f64 {
    0.33
}

fn default_presence() -> f64 {
    1.0
}

impl Vehicle {
    pub fn new(id: &str, name: &str, axles: &[f64], spacings: &[AxleSpacing]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            axles: axles.to_vec(),
            spacings: spacings.to_vec(),
            lane: None,
            impact: default_impact(),
            multiple_presence: default_presence(),
        }
    }

    pub fn with_lane(mut self, intensity: f64, mode: LaneLoadMode) -> Self {
        self.lane = Some(LaneLoad { intensity, mode });
        self
    }

    pub fn with_impact(mut self, impact: f64) -> Self {
        self.impact = impact;
        self
    }

    pub fn with_multiple_presence(mut self, m: f64) -> Self {
        self.multiple_presence = m;
        self
    }

    /// Gross axle weight (kip), the reference for load restrictions
    pub fn weight(&self) -> f64 {
        self.axles.iter().sum()
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.axles.is_empty() {
            return Err(BridgeError::InvalidInput(format!("vehicle '{}' has no axles", self.id)));
        }
        if self.spacings.len() + 1 != self.axles.len() {
            return Err(BridgeError::InvalidInput(format!(
                "vehicle '{}' has {} axles but {} spacings",
                self.id,
                self.axles.len(),
                self.spacings.len()
            )));
        }
        if self.spacings.iter().any(|s| !(s.min > 0.0) || s.max < s.min) {
            return Err(BridgeError::InvalidInput(format!(
                "vehicle '{}' has an invalid axle spacing",
                self.id
            )));
        }
        if self.spacings.iter().filter(|s| s.is_variable()).count() > 1 {
            return Err(BridgeError::InvalidInput(format!(
                "vehicle '{}' may have at most one variable spacing",
                self.id
            )));
        }
        Ok(())
    }

    /// Spacing sets to search, ascending in the variable spacing: `steps + 1`
    /// values from its minimum to its maximum.
    pub fn spacing_options(&self, steps: usize) -> Vec<Vec<f64>> {
        let base: Vec<f64> = self.spacings.iter().map(|s| s.min).collect();
        let Some(k) = self.spacings.iter().position(|s| s.is_variable()) else {
            return vec![base];
        };
        let AxleSpacing { min, max } = self.spacings[k];
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| {
                let mut set = base.clone();
                set[k] = if i == steps {
                    max
                } else {
                    min + (max - min) * i as f64 / steps as f64
                };
                set
            })
            .collect()
    }
}

/// Distance of each axle behind the front axle
pub fn axle_offsets(spacings: &[f64]) -> Vec<f64> {
    std::iter::once(0.0)
        .chain(spacings.iter().scan(0.0, |acc, s| {
            *acc += s;
            Some(*acc)
        }))
        .collect()
}
