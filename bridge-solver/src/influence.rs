//! Influence lines
//!
//! The primary generator imposes a unit dislocation at the section of
//! interest (a unit relative rotation for moment, a unit relative transverse
//! displacement for shear, a unit support settlement for a reaction) and reads
//! the deflected shape of the girder line, which by the reciprocal theorem is
//! the influence line. One solve per line, all against one factorization.
//!
//! Ordinates are positive for a response in the positive sense (sagging
//! moment, left-to-right shear, upward reaction, downward deflection) under a
//! unit downward load.

use serde::{Deserialize, Serialize};

use crate::analysis::{LinearSystem, SolverOptions};
use crate::error::{BridgeError, BridgeResult};
use crate::loads::{LoadSet, NodeLoad};
use crate::math::{hermite_deflection, Vec12};
use crate::model::{BridgeModel, GirderLayout};

/// Response an influence line is drawn for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceQuantity {
    Moment,
    Shear,
    Reaction,
    Deflection,
}

impl std::fmt::Display for InfluenceQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InfluenceQuantity::Moment => "moment",
            InfluenceQuantity::Shear => "shear",
            InfluenceQuantity::Reaction => "reaction",
            InfluenceQuantity::Deflection => "deflection",
        };
        f.write_str(name)
    }
}

/// Sampling resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceOptions {
    /// Minimum samples in the shortest span
    pub samples_per_span: usize,
    /// Maximum sample spacing as a fraction of the total length
    pub length_fraction: f64,
}

impl Default for InfluenceOptions {
    fn default() -> Self {
        Self {
            samples_per_span: 100,
            length_fraction: 0.01,
        }
    }
}

impl InfluenceOptions {
    pub fn with_samples_per_span(mut self, n: usize) -> Self {
        self.samples_per_span = n.max(1);
        self
    }

    /// Sample spacing for a girder line: the finer of the two rules
    pub fn spacing(&self, layout: &GirderLayout) -> f64 {
        let shortest = layout
            .spans()
            .into_iter()
            .fold(layout.length(), f64::min);
        let per_span = shortest / self.samples_per_span.max(1) as f64;
        per_span.min(self.length_fraction * layout.length())
    }
}

/// Sampled influence line for one quantity at one section.
///
/// Positions are ascending; a position appears twice where the line jumps
/// (shear), left value first. Between samples the line is linear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceLine {
    pub quantity: InfluenceQuantity,
    /// Station of the section (snapped to the nearest node)
    pub station: f64,
    pub positions: Vec<f64>,
    pub ordinates: Vec<f64>,
}

impl InfluenceLine {
    pub fn new(quantity: InfluenceQuantity, station: f64, positions: Vec<f64>, ordinates: Vec<f64>) -> Self {
        Self {
            quantity,
            station,
            positions,
            ordinates,
        }
    }

    /// First and last sampled position
    pub fn extent(&self) -> (f64, f64) {
        match (self.positions.first(), self.positions.last()) {
            (Some(&a), Some(&b)) => (a, b),
            _ => (0.0, 0.0),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Linear interpolation between samples; zero off the structure. At a jump
    /// the right-hand value is returned.
    pub fn ordinate_at(&self, x: f64) -> f64 {
        let (a, b) = self.extent();
        if self.is_empty() || x < a || x > b {
            return 0.0;
        }
        let k = self.positions.partition_point(|&p| p <= x);
        if k == 0 {
            return self.ordinates[0];
        }
        if k == self.positions.len() {
            return self.ordinates[k - 1];
        }
        let (x0, x1) = (self.positions[k - 1], self.positions[k]);
        let (y0, y1) = (self.ordinates[k - 1], self.ordinates[k]);
        if x1 <= x0 {
            return y0;
        }
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// Limit of the line approaching `x` from the left. Equal to
    /// [`ordinate_at`](Self::ordinate_at) except at a jump.
    pub fn ordinate_left_of(&self, x: f64) -> f64 {
        let (a, b) = self.extent();
        if self.is_empty() || x < a || x > b {
            return 0.0;
        }
        let k = self.positions.partition_point(|&p| p < x);
        if k == 0 {
            return self.ordinates[0];
        }
        if k == self.positions.len() {
            return self.ordinates[k - 1];
        }
        let (x0, x1) = (self.positions[k - 1], self.positions[k]);
        let (y0, y1) = (self.ordinates[k - 1], self.ordinates[k]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    /// Exact integral of the piecewise-linear line over [a, b]
    pub fn integrate(&self, a: f64, b: f64) -> f64 {
        if b < a {
            return -self.integrate(b, a);
        }
        self.segments()
            .map(|(x0, y0, x1, y1)| {
                let lo = x0.max(a);
                let hi = x1.min(b);
                if hi <= lo {
                    return 0.0;
                }
                let at = |x: f64| y0 + (y1 - y0) * (x - x0) / (x1 - x0);
                0.5 * (at(lo) + at(hi)) * (hi - lo)
            })
            .sum()
    }

    /// Area under the positive part of the line
    pub fn positive_area(&self) -> f64 {
        self.segments().map(|(x0, y0, x1, y1)| signed_part(x0, y0, x1, y1)).sum()
    }

    /// Area of the negative part of the line (a negative number)
    pub fn negative_area(&self) -> f64 {
        -self
            .segments()
            .map(|(x0, y0, x1, y1)| signed_part(x0, -y0, x1, -y1))
            .sum::<f64>()
    }

    /// Position and value of the largest-magnitude ordinate
    pub fn peak(&self) -> (f64, f64) {
        self.positions
            .iter()
            .zip(&self.ordinates)
            .fold((0.0, 0.0), |best, (&x, &y)| {
                if y.abs() > best.1.abs() {
                    (x, y)
                } else {
                    best
                }
            })
    }

    pub fn max_ordinate(&self) -> f64 {
        self.ordinates.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_ordinate(&self) -> f64 {
        self.ordinates.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Non-degenerate segments as (x0, y0, x1, y1)
    fn segments(&self) -> impl Iterator<Item = (f64, f64, f64, f64)> + '_ {
        self.positions
            .windows(2)
            .zip(self.ordinates.windows(2))
            .filter(|(x, _)| x[1] > x[0])
            .map(|(x, y)| (x[0], y[0], x[1], y[1]))
    }
}

/// Integral of max(y, 0) over one linear segment
fn signed_part(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let dx = x1 - x0;
    match (y0 >= 0.0, y1 >= 0.0) {
        (true, true) => 0.5 * (y0 + y1) * dx,
        (false, false) => 0.0,
        (true, false) => {
            let root = dx * y0 / (y0 - y1);
            0.5 * y0 * root
        }
        (false, true) => {
            let root = dx * y1 / (y1 - y0);
            0.5 * y1 * root
        }
    }
}

/// Generates influence lines for sections of one girder-line model
pub struct InfluenceGenerator {
    system: LinearSystem,
    layout: GirderLayout,
    options: InfluenceOptions,
}

impl InfluenceGenerator {
    /// Assemble and factorize the model once
    pub fn new(model: &BridgeModel, solver: &SolverOptions, options: InfluenceOptions) -> BridgeResult<Self> {
        let system = LinearSystem::assemble(model, solver)?;
        let layout = model.layout()?;
        Ok(Self {
            system,
            layout,
            options,
        })
    }

    pub fn layout(&self) -> &GirderLayout {
        &self.layout
    }

    /// Unit-dislocation influence line for a quantity at a station
    pub fn generate(&self, quantity: InfluenceQuantity, station: f64) -> BridgeResult<InfluenceLine> {
        let s = self.layout.nearest_node(station);
        let node = &self.layout.nodes[s];
        let last = self.layout.nodes.len() - 1;

        // (element index, local dislocation) pairs
        let mut dislocations: Vec<(usize, Vec12)> = Vec::new();
        let mut prescribed = Vec::new();
        let mut load = None;
        let sign;

        match quantity {
            InfluenceQuantity::Moment => {
                if s > 0 {
                    dislocations.push((s - 1, self.end_dislocation(s - 1, true, 5, 1.0)));
                } else {
                    dislocations.push((0, self.end_dislocation(0, false, 5, -1.0)));
                }
                sign = -1.0;
            }
            InfluenceQuantity::Shear => {
                if s > 0 {
                    dislocations.push((s - 1, self.end_dislocation(s - 1, true, 1, -1.0)));
                } else if s < last {
                    dislocations.push((0, self.end_dislocation(0, false, 1, 1.0)));
                }
                sign = -1.0;
            }
            InfluenceQuantity::Reaction => {
                let dof = self.system.dof(node, 1)?;
                if !self.system.is_restrained(dof) {
                    return Err(BridgeError::InvalidInput(format!(
                        "no vertical support at station {:.3}",
                        self.layout.stations[s]
                    )));
                }
                prescribed.push((dof, 1.0));
                sign = 1.0;
            }
            InfluenceQuantity::Deflection => {
                load = Some(LoadSet::new("unit").with_node_load(node, NodeLoad::downward(1.0)));
                sign = -1.0;
            }
        }

        let mut f = match &load {
            Some(loads) => self.system.load_vector(loads)?,
            None => nalgebra::DVector::zeros(self.system.n_dofs()),
        };
        for (e, d0) in &dislocations {
            f += self.system.dislocation_load(&self.layout.members[*e], d0)?;
        }
        let u = self
            .system
            .solve_vector(&f, &prescribed)
            .map_err(|e| e.in_context(&format!("{quantity} influence line at {:.3}", self.layout.stations[s])))?;

        let h = self.options.spacing(&self.layout);
        let mut positions = Vec::new();
        let mut ordinates = Vec::new();
        for (e, member) in self.layout.members.iter().enumerate() {
            let element = self.system.element(member)?;
            let mut local = element.local_displacements(&u);
            if let Some((_, d0)) = dislocations.iter().find(|(k, _)| *k == e) {
                local -= d0;
            }
            let (x0, x1) = (self.layout.stations[e], self.layout.stations[e + 1]);
            let m = ((x1 - x0) / h).ceil().max(1.0) as usize;
            for j in 0..=m {
                let t = j as f64 / m as f64;
                let xi = if self.layout.forward[e] { t } else { 1.0 - t };
                let v = hermite_deflection(local[1], local[5], local[7], local[11], element.length, xi);
                positions.push(x0 + t * (x1 - x0));
                ordinates.push(sign * v);
            }
        }
        let (positions, ordinates) = merge_joints(positions, ordinates);

        Ok(InfluenceLine::new(quantity, self.layout.stations[s], positions, ordinates))
    }

    /// Local dislocation at the end of element `e` that touches its right
    /// (`at_right` = true) or left node, with a value in the global sense.
    /// `component` is 1 for transverse displacement, 5 for rotation.
    fn end_dislocation(&self, e: usize, at_right: bool, component: usize, value: f64) -> Vec12 {
        let forward = self.layout.forward[e];
        // The right-hand node is the j-end of a forward member
        let j_end = at_right == forward;
        let index = if j_end { component + 6 } else { component };
        let orientation = if component == 5 && !forward { -1.0 } else { 1.0 };
        let mut d0 = Vec12::zeros();
        d0[index] = orientation * value;
        d0
    }

    /// Influence line built from one unit-load solve per node, reading the
    /// response at the section. Slower, used to cross-check the
    /// dislocation lines.
    pub fn generate_direct(&self, quantity: InfluenceQuantity, station: f64) -> BridgeResult<InfluenceLine> {
        let s = self.layout.nearest_node(station);
        let target = &self.layout.nodes[s];
        let mut ordinates = Vec::with_capacity(self.layout.nodes.len());

        for node in &self.layout.nodes {
            let loads = LoadSet::new("unit").with_node_load(node, NodeLoad::downward(1.0));
            let solution = self.system.solve(&loads)?;
            let value = match quantity {
                InfluenceQuantity::Moment => solution.girder_moment(&self.layout, s)?,
                InfluenceQuantity::Shear => solution.girder_shear(&self.layout, s)?,
                InfluenceQuantity::Reaction => solution.reactions(target).fy,
                InfluenceQuantity::Deflection => -solution.node_displacement(target)?.dy,
            };
            ordinates.push(value);
        }

        Ok(InfluenceLine::new(
            quantity,
            self.layout.stations[s],
            self.layout.stations.clone(),
            ordinates,
        ))
    }
}

/// Drop repeated joint samples that carry the same value, keeping real jumps
fn merge_joints(positions: Vec<f64>, ordinates: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    let scale = ordinates.iter().fold(1.0_f64, |m, y| m.max(y.abs()));
    let mut xs: Vec<f64> = Vec::with_capacity(positions.len());
    let mut ys: Vec<f64> = Vec::with_capacity(ordinates.len());
    for (x, y) in positions.into_iter().zip(ordinates) {
        if let (Some(&px), Some(&py)) = (xs.last(), ys.last()) {
            if (x - px).abs() < 1e-12 && (y - py).abs() <= 1e-9 * scale {
                continue;
            }
        }
        xs.push(x);
        ys.push(y);
    }
    (xs, ys)
}
