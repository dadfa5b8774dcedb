//! Pretensioned strand layout and its equivalent loads
//!
//! Strand heights are measured from the girder bottom in inches. Debond
//! lengths and the transfer length are in feet along the girder, measured
//! from the nearer end of the precast piece (each span is one piece).

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::loads::{LoadSet, NodeLoad};
use crate::model::GirderLayout;
use crate::units::IN_PER_FT;

/// A horizontal row of strands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrandRow {
    pub count: usize,
    /// Height above the girder bottom (in)
    pub height: f64,
}

/// Strands of one row that are sleeved over a length at each girder end
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebondGroup {
    /// Index into the layout's rows
    pub row: usize,
    pub count: usize,
    /// Debonded length from each end (ft)
    pub length: f64,
}

/// Resultant of the bonded strands at a section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrestressResultant {
    /// Compressive force on the concrete (kip)
    pub force: f64,
    /// Strand centroid below the section centroid (in)
    pub eccentricity: f64,
    /// Effective bonded strand area (in²)
    pub area: f64,
}

/// Strand layout of a pretensioned girder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrestressLayout {
    pub rows: Vec<StrandRow>,
    pub debonded: Vec<DebondGroup>,
    /// Area of one strand (in²)
    pub strand_area: f64,
    /// Nominal strand diameter (in)
    pub strand_diameter: f64,
    /// Stress at jacking (ksi)
    pub jacking_stress: f64,
    /// Transfer length (ft); 60 strand diameters when absent
    pub transfer_length: Option<f64>,
}

impl Default for PrestressLayout {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            debonded: Vec::new(),
            strand_area: 0.153,
            strand_diameter: 0.5,
            jacking_stress: 202.5,
            transfer_length: None,
        }
    }
}

/// Fraction of full force developed at `distance` from the girder end by a
/// strand bonded from `debond` onwards
fn bond_ramp(distance: f64, debond: f64, transfer: f64) -> f64 {
    if transfer <= 0.0 {
        return if distance >= debond { 1.0 } else { 0.0 };
    }
    ((distance - debond) / transfer).clamp(0.0, 1.0)
}

impl PrestressLayout {
    /// Layout of equal rows of 0.5 in strands
    pub fn from_rows(rows: &[(usize, f64)]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|&(count, height)| StrandRow { count, height })
                .collect(),
            ..Self::default()
        }
    }

    /// Add a debonded group
    pub fn with_debonding(mut self, row: usize, count: usize, length: f64) -> Self {
        self.debonded.push(DebondGroup { row, count, length });
        self
    }

    /// Total number of strands
    pub fn strand_count(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// Transfer length in feet
    pub fn transfer_length_ft(&self) -> f64 {
        self.transfer_length
            .unwrap_or(60.0 * self.strand_diameter / IN_PER_FT)
    }

    /// Check the debond groups against the rows they refer to
    pub fn validate(&self) -> BridgeResult<()> {
        if self.strand_area <= 0.0 || self.jacking_stress <= 0.0 {
            return Err(BridgeError::InvalidInput(
                "strand area and jacking stress must be positive".into(),
            ));
        }
        for (k, row) in self.rows.iter().enumerate() {
            let sleeved: usize = self
                .debonded
                .iter()
                .filter(|g| g.row == k)
                .map(|g| g.count)
                .sum();
            if sleeved > row.count {
                return Err(BridgeError::InvalidInput(format!(
                    "row {k} has {} strands but {sleeved} are debonded",
                    row.count
                )));
            }
        }
        if let Some(g) = self.debonded.iter().find(|g| g.row >= self.rows.len()) {
            return Err(BridgeError::InvalidInput(format!(
                "debonded group refers to missing row {}",
                g.row
            )));
        }
        Ok(())
    }

    /// Effective strand count of each row at a distance from the girder end
    fn effective_counts(&self, distance: f64) -> Vec<f64> {
        let lt = self.transfer_length_ft();
        self.rows
            .iter()
            .enumerate()
            .map(|(k, row)| {
                let groups = self.debonded.iter().filter(|g| g.row == k);
                let sleeved: usize = groups.clone().map(|g| g.count).sum();
                let bonded = row.count.saturating_sub(sleeved) as f64 * bond_ramp(distance, 0.0, lt);
                bonded
                    + groups
                        .map(|g| g.count as f64 * bond_ramp(distance, g.length, lt))
                        .sum::<f64>()
            })
            .collect()
    }

    /// Fully bonded strand area (in²)
    pub fn total_area(&self) -> f64 {
        self.strand_count() as f64 * self.strand_area
    }

    /// Centroid height of all strands (in)
    pub fn centroid_height(&self) -> f64 {
        let n = self.strand_count();
        if n == 0 {
            return 0.0;
        }
        self.rows.iter().map(|r| r.count as f64 * r.height).sum::<f64>() / n as f64
    }

    /// Bonded strand area at a distance from the girder end (in²)
    pub fn effective_area(&self, distance: f64) -> f64 {
        self.effective_counts(distance).iter().sum::<f64>() * self.strand_area
    }

    /// Centroid height of the bonded strands at a distance from the girder end.
    /// Falls back to the full-layout centroid where nothing is bonded yet.
    pub fn effective_centroid_height(&self, distance: f64) -> f64 {
        let counts = self.effective_counts(distance);
        let n: f64 = counts.iter().sum();
        if n <= 0.0 {
            return self.centroid_height();
        }
        counts
            .iter()
            .zip(&self.rows)
            .map(|(c, r)| c * r.height)
            .sum::<f64>()
            / n
    }

    /// Force and eccentricity at a distance from the girder end for a given
    /// strand stress (ksi) and section centroid height (in)
    pub fn resultant(&self, distance: f64, stress: f64, y_centroid: f64) -> PrestressResultant {
        let area = self.effective_area(distance);
        PrestressResultant {
            force: area * stress,
            eccentricity: y_centroid - self.effective_centroid_height(distance),
            area,
        }
    }

    /// Equivalent node loads of a uniform strand stress along a girder line.
    ///
    /// Each element carries the resultant at its midpoint as a pair of
    /// self-equilibrated end loads, so the force steps up element by element
    /// through the transfer and debond regions.
    pub fn equivalent_loads(
        &self,
        layout: &GirderLayout,
        stress: f64,
        y_centroid: f64,
        name: &str,
    ) -> BridgeResult<LoadSet> {
        let mut loads = LoadSet::new(name);
        if stress == 0.0 || self.strand_count() == 0 {
            return Ok(loads);
        }

        for k in 0..layout.members.len() {
            let (xa, xb) = (layout.stations[k], layout.stations[k + 1]);
            let xm = 0.5 * (xa + xb);
            let span = layout.span_index(xm).ok_or_else(|| {
                BridgeError::InvalidGeometry(format!("station {xm:.3} lies outside every span"))
            })?;
            let start = layout.stations[layout.supports[span]];
            let end = layout.stations[layout.supports[span + 1]];
            let distance = (xm - start).min(end - xm);

            let r = self.resultant(distance, stress, y_centroid);
            let moment = r.force * r.eccentricity / IN_PER_FT;
            loads.add_node_load(&layout.nodes[k], NodeLoad::axial_and_moment(r.force, moment));
            loads.add_node_load(&layout.nodes[k + 1], NodeLoad::axial_and_moment(-r.force, -moment));
        }

        Ok(loads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GirderLineBuilder;
    use approx::assert_relative_eq;

    fn layout() -> PrestressLayout {
        PrestressLayout::from_rows(&[(12, 2.0), (12, 4.0), (6, 6.0)]).with_debonding(0, 4, 10.0)
    }

    #[test]
    fn test_centroid_and_area() {
        let ps = layout();
        assert_eq!(ps.strand_count(), 30);
        assert_relative_eq!(ps.total_area(), 30.0 * 0.153);
        assert_relative_eq!(ps.centroid_height(), (24.0 + 48.0 + 36.0) / 30.0);
        assert_relative_eq!(ps.transfer_length_ft(), 2.5);
    }

    #[test]
    fn test_bond_ramps() {
        let ps = layout();
        assert_relative_eq!(ps.effective_area(0.0), 0.0);
        // Half the transfer length: bonded strands at half force, sleeved ones at zero
        assert_relative_eq!(ps.effective_area(1.25), 13.0 * 0.153, max_relative = 1e-12);
        assert_relative_eq!(ps.effective_area(5.0), 26.0 * 0.153, max_relative = 1e-12);
        assert_relative_eq!(ps.effective_area(11.25), 28.0 * 0.153, max_relative = 1e-12);
        assert_relative_eq!(ps.effective_area(20.0), ps.total_area(), max_relative = 1e-12);

        // Debonding the bottom row lifts the centroid near the end
        assert!(ps.effective_centroid_height(5.0) > ps.centroid_height());
    }

    #[test]
    fn test_debond_validation() {
        assert!(layout().validate().is_ok());
        assert!(layout().with_debonding(2, 7, 5.0).validate().is_err());
        assert!(layout().with_debonding(5, 1, 5.0).validate().is_err());
    }

    #[test]
    fn test_equivalent_loads_self_equilibrate() {
        let model = GirderLineBuilder::new(&[60.0]).elements_per_span(20).build().unwrap();
        let girder = model.layout().unwrap();
        let ps = layout();
        let loads = ps.equivalent_loads(&girder, 180.0, 24.73, "PS").unwrap();

        let (mut fx, mut mz) = (0.0, 0.0);
        for node in &girder.nodes {
            let l = loads.node_total(node);
            fx += l.fx;
            mz += l.mz;
        }
        assert!(fx.abs() < 1e-9);
        assert!(mz.abs() < 1e-9);

        // The end node only sees the first element's partially bonded force
        let first = loads.node_total(&girder.nodes[0]);
        let expected = ps.effective_area(1.5) * 180.0;
        assert_relative_eq!(first.fx, expected, max_relative = 1e-12);
        assert!(first.mz > 0.0);
    }
}
