//! Moving-load optimizer
//!
//! Searches vehicle position, travel direction and the variable axle spacing
//! for the extreme response against one influence line. The response is
//! piecewise linear in position (quadratic where a footprint lane load is
//! carried), so the search visits exact breakpoints: every position where an
//! axle sits on an influence-line sample, plus the interior extremum of each
//! quadratic piece.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::influence::{InfluenceLine, InfluenceQuantity};
use crate::vehicle::{axle_offsets, LaneLoad, LaneLoadMode, Vehicle};

/// Search options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Divisions of a variable spacing range (`steps + 1` values searched)
    pub spacing_steps: usize,
    /// Relative tolerance below which two responses are considered tied
    pub tie_tolerance: f64,
    /// Also run the vehicle right to left
    pub reverse: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            spacing_steps: 16,
            tie_tolerance: 1e-9,
            reverse: true,
        }
    }
}

impl OptimizerOptions {
    pub fn with_spacing_steps(mut self, steps: usize) -> Self {
        self.spacing_steps = steps;
        self
    }

    pub fn forward_only(mut self) -> Self {
        self.reverse = false;
        self
    }
}

/// Travel direction. Forward vehicles lead with their first axle toward
/// increasing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelDirection {
    Forward,
    Reverse,
}

impl TravelDirection {
    fn sign(self) -> f64 {
        match self {
            TravelDirection::Forward => 1.0,
            TravelDirection::Reverse => -1.0,
        }
    }
}

/// One vehicle placement and the response it produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub direction: TravelDirection,
    /// Axle spacings used (ft)
    pub spacings: Vec<f64>,
    /// Axle positions, front axle first (ft). Axles off the structure keep
    /// their position but carry no response.
    pub axle_positions: Vec<f64>,
    /// Sum of axle load times ordinate
    pub axle_effect: f64,
    /// Uniform lane load contribution
    pub lane_effect: f64,
    /// `axle_effect + lane_effect`
    pub raw: f64,
    /// Multiple presence times (impact-amplified axles plus lane)
    pub amplified: f64,
}

/// Extreme placements of one vehicle against one influence line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingLoadResult {
    pub vehicle: String,
    pub quantity: InfluenceQuantity,
    pub station: f64,
    pub maximum: Placement,
    pub minimum: Placement,
}

impl MovingLoadResult {
    /// The placement with the larger response magnitude (the maximum on a tie)
    pub fn governing(&self) -> &Placement {
        if self.minimum.amplified.abs() > self.maximum.amplified.abs() {
            &self.minimum
        } else {
            &self.maximum
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Approach {
    Left,
    Right,
}

/// Influence line with a running integral for constant-time area queries
struct Search<'a> {
    line: &'a InfluenceLine,
    cumulative: Vec<f64>,
    extent: (f64, f64),
    breakpoints: Vec<f64>,
    positive_area: f64,
    negative_area: f64,
}

impl<'a> Search<'a> {
    fn new(line: &'a InfluenceLine) -> Self {
        let mut cumulative = Vec::with_capacity(line.len());
        let mut acc = 0.0;
        cumulative.push(acc);
        for i in 1..line.len() {
            let dx = line.positions[i] - line.positions[i - 1];
            acc += 0.5 * (line.ordinates[i] + line.ordinates[i - 1]) * dx;
            cumulative.push(acc);
        }
        let mut breakpoints = line.positions.clone();
        breakpoints.dedup();
        Self {
            line,
            cumulative,
            extent: line.extent(),
            breakpoints,
            positive_area: line.positive_area(),
            negative_area: line.negative_area(),
        }
    }

    /// Integral of the line from the start of the extent to `x`
    fn area_to(&self, x: f64) -> f64 {
        let (a, b) = self.extent;
        let x = x.clamp(a, b);
        let positions = &self.line.positions;
        let k = positions.partition_point(|&p| p <= x);
        if k == 0 {
            return 0.0;
        }
        if k == positions.len() {
            return self.cumulative[k - 1];
        }
        let x0 = positions[k - 1];
        let y0 = self.line.ordinates[k - 1];
        let y = self.line.ordinate_at(x);
        self.cumulative[k - 1] + 0.5 * (y0 + y) * (x - x0)
    }

    fn integrate(&self, a: f64, b: f64) -> f64 {
        self.area_to(b) - self.area_to(a)
    }

    fn on_structure(&self, positions: &[f64]) -> bool {
        let (a, b) = self.extent;
        positions.iter().any(|&x| x >= a && x <= b)
    }

    fn axle_effect(&self, axles: &[f64], positions: &[f64], approach: Approach) -> f64 {
        axles
            .iter()
            .zip(positions)
            .map(|(&p, &x)| match approach {
                Approach::Left => p * self.line.ordinate_left_of(x),
                Approach::Right => p * self.line.ordinate_at(x),
            })
            .sum()
    }

    fn lane_effect(&self, lane: Option<LaneLoad>, positions: &[f64], maximize: bool) -> f64 {
        let Some(lane) = lane else {
            return 0.0;
        };
        match lane.mode {
            LaneLoadMode::Footprint => {
                let lo = positions.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = positions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                lane.intensity * self.integrate(lo, hi)
            }
            LaneLoadMode::AdverseRegions if maximize => lane.intensity * self.positive_area,
            LaneLoadMode::AdverseRegions => lane.intensity * self.negative_area,
        }
    }

    /// Lead-axle positions to evaluate, ascending
    fn candidates(&self, vehicle: &Vehicle, offsets: &[f64], direction: TravelDirection) -> Vec<f64> {
        let sign = direction.sign();
        let mut leads: Vec<f64> = self
            .breakpoints
            .iter()
            .flat_map(|&p| offsets.iter().map(move |&o| p + sign * o))
            .collect();
        sort_unique(&mut leads, self.scale());

        // Footprint lane loads make the response quadratic between breakpoints
        let footprint = matches!(
            vehicle.lane,
            Some(LaneLoad { mode: LaneLoadMode::Footprint, intensity }) if intensity != 0.0
        );
        if footprint && offsets.len() > 1 {
            let response = |lead: f64| {
                let positions = axle_positions(lead, offsets, direction);
                self.axle_effect(&vehicle.axles, &positions, Approach::Right)
                    + self.lane_effect(vehicle.lane, &positions, true)
            };
            let vertices: Vec<f64> = leads
                .windows(2)
                .filter_map(|w| {
                    let h = 0.25 * (w[1] - w[0]);
                    let mid = 0.5 * (w[0] + w[1]);
                    let (y1, y2, y3) = (response(mid - h), response(mid), response(mid + h));
                    let curvature = y3 - 2.0 * y2 + y1;
                    if curvature.abs() <= 1e-12 * (y1.abs() + y2.abs() + y3.abs()).max(1.0) {
                        return None;
                    }
                    let t = mid - h * (y3 - y1) / (2.0 * curvature);
                    (t > w[0] && t < w[1]).then_some(t)
                })
                .collect();
            leads.extend(vertices);
            sort_unique(&mut leads, self.scale());
        }

        leads.retain(|&lead| self.on_structure(&axle_positions(lead, offsets, direction)));
        leads
    }

    fn scale(&self) -> f64 {
        let (a, b) = self.extent;
        (b - a).abs().max(1.0)
    }
}

fn sort_unique(values: &mut Vec<f64>, scale: f64) {
    values.sort_by(f64::total_cmp);
    values.dedup_by(|b, a| (*b - *a).abs() <= 1e-9 * scale);
}

fn axle_positions(lead: f64, offsets: &[f64], direction: TravelDirection) -> Vec<f64> {
    let sign = direction.sign();
    offsets.iter().map(|o| lead - sign * o).collect()
}

/// Find the maximum and minimum response of `vehicle` on `line`.
///
/// Scan order is forward before reverse, then ascending spacing, then
/// ascending lead position; a later placement replaces the current best only
/// when it is better by more than the tie tolerance. At a jump in the line the
/// axle is taken on whichever side gives the more extreme response.
pub fn optimize(
    line: &InfluenceLine,
    vehicle: &Vehicle,
    options: &OptimizerOptions,
) -> BridgeResult<MovingLoadResult> {
    vehicle.validate()?;
    if line.len() < 2 {
        return Err(BridgeError::InvalidInput(format!(
            "influence line at x = {} has fewer than two samples",
            line.station
        )));
    }

    let search = Search::new(line);
    let directions: &[TravelDirection] = if options.reverse {
        &[TravelDirection::Forward, TravelDirection::Reverse]
    } else {
        &[TravelDirection::Forward]
    };
    let amplify = |axle: f64, lane: f64| vehicle.multiple_presence * ((1.0 + vehicle.impact) * axle + lane);

    let mut maximum: Option<Placement> = None;
    let mut minimum: Option<Placement> = None;
    let mut evaluated = 0usize;

    for &direction in directions {
        for spacings in vehicle.spacing_options(options.spacing_steps) {
            let offsets = axle_offsets(&spacings);
            for lead in search.candidates(vehicle, &offsets, direction) {
                let positions = axle_positions(lead, &offsets, direction);
                for approach in [Approach::Left, Approach::Right] {
                    let axle_effect = search.axle_effect(&vehicle.axles, &positions, approach);
                    evaluated += 1;
                    for (best, maximize) in [(&mut maximum, true), (&mut minimum, false)] {
                        let lane_effect = search.lane_effect(vehicle.lane, &positions, maximize);
                        let amplified = amplify(axle_effect, lane_effect);
                        let improves = match best.as_ref() {
                            None => true,
                            Some(current) => {
                                let tol = options.tie_tolerance * current.amplified.abs().max(1.0);
                                if maximize {
                                    amplified > current.amplified + tol
                                } else {
                                    amplified < current.amplified - tol
                                }
                            }
                        };
                        if improves {
                            *best = Some(Placement {
                                direction,
                                spacings: spacings.clone(),
                                axle_positions: positions.clone(),
                                axle_effect,
                                lane_effect,
                                raw: axle_effect + lane_effect,
                                amplified,
                            });
                        }
                    }
                }
            }
        }
    }

    log::debug!(
        "Vehicle '{}' on {} line at x = {:.3}: {} placements evaluated",
        vehicle.id,
        line.quantity,
        line.station,
        evaluated
    );

    match (maximum, minimum) {
        (Some(maximum), Some(minimum)) => Ok(MovingLoadResult {
            vehicle: vehicle.id.clone(),
            quantity: line.quantity,
            station: line.station,
            maximum,
            minimum,
        }),
        _ => Err(BridgeError::InvalidInput(format!(
            "vehicle '{}' cannot be placed on the structure",
            vehicle.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::AxleSpacing;
    use approx::assert_relative_eq;

    fn triangle(span: f64, peak: f64) -> InfluenceLine {
        InfluenceLine::new(
            InfluenceQuantity::Moment,
            span / 2.0,
            vec![0.0, span / 2.0, span],
            vec![0.0, peak, 0.0],
        )
    }

    fn truck() -> Vehicle {
        Vehicle::new(
            "T",
            "three axle",
            &[8.0, 32.0, 32.0],
            &[AxleSpacing::fixed(14.0), AxleSpacing::variable(14.0, 30.0)],
        )
        .with_impact(0.0)
    }

    #[test]
    fn test_three_axle_truck_centred_on_peak() {
        let result = optimize(&triangle(80.0, 20.0), &truck(), &OptimizerOptions::default()).unwrap();
        let max = &result.maximum;
        assert_relative_eq!(max.raw, 1160.0, epsilon = 1e-9);
        assert_eq!(max.direction, TravelDirection::Forward);
        assert_eq!(max.spacings, vec![14.0, 14.0]);
        assert_relative_eq!(max.axle_positions[1], 40.0, epsilon = 1e-9);
        assert!(result.minimum.amplified.abs() < 1e-9);
        assert_eq!(result.governing(), &result.maximum);
    }

    #[test]
    fn test_short_span_overhang() {
        let tandem = Vehicle::new("TAN", "tandem", &[32.0, 32.0], &[AxleSpacing::fixed(14.0)]).with_impact(0.0);
        let result = optimize(&triangle(10.0, 2.5), &tandem, &OptimizerOptions::default()).unwrap();
        assert_relative_eq!(result.maximum.raw, 80.0, epsilon = 1e-9);
        assert_eq!(result.maximum.axle_positions, vec![5.0, -9.0]);
    }

    #[test]
    fn test_shear_jump_uses_both_sides() {
        let line = InfluenceLine::new(
            InfluenceQuantity::Shear,
            20.0,
            vec![0.0, 20.0, 20.0, 80.0],
            vec![0.0, -0.25, 0.75, 0.0],
        );
        let axle = Vehicle::new("A", "single axle", &[10.0], &[]).with_impact(0.0);
        let result = optimize(&line, &axle, &OptimizerOptions::default()).unwrap();
        assert_relative_eq!(result.maximum.raw, 7.5, epsilon = 1e-12);
        assert_relative_eq!(result.minimum.raw, -2.5, epsilon = 1e-12);
        assert_eq!(result.maximum.axle_positions, vec![20.0]);
    }

    #[test]
    fn test_adverse_lane_and_impact() {
        let design = truck().with_impact(0.33).with_lane(0.64, LaneLoadMode::AdverseRegions);
        let result = optimize(&triangle(80.0, 20.0), &design, &OptimizerOptions::default()).unwrap();
        assert_relative_eq!(result.maximum.lane_effect, 512.0, epsilon = 1e-9);
        assert_relative_eq!(result.maximum.amplified, 1.33 * 1160.0 + 512.0, epsilon = 1e-9);
    }

    #[test]
    fn test_footprint_lane_finds_interior_optimum() {
        let tandem = Vehicle::new("TAN", "tandem", &[25.0, 25.0], &[AxleSpacing::fixed(4.0)])
            .with_impact(0.0)
            .with_lane(1.0, LaneLoadMode::Footprint);
        let result = optimize(&triangle(80.0, 20.0), &tandem, &OptimizerOptions::default()).unwrap();
        assert_relative_eq!(result.maximum.raw, 1028.0, epsilon = 1e-6);
        assert_relative_eq!(result.maximum.axle_positions[0], 42.0, epsilon = 1e-6);
        assert_relative_eq!(result.maximum.axle_positions[1], 38.0, epsilon = 1e-6);
    }

    #[test]
    fn test_running_integral_matches_line() {
        let line = InfluenceLine::new(
            InfluenceQuantity::Shear,
            20.0,
            vec![0.0, 20.0, 20.0, 80.0],
            vec![0.0, -0.25, 0.75, 0.0],
        );
        let search = Search::new(&line);
        for (a, b) in [(0.0, 80.0), (5.0, 25.0), (20.0, 20.0), (-10.0, 30.0)] {
            assert_relative_eq!(search.integrate(a, b), line.integrate(a, b), epsilon = 1e-12);
        }
    }
}
