//! Load rating
//!
//! RF = (C − γDC·DC − γDW·DW) / (γLL·(LL + IM)), evaluated per section,
//! vehicle and force effect at an inventory and an operating live-load
//! factor. Capacities and demands are expressed in the sense of the effect
//! being rated, so a hogging demand is a positive negative-moment demand.

use serde::{Deserialize, Serialize};

use crate::control::AnalysisContext;
use crate::error::{BridgeResult, LimitKind, LimitWarning};
use crate::girder::SectionCapacity;
use crate::moving_load::MovingLoadResult;
use crate::stages::StationEffects;

/// Live-load effects smaller than this are not rated
const MIN_LIVE_EFFECT: f64 = 1e-9;

/// Load factors and the restriction threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingFactors {
    pub dc: f64,
    pub dw: f64,
    pub ll_inventory: f64,
    pub ll_operating: f64,
    /// Operating rating factors below this call for a load restriction
    pub restriction_threshold: f64,
}

impl Default for RatingFactors {
    fn default() -> Self {
        Self {
            dc: 1.25,
            dw: 1.50,
            ll_inventory: 1.75,
            ll_operating: 1.35,
            restriction_threshold: 1.0,
        }
    }
}

impl RatingFactors {
    /// Rating factor for one live-load factor
    pub fn rating_factor(&self, capacity: f64, dc: f64, dw: f64, live: f64, gamma_ll: f64) -> f64 {
        (capacity - self.dc * dc - self.dw * dw) / (gamma_ll * live)
    }
}

/// Force effect being rated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceEffect {
    PositiveMoment,
    NegativeMoment,
    Shear,
}

impl std::fmt::Display for ForceEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ForceEffect::PositiveMoment => "positive moment",
            ForceEffect::NegativeMoment => "negative moment",
            ForceEffect::Shear => "shear",
        };
        f.write_str(name)
    }
}

/// Recommended restriction: the rating factor times the reference weight of
/// the vehicle. Deriving it again from its own rating factor and reference
/// weight gives the same restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRestriction {
    pub vehicle: String,
    pub rating_factor: f64,
    /// Gross vehicle weight (kip)
    pub reference_weight: f64,
    /// Permitted gross weight (kip)
    pub restricted_weight: f64,
}

impl LoadRestriction {
    pub fn derive(vehicle: &str, rating_factor: f64, reference_weight: f64) -> Self {
        Self {
            vehicle: vehicle.to_string(),
            rating_factor,
            reference_weight,
            restricted_weight: (rating_factor * reference_weight).max(0.0),
        }
    }

    /// Derive the restriction again from its own inputs
    pub fn rederive(&self) -> Self {
        Self::derive(&self.vehicle, self.rating_factor, self.reference_weight)
    }

    /// Permitted weight in tons
    pub fn restricted_tons(&self) -> f64 {
        self.restricted_weight / 2.0
    }
}

/// Rating of one force effect at one section for one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingResult {
    pub station: f64,
    pub vehicle: String,
    pub effect: ForceEffect,
    /// Factored resistance
    pub capacity: f64,
    pub dc: f64,
    pub dw: f64,
    /// Live load with impact and multiple presence
    pub live_load: f64,
    pub inventory: f64,
    pub operating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restriction: Option<LoadRestriction>,
}

/// Live-load extremes of one vehicle at one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEffects {
    pub vehicle: String,
    /// Reference weight for restrictions (kip)
    pub weight: f64,
    pub moment: MovingLoadResult,
    pub shear: MovingLoadResult,
}

/// Everything needed to rate one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDemand {
    pub station: f64,
    pub capacity: SectionCapacity,
    pub permanent: StationEffects,
    pub live: Vec<VehicleEffects>,
}

/// All ratings of one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub results: Vec<RatingResult>,
    /// Lowest inventory rating factor; the first one found on a tie
    pub governing: Option<RatingResult>,
    pub restrictions: Vec<LoadRestriction>,
    pub warnings: Vec<LimitWarning>,
}

/// Rates sections against vehicles
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingEngine {
    factors: RatingFactors,
}

impl RatingEngine {
    pub fn new(factors: RatingFactors) -> Self {
        Self { factors }
    }

    pub fn factors(&self) -> &RatingFactors {
        &self.factors
    }

    #[allow(clippy::too_many_arguments)]
    fn result(
        &self,
        station: f64,
        vehicle: &VehicleEffects,
        effect: ForceEffect,
        capacity: f64,
        dc: f64,
        dw: f64,
        live_load: f64,
    ) -> RatingResult {
        let f = &self.factors;
        let inventory = f.rating_factor(capacity, dc, dw, live_load, f.ll_inventory);
        let operating = f.rating_factor(capacity, dc, dw, live_load, f.ll_operating);
        let restriction = (operating < f.restriction_threshold)
            .then(|| LoadRestriction::derive(&vehicle.vehicle, operating, vehicle.weight));
        RatingResult {
            station,
            vehicle: vehicle.vehicle.clone(),
            effect,
            capacity,
            dc,
            dw,
            live_load,
            inventory,
            operating,
            restriction,
        }
    }

    /// Rate every force effect with a live-load demand at one section for one
    /// vehicle. Negative moment is rated only where the section has negative
    /// moment reinforcement.
    pub fn rate_pair(&self, section: &SectionDemand, vehicle: &VehicleEffects) -> Vec<RatingResult> {
        let cap = &section.capacity;
        let pm = &section.permanent;
        let mut results = Vec::new();

        let positive = vehicle.moment.maximum.amplified;
        if positive > MIN_LIVE_EFFECT {
            results.push(self.result(
                section.station,
                vehicle,
                ForceEffect::PositiveMoment,
                cap.positive_moment,
                pm.dc_moment,
                pm.dw_moment,
                positive,
            ));
        }

        let negative = -vehicle.moment.minimum.amplified;
        if negative > MIN_LIVE_EFFECT && cap.negative_moment < 0.0 {
            results.push(self.result(
                section.station,
                vehicle,
                ForceEffect::NegativeMoment,
                -cap.negative_moment,
                -pm.dc_moment,
                -pm.dw_moment,
                negative,
            ));
        }

        // Shear in either sense; the lower rating governs
        let shear = [
            (1.0, vehicle.shear.maximum.amplified),
            (-1.0, -vehicle.shear.minimum.amplified),
        ]
        .into_iter()
        .filter(|&(_, live)| live > MIN_LIVE_EFFECT)
        .map(|(sense, live)| {
            self.result(
                section.station,
                vehicle,
                ForceEffect::Shear,
                cap.shear,
                sense * pm.dc_shear,
                sense * pm.dw_shear,
                live,
            )
        })
        .reduce(|a, b| if b.inventory < a.inventory { b } else { a });
        results.extend(shear);

        results
    }

    /// Rate every section against every vehicle, checking for cancellation
    /// between pairs
    pub fn rate(&self, sections: &[SectionDemand], ctx: &AnalysisContext) -> BridgeResult<RatingSummary> {
        let pairs: usize = sections.iter().map(|s| s.live.len()).sum();
        let mut summary = RatingSummary::default();
        let mut done = 0usize;

        for section in sections {
            for vehicle in &section.live {
                ctx.checkpoint("rating")?;
                for result in self.rate_pair(section, vehicle) {
                    if let Some(restriction) = &result.restriction {
                        summary.warnings.push(LimitWarning {
                            kind: LimitKind::RatingFactor,
                            stage: "rating".to_string(),
                            location: result.station,
                            vehicle: Some(result.vehicle.clone()),
                            value: result.operating,
                            limit: self.factors.restriction_threshold,
                        });
                        summary.restrictions.push(restriction.clone());
                    }
                    let lower = summary
                        .governing
                        .as_ref()
                        .map_or(true, |g| result.inventory < g.inventory);
                    if lower {
                        summary.governing = Some(result.clone());
                    }
                    summary.results.push(result);
                }
                done += 1;
                if pairs > 0 {
                    ctx.report("rating", 100.0 * done as f64 / pairs as f64, None);
                }
            }
        }

        if let Some(g) = &summary.governing {
            log::info!(
                "Governing rating: {} {} at x = {:.2}, inventory {:.3}, operating {:.3}",
                g.vehicle,
                g.effect,
                g.station,
                g.inventory,
                g.operating
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::CancellationToken;
    use crate::control::NullSink;
    use crate::error::BridgeError;
    use crate::influence::InfluenceQuantity;
    use crate::moving_load::{Placement, TravelDirection};
    use approx::assert_relative_eq;

    fn placement(amplified: f64) -> Placement {
        Placement {
            direction: TravelDirection::Forward,
            spacings: vec![],
            axle_positions: vec![40.0],
            axle_effect: amplified,
            lane_effect: 0.0,
            raw: amplified,
            amplified,
        }
    }

    fn extremes(quantity: InfluenceQuantity, max: f64, min: f64) -> MovingLoadResult {
        MovingLoadResult {
            vehicle: "V".to_string(),
            quantity,
            station: 40.0,
            maximum: placement(max),
            minimum: placement(min),
        }
    }

    fn section(live_moment: f64) -> SectionDemand {
        SectionDemand {
            station: 40.0,
            capacity: SectionCapacity {
                positive_moment: 4500.0,
                negative_moment: 0.0,
                shear: 400.0,
            },
            permanent: StationEffects {
                station: 40.0,
                dc_moment: 800.0,
                dw_moment: 150.0,
                dc_shear: 10.0,
                ..StationEffects::default()
            },
            live: vec![VehicleEffects {
                vehicle: "V".to_string(),
                weight: 72.0,
                moment: extremes(InfluenceQuantity::Moment, live_moment, 0.0),
                shear: extremes(InfluenceQuantity::Shear, 50.0, -20.0),
            }],
        }
    }

    #[test]
    fn test_inventory_rating_factor() {
        let engine = RatingEngine::default();
        let results = engine.rate_pair(&section(1500.0), &section(1500.0).live[0]);
        let moment = results.iter().find(|r| r.effect == ForceEffect::PositiveMoment).unwrap();
        assert_relative_eq!(moment.inventory, 3275.0 / 2625.0, epsilon = 1e-12);
        assert_relative_eq!(moment.operating, 3275.0 / (1.35 * 1500.0), epsilon = 1e-12);
        assert!(moment.restriction.is_none());
        // No negative reinforcement, no negative moment rating
        assert!(results.iter().all(|r| r.effect != ForceEffect::NegativeMoment));

        // Shear: positive sense carries the dead-load shear and governs
        let shear = results.iter().find(|r| r.effect == ForceEffect::Shear).unwrap();
        assert_relative_eq!(shear.inventory, (400.0 - 12.5) / (1.75 * 50.0), epsilon = 1e-12);
    }

    #[test]
    fn test_low_rating_restricts_and_round_trips() {
        let engine = RatingEngine::default();
        let ctx = AnalysisContext::detached();
        let summary = engine.rate(&[section(3000.0)], &ctx).unwrap();
        let governing = summary.governing.as_ref().unwrap();
        assert_eq!(governing.effect, ForceEffect::PositiveMoment);

        let restriction = governing.restriction.as_ref().unwrap();
        assert_relative_eq!(restriction.restricted_weight, governing.operating * 72.0);
        assert_eq!(&restriction.rederive(), restriction);
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].kind, LimitKind::RatingFactor);

        let again = engine.rate(&[section(3000.0)], &ctx).unwrap();
        assert_eq!(again, summary);
    }

    #[test]
    fn test_rating_observes_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = AnalysisContext::new(&NullSink, token);
        let err = RatingEngine::default().rate(&[section(1500.0)], &ctx).unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled { .. }));
    }
}
