//! Analysis request/result contract and execution tiers
//!
//! [`run_analysis`] is the single entry point used by both the embedded
//! bounded tier and the server workers. It reports progress through the
//! context's sink and always finishes with exactly one terminal event.

use serde::{Deserialize, Serialize};

use crate::analysis::SolverOptions;
use crate::builder::planned_element_count;
use crate::catalog::Catalog;
use crate::control::AnalysisContext;
use crate::error::{BridgeError, BridgeResult, ErrorKind, LimitWarning};
use crate::girder::{GirderDefinition, GirderSystem};
use crate::influence::{InfluenceGenerator, InfluenceLine, InfluenceOptions, InfluenceQuantity};
use crate::losses::LossMethod;
use crate::model::GirderLayout;
use crate::moving_load::{optimize, MovingLoadResult, OptimizerOptions};
use crate::rating::{ForceEffect, RatingEngine, RatingFactors, RatingSummary, SectionDemand, VehicleEffects};
use crate::stages::{standard_stages, ConstructionStage, StageHistory, StageManager, StressLimits};
use crate::vehicle::Vehicle;

/// Where an analysis may run. Ordered from least to most capable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTier {
    /// Inline, single-threaded, size-capped
    Bounded,
    /// Queued on a server worker
    #[default]
    Unbounded,
}

impl std::str::FromStr for ExecutionTier {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bounded" => Ok(ExecutionTier::Bounded),
            "unbounded" => Ok(ExecutionTier::Unbounded),
            other => Err(BridgeError::InvalidInput(format!("unknown execution tier '{other}'"))),
        }
    }
}

/// Size ceilings of the bounded tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierLimits {
    pub max_spans: usize,
    pub max_elements: usize,
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            max_spans: 3,
            max_elements: 400,
        }
    }
}

impl ExecutionTier {
    /// The least capable tier that can run `request`, judged on the number
    /// of elements the girder line will actually be built with
    pub fn select(request: &AnalysisRequest, limits: &TierLimits) -> BridgeResult<Self> {
        let spans = request.girder.spans.len();
        let elements = planned_element_count(spans, request.girder.elements_per_span)?;
        if spans <= limits.max_spans && elements <= limits.max_elements {
            Ok(ExecutionTier::Bounded)
        } else {
            Ok(ExecutionTier::Unbounded)
        }
    }

    /// The required tier, or `PlanLimit` when `allowed` is not enough
    pub fn check(request: &AnalysisRequest, limits: &TierLimits, allowed: ExecutionTier) -> BridgeResult<Self> {
        let required = Self::select(request, limits)?;
        if required > allowed {
            let spans = request.girder.spans.len();
            return Err(BridgeError::PlanLimit {
                requested: required,
                allowed,
                reason: format!(
                    "{} spans / {} elements exceed the bounded tier ({} spans / {} elements)",
                    spans,
                    planned_element_count(spans, request.girder.elements_per_span)?,
                    limits.max_spans,
                    limits.max_elements
                ),
            });
        }
        Ok(required)
    }
}

/// What to compute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    InfluenceLines,
    MovingLoad,
    TimeDependent,
    #[default]
    LoadRating,
}

impl AnalysisKind {
    fn needs_stages(self) -> bool {
        matches!(self, AnalysisKind::TimeDependent | AnalysisKind::LoadRating)
    }

    fn needs_influence(self) -> bool {
        !matches!(self, AnalysisKind::TimeDependent)
    }

    fn needs_vehicles(self) -> bool {
        matches!(self, AnalysisKind::MovingLoad | AnalysisKind::LoadRating)
    }
}

/// Numeric options for every phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub solver: SolverOptions,
    pub influence: InfluenceOptions,
    pub optimizer: OptimizerOptions,
    pub rating: RatingFactors,
    pub stress_limits: StressLimits,
    pub tier_limits: TierLimits,
}

/// One analysis as submitted by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub girder: GirderDefinition,
    #[serde(default)]
    pub kind: AnalysisKind,
    /// Vehicle identifiers to run and rate against
    #[serde(default)]
    pub vehicles: Vec<String>,
    /// Sections of interest (ft). Tenth points and interior supports when empty.
    #[serde(default)]
    pub stations: Vec<f64>,
    /// Influence quantities to report. Moment and shear when empty.
    #[serde(default)]
    pub quantities: Vec<InfluenceQuantity>,
    #[serde(default)]
    pub loss_method: LossMethod,
    /// Construction timeline; the standard four stages when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<ConstructionStage>>,
    /// Most capable tier the caller may use
    #[serde(default)]
    pub plan: ExecutionTier,
    #[serde(default)]
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    pub fn new(girder: GirderDefinition, kind: AnalysisKind) -> Self {
        Self {
            girder,
            kind,
            vehicles: Vec::new(),
            stations: Vec::new(),
            quantities: Vec::new(),
            loss_method: LossMethod::default(),
            stages: None,
            plan: ExecutionTier::default(),
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_vehicles(mut self, ids: &[&str]) -> Self {
        self.vehicles = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_stations(mut self, stations: &[f64]) -> Self {
        self.stations = stations.to_vec();
        self
    }

    pub fn with_plan(mut self, plan: ExecutionTier) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_loss_method(mut self, method: LossMethod) -> Self {
        self.loss_method = method;
        self
    }

    /// Parse a request from JSON
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn quantities(&self) -> Vec<InfluenceQuantity> {
        if self.quantities.is_empty() {
            vec![InfluenceQuantity::Moment, InfluenceQuantity::Shear]
        } else {
            self.quantities.clone()
        }
    }
}

/// Lifecycle of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisStatus::Completed | AnalysisStatus::Failed | AnalysisStatus::Cancelled
        )
    }
}

/// Machine-readable headline results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_station: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_vehicle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_effect: Option<ForceEffect>,
    /// Lowest inventory rating factor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating_factor: Option<f64>,
    /// Operating rating factor of the governing result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_rating_factor: Option<f64>,
    /// Largest live-load sagging moment (kip-ft)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_positive_moment: Option<f64>,
    /// Largest live-load hogging moment (kip-ft, negative)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_negative_moment: Option<f64>,
    /// Largest live-load shear magnitude (kip)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_shear: Option<f64>,
    /// Largest influence ordinate magnitude over all lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ordinate: Option<f64>,
    /// Total prestress loss at the last stage (ksi)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_loss: Option<f64>,
    pub restricted: bool,
    pub failed_stages: usize,
    pub warning_count: usize,
}

/// A section whose influence line could not be computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionFailure {
    pub station: f64,
    pub error: String,
}

/// Full numeric payload, fetched lazily by callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<StageHistory>,
    pub influence_lines: Vec<InfluenceLine>,
    pub moving_loads: Vec<MovingLoadResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<RatingSummary>,
    pub section_failures: Vec<SectionFailure>,
    pub warnings: Vec<LimitWarning>,
}

/// Error reported in a failed or cancelled result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&BridgeError> for AnalysisFailure {
    fn from(err: &BridgeError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<ExecutionTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AnalysisSummary>,
    /// Location of the detailed payload once it has been stored apart
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailedResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisFailure>,
}

impl AnalysisResult {
    pub fn pending() -> Self {
        Self {
            status: AnalysisStatus::Pending,
            tier: None,
            summary: None,
            detail_ref: None,
            detail: None,
            error: None,
        }
    }

    fn failed(err: &BridgeError, tier: Option<ExecutionTier>) -> Self {
        let status = match err {
            BridgeError::Cancelled { .. } => AnalysisStatus::Cancelled,
            _ => AnalysisStatus::Failed,
        };
        Self {
            status,
            tier,
            error: Some(AnalysisFailure::from(err)),
            ..Self::pending()
        }
    }

    /// Move the detailed payload out, leaving `detail_ref` in its place
    pub fn detach_detail(&mut self, reference: &str) -> Option<DetailedResult> {
        let detail = self.detail.take();
        if detail.is_some() {
            self.detail_ref = Some(reference.to_string());
        }
        detail
    }
}

/// Default sections: tenth points of every span plus interior supports
pub fn default_stations(layout: &GirderLayout) -> Vec<f64> {
    let supports: Vec<f64> = layout.supports.iter().map(|&k| layout.stations[k]).collect();
    let mut stations = Vec::new();
    for (s, w) in supports.windows(2).enumerate() {
        if s > 0 {
            stations.push(w[0]);
        }
        stations.extend((1..10).map(|i| w[0] + (w[1] - w[0]) * i as f64 / 10.0));
    }
    stations
}

/// Run one analysis. Never panics on bad input; every outcome, including
/// cancellation and plan limits, is reported in the returned result and by
/// one terminal progress event.
pub fn run_analysis(request: &AnalysisRequest, catalog: &Catalog, ctx: &AnalysisContext) -> AnalysisResult {
    let tier = match ExecutionTier::check(request, &request.options.tier_limits, request.plan) {
        Ok(tier) => tier,
        Err(err) => {
            log::warn!("Analysis rejected: {err}");
            ctx.finish("failed", Some(err.to_string()));
            return AnalysisResult::failed(&err, None);
        }
    };

    match execute(request, catalog, ctx) {
        Ok((summary, detail)) => {
            ctx.finish("completed", None);
            AnalysisResult {
                status: AnalysisStatus::Completed,
                tier: Some(tier),
                summary: Some(summary),
                detail: Some(detail),
                ..AnalysisResult::pending()
            }
        }
        Err(err) => {
            let phase = match err {
                BridgeError::Cancelled { .. } => "cancelled",
                _ => "failed",
            };
            log::warn!("Analysis {phase}: {err}");
            ctx.finish(phase, Some(err.to_string()));
            AnalysisResult::failed(&err, Some(tier))
        }
    }
}

/// Run inline in the bounded tier, whatever plan the request names
pub fn run_bounded(request: &AnalysisRequest, catalog: &Catalog, ctx: &AnalysisContext) -> AnalysisResult {
    let bounded = AnalysisRequest {
        plan: ExecutionTier::Bounded,
        ..request.clone()
    };
    run_analysis(&bounded, catalog, ctx)
}

fn execute(
    request: &AnalysisRequest,
    catalog: &Catalog,
    ctx: &AnalysisContext,
) -> BridgeResult<(AnalysisSummary, DetailedResult)> {
    let options = &request.options;

    // validate
    ctx.report("validate", 0.0, None);
    let shape = catalog.shape(&request.girder.shape)?.clone();
    let vehicles: Vec<&Vehicle> = if request.kind.needs_vehicles() {
        if request.vehicles.is_empty() {
            return Err(BridgeError::InvalidInput("no vehicles selected".into()));
        }
        catalog.vehicles(&request.vehicles)?
    } else {
        Vec::new()
    };
    let system = GirderSystem::new(request.girder.clone(), shape)?;
    let composite = system.composite_model()?;
    composite.validate()?;
    let layout = composite.layout()?;
    let stations = if request.stations.is_empty() {
        default_stations(&layout)
    } else {
        let (a, b) = layout.extent();
        if let Some(x) = request.stations.iter().find(|&&x| x < a || x > b) {
            return Err(BridgeError::InvalidInput(format!(
                "station {x} lies outside the girder line [{a}, {b}]"
            )));
        }
        request.stations.clone()
    };
    log::info!(
        "Analysis {:?}: {} spans, {} elements, {} sections, {} vehicles",
        request.kind,
        request.girder.spans.len(),
        system.element_count(),
        stations.len(),
        vehicles.len()
    );
    ctx.report("validate", 100.0, None);

    let mut detail = DetailedResult::default();

    if request.kind.needs_stages() {
        ctx.checkpoint("stages")?;
        let stages = request.stages.clone().unwrap_or_else(standard_stages);
        let history = StageManager::new(&system)
            .with_stages(stages)
            .with_loss_method(request.loss_method)
            .with_limits(options.stress_limits)
            .with_solver_options(options.solver)
            .run(ctx)?;
        detail.warnings.extend(history.warnings().cloned());
        detail.stages = Some(history);
    }

    // Lines needed per section: the requested quantities, plus moment and
    // shear for moving loads and rating
    let mut quantities = request.quantities();
    if request.kind.needs_vehicles() {
        for q in [InfluenceQuantity::Moment, InfluenceQuantity::Shear] {
            if !quantities.contains(&q) {
                quantities.push(q);
            }
        }
    }

    if request.kind.needs_influence() {
        ctx.checkpoint("influence")?;
        let generator = InfluenceGenerator::new(&composite, &options.solver, options.influence)
            .map_err(|e| e.in_context("influence lines"))?;
        let total = stations.len() * quantities.len();
        for (i, &station) in stations.iter().enumerate() {
            ctx.checkpoint("influence")?;
            for &quantity in &quantities {
                if quantity == InfluenceQuantity::Reaction && !layout.supports.contains(&layout.nearest_node(station)) {
                    continue;
                }
                match generator.generate(quantity, station) {
                    Ok(line) => detail.influence_lines.push(line),
                    Err(err @ BridgeError::Singularity { .. }) => {
                        let err = err.in_context(&format!("section x = {station}"));
                        log::warn!("{err}");
                        detail.section_failures.push(SectionFailure {
                            station,
                            error: err.to_string(),
                        });
                    }
                    Err(err) => return Err(err.in_context(&format!("section x = {station}"))),
                }
            }
            ctx.report(
                "influence",
                100.0 * ((i + 1) * quantities.len()) as f64 / total.max(1) as f64,
                None,
            );
        }
    }

    if request.kind.needs_vehicles() {
        let lines: Vec<&InfluenceLine> = detail
            .influence_lines
            .iter()
            .filter(|l| matches!(l.quantity, InfluenceQuantity::Moment | InfluenceQuantity::Shear))
            .collect();
        let total = lines.len() * vehicles.len();
        let mut done = 0usize;
        let mut results = Vec::with_capacity(total);
        for line in lines {
            for vehicle in &vehicles {
                ctx.checkpoint("moving-load")?;
                let result = optimize(line, vehicle, &options.optimizer)
                    .map_err(|e| e.in_context(&format!("vehicle '{}' at x = {}", vehicle.id, line.station)))?;
                results.push(result);
                done += 1;
                ctx.report("moving-load", 100.0 * done as f64 / total.max(1) as f64, None);
            }
        }
        detail.moving_loads = results;
    }

    if request.kind == AnalysisKind::LoadRating {
        ctx.checkpoint("rating")?;
        let effects = detail
            .stages
            .as_ref()
            .and_then(|h| h.final_effects())
            .map(|e| e.to_vec())
            .unwrap_or_default();
        let sections = rating_sections(&system, &layout, &stations, &effects, &vehicles, &detail.moving_loads);
        let summary = RatingEngine::new(options.rating).rate(&sections, ctx)?;
        detail.warnings.extend(summary.warnings.iter().cloned());
        detail.rating = Some(summary);
    }

    let summary = summarize(&detail);
    Ok((summary, detail))
}

/// Pair each section's capacity and permanent effects with the live-load
/// extremes of every vehicle
fn rating_sections(
    system: &GirderSystem,
    layout: &GirderLayout,
    stations: &[f64],
    effects: &[crate::stages::StationEffects],
    vehicles: &[&Vehicle],
    moving: &[MovingLoadResult],
) -> Vec<SectionDemand> {
    let find = |quantity: InfluenceQuantity, station: f64, vehicle: &str| {
        moving
            .iter()
            .find(|m| m.quantity == quantity && m.vehicle == vehicle && (m.station - station).abs() < 1e-9)
            .cloned()
    };

    let mut sections = Vec::new();
    for &requested in stations {
        let k = layout.nearest_node(requested);
        let station = layout.stations[k];
        if sections.iter().any(|s: &SectionDemand| (s.station - station).abs() < 1e-9) {
            continue;
        }
        let live = vehicles
            .iter()
            .filter_map(|v| {
                Some(VehicleEffects {
                    vehicle: v.id.clone(),
                    weight: v.weight(),
                    moment: find(InfluenceQuantity::Moment, station, &v.id)?,
                    shear: find(InfluenceQuantity::Shear, station, &v.id)?,
                })
            })
            .collect();
        sections.push(SectionDemand {
            station,
            capacity: system.capacity_at(layout, station),
            permanent: effects.get(k).copied().unwrap_or_default(),
            live,
        });
    }
    sections
}

fn max_by_abs(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |best: Option<f64>, v| match best {
        Some(b) if b.abs() >= v.abs() => Some(b),
        _ => Some(v),
    })
}

fn summarize(detail: &DetailedResult) -> AnalysisSummary {
    let moments = || {
        detail
            .moving_loads
            .iter()
            .filter(|m| m.quantity == InfluenceQuantity::Moment)
    };
    let positive = moments().map(|m| m.maximum.amplified).fold(None, |b: Option<f64>, v| {
        Some(b.map_or(v, |b| b.max(v)))
    });
    let negative = moments().map(|m| m.minimum.amplified).fold(None, |b: Option<f64>, v| {
        Some(b.map_or(v, |b| b.min(v)))
    });
    let shear = max_by_abs(
        detail
            .moving_loads
            .iter()
            .filter(|m| m.quantity == InfluenceQuantity::Shear)
            .map(|m| m.governing().amplified),
    )
    .map(f64::abs);
    let max_ordinate = max_by_abs(detail.influence_lines.iter().map(|l| l.peak().1));

    let governing = detail.rating.as_ref().and_then(|r| r.governing.as_ref());
    let stages = detail.stages.as_ref();

    AnalysisSummary {
        critical_station: governing.map(|g| g.station),
        critical_vehicle: governing.map(|g| g.vehicle.clone()),
        critical_effect: governing.map(|g| g.effect),
        min_rating_factor: governing.map(|g| g.inventory),
        operating_rating_factor: governing.map(|g| g.operating),
        max_positive_moment: positive.filter(|&m| m > 0.0),
        max_negative_moment: negative.filter(|&m| m < 0.0),
        max_shear: shear,
        max_ordinate,
        final_loss: stages.and_then(|h| h.stages.last()).map(|s| s.losses.total),
        restricted: detail.rating.as_ref().is_some_and(|r| !r.restrictions.is_empty()),
        failed_stages: stages.map_or(0, |h| h.stages.iter().filter(|s| !s.is_completed()).count()),
        warning_count: detail.warnings.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{CancellationToken, ProgressEvent};
    use std::sync::Mutex;

    fn request(spans: &[f64], kind: AnalysisKind) -> AnalysisRequest {
        AnalysisRequest::new(
            GirderDefinition {
                spans: spans.to_vec(),
                elements_per_span: 10,
                ..GirderDefinition::default()
            },
            kind,
        )
    }

    #[test]
    fn test_tier_selection_and_plan_limit() {
        let limits = TierLimits::default();
        assert_eq!(
            ExecutionTier::select(&request(&[80.0, 80.0], AnalysisKind::LoadRating), &limits).unwrap(),
            ExecutionTier::Bounded
        );
        let long = request(&[80.0; 4], AnalysisKind::LoadRating);
        assert_eq!(ExecutionTier::select(&long, &limits).unwrap(), ExecutionTier::Unbounded);

        let err = ExecutionTier::check(&long, &limits, ExecutionTier::Bounded).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::PlanLimit { requested: ExecutionTier::Unbounded, allowed: ExecutionTier::Bounded, .. }
        ));
        assert_eq!("Bounded".parse::<ExecutionTier>().unwrap(), ExecutionTier::Bounded);
    }

    #[test]
    fn test_element_ceiling_uses_built_count() {
        let limits = TierLimits::default();
        // 133 rounds up to 134 per span: 402 elements, over the 400 ceiling
        let mut odd = request(&[60.0, 60.0, 60.0], AnalysisKind::LoadRating);
        odd.girder.elements_per_span = 133;
        assert_eq!(ExecutionTier::select(&odd, &limits).unwrap(), ExecutionTier::Unbounded);
        assert!(matches!(
            ExecutionTier::check(&odd, &limits, ExecutionTier::Bounded),
            Err(BridgeError::PlanLimit { .. })
        ));

        let mut huge = odd.clone();
        huge.girder.elements_per_span = usize::MAX;
        let err = ExecutionTier::check(&huge, &limits, ExecutionTier::Unbounded).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let result = run_analysis(&huge, &Catalog::standard(), &AnalysisContext::detached());
        assert_eq!(result.status, AnalysisStatus::Failed);
    }

    #[test]
    fn test_plan_limit_rejected_before_work() {
        let events = Mutex::new(Vec::new());
        let sink = |e: ProgressEvent| events.lock().unwrap().push(e);
        let ctx = AnalysisContext::new(&sink, CancellationToken::new());
        let long = request(&[80.0; 4], AnalysisKind::LoadRating).with_vehicles(&["HL93"]);
        let result = run_bounded(&long, &Catalog::standard(), &ctx);

        assert_eq!(result.status, AnalysisStatus::Failed);
        assert_eq!(result.error.as_ref().map(|e| e.kind), Some(ErrorKind::PlanLimit));
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].terminal);
    }

    #[test]
    fn test_influence_only_analysis() {
        let ctx = AnalysisContext::detached();
        let req = request(&[60.0], AnalysisKind::InfluenceLines).with_stations(&[30.0]);
        let result = run_analysis(&req, &Catalog::standard(), &ctx);
        assert_eq!(result.status, AnalysisStatus::Completed);
        let detail = result.detail.unwrap();
        assert_eq!(detail.influence_lines.len(), 2);
        assert!(detail.stages.is_none());
        let summary = result.summary.unwrap();
        // Moment line at mid-span of a 60 ft span peaks at L/4
        assert!((summary.max_ordinate.unwrap() - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_unknown_vehicle_fails() {
        let ctx = AnalysisContext::detached();
        let req = request(&[60.0], AnalysisKind::MovingLoad).with_vehicles(&["HS99"]);
        let result = run_analysis(&req, &Catalog::standard(), &ctx);
        assert_eq!(result.status, AnalysisStatus::Failed);
        assert_eq!(result.error.unwrap().kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_default_stations() {
        let req = request(&[50.0, 50.0], AnalysisKind::LoadRating);
        let system = GirderSystem::new(req.girder.clone(), Catalog::standard().shape("AASHTO-IV").unwrap().clone()).unwrap();
        let layout = system.composite_model().unwrap().layout().unwrap();
        let stations = default_stations(&layout);
        assert_eq!(stations.len(), 19);
        assert!(stations.contains(&50.0));
        assert!((stations[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_detach_detail() {
        let mut result = AnalysisResult {
            status: AnalysisStatus::Completed,
            detail: Some(DetailedResult::default()),
            ..AnalysisResult::pending()
        };
        assert!(result.detach_detail("/detail").is_some());
        assert!(result.detail.is_none());
        assert_eq!(result.detail_ref.as_deref(), Some("/detail"));
    }
}
