//! Construction stage sequencing
//!
//! Stages run in a fixed order over the same girder geometry. Each stage adds
//! only its own load increments (self-weight, deck, superimposed dead load and
//! the change in prestress since the last completed stage), solves them on
//! the section that carries them at that time, and adds the resulting forces
//! and fibre stresses to the running totals. Losses are computed once per
//! stage age and only ever grow.
//!
//! A singular stage is reported as failed and its increments move on to the
//! next stage that solves.

use serde::{Deserialize, Serialize};

use crate::analysis::{LinearSystem, SolverOptions};
use crate::control::AnalysisContext;
use crate::error::{BridgeError, BridgeResult, LimitKind, LimitWarning};
use crate::girder::GirderSystem;
use crate::loads::{DistributedLoad, LoadSet};
use crate::losses::{Environment, LossBreakdown, LossMethod};
use crate::model::{BridgeModel, GirderLayout};
use crate::results::Solution;
use crate::units::IN_PER_FT;

/// Loss above this fraction of the jacking stress is flagged
const LOSS_WARNING_RATIO: f64 = 0.4;

/// The four construction stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Prestress and girder self-weight on the bare girder
    Transfer,
    /// Wet deck and haunch on the bare girder
    DeckPlacement,
    /// Barrier and overlay on the composite section
    Composite,
    /// Long-term losses on the composite section
    Service,
}

impl StageKind {
    pub fn is_composite(&self) -> bool {
        matches!(self, StageKind::Composite | StageKind::Service)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageKind::Transfer => "transfer",
            StageKind::DeckPlacement => "deck-placement",
            StageKind::Composite => "composite",
            StageKind::Service => "service",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A point on the construction timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstructionStage {
    pub kind: StageKind,
    /// Girder concrete age (days)
    pub age: f64,
    /// Ambient conditions; the girder definition's when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
}

impl ConstructionStage {
    pub fn new(kind: StageKind, age: f64) -> Self {
        Self {
            kind,
            age,
            environment: None,
        }
    }
}

/// Transfer at 1 day, deck at 60, composite at 90, service at 10 000 days
pub fn standard_stages() -> Vec<ConstructionStage> {
    vec![
        ConstructionStage::new(StageKind::Transfer, 1.0),
        ConstructionStage::new(StageKind::DeckPlacement, 60.0),
        ConstructionStage::new(StageKind::Composite, 90.0),
        ConstructionStage::new(StageKind::Service, 10_000.0),
    ]
}

/// Allowable concrete stresses (ksi, magnitudes). Unset limits derive from
/// the concrete strengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressLimits {
    pub transfer_compression: Option<f64>,
    pub transfer_tension: Option<f64>,
    pub service_compression: Option<f64>,
    pub service_tension: Option<f64>,
    pub deck_compression: Option<f64>,
}

impl StressLimits {
    /// (compression, tension) allowables for the girder in a stage
    pub fn girder(&self, kind: StageKind, fc: f64, fci: f64) -> (f64, f64) {
        match kind {
            StageKind::Transfer => (
                self.transfer_compression.unwrap_or(0.65 * fci),
                self.transfer_tension
                    .unwrap_or_else(|| (0.0948 * fci.sqrt()).min(0.2)),
            ),
            _ => (
                self.service_compression.unwrap_or(0.45 * fc),
                self.service_tension.unwrap_or_else(|| 0.19 * fc.sqrt()),
            ),
        }
    }

    /// Compression allowable for the deck
    pub fn deck(&self, fc_deck: f64) -> f64 {
        self.deck_compression.unwrap_or(0.45 * fc_deck)
    }
}

/// Cumulative response at one node, stresses in ksi (tension positive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStress {
    pub station: f64,
    pub node: String,
    /// Total moment (kip-ft)
    pub moment: f64,
    /// Total shear (kip)
    pub shear: f64,
    /// Total axial force (kip), tension positive
    pub axial: f64,
    pub girder_bottom: f64,
    pub girder_top: f64,
    /// Deck top stress once the deck acts compositely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_top: Option<f64>,
    /// Concrete stress at the strand centroid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strand: Option<f64>,
    /// Vertical deflection (in), upward positive
    pub deflection: f64,
}

/// Cumulative permanent-load effects at one node, by load category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StationEffects {
    pub station: f64,
    pub dc_moment: f64,
    pub dc_shear: f64,
    pub dw_moment: f64,
    pub dw_shear: f64,
    pub ps_moment: f64,
    pub ps_shear: f64,
}

/// Whether a stage produced results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Completed,
    Failed { error: String },
}

/// Results of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub kind: StageKind,
    pub age: f64,
    pub outcome: StageOutcome,
    pub losses: LossBreakdown,
    /// Effective strand stress (ksi)
    pub effective_stress: f64,
    /// Cumulative stresses; empty when the stage failed
    pub stations: Vec<StationStress>,
    /// Cumulative effects by category; empty when the stage failed
    pub effects: Vec<StationEffects>,
    pub warnings: Vec<LimitWarning>,
}

impl StageResult {
    pub fn is_completed(&self) -> bool {
        self.outcome == StageOutcome::Completed
    }
}

/// All stages of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageHistory {
    pub loss_method: LossMethod,
    /// Station where losses were evaluated
    pub loss_station: f64,
    pub stages: Vec<StageResult>,
}

impl StageHistory {
    /// Every warning from every stage
    pub fn warnings(&self) -> impl Iterator<Item = &LimitWarning> {
        self.stages.iter().flat_map(|s| s.warnings.iter())
    }

    /// Permanent effects after the last completed stage
    pub fn final_effects(&self) -> Option<&[StationEffects]> {
        self.stages
            .iter()
            .rev()
            .find(|s| s.is_completed())
            .map(|s| s.effects.as_slice())
    }

    /// Loss breakdown of each stage, in order
    pub fn losses(&self) -> Vec<LossBreakdown> {
        self.stages.iter().map(|s| s.losses).collect()
    }
}

/// Running totals carried from stage to stage
#[derive(Debug, Clone)]
struct Totals {
    stresses: Vec<StationStress>,
    effects: Vec<StationEffects>,
}

/// Section properties (inches) a stage's increments act on
struct StageSection {
    area: f64,
    inertia: f64,
    y_bottom: f64,
    y_top_girder: f64,
    /// Modular ratio and distance to deck top, for composite sections
    deck: Option<(f64, f64)>,
}

/// Sequences the construction stages of one girder
pub struct StageManager<'a> {
    system: &'a GirderSystem,
    stages: Vec<ConstructionStage>,
    method: LossMethod,
    limits: StressLimits,
    options: SolverOptions,
}

impl<'a> StageManager<'a> {
    pub fn new(system: &'a GirderSystem) -> Self {
        Self {
            system,
            stages: standard_stages(),
            method: LossMethod::default(),
            limits: StressLimits::default(),
            options: SolverOptions::default(),
        }
    }

    pub fn with_stages(mut self, stages: Vec<ConstructionStage>) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_loss_method(mut self, method: LossMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_limits(mut self, limits: StressLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_solver_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    fn check_order(&self) -> BridgeResult<()> {
        if self.stages.is_empty() {
            return Err(BridgeError::InvalidInput("no construction stages given".into()));
        }
        for w in self.stages.windows(2) {
            if w[1].kind <= w[0].kind || w[1].age <= w[0].age {
                return Err(BridgeError::InvalidInput(format!(
                    "stage '{}' at {} days cannot follow '{}' at {} days",
                    w[1].kind, w[1].age, w[0].kind, w[0].age
                )));
            }
        }
        Ok(())
    }

    fn age_of(&self, kind: StageKind) -> Option<f64> {
        self.stages.iter().find(|s| s.kind == kind).map(|s| s.age)
    }

    /// Cumulative losses at each stage, non-decreasing along the sequence
    pub fn stage_losses(&self) -> BridgeResult<Vec<LossBreakdown>> {
        self.check_order()?;
        let env = self.system.definition.environment;
        let transfer_age = self.age_of(StageKind::Transfer).unwrap_or(self.stages[0].age);
        let deck_age = self
            .age_of(StageKind::DeckPlacement)
            .or_else(|| self.age_of(StageKind::Composite))
            .unwrap_or(f64::INFINITY);

        let Some(input) = self.system.loss_input(&env, transfer_age, deck_age) else {
            return Ok(self
                .stages
                .iter()
                .map(|s| LossBreakdown {
                    age: s.age,
                    ..LossBreakdown::default()
                })
                .collect());
        };

        let engine = self.method.engine();
        let mut losses: Vec<LossBreakdown> = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let stage_input = input.with_environment(&stage.environment.unwrap_or(env));
            let mut loss = engine.at(&stage_input, stage.age)?;
            if let Some(prev) = losses.last() {
                loss = loss.at_least(prev);
            }
            losses.push(loss);
        }
        Ok(losses)
    }

    fn model_for(&self, kind: StageKind) -> BridgeResult<BridgeModel> {
        match kind {
            StageKind::Transfer => self.system.transfer_model(),
            StageKind::DeckPlacement => self.system.non_composite_model(),
            StageKind::Composite | StageKind::Service => self.system.composite_model(),
        }
    }

    fn section_for(&self, kind: StageKind) -> StageSection {
        let shape = &self.system.shape;
        if kind.is_composite() {
            let c = &self.system.composite;
            StageSection {
                area: c.area,
                inertia: c.inertia,
                y_bottom: c.y_bottom,
                y_top_girder: c.y_top_girder(),
                deck: Some((c.modular_ratio, c.y_top_deck())),
            }
        } else {
            StageSection {
                area: shape.area,
                inertia: shape.inertia,
                y_bottom: shape.y_bottom,
                y_top_girder: shape.y_top(),
                deck: None,
            }
        }
    }

    fn uniform(name: &str, layout: &GirderLayout, w: f64) -> LoadSet {
        let mut loads = LoadSet::new(name);
        if w != 0.0 {
            for member in &layout.members {
                loads.add_member_load(member, DistributedLoad::uniform_downward(w));
            }
        }
        loads
    }

    /// Run every stage
    pub fn run(&self, ctx: &AnalysisContext) -> BridgeResult<StageHistory> {
        let losses = self.stage_losses()?;
        let layout = self.system.non_composite_model()?.layout()?;
        let definition = &self.system.definition;
        let (fc, fci) = self.system.concrete_strengths();
        let jacking = definition
            .prestress
            .as_ref()
            .map(|ps| ps.jacking_stress)
            .unwrap_or(0.0);
        let loss_station = layout.stations[layout.supports[0]]
            + self.longest_span_midpoint(&layout);

        let mut totals = Totals {
            stresses: layout
                .nodes
                .iter()
                .zip(&layout.stations)
                .map(|(node, &station)| StationStress {
                    station,
                    node: node.clone(),
                    moment: 0.0,
                    shear: 0.0,
                    axial: 0.0,
                    girder_bottom: 0.0,
                    girder_top: 0.0,
                    deck_top: None,
                    strand: None,
                    deflection: 0.0,
                })
                .collect(),
            effects: layout
                .stations
                .iter()
                .map(|&station| StationEffects {
                    station,
                    ..StationEffects::default()
                })
                .collect(),
        };

        // Loads and loss not yet carried by a completed stage
        let mut pending_dc = 0.0;
        let mut pending_dw = 0.0;
        let mut applied_stress = 0.0;

        let mut results = Vec::with_capacity(self.stages.len());
        for (k, (stage, loss)) in self.stages.iter().zip(&losses).enumerate() {
            ctx.checkpoint("stages")?;
            ctx.report(
                "stages",
                100.0 * k as f64 / self.stages.len() as f64,
                Some(format!("{} at {} days", stage.kind, stage.age)),
            );

            match stage.kind {
                StageKind::Transfer => pending_dc += self.system.girder_weight(),
                StageKind::DeckPlacement => pending_dc += self.system.deck_weight(),
                StageKind::Composite => {
                    pending_dc += definition.barrier;
                    pending_dw += definition.overlay;
                }
                StageKind::Service => {}
            }
            let target_stress = if jacking > 0.0 { jacking - loss.total } else { 0.0 };
            let ps_increment = target_stress - applied_stress;

            let section = self.section_for(stage.kind);
            let solved = self
                .solve_increment(stage.kind, &layout, pending_dc, pending_dw, ps_increment, &section)
                .map_err(|e| e.in_context(&format!("stage '{}'", stage.kind)));

            let mut result = StageResult {
                kind: stage.kind,
                age: stage.age,
                outcome: StageOutcome::Completed,
                losses: *loss,
                effective_stress: target_stress,
                stations: Vec::new(),
                effects: Vec::new(),
                warnings: Vec::new(),
            };

            match solved {
                Ok(increment) => {
                    self.accumulate(&mut totals, &layout, &increment, &section)?;
                    pending_dc = 0.0;
                    pending_dw = 0.0;
                    applied_stress = target_stress;

                    result.stations = totals.stresses.clone();
                    result.effects = totals.effects.clone();
                    result.warnings = self.check_limits(stage.kind, &totals.stresses, fc, fci);
                    log::info!(
                        "Stage {} completed: loss {:.2} ksi, {} warnings",
                        stage.kind,
                        loss.total,
                        result.warnings.len()
                    );
                }
                Err(err @ BridgeError::Singularity { .. }) => {
                    log::warn!("Stage {} failed: {}", stage.kind, err);
                    result.outcome = StageOutcome::Failed {
                        error: err.to_string(),
                    };
                }
                Err(err) => return Err(err),
            }

            if jacking > 0.0 && loss.total > LOSS_WARNING_RATIO * jacking {
                result.warnings.push(LimitWarning {
                    kind: LimitKind::PrestressLoss,
                    stage: stage.kind.to_string(),
                    location: loss_station,
                    vehicle: None,
                    value: loss.total,
                    limit: LOSS_WARNING_RATIO * jacking,
                });
            }
            results.push(result);
        }

        ctx.report("stages", 100.0, None);
        Ok(StageHistory {
            loss_method: self.method,
            loss_station,
            stages: results,
        })
    }

    fn longest_span_midpoint(&self, layout: &GirderLayout) -> f64 {
        let spans = layout.spans();
        let (idx, _) = spans
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &l)| if l > best.1 { (i, l) } else { best });
        spans[..idx].iter().sum::<f64>() + spans.get(idx).copied().unwrap_or(0.0) / 2.0
    }

    fn solve_increment(
        &self,
        kind: StageKind,
        layout: &GirderLayout,
        dc: f64,
        dw: f64,
        ps_stress: f64,
        section: &StageSection,
    ) -> BridgeResult<[Option<Solution>; 3]> {
        let dc_loads = Self::uniform("DC", layout, dc);
        let dw_loads = Self::uniform("DW", layout, dw);
        let ps_loads = match &self.system.definition.prestress {
            Some(ps) if ps_stress != 0.0 => {
                ps.equivalent_loads(layout, ps_stress, section.y_bottom, "PS")?
            }
            _ => LoadSet::new("PS"),
        };
        if dc_loads.is_empty() && dw_loads.is_empty() && ps_loads.is_empty() {
            return Ok([None, None, None]);
        }

        let system = LinearSystem::assemble(&self.model_for(kind)?, &self.options)?;
        let solve = |loads: &LoadSet| -> BridgeResult<Option<Solution>> {
            if loads.is_empty() {
                Ok(None)
            } else {
                system.solve(loads).map(Some)
            }
        };
        Ok([solve(&dc_loads)?, solve(&dw_loads)?, solve(&ps_loads)?])
    }

    fn accumulate(
        &self,
        totals: &mut Totals,
        layout: &GirderLayout,
        increment: &[Option<Solution>; 3],
        section: &StageSection,
    ) -> BridgeResult<()> {
        let prestress = self.system.definition.prestress.as_ref();
        for k in 0..layout.nodes.len() {
            let mut parts = [(0.0, 0.0); 3];
            let (mut axial, mut dy) = (0.0, 0.0);
            for (part, solution) in parts.iter_mut().zip(increment) {
                if let Some(s) = solution {
                    *part = (s.girder_moment(layout, k)?, s.girder_shear(layout, k)?);
                    axial += s.girder_axial(layout, k)?;
                    dy += s.node_displacement(&layout.nodes[k])?.dy;
                }
            }
            let moment: f64 = parts.iter().map(|p| p.0).sum();
            let shear: f64 = parts.iter().map(|p| p.1).sum();

            let effects = &mut totals.effects[k];
            effects.dc_moment += parts[0].0;
            effects.dc_shear += parts[0].1;
            effects.dw_moment += parts[1].0;
            effects.dw_shear += parts[1].1;
            effects.ps_moment += parts[2].0;
            effects.ps_shear += parts[2].1;

            // ksi from kip and kip-ft
            let axial_stress = axial / section.area;
            let bending = |y: f64| moment * IN_PER_FT * y / section.inertia;

            let row = &mut totals.stresses[k];
            row.moment += moment;
            row.shear += shear;
            row.axial += axial;
            row.deflection += dy * IN_PER_FT;
            row.girder_bottom += axial_stress + bending(section.y_bottom);
            row.girder_top += axial_stress - bending(section.y_top_girder);
            if let Some((n, y_deck)) = section.deck {
                let deck = row.deck_top.get_or_insert(0.0);
                *deck += n * (axial_stress - bending(y_deck));
            }
            if let Some(ps) = prestress.filter(|ps| ps.strand_count() > 0) {
                let distance = self.system.distance_from_girder_end(layout, row.station);
                let y = section.y_bottom - ps.effective_centroid_height(distance);
                let strand = row.strand.get_or_insert(0.0);
                *strand += axial_stress + bending(y);
            }
        }
        Ok(())
    }

    fn check_limits(&self, kind: StageKind, rows: &[StationStress], fc: f64, fci: f64) -> Vec<LimitWarning> {
        let (compression, tension) = self.limits.girder(kind, fc, fci);
        let deck_limit = self.limits.deck(self.system.definition.deck.fc);
        let warning = |limit_kind: LimitKind, location: f64, value: f64, limit: f64| LimitWarning {
            kind: limit_kind,
            stage: kind.to_string(),
            location,
            vehicle: None,
            value,
            limit,
        };

        let mut warnings = Vec::new();
        for row in rows {
            for value in [row.girder_bottom, row.girder_top] {
                if value > tension {
                    warnings.push(warning(LimitKind::TensileStress, row.station, value, tension));
                } else if value < -compression {
                    warnings.push(warning(LimitKind::CompressiveStress, row.station, value, -compression));
                }
            }
            if let Some(deck) = row.deck_top.filter(|&d| d < -deck_limit) {
                warnings.push(warning(LimitKind::CompressiveStress, row.station, deck, -deck_limit));
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::girder::{standard_shapes, GirderDefinition, PrestressLayout};
    use approx::assert_relative_eq;

    fn system(spans: &[f64], prestress: bool) -> GirderSystem {
        let shape = standard_shapes().into_iter().find(|s| s.id == "AASHTO-IV").unwrap();
        let definition = GirderDefinition {
            spans: spans.to_vec(),
            prestress: prestress
                .then(|| PrestressLayout::from_rows(&[(12, 2.0), (12, 4.0), (6, 6.0)])),
            barrier: 0.3,
            overlay: 0.2,
            ..GirderDefinition::default()
        };
        GirderSystem::new(definition, shape).unwrap()
    }

    #[test]
    fn test_self_weight_moment_at_transfer() {
        let sys = system(&[60.0], false);
        let history = StageManager::new(&sys).run(&AnalysisContext::detached()).unwrap();
        let transfer = &history.stages[0];
        assert!(transfer.is_completed());

        let mid = &transfer.stations[10];
        assert_relative_eq!(mid.station, 30.0);
        let w = sys.girder_weight();
        assert_relative_eq!(mid.moment, w * 60.0 * 60.0 / 8.0, max_relative = 1e-6);
        assert!(mid.girder_bottom > 0.0 && mid.girder_top < 0.0);
        assert!(mid.deflection < 0.0);
    }

    #[test]
    fn test_effects_accumulate_by_category() {
        let sys = system(&[80.0], false);
        let history = StageManager::new(&sys).run(&AnalysisContext::detached()).unwrap();
        let effects = history.final_effects().unwrap();
        let mid = &effects[10];
        let dc = sys.girder_weight() + sys.deck_weight() + 0.3;
        assert_relative_eq!(mid.dc_moment, dc * 80.0 * 80.0 / 8.0, max_relative = 1e-6);
        assert_relative_eq!(mid.dw_moment, 0.2 * 80.0 * 80.0 / 8.0, max_relative = 1e-6);
        assert_eq!(mid.ps_moment, 0.0);
        // Deck stress only once composite
        assert!(history.stages[1].stations[10].deck_top.is_none());
        assert!(history.stages[2].stations[10].deck_top.is_some());
    }

    #[test]
    fn test_prestress_cambers_and_losses_grow() {
        let sys = system(&[100.0], true);
        let history = StageManager::new(&sys).run(&AnalysisContext::detached()).unwrap();
        let transfer = &history.stages[0];
        assert!(transfer.stations[10].deflection > 0.0);
        assert!(transfer.stations[10].girder_bottom < 0.0);

        let losses = history.losses();
        for w in losses.windows(2) {
            assert!(w[1].total >= w[0].total);
        }
        let service = history.stages.last().unwrap();
        assert_relative_eq!(service.effective_stress, 202.5 - losses[3].total);
    }

    #[test]
    fn test_out_of_order_stages_rejected() {
        let sys = system(&[60.0], false);
        let stages = vec![
            ConstructionStage::new(StageKind::Composite, 90.0),
            ConstructionStage::new(StageKind::Transfer, 1.0),
        ];
        let manager = StageManager::new(&sys).with_stages(stages);
        assert!(matches!(
            manager.run(&AnalysisContext::detached()),
            Err(BridgeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cancellation_between_stages() {
        let sys = system(&[60.0], false);
        let ctx = AnalysisContext::detached();
        ctx.cancellation().cancel();
        assert!(matches!(
            StageManager::new(&sys).run(&ctx),
            Err(BridgeError::Cancelled { .. })
        ));
    }
}
