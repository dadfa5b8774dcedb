//! Reference scenarios with known answers

use approx::assert_relative_eq;
use bridge_solver::prelude::*;
use bridge_solver::girder::SectionCapacity;
use bridge_solver::rating::{SectionDemand, VehicleEffects};
use bridge_solver::stages::{StageOutcome, StationEffects};

fn girder_line(spans: &[f64]) -> BridgeModel {
    let section = Catalog::standard().shape("AASHTO-IV").unwrap().frame_section();
    GirderLineBuilder::new(spans)
        .elements_per_span(20)
        .material(Material::concrete(8.0, 6.0, 0.150))
        .section(section)
        .build()
        .unwrap()
}

/// Simple span, 60 ft, uniform 0.82 kip/ft: M = wL²/8 = 369 kip-ft
#[test]
fn scenario_a_self_weight_midspan_moment() {
    let model = girder_line(&[60.0]);
    let layout = model.layout().unwrap();
    let system = LinearSystem::assemble(&model, &SolverOptions::default()).unwrap();

    let mut loads = LoadSet::new("DC");
    for member in &layout.members {
        loads.add_member_load(member, DistributedLoad::uniform_downward(0.82));
    }
    let solution = system.solve(&loads).unwrap();

    let mid = layout.nearest_node(30.0);
    let moment = solution.girder_moment(&layout, mid).unwrap();
    assert_relative_eq!(moment, 369.0, max_relative = 0.01);
    assert_relative_eq!(solution.total_vertical_reaction(), 0.82 * 60.0, max_relative = 1e-6);
}

/// 80 ft span, triangular moment line peaking at 20, 8/32/32 truck with a
/// 14 ft minimum spacing. Centring the middle axle on the peak gives
/// 32·20 + (32 + 8)·13 = 1160 kip-ft.
#[test]
fn scenario_b_truck_on_triangular_line() {
    let line = InfluenceLine::new(
        InfluenceQuantity::Moment,
        40.0,
        vec![0.0, 40.0, 80.0],
        vec![0.0, 20.0, 0.0],
    );
    let truck = Catalog::standard().vehicle("HS20").unwrap().clone();
    let result = optimize(&line, &truck, &OptimizerOptions::default()).unwrap();
    let max = &result.maximum;

    assert_relative_eq!(max.raw, 1160.0, max_relative = 0.02);
    // Symmetric about mid-span
    assert_relative_eq!(max.axle_positions[1], 40.0, epsilon = 1e-9);
    assert_relative_eq!(max.axle_positions[0] + max.axle_positions[2], 80.0, epsilon = 1e-9);
    assert_eq!(max.spacings, vec![14.0, 14.0]);
    assert_relative_eq!(max.amplified, 1.33 * max.raw, max_relative = 1e-12);
}

/// Same truck on a generated simple-span moment line
#[test]
fn scenario_b_generated_line_matches_triangle() {
    let model = girder_line(&[80.0]);
    let generator = InfluenceGenerator::new(&model, &SolverOptions::default(), InfluenceOptions::default()).unwrap();
    let line = generator.generate(InfluenceQuantity::Moment, 40.0).unwrap();
    let truck = Catalog::standard().vehicle("HS20").unwrap().clone().with_impact(0.0);
    let result = optimize(&line, &truck, &OptimizerOptions::default()).unwrap();
    assert_relative_eq!(result.maximum.raw, 1160.0, max_relative = 0.01);
}

/// Two-span 80-80, C = 4500, DC = 800, DW = 150, LL = 1500:
/// RF = (4500 − 1.25·800 − 1.50·150) / (1.75·1500) = 1.248
#[test]
fn scenario_c_two_span_inventory_rating() {
    let model = girder_line(&[80.0, 80.0]);
    let layout = model.layout().unwrap();
    let station = layout.stations[layout.nearest_node(32.0)];

    let placement = |amplified: f64| Placement {
        direction: bridge_solver::moving_load::TravelDirection::Forward,
        spacings: vec![14.0, 14.0],
        axle_positions: vec![46.0, 32.0, 18.0],
        axle_effect: amplified,
        lane_effect: 0.0,
        raw: amplified,
        amplified,
    };
    let extremes = |quantity, max: f64, min: f64| MovingLoadResult {
        vehicle: "HL93".to_string(),
        quantity,
        station,
        maximum: placement(max),
        minimum: placement(min),
    };
    let section = SectionDemand {
        station,
        capacity: SectionCapacity {
            positive_moment: 4500.0,
            negative_moment: 0.0,
            shear: 1000.0,
        },
        permanent: StationEffects {
            station,
            dc_moment: 800.0,
            dw_moment: 150.0,
            ..StationEffects::default()
        },
        live: vec![VehicleEffects {
            vehicle: "HL93".to_string(),
            weight: 72.0,
            moment: extremes(InfluenceQuantity::Moment, 1500.0, -200.0),
            shear: extremes(InfluenceQuantity::Shear, 60.0, -10.0),
        }],
    };

    let summary = RatingEngine::default()
        .rate(&[section], &AnalysisContext::detached())
        .unwrap();
    let governing = summary.governing.unwrap();
    assert_eq!(governing.effect, ForceEffect::PositiveMoment);
    assert_relative_eq!(governing.inventory, 1.25, max_relative = 0.02);
    assert!(governing.operating > governing.inventory);
    assert!(summary.restrictions.is_empty());
}

/// A beam with no supports is rejected before assembly
#[test]
fn scenario_d_unsupported_beam_is_invalid_geometry() {
    let mut model = BridgeModel::new();
    model.add_material("concrete", Material::default()).unwrap();
    model.add_section("girder", Section::rectangular(1.0, 4.0)).unwrap();
    model.add_node("A", Node::new(0.0, 0.0, 0.0)).unwrap();
    model.add_node("B", Node::new(40.0, 0.0, 0.0)).unwrap();
    model.add_member("M", Member::new("A", "B", "concrete", "girder")).unwrap();

    assert!(matches!(model.validate(), Err(BridgeError::InvalidGeometry(_))));
    let err = LinearSystem::assemble(&model, &SolverOptions::default()).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidGeometry(_)));
}

/// Zero transfer strength leaves the bare girder without stiffness at
/// transfer. That stage fails on its own and the later stages still run.
#[test]
fn singular_transfer_stage_does_not_stop_later_stages() {
    let girder = GirderDefinition {
        spans: vec![80.0],
        concrete: Material::concrete(8.0, 0.0, 0.150),
        ..GirderDefinition::default()
    };
    let request = AnalysisRequest::new(girder, AnalysisKind::LoadRating).with_vehicles(&["HL93"]);
    let result = run_analysis(&request, &Catalog::standard(), &AnalysisContext::detached());

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert_eq!(result.summary.as_ref().unwrap().failed_stages, 1);

    let history = result.detail.as_ref().unwrap().stages.as_ref().unwrap();
    let transfer = &history.stages[0];
    assert_eq!(transfer.kind, StageKind::Transfer);
    match &transfer.outcome {
        StageOutcome::Failed { error } => assert!(error.contains("Singular stiffness"), "{error}"),
        other => panic!("transfer should fail, got {other:?}"),
    }
    assert!(transfer.stations.is_empty());

    let rest: Vec<StageKind> = history.stages[1..]
        .iter()
        .filter(|s| s.is_completed())
        .map(|s| s.kind)
        .collect();
    assert_eq!(rest, vec![StageKind::DeckPlacement, StageKind::Composite, StageKind::Service]);
}
