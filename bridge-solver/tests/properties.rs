//! Structural and behavioural properties of the analysis pipeline

use std::sync::Mutex;

use approx::assert_relative_eq;
use bridge_solver::losses::LossInput;
use bridge_solver::prelude::*;

fn girder_line(spans: &[f64], elements_per_span: usize) -> BridgeModel {
    let section = Catalog::standard().shape("AASHTO-IV").unwrap().frame_section();
    GirderLineBuilder::new(spans)
        .elements_per_span(elements_per_span)
        .material(Material::concrete(8.0, 6.0, 0.150))
        .section(section)
        .build()
        .unwrap()
}

fn prestressed(spans: &[f64]) -> GirderDefinition {
    GirderDefinition {
        spans: spans.to_vec(),
        elements_per_span: 10,
        prestress: Some(PrestressLayout::from_rows(&[(12, 2.0), (12, 4.0), (6, 6.0)])),
        barrier: 0.3,
        overlay: 0.2,
        ..GirderDefinition::default()
    }
}

fn loss_input(spans: &[f64]) -> LossInput {
    let shape = Catalog::standard().shape("AASHTO-IV").unwrap().clone();
    let system = GirderSystem::new(prestressed(spans), shape).unwrap();
    system.loss_input(&Environment::default(), 1.0, 60.0).unwrap()
}

#[test]
fn stiffness_matrix_is_symmetric() {
    let model = girder_line(&[60.0, 90.0], 8);
    let system = LinearSystem::assemble(&model, &SolverOptions::default()).unwrap();
    let k = system.stiffness_matrix();
    let scale = k.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    for i in 0..k.nrows() {
        for j in 0..i {
            assert!((k[(i, j)] - k[(j, i)]).abs() <= 1e-12 * scale, "K[{i},{j}] != K[{j},{i}]");
        }
    }
}

#[test]
fn moment_lines_are_reciprocal() {
    let model = girder_line(&[80.0, 80.0], 16);
    let generator = InfluenceGenerator::new(&model, &SolverOptions::default(), InfluenceOptions::default()).unwrap();
    let layout = generator.layout().clone();

    for station in [40.0, 80.0, 120.0] {
        let dislocation = generator.generate(InfluenceQuantity::Moment, station).unwrap();
        let direct = generator.generate_direct(InfluenceQuantity::Moment, station).unwrap();
        for (&x, &expected) in layout.stations.iter().zip(&direct.ordinates) {
            assert_relative_eq!(dislocation.ordinate_at(x), expected, epsilon = 1e-5);
        }
    }
}

#[test]
fn deflection_lines_satisfy_maxwell_betti() {
    let model = girder_line(&[80.0, 80.0], 16);
    let generator = InfluenceGenerator::new(&model, &SolverOptions::default(), InfluenceOptions::default()).unwrap();
    let a = generator.generate(InfluenceQuantity::Deflection, 20.0).unwrap();
    let b = generator.generate(InfluenceQuantity::Deflection, 110.0).unwrap();
    let scale = a.max_ordinate().abs().max(b.max_ordinate().abs());
    assert!((a.ordinate_at(110.0) - b.ordinate_at(20.0)).abs() <= 1e-6 * scale);
}

#[test]
fn losses_never_decrease_with_age() {
    let input = loss_input(&[100.0]);
    let ages = [1.0, 3.0, 10.0, 30.0, 59.0, 60.0, 61.0, 90.0, 365.0, 3650.0, 10_000.0];
    for method in [LossMethod::Approximate, LossMethod::Refined] {
        let history = method.engine().history(&input, &ages).unwrap();
        assert_eq!(history.len(), ages.len());
        for w in history.windows(2) {
            assert!(w[1].total >= w[0].total, "{method:?}: {} < {}", w[1].total, w[0].total);
            assert!(w[1].creep >= w[0].creep);
            assert!(w[1].shrinkage >= w[0].shrinkage);
            assert!(w[1].relaxation >= w[0].relaxation);
        }
    }
}

#[test]
fn both_loss_methods_give_plausible_long_term_totals() {
    let input = loss_input(&[100.0]);
    for method in [LossMethod::Approximate, LossMethod::Refined] {
        let loss = method.engine().at(&input, 10_000.0).unwrap();
        // roughly 10 to 30 % of the jacking stress for a pretensioned girder
        assert!(loss.total > 0.10 * 202.5 && loss.total < 0.30 * 202.5, "{method:?}: {}", loss.total);
        assert!(loss.elastic_shortening > 0.0);
    }
}

#[test]
fn stages_run_in_order_and_carry_history() {
    let shape = Catalog::standard().shape("AASHTO-IV").unwrap().clone();
    let system = GirderSystem::new(prestressed(&[100.0]), shape).unwrap();
    let history = StageManager::new(&system)
        .with_loss_method(LossMethod::Refined)
        .run(&AnalysisContext::detached())
        .unwrap();

    let kinds: Vec<StageKind> = history.stages.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![StageKind::Transfer, StageKind::DeckPlacement, StageKind::Composite, StageKind::Service]
    );
    assert!(history.stages.iter().all(|s| s.is_completed()));

    for w in history.stages.windows(2) {
        assert!(w[1].losses.total >= w[0].losses.total);
        assert!(w[1].effective_stress <= w[0].effective_stress);
    }

    // Deck load arrives at deck placement and is carried by the bare girder
    let mid = history.stages[0].stations.len() / 2;
    let transfer = &history.stages[0].stations[mid];
    let deck = &history.stages[1].stations[mid];
    let added = deck.moment - transfer.moment;
    let deck_moment = system.deck_weight() * 100.0 * 100.0 / 8.0;
    assert!(added > 0.9 * deck_moment, "deck moment {added} vs {deck_moment}");
    assert!(deck.deck_top.is_none());
    assert!(history.stages[2].stations[mid].deck_top.is_some());
}

#[test]
fn rating_is_idempotent() {
    let catalog = Catalog::standard();
    let request = AnalysisRequest::new(prestressed(&[80.0, 80.0]), AnalysisKind::LoadRating)
        .with_vehicles(&["HL93", "TYPE3S2"]);

    let first = run_analysis(&request, &catalog, &AnalysisContext::detached());
    let second = run_analysis(&request, &catalog, &AnalysisContext::detached());
    assert_eq!(first.status, AnalysisStatus::Completed);
    assert_eq!(first, second);

    let rating = first.detail.as_ref().unwrap().rating.as_ref().unwrap();
    for restriction in &rating.restrictions {
        assert_eq!(&restriction.rederive(), restriction);
    }
    let summary = first.summary.unwrap();
    assert!(summary.min_rating_factor.unwrap().is_finite());
    assert!(summary.max_negative_moment.unwrap() < 0.0);
    assert!(summary.critical_vehicle.is_some());
}

#[test]
fn cancellation_stops_between_units_with_one_terminal_event() {
    let catalog = Catalog::standard();
    let request = AnalysisRequest::new(prestressed(&[80.0, 80.0]), AnalysisKind::LoadRating)
        .with_vehicles(&["HL93"]);

    let token = CancellationToken::new();
    let events = Mutex::new(Vec::new());
    let trigger = token.clone();
    let sink = |event: ProgressEvent| {
        if event.phase == "stages" {
            trigger.cancel();
        }
        events.lock().unwrap().push(event);
    };
    let ctx = AnalysisContext::new(&sink, token);
    let result = run_analysis(&request, &catalog, &ctx);

    assert_eq!(result.status, AnalysisStatus::Cancelled);
    assert!(result.detail.is_none());

    let events = events.into_inner().unwrap();
    let terminal: Vec<&ProgressEvent> = events.iter().filter(|e| e.terminal).collect();
    assert_eq!(terminal.len(), 1);
    assert_eq!(terminal[0].phase, "cancelled");
    assert!(events.last().unwrap().terminal);
    for (k, e) in events.iter().enumerate() {
        assert_eq!(e.sequence, k as u64);
    }
}

#[test]
fn unbounded_request_runs_with_unbounded_plan() {
    let catalog = Catalog::standard();
    let mut girder = prestressed(&[60.0, 80.0, 80.0, 60.0]);
    girder.elements_per_span = 8;
    let request = AnalysisRequest::new(girder, AnalysisKind::MovingLoad)
        .with_vehicles(&["TYPE3"])
        .with_stations(&[30.0, 100.0]);

    let result = run_analysis(&request, &catalog, &AnalysisContext::detached());
    assert_eq!(result.status, AnalysisStatus::Completed);
    assert_eq!(result.tier, Some(ExecutionTier::Unbounded));
    assert_eq!(result.detail.unwrap().moving_loads.len(), 4);

    let bounded = run_bounded(&request, &catalog, &AnalysisContext::detached());
    assert_eq!(bounded.status, AnalysisStatus::Failed);
}
