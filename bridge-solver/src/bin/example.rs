//! Bridge Solver Example - Two-span prestressed girder rating

use anyhow::Context;
use bridge_solver::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Bridge Solver Example: AASHTO Type IV, 2 x 80 ft ===\n");

    let catalog = Catalog::standard();
    let girder = GirderDefinition {
        spans: vec![80.0, 80.0],
        shape: "AASHTO-IV".to_string(),
        spacing: 8.0,
        prestress: Some(PrestressLayout::from_rows(&[(12, 2.0), (12, 4.0), (6, 6.0)])),
        barrier: 0.25,
        overlay: 0.20,
        ..GirderDefinition::default()
    };

    // Construction stages
    let shape = catalog.shape(&girder.shape)?.clone();
    let system = GirderSystem::new(girder.clone(), shape).context("building girder system")?;
    let history = StageManager::new(&system)
        .with_loss_method(LossMethod::Refined)
        .run(&AnalysisContext::detached())
        .context("stage analysis")?;

    println!("Stage results at x = {:.1} ft:", history.loss_station);
    println!(
        "  {:<16} {:>8} {:>10} {:>10} {:>10} {:>10}",
        "stage", "age (d)", "loss", "f_bot", "f_top", "defl (in)"
    );
    for stage in &history.stages {
        let row = stage
            .stations
            .iter()
            .min_by(|a, b| {
                (a.station - history.loss_station)
                    .abs()
                    .total_cmp(&(b.station - history.loss_station).abs())
            });
        match row {
            Some(row) => println!(
                "  {:<16} {:>8.0} {:>10.2} {:>10.3} {:>10.3} {:>10.3}",
                stage.kind.label(),
                stage.age,
                stage.losses.total,
                row.girder_bottom,
                row.girder_top,
                row.deflection
            ),
            None => println!("  {:<16} {:>8.0}  failed", stage.kind.label(), stage.age),
        }
    }
    for warning in history.warnings() {
        println!("  warning: {warning}");
    }

    // Load rating
    println!("\n=== Load Rating ===\n");
    let request = AnalysisRequest::new(girder, AnalysisKind::LoadRating)
        .with_vehicles(&["HL93", "HL93-TANDEM", "TYPE3", "TYPE3S2", "TYPE3-3"])
        .with_loss_method(LossMethod::Refined);

    let sink = |event: ProgressEvent| {
        if event.terminal {
            println!("[{}] done", event.phase);
        }
    };
    let ctx = AnalysisContext::new(&sink, CancellationToken::new());
    let result = run_analysis(&request, &catalog, &ctx);

    let Some(summary) = result.summary.as_ref() else {
        anyhow::bail!("analysis {:?}: {:?}", result.status, result.error);
    };
    if let (Some(rf), Some(vehicle), Some(station)) = (
        summary.min_rating_factor,
        summary.critical_vehicle.as_ref(),
        summary.critical_station,
    ) {
        println!("Governing inventory RF: {rf:.3} ({vehicle} at x = {station:.1} ft)");
    }
    if let Some(m) = summary.max_positive_moment {
        println!("Max LL+IM positive moment: {m:.1} kip-ft");
    }
    if let Some(m) = summary.max_negative_moment {
        println!("Max LL+IM negative moment: {m:.1} kip-ft");
    }
    if let Some(v) = summary.max_shear {
        println!("Max LL+IM shear: {v:.1} kip");
    }

    if let Some(rating) = result.detail.as_ref().and_then(|d| d.rating.as_ref()) {
        println!("\nRestrictions:");
        if rating.restrictions.is_empty() {
            println!("  none");
        }
        for r in &rating.restrictions {
            println!(
                "  {}: RF {:.3} -> {:.1} tons of {:.1}",
                r.vehicle,
                r.rating_factor,
                r.restricted_tons(),
                r.reference_weight / 2.0
            );
        }
    }

    println!("\n=== Analysis Complete ===");
    Ok(())
}
