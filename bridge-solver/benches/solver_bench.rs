//! Benchmarks for the bridge solver

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use bridge_solver::prelude::*;

fn girder_model(spans: &[f64], elements_per_span: usize) -> BridgeModel {
    let shape = Catalog::standard().shape("AASHTO-IV").unwrap().frame_section();
    GirderLineBuilder::new(spans)
        .elements_per_span(elements_per_span)
        .material(Material::concrete(8.0, 6.0, 0.150))
        .section(shape)
        .build()
        .unwrap()
}

fn benchmark_assembly(c: &mut Criterion) {
    let model = girder_model(&[100.0, 120.0, 100.0], 40);
    c.bench_function("girder_3span_assemble_factorize", |b| {
        b.iter(|| {
            let system = LinearSystem::assemble(&model, &SolverOptions::default()).unwrap();
            black_box(&system);
        })
    });
}

fn benchmark_influence(c: &mut Criterion) {
    let model = girder_model(&[100.0, 120.0, 100.0], 40);
    let generator = InfluenceGenerator::new(&model, &SolverOptions::default(), InfluenceOptions::default()).unwrap();
    c.bench_function("influence_moment_interior_support", |b| {
        b.iter(|| {
            let line = generator.generate(InfluenceQuantity::Moment, 100.0).unwrap();
            black_box(&line);
        })
    });
}

fn benchmark_moving_load(c: &mut Criterion) {
    let model = girder_model(&[100.0, 120.0, 100.0], 40);
    let generator = InfluenceGenerator::new(&model, &SolverOptions::default(), InfluenceOptions::default()).unwrap();
    let line = generator.generate(InfluenceQuantity::Moment, 160.0).unwrap();
    let catalog = Catalog::standard();
    let truck = catalog.vehicle("HL93").unwrap();
    c.bench_function("moving_load_hl93_3span", |b| {
        b.iter(|| {
            let result = optimize(&line, truck, &OptimizerOptions::default()).unwrap();
            black_box(&result);
        })
    });
}

fn benchmark_rating(c: &mut Criterion) {
    let catalog = Catalog::standard();
    let girder = GirderDefinition {
        spans: vec![80.0, 80.0],
        prestress: Some(PrestressLayout::from_rows(&[(12, 2.0), (12, 4.0)])),
        ..GirderDefinition::default()
    };
    let request = AnalysisRequest::new(girder, AnalysisKind::LoadRating).with_vehicles(&["HL93", "TYPE3"]);
    c.bench_function("load_rating_2span", |b| {
        b.iter(|| {
            let result = run_analysis(&request, &catalog, &AnalysisContext::detached());
            black_box(&result);
        })
    });
}

criterion_group!(
    benches,
    benchmark_assembly,
    benchmark_influence,
    benchmark_moving_load,
    benchmark_rating,
);

criterion_main!(benches);
