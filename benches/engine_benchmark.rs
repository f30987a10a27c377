use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use std::sync::OnceLock;

use revpulse::prelude::*;

// Static storage for the synthetic population so each benchmark reuses the
// same fixture
static POPULATION: OnceLock<(Vec<PracticeProfile>, HashMap<String, SpecialtyBenchmark>)> =
    OnceLock::new();

fn benchmark_fixture(specialty: &str, provider_count: u32) -> SpecialtyBenchmark {
    SpecialtyBenchmark {
        specialty: specialty.to_string(),
        provider_count,
        avg_patients: 450.0,
        avg_revenue_per_patient: 520.0,
        avg_total_payment: 234_000.0,
        avg_total_services: 3_200.0,
        pct_99213: 0.38,
        pct_99214: 0.47,
        pct_99215: 0.15,
        ccm_adoption: 0.20,
        rpm_adoption: 0.07,
        bhi_adoption: 0.03,
        awv_adoption: 0.48,
        chronic_prevalence: Some(0.58),
        last_refreshed: None,
    }
}

fn practice_fixture(index: usize, specialty: &str) -> PracticeProfile {
    // Deterministic variation across the population without a RNG
    let spread = (index % 17) as f64;
    let patients = 120 + (index % 700) as u32;
    PracticeProfile {
        id: PracticeId(format!("P{:05}", index)),
        specialty: specialty.to_string(),
        state: "TX".to_string(),
        city: None,
        total_patients: patients,
        total_services: 1_500 + (index % 3_000) as u64,
        total_payment: 60_000.0 + spread * 15_000.0,
        em_99213: 400 + (index % 900) as u64,
        em_99214: 200 + (index % 500) as u64,
        em_99215: 40 + (index % 120) as u64,
        ccm: ProgramActivity {
            services: if index % 3 == 0 { 120 } else { 0 },
            payment: if index % 3 == 0 { 7_400.0 } else { 0.0 },
        },
        rpm: ProgramActivity::default(),
        bhi: ProgramActivity::default(),
        awv: ProgramActivity {
            services: if index % 2 == 0 { 60 } else { 0 },
            payment: if index % 2 == 0 { 10_500.0 } else { 0.0 },
        },
        distinct_codes: Some(4 + (index % 22) as u32),
        last_refreshed: None,
    }
}

fn get_population() -> &'static (Vec<PracticeProfile>, HashMap<String, SpecialtyBenchmark>) {
    POPULATION.get_or_init(|| {
        let specialties = ["Cardiology", "Family Medicine", "Internal Medicine"];
        let practices: Vec<PracticeProfile> = (0..1_000)
            .map(|i| practice_fixture(i, specialties[i % specialties.len()]))
            .collect();
        let benchmarks = specialties
            .iter()
            .map(|s| (s.to_string(), benchmark_fixture(s, 12_000)))
            .collect();
        (practices, benchmarks)
    })
}

fn benchmark_scoring(c: &mut Criterion) {
    let (practices, benchmarks) = get_population();
    let practice = &practices[0];
    let benchmark = &benchmarks[&practice.specialty];

    c.bench_function("score_practice", |b| {
        b.iter(|| score_practice(black_box(practice), black_box(benchmark), None))
    });

    c.bench_function("evaluate_acquisition", |b| {
        b.iter(|| evaluate_acquisition(black_box(practice), black_box(benchmark), None))
    });

    c.bench_function("estimate_percentile_sweep", |b| {
        b.iter(|| {
            for score in 0..=100 {
                black_box(estimate_percentile(score as f64));
            }
        })
    });
}

fn benchmark_forecast(c: &mut Criterion) {
    let (practices, benchmarks) = get_population();
    let practice = &practices[0];
    let benchmark = &benchmarks[&practice.specialty];
    let inputs = derive_forecast_inputs(practice, benchmark);

    c.bench_function("run_forecast_full_optimization", |b| {
        b.iter(|| run_scenario(black_box(&inputs), Scenario::FullOptimization))
    });

    c.bench_function("derive_forecast_inputs", |b| {
        b.iter(|| derive_forecast_inputs(black_box(practice), black_box(benchmark)))
    });
}

fn benchmark_market_scan(c: &mut Criterion) {
    let (practices, benchmarks) = get_population();

    let mut group = c.benchmark_group("market");
    group.sample_size(20); // Reduce sample size for the expensive scans

    group.bench_function("market_opportunity_1k_practices", |b| {
        b.iter(|| market_opportunity(black_box(practices), black_box(benchmarks)))
    });

    group.bench_function("portfolio_analysis_1k_practices", |b| {
        b.iter(|| portfolio_analysis(black_box(practices), black_box(benchmarks)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_scoring,
    benchmark_forecast,
    benchmark_market_scan
);
criterion_main!(benches);
