/*!
 * Market and portfolio aggregation
 *
 * Runs the scoring engines across practice populations: a market-level
 * opportunity summary for a geography or specialty sweep, and a portfolio
 * analysis for an explicit list of holdings. Practices without a matching
 * specialty benchmark are skipped, never scored blind.
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::acquisition::{
    evaluate_acquisition, readiness_threshold, AcquisitionBreakdown,
};
use crate::data_types::{PracticeId, PracticeProfile, Program, SpecialtyBenchmark};
use crate::score::safe_divide;

/// Health score below which a practice counts as underperforming.
pub const UNDERPERFORMING_SCORE_CEILING: f64 = 60.0;

/// Acquisition score at or above which a practice counts as a prime target.
pub const PRIME_TARGET_SCORE_FLOOR: f64 = 70.0;

/// Specialty gap rows retained in the market summary.
pub const TOP_SPECIALTY_GAPS: usize = 10;

/// Sub-score thresholds that trigger portfolio actions.
pub const READINESS_ACTION_THRESHOLD: f64 = 50.0;
pub const UPSIDE_ACTION_THRESHOLD: f64 = 60.0;

/// One specialty's aggregate revenue gap across the scanned population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyGap {
    pub specialty: String,
    pub practice_count: u32,
    /// Average addressable-minus-current gap per practice
    pub avg_gap: f64,
    /// Ranking key: `avg_gap * practice_count`
    pub priority: f64,
}

/// Population-level market summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOpportunity {
    /// Practices scored (those with a matching benchmark)
    pub practice_count: u32,
    /// Practices skipped for lack of a benchmark
    pub skipped_practices: u32,
    pub avg_health_score: f64,
    pub total_current_payment: f64,
    /// What the population would collect at benchmark revenue per patient
    pub total_addressable_payment: f64,
    /// `max(0, addressable - current)`
    pub missed_revenue: f64,
    pub underperforming_count: u32,
    pub prime_target_count: u32,
    /// Top specialties by aggregate gap, largest first
    pub top_specialty_gaps: Vec<SpecialtyGap>,
}

/// One holding's acquisition evaluation inside a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeAcquisition {
    pub id: PracticeId,
    pub specialty: String,
    pub current_payment: f64,
    pub acquisition: AcquisitionBreakdown,
}

/// Portfolio-level acquisition analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    /// Holdings sorted by acquisition score, best first
    pub practices: Vec<PracticeAcquisition>,
    pub total_current_revenue: f64,
    pub total_projected_revenue: f64,
    /// `max(0, projected - current)` across the portfolio
    pub total_upside: f64,
    pub avg_acquisition_score: f64,
    /// Deduplicated actions, in the order they were first triggered
    pub recommended_actions: Vec<String>,
}

struct ScannedPractice {
    specialty: String,
    health_score: f64,
    acquisition_score: f64,
    current_payment: f64,
    addressable_payment: f64,
}

fn scan_practice(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> ScannedPractice {
    let acquisition = evaluate_acquisition(profile, benchmark, None);
    ScannedPractice {
        specialty: profile.specialty.clone(),
        health_score: acquisition.score.overall,
        acquisition_score: acquisition.overall,
        current_payment: profile.total_payment,
        addressable_payment: profile.total_patients as f64
            * benchmark.avg_revenue_per_patient,
    }
}

/// Summarize the revenue opportunity across a practice population.
///
/// Practices whose specialty has no benchmark are excluded from every
/// statistic and reported in `skipped_practices`.
pub fn market_opportunity(
    practices: &[PracticeProfile],
    benchmarks: &HashMap<String, SpecialtyBenchmark>,
) -> MarketOpportunity {
    let matched: Vec<(&PracticeProfile, &SpecialtyBenchmark)> = practices
        .iter()
        .filter_map(|p| benchmarks.get(&p.specialty).map(|b| (p, b)))
        .collect();
    let skipped_practices = (practices.len() - matched.len()) as u32;

    #[cfg(feature = "parallel")]
    let scanned: Vec<ScannedPractice> = matched
        .par_iter()
        .map(|(profile, benchmark)| scan_practice(profile, benchmark))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let scanned: Vec<ScannedPractice> = matched
        .iter()
        .map(|(profile, benchmark)| scan_practice(profile, benchmark))
        .collect();

    let practice_count = scanned.len() as u32;
    let total_current_payment: f64 = scanned.iter().map(|s| s.current_payment).sum();
    let total_addressable_payment: f64 =
        scanned.iter().map(|s| s.addressable_payment).sum();
    let avg_health_score = safe_divide(
        scanned.iter().map(|s| s.health_score).sum(),
        practice_count as f64,
        0.0,
    )
    .round();

    let underperforming_count = scanned
        .iter()
        .filter(|s| s.health_score < UNDERPERFORMING_SCORE_CEILING)
        .count() as u32;
    let prime_target_count = scanned
        .iter()
        .filter(|s| s.acquisition_score >= PRIME_TARGET_SCORE_FLOOR)
        .count() as u32;

    let mut by_specialty: HashMap<&str, (u32, f64)> = HashMap::new();
    for practice in &scanned {
        let entry = by_specialty.entry(&practice.specialty).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += practice.addressable_payment - practice.current_payment;
    }
    let mut top_specialty_gaps: Vec<SpecialtyGap> = by_specialty
        .into_iter()
        .map(|(specialty, (count, gap_sum))| {
            let avg_gap = gap_sum / count as f64;
            SpecialtyGap {
                specialty: specialty.to_string(),
                practice_count: count,
                avg_gap,
                priority: avg_gap * count as f64,
            }
        })
        .collect();
    top_specialty_gaps.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    top_specialty_gaps.truncate(TOP_SPECIALTY_GAPS);

    MarketOpportunity {
        practice_count,
        skipped_practices,
        avg_health_score,
        total_current_payment,
        total_addressable_payment,
        missed_revenue: (total_addressable_payment - total_current_payment).max(0.0),
        underperforming_count,
        prime_target_count,
        top_specialty_gaps,
    }
}

/// Analyze an explicit list of holdings (one owner's practices).
///
/// Results come back sorted by acquisition score; actions fire when a
/// holding's readiness or upside sub-score clears its threshold and are
/// deduplicated across the portfolio.
pub fn portfolio_analysis(
    practices: &[PracticeProfile],
    benchmarks: &HashMap<String, SpecialtyBenchmark>,
) -> PortfolioAnalysis {
    let mut evaluated = Vec::new();
    let mut recommended_actions: Vec<String> = Vec::new();

    for profile in practices {
        let Some(benchmark) = benchmarks.get(&profile.specialty) else {
            continue;
        };
        let acquisition = evaluate_acquisition(profile, benchmark, None);

        if acquisition.optimization_readiness > READINESS_ACTION_THRESHOLD {
            for program in Program::ALL {
                if !profile.bills(program)
                    && benchmark.adoption_rate(program) > readiness_threshold(program)
                {
                    push_action(
                        &mut recommended_actions,
                        format!("Launch a {} program", program.display_name()),
                    );
                }
            }
        }
        if acquisition.upside_potential > UPSIDE_ACTION_THRESHOLD {
            push_action(
                &mut recommended_actions,
                "Optimize evaluation visit coding".to_string(),
            );
        }

        evaluated.push(PracticeAcquisition {
            id: profile.id.clone(),
            specialty: profile.specialty.clone(),
            current_payment: profile.total_payment,
            acquisition,
        });
    }

    evaluated.sort_by(|a, b| b.acquisition.overall.total_cmp(&a.acquisition.overall));

    let total_current_revenue: f64 = evaluated.iter().map(|p| p.current_payment).sum();
    let total_projected_revenue: f64 = evaluated
        .iter()
        .map(|p| p.acquisition.projected_revenue)
        .sum();
    let avg_acquisition_score = safe_divide(
        evaluated.iter().map(|p| p.acquisition.overall).sum(),
        evaluated.len() as f64,
        0.0,
    )
    .round();

    PortfolioAnalysis {
        total_current_revenue,
        total_projected_revenue,
        total_upside: (total_projected_revenue - total_current_revenue).max(0.0),
        avg_acquisition_score,
        recommended_actions,
        practices: evaluated,
    }
}

fn push_action(actions: &mut Vec<String>, action: String) {
    if !actions.contains(&action) {
        actions.push(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::ProgramActivity;

    fn benchmark(specialty: &str) -> SpecialtyBenchmark {
        SpecialtyBenchmark {
            specialty: specialty.to_string(),
            provider_count: 24_000,
            avg_patients: 500.0,
            avg_revenue_per_patient: 430.0,
            avg_total_payment: 215_000.0,
            avg_total_services: 3_900.0,
            pct_99213: 0.40,
            pct_99214: 0.45,
            pct_99215: 0.15,
            ccm_adoption: 0.18,
            rpm_adoption: 0.06,
            bhi_adoption: 0.02,
            awv_adoption: 0.55,
            chronic_prevalence: Some(0.55),
            last_refreshed: None,
        }
    }

    fn practice(id: &str, specialty: &str, patients: u32, payment: f64) -> PracticeProfile {
        PracticeProfile {
            id: PracticeId(id.to_string()),
            specialty: specialty.to_string(),
            state: "OH".to_string(),
            city: None,
            total_patients: patients,
            total_services: 3_000,
            total_payment: payment,
            em_99213: 1_400,
            em_99214: 500,
            em_99215: 100,
            ccm: ProgramActivity::default(),
            rpm: ProgramActivity::default(),
            bhi: ProgramActivity::default(),
            awv: ProgramActivity::default(),
            distinct_codes: Some(9),
            last_refreshed: None,
        }
    }

    fn benchmarks() -> HashMap<String, SpecialtyBenchmark> {
        let mut map = HashMap::new();
        map.insert("Family Medicine".to_string(), benchmark("Family Medicine"));
        map.insert("Cardiology".to_string(), benchmark("Cardiology"));
        map
    }

    #[test]
    fn test_market_skips_unmatched_specialties() {
        let practices = vec![
            practice("A", "Family Medicine", 450, 120_000.0),
            practice("B", "Cardiology", 300, 200_000.0),
            practice("C", "Astrology", 100, 50_000.0),
        ];
        let summary = market_opportunity(&practices, &benchmarks());

        assert_eq!(summary.practice_count, 2);
        assert_eq!(summary.skipped_practices, 1);
        assert!(summary.missed_revenue >= 0.0);
        assert!(summary.total_addressable_payment > 0.0);
    }

    #[test]
    fn test_specialty_gaps_ranked_by_priority() {
        let practices = vec![
            practice("A", "Family Medicine", 450, 120_000.0),
            practice("B", "Family Medicine", 500, 100_000.0),
            practice("C", "Cardiology", 200, 84_000.0),
        ];
        let summary = market_opportunity(&practices, &benchmarks());

        assert!(summary.top_specialty_gaps.len() <= TOP_SPECIALTY_GAPS);
        for pair in summary.top_specialty_gaps.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
        // Two Family Medicine practices with larger gaps outrank the lone
        // cardiology practice.
        assert_eq!(summary.top_specialty_gaps[0].specialty, "Family Medicine");
        assert_eq!(summary.top_specialty_gaps[0].practice_count, 2);
    }

    #[test]
    fn test_portfolio_sorted_with_rounded_average() {
        let practices = vec![
            practice("LOW", "Family Medicine", 450, 40_000.0),
            practice("HIGH", "Family Medicine", 450, 250_000.0),
            practice("MID", "Family Medicine", 450, 150_000.0),
        ];
        let analysis = portfolio_analysis(&practices, &benchmarks());

        assert_eq!(analysis.practices.len(), 3);
        for pair in analysis.practices.windows(2) {
            assert!(pair[0].acquisition.overall >= pair[1].acquisition.overall);
        }

        let mean: f64 = analysis
            .practices
            .iter()
            .map(|p| p.acquisition.overall)
            .sum::<f64>()
            / 3.0;
        assert_eq!(analysis.avg_acquisition_score, mean.round());
        assert!(analysis.total_upside >= 0.0);
        assert!(
            (analysis.total_upside
                - (analysis.total_projected_revenue - analysis.total_current_revenue).max(0.0))
            .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_portfolio_actions_deduplicated() {
        // Two near-identical under-optimized practices trigger the same
        // actions once.
        let practices = vec![
            practice("A", "Family Medicine", 450, 60_000.0),
            practice("B", "Family Medicine", 460, 62_000.0),
        ];
        let analysis = portfolio_analysis(&practices, &benchmarks());

        assert!(!analysis.recommended_actions.is_empty());
        let mut deduped = analysis.recommended_actions.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), analysis.recommended_actions.len());
        let unique: std::collections::HashSet<_> =
            analysis.recommended_actions.iter().collect();
        assert_eq!(unique.len(), analysis.recommended_actions.len());
    }

    #[test]
    fn test_empty_portfolio() {
        let analysis = portfolio_analysis(&[], &benchmarks());
        assert!(analysis.practices.is_empty());
        assert_eq!(analysis.avg_acquisition_score, 0.0);
        assert_eq!(analysis.total_upside, 0.0);
    }
}
